// Business logic services for the GymKit backend

pub mod billing_cycle;
pub mod email;
pub mod payment_ledger;
pub mod provider;
pub mod rate_limit;
pub mod referral_credit;
pub mod streak;
pub mod subscription_tracker;
pub mod write_gate;

pub use billing_cycle::{run_billing_cycle, CycleReport, ReminderSender};
pub use email::EmailService;
pub use payment_ledger::{record_payment, LedgerError, PaymentOutcome};
pub use provider::{
    parse_event, BillingProvider, ProviderClient, ProviderError, ProviderEvent, WebhookVerifier,
};
pub use rate_limit::{
    InMemoryRateLimitStore, RateLimitConfig, RateLimitService, RateLimitStore,
    RedisRateLimitStore,
};
pub use referral_credit::{apply_credit, CreditError, CreditOutcome};
pub use streak::{record_check_in, CheckInOutcome, StreakError, StreakState};
pub use subscription_tracker::{apply_event, TrackerError, TrackerOutcome};
pub use write_gate::{
    billing_status, evaluate_for, BillingStatus, DenialReason, GateDecision, GateError,
    GateInput,
};
