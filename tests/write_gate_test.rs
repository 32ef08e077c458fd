// Write-access gate decision tests
// Exercises the gate rules over in-memory inputs; no database required.

use chrono::{Duration, Utc};
use gymkit_backend_core::models::tenant::{BillingMode, SubscriptionStatus};
use gymkit_backend_core::services::write_gate::{evaluate, DenialReason, GateDecision, GateInput};

fn input(status: SubscriptionStatus) -> GateInput {
    GateInput {
        subscription_status: status,
        trial_ends_at: None,
        billing_mode: BillingMode::Provider,
        free_until: None,
    }
}

#[test]
fn active_subscription_always_writes() {
    let now = Utc::now();

    // Active wins regardless of trial or grace state
    let gate = GateInput {
        trial_ends_at: Some(now - Duration::days(100)),
        ..input(SubscriptionStatus::Active)
    };
    assert_eq!(evaluate(&gate, now), GateDecision::Allowed);
}

#[test]
fn trial_boundary_is_exclusive() {
    let now = Utc::now();

    // One second left on the trial still writes
    let gate = GateInput {
        trial_ends_at: Some(now + Duration::seconds(1)),
        ..input(SubscriptionStatus::Trialing)
    };
    assert!(evaluate(&gate, now).is_allowed());

    // Trial ending exactly now no longer writes
    let gate = GateInput {
        trial_ends_at: Some(now),
        ..input(SubscriptionStatus::Trialing)
    };
    assert_eq!(
        evaluate(&gate, now),
        GateDecision::Denied(DenialReason::TrialExpired)
    );
}

#[test]
fn tenant_without_trial_record_is_inactive_not_expired() {
    // Distinguishes "never had a trial" from "trial ran out" so the UI
    // shows the right call to action
    let decision = evaluate(&input(SubscriptionStatus::None), Utc::now());
    assert_eq!(
        decision,
        GateDecision::Denied(DenialReason::SubscriptionInactive)
    );
}

#[test]
fn payment_failures_deny_with_past_due_reason() {
    let now = Utc::now();
    for status in [SubscriptionStatus::PastDue, SubscriptionStatus::Unpaid] {
        // Even with an old trial timestamp on record, payment trouble is
        // the more actionable message
        let gate = GateInput {
            trial_ends_at: Some(now - Duration::days(30)),
            ..input(status)
        };
        assert_eq!(
            evaluate(&gate, now),
            GateDecision::Denied(DenialReason::PaymentPastDue)
        );
    }
}

#[test]
fn external_billing_grace_window() {
    let now = Utc::now();

    let gate = GateInput {
        billing_mode: BillingMode::External,
        free_until: Some(now + Duration::days(10)),
        ..input(SubscriptionStatus::Canceled)
    };
    assert!(evaluate(&gate, now).is_allowed());

    // Expired window falls through to the canceled denial
    let gate = GateInput {
        free_until: Some(now - Duration::seconds(1)),
        ..gate
    };
    assert_eq!(
        evaluate(&gate, now),
        GateDecision::Denied(DenialReason::SubscriptionInactive)
    );
}

#[test]
fn grace_window_ignored_under_provider_billing() {
    let now = Utc::now();
    let gate = GateInput {
        billing_mode: BillingMode::Provider,
        free_until: Some(now + Duration::days(365)),
        ..input(SubscriptionStatus::Canceled)
    };
    assert!(!evaluate(&gate, now).is_allowed());
}
