// Write-access gate
// Decides whether a tenant may perform mutating operations based on its
// subscription and trial state. The decision is a pure function over
// already-persisted state; it performs no writes.

use chrono::{DateTime, Utc};
use diesel_async::AsyncPgConnection;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::member::MemberError;
use crate::models::tenant::{BillingMode, GymProfile, SubscriptionStatus, Tenant, TenantError};
use crate::models::Member;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Tenant lookup failed: {0}")]
    Tenant(#[from] TenantError),

    #[error("Member count failed: {0}")]
    Member(#[from] MemberError),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

/// Why a write was denied; drives user-facing messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    TrialExpired,
    SubscriptionInactive,
    PaymentPastDue,
}

impl DenialReason {
    pub fn message(&self) -> &'static str {
        match self {
            DenialReason::TrialExpired => {
                "Your free trial has ended. Subscribe to keep making changes."
            }
            DenialReason::SubscriptionInactive => {
                "Your subscription is inactive. Subscribe to keep making changes."
            }
            DenialReason::PaymentPastDue => {
                "Your last payment failed. Update your payment method to keep making changes."
            }
        }
    }
}

/// Gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    Denied(DenialReason),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }
}

/// Inputs the gate decides on, separated from the database rows so the
/// decision logic can be tested in isolation
#[derive(Debug, Clone, Copy)]
pub struct GateInput {
    pub subscription_status: SubscriptionStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub billing_mode: BillingMode,
    pub free_until: Option<DateTime<Utc>>,
}

/// Evaluate the gate rules in order; first match wins
pub fn evaluate(input: &GateInput, now: DateTime<Utc>) -> GateDecision {
    // 1. Paying tenants always write
    if input.subscription_status == SubscriptionStatus::Active {
        return GateDecision::Allowed;
    }

    // 2. Live trial
    if matches!(
        input.subscription_status,
        SubscriptionStatus::Trialing | SubscriptionStatus::None
    ) {
        if let Some(trial_ends_at) = input.trial_ends_at {
            if trial_ends_at > now {
                return GateDecision::Allowed;
            }
        }
    }

    // 3. External-billing grace credit
    if input.billing_mode == BillingMode::External {
        if let Some(free_until) = input.free_until {
            if free_until > now {
                return GateDecision::Allowed;
            }
        }
    }

    // 4. Denied; pick the most specific reason
    let reason = match input.subscription_status {
        SubscriptionStatus::PastDue | SubscriptionStatus::Unpaid => DenialReason::PaymentPastDue,
        SubscriptionStatus::Trialing | SubscriptionStatus::None
            if input.trial_ends_at.is_some() =>
        {
            DenialReason::TrialExpired
        }
        _ => DenialReason::SubscriptionInactive,
    };

    GateDecision::Denied(reason)
}

/// Load the gate inputs for an already-fetched tenant row and evaluate
///
/// Must be called before every mutating member/staff/prospect/settings
/// operation.
#[instrument(skip(conn, tenant), fields(tenant_id = %tenant.id))]
pub async fn evaluate_for(
    conn: &mut AsyncPgConnection,
    tenant: &Tenant,
) -> Result<GateDecision, GateError> {
    let profile = GymProfile::find_by_tenant_id(conn, tenant.id).await?;

    let input = GateInput {
        subscription_status: tenant.subscription_status_enum(),
        trial_ends_at: tenant.trial_ends_at,
        billing_mode: profile
            .as_ref()
            .map(|p| p.billing_mode_enum())
            .unwrap_or(BillingMode::Provider),
        free_until: profile.and_then(|p| p.free_until),
    };

    Ok(evaluate(&input, Utc::now()))
}

// =============================================================================
// BILLING STATUS READ MODEL
// =============================================================================

/// Billing status summary consumed by the UI
#[derive(Debug, Serialize, ToSchema)]
pub struct BillingStatus {
    pub status: String,
    pub can_write: bool,
    pub can_read: bool,
    pub message: Option<String>,
    pub days_remaining: Option<i64>,
    pub plan_type: String,
    pub member_limit: u32,
    pub member_count: i64,
}

/// Build the billing status read model for a tenant
#[instrument(skip(conn))]
pub async fn billing_status(
    conn: &mut AsyncPgConnection,
    tenant_id: Uuid,
) -> Result<BillingStatus, GateError> {
    let tenant = Tenant::find_by_id(conn, tenant_id).await?;
    let profile = GymProfile::find_by_tenant_id(conn, tenant_id).await?;
    let member_count = Member::count_for_tenant(conn, tenant_id).await?;

    let now = Utc::now();
    let input = GateInput {
        subscription_status: tenant.subscription_status_enum(),
        trial_ends_at: tenant.trial_ends_at,
        billing_mode: profile
            .as_ref()
            .map(|p| p.billing_mode_enum())
            .unwrap_or(BillingMode::Provider),
        free_until: profile.and_then(|p| p.free_until),
    };
    let decision = evaluate(&input, now);

    let days_remaining = match input.subscription_status {
        SubscriptionStatus::Active => tenant.renewal_at,
        _ => tenant.trial_ends_at,
    }
    .map(|deadline| (deadline - now).num_days().max(0));

    let plan = tenant.plan_type_enum();

    Ok(BillingStatus {
        status: tenant.subscription_status.clone(),
        can_write: decision.is_allowed(),
        can_read: true,
        message: match decision {
            GateDecision::Allowed => None,
            GateDecision::Denied(reason) => Some(reason.message().to_string()),
        },
        days_remaining,
        plan_type: tenant.plan_type.clone(),
        member_limit: plan.member_limit(),
        member_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_input() -> GateInput {
        GateInput {
            subscription_status: SubscriptionStatus::None,
            trial_ends_at: None,
            billing_mode: BillingMode::Provider,
            free_until: None,
        }
    }

    #[test]
    fn test_active_subscription_allows() {
        let input = GateInput {
            subscription_status: SubscriptionStatus::Active,
            ..base_input()
        };
        assert_eq!(evaluate(&input, Utc::now()), GateDecision::Allowed);
    }

    #[test]
    fn test_live_trial_allows() {
        let now = Utc::now();
        let input = GateInput {
            subscription_status: SubscriptionStatus::Trialing,
            trial_ends_at: Some(now + Duration::days(7)),
            ..base_input()
        };
        assert_eq!(evaluate(&input, now), GateDecision::Allowed);

        // Tenants that never subscribed also ride on trial_ends_at
        let input = GateInput {
            subscription_status: SubscriptionStatus::None,
            trial_ends_at: Some(now + Duration::days(7)),
            ..base_input()
        };
        assert_eq!(evaluate(&input, now), GateDecision::Allowed);
    }

    #[test]
    fn test_expired_trial_denies_with_trial_reason() {
        let now = Utc::now();
        let input = GateInput {
            subscription_status: SubscriptionStatus::Trialing,
            trial_ends_at: Some(now - Duration::days(1)),
            ..base_input()
        };
        assert_eq!(
            evaluate(&input, now),
            GateDecision::Denied(DenialReason::TrialExpired)
        );
    }

    #[test]
    fn test_external_grace_credit_allows() {
        let now = Utc::now();
        let input = GateInput {
            subscription_status: SubscriptionStatus::Canceled,
            billing_mode: BillingMode::External,
            free_until: Some(now + Duration::days(30)),
            ..base_input()
        };
        assert_eq!(evaluate(&input, now), GateDecision::Allowed);

        // Same free_until under provider billing does not count
        let input = GateInput {
            billing_mode: BillingMode::Provider,
            ..input
        };
        assert!(!evaluate(&input, now).is_allowed());
    }

    #[test]
    fn test_past_due_denies_with_payment_reason() {
        let now = Utc::now();
        for status in [SubscriptionStatus::PastDue, SubscriptionStatus::Unpaid] {
            let input = GateInput {
                subscription_status: status,
                ..base_input()
            };
            assert_eq!(
                evaluate(&input, now),
                GateDecision::Denied(DenialReason::PaymentPastDue)
            );
        }
    }

    #[test]
    fn test_canceled_denies_with_inactive_reason() {
        let input = GateInput {
            subscription_status: SubscriptionStatus::Canceled,
            ..base_input()
        };
        assert_eq!(
            evaluate(&input, Utc::now()),
            GateDecision::Denied(DenialReason::SubscriptionInactive)
        );
    }
}
