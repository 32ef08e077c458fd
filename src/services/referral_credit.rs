// Referral credit engine
// Grants the referrer a one-month credit when a referred tenant first
// converts to a paying state. The resolved lifecycle event written at the
// end doubles as the idempotency marker, so a duplicate invocation for the
// same referred tenant is a no-op.

use chrono::{DateTime, Months, Utc};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection};
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::models::lifecycle_event::{event_types, LifecycleEventError, NewLifecycleEvent};
use crate::models::referral::ReferralError;
use crate::models::tenant::{BillingMode, GymProfile, Tenant, TenantError};
use crate::models::{LifecycleEvent, Referral};
use crate::services::provider::BillingProvider;

#[derive(Error, Debug)]
pub enum CreditError {
    #[error("Referral lookup failed: {0}")]
    Referral(#[from] ReferralError),

    #[error("Tenant lookup failed: {0}")]
    Tenant(#[from] TenantError),

    #[error("Event log failed: {0}")]
    EventLog(#[from] LifecycleEventError),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

/// What happened when a credit was attempted
#[derive(Debug, PartialEq, Eq)]
pub enum CreditOutcome {
    /// Credit applied; `provider_error` is set when the provider-side call
    /// failed but bookkeeping still advanced
    Credited { provider_error: bool },
    /// This referred tenant was already credited
    AlreadyCredited,
    /// The referred tenant has no referrer
    NoReferrer,
}

/// One month past the later of the current grace window and now. Never
/// shrinks an existing window, and compounds across multiple credits.
pub fn extend_free_until(
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let base = match current {
        Some(existing) if existing > now => existing,
        _ => now,
    };
    base.checked_add_months(Months::new(1)).unwrap_or(base)
}

/// Apply a one-time referral credit for a referred tenant's conversion
///
/// Callers invoke this at the referred tenant's transition into a paying
/// state; the idempotency check here is the last line of defense against
/// duplicate webhook delivery.
#[instrument(skip(conn, provider))]
pub async fn apply_credit(
    conn: &mut AsyncPgConnection,
    provider: &dyn BillingProvider,
    referred_tenant_id: Uuid,
) -> Result<CreditOutcome, CreditError> {
    // 1. Resolve the referrer
    let Some(referral) = Referral::find_by_owner_id(conn, referred_tenant_id).await? else {
        return Ok(CreditOutcome::NoReferrer);
    };
    let Some(referrer_id) = referral.referred_by_owner_id else {
        return Ok(CreditOutcome::NoReferrer);
    };

    // 2. Idempotency check keyed on the referred tenant id
    let already = LifecycleEvent::exists_for_reference(
        conn,
        referrer_id,
        event_types::REFERRAL_CREDITED,
        referred_tenant_id,
    )
    .await?;
    if already {
        info!(%referrer_id, %referred_tenant_id, "Referral already credited, skipping");
        return Ok(CreditOutcome::AlreadyCredited);
    }

    // 3. Provider-side credit happens before the local bookkeeping. A
    // provider failure is surfaced in the outcome but does not abort
    // bookkeeping; aborting would let webhook retries compound the credit.
    let referrer = Tenant::find_by_id(conn, referrer_id).await?;
    let profile = GymProfile::find_by_tenant_id(conn, referrer_id).await?;
    let credit_cents = referrer.plan_type_enum().monthly_price_cents();

    let billing_mode = profile
        .as_ref()
        .map(|p| p.billing_mode_enum())
        .unwrap_or(BillingMode::Provider);
    let provider_billed =
        billing_mode == BillingMode::Provider && referrer.provider_customer_id.is_some();

    let mut provider_error = false;
    if provider_billed {
        if let Some(customer_id) = referrer.provider_customer_id.as_deref() {
            if let Err(e) = provider
                .credit_customer_balance(
                    customer_id,
                    credit_cents,
                    "Referral credit: one free month",
                )
                .await
            {
                error!(%referrer_id, "Provider credit failed: {}", e);
                provider_error = true;
            }
        }
    }

    // 4. Bookkeeping. The grace extension, the counter bump, and the
    // idempotency marker commit together or not at all; a failure here
    // leaves no half-applied credit for a webhook redelivery to compound.
    // The partial unique index on (owner_id, event_type, reference_id)
    // backstops concurrent deliveries.
    conn.transaction::<_, CreditError, _>(|conn| {
        async move {
            if !provider_billed {
                let now = Utc::now();
                let current = profile.as_ref().and_then(|p| p.free_until);
                if profile.is_some() {
                    let new_until = extend_free_until(current, now);
                    GymProfile::set_free_until(conn, referrer_id, new_until).await?;
                } else {
                    warn!(%referrer_id, "Referrer has no gym profile, free_until not extended");
                }
            }

            match Referral::find_by_owner_id(conn, referrer_id).await? {
                Some(referrer_row) => {
                    Referral::increment_credited_months(conn, referrer_row.id).await?;
                }
                None => {
                    warn!(%referrer_id, "Referrer has no referral row, credited_months not incremented");
                }
            }

            // Audit record; also the idempotency marker for step 2
            LifecycleEvent::create(
                conn,
                NewLifecycleEvent {
                    owner_id: referrer_id,
                    event_type: event_types::REFERRAL_CREDITED.to_string(),
                    message: "A gym you referred subscribed. You earned one free month!"
                        .to_string(),
                    reference_id: Some(referred_tenant_id),
                    resolved_at: Some(Utc::now()),
                },
            )
            .await?;

            Ok(())
        }
        .scope_boxed()
    })
    .await?;

    info!(%referrer_id, %referred_tenant_id, provider_error, "Referral credit applied");
    Ok(CreditOutcome::Credited { provider_error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_extend_from_nothing_starts_at_now() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let extended = extend_free_until(None, now);
        assert_eq!(extended, Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_extend_never_shrinks_future_window() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let existing = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let extended = extend_free_until(Some(existing), now);
        assert_eq!(extended, Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_extend_ignores_expired_window() {
        let now = Utc.with_ymd_and_hms(2026, 6, 10, 8, 0, 0).unwrap();
        let expired = now - Duration::days(90);
        let extended = extend_free_until(Some(expired), now);
        assert_eq!(extended, Utc.with_ymd_and_hms(2026, 7, 10, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_extend_handles_month_end_clamping() {
        // Jan 31 + 1 month clamps to Feb 28
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap();
        let extended = extend_free_until(None, now);
        assert_eq!(extended, Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap());
    }
}
