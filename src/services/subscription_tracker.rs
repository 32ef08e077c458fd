// Subscription state tracker
// Applies verified provider events to tenant subscription state. Updates
// are keyed by provider subscription id, so replayed deliveries converge
// to the same stored state.

use chrono::{DateTime, Utc};
use diesel_async::AsyncPgConnection;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::lifecycle_event::{event_types, LifecycleEventError, NewLifecycleEvent};
use crate::models::tenant::{SubscriptionStatus, Tenant, TenantError, TenantUpdate};
use crate::models::LifecycleEvent;
use crate::services::provider::{
    CheckoutSessionData, ProviderEvent, ProviderEventData, ProviderEventType,
};

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Tenant lookup failed: {0}")]
    Tenant(#[from] TenantError),

    #[error("Event log write failed: {0}")]
    EventLog(#[from] LifecycleEventError),
}

/// Result of applying one provider event
#[derive(Debug, Clone)]
pub struct TrackerOutcome {
    pub tenant_id: Uuid,
    pub new_status: SubscriptionStatus,
    /// True when this event moved the tenant from a non-paying state into
    /// a paying one. The caller uses this to trigger referral crediting.
    pub became_paying: bool,
}

/// Apply a parsed provider event to the owning tenant
///
/// Returns `Ok(None)` for events that carry nothing actionable (unknown
/// types, or identifiers that match no tenant) so webhook delivery still
/// succeeds and the provider does not retry indefinitely.
#[instrument(skip(conn, event), fields(event_id = %event.id))]
pub async fn apply_event(
    conn: &mut AsyncPgConnection,
    event: &ProviderEvent,
) -> Result<Option<TrackerOutcome>, TrackerError> {
    match (&event.event_type, &event.data) {
        (ProviderEventType::CheckoutSessionCompleted, ProviderEventData::CheckoutSession(data)) => {
            let Some(tenant_id) = data.tenant_id else {
                warn!("Checkout event without a tenant reference, skipping");
                return Ok(None);
            };

            let tenant = match Tenant::find_by_id(conn, tenant_id).await {
                Ok(t) => t,
                Err(TenantError::NotFound) => {
                    warn!(%tenant_id, "Checkout references an unknown tenant, skipping");
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };
            let was_paying = tenant.subscription_status_enum().is_paying();

            let (update, new_status) = checkout_update(data, Utc::now());
            let tenant = Tenant::update(conn, tenant_id, update).await?;

            LifecycleEvent::create(
                conn,
                NewLifecycleEvent {
                    owner_id: tenant.id,
                    event_type: event_types::SUBSCRIPTION_STARTED.to_string(),
                    message: format!("Subscription started on the {} plan", tenant.plan_type),
                    reference_id: None,
                    resolved_at: Some(Utc::now()),
                },
            )
            .await?;

            info!(tenant_id = %tenant.id, "Checkout completed, subscription bound");
            Ok(Some(TrackerOutcome {
                tenant_id: tenant.id,
                new_status,
                became_paying: !was_paying && new_status.is_paying(),
            }))
        }

        (ProviderEventType::InvoicePaid, ProviderEventData::Invoice(data)) => {
            let Some(tenant) = find_by_subscription(conn, data.subscription_id.as_deref()).await?
            else {
                return Ok(None);
            };
            let was_paying = tenant.subscription_status_enum().is_paying();

            // Partial update: a missing period end from the provider must
            // not clobber the stored renewal date.
            let update = TenantUpdate {
                subscription_status: Some(SubscriptionStatus::Active.as_str().to_string()),
                renewal_at: data.period_end.map(Some),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };
            let tenant = Tenant::update(conn, tenant.id, update).await?;

            LifecycleEvent::create(
                conn,
                NewLifecycleEvent {
                    owner_id: tenant.id,
                    event_type: event_types::SUBSCRIPTION_RENEWED.to_string(),
                    message: "Invoice paid, subscription renewed".to_string(),
                    reference_id: None,
                    resolved_at: Some(Utc::now()),
                },
            )
            .await?;

            Ok(Some(TrackerOutcome {
                tenant_id: tenant.id,
                new_status: SubscriptionStatus::Active,
                became_paying: !was_paying,
            }))
        }

        (ProviderEventType::InvoicePaymentFailed, ProviderEventData::Invoice(data)) => {
            let Some(tenant) = find_by_subscription(conn, data.subscription_id.as_deref()).await?
            else {
                return Ok(None);
            };

            let update = TenantUpdate {
                subscription_status: Some(SubscriptionStatus::PastDue.as_str().to_string()),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };
            let tenant = Tenant::update(conn, tenant.id, update).await?;

            LifecycleEvent::create(
                conn,
                NewLifecycleEvent {
                    owner_id: tenant.id,
                    event_type: event_types::PAYMENT_FAILED.to_string(),
                    message: "A subscription payment failed. Please update your payment method."
                        .to_string(),
                    reference_id: None,
                    resolved_at: None,
                },
            )
            .await?;

            warn!(tenant_id = %tenant.id, "Invoice payment failed, tenant marked past_due");
            Ok(Some(TrackerOutcome {
                tenant_id: tenant.id,
                new_status: SubscriptionStatus::PastDue,
                became_paying: false,
            }))
        }

        (ProviderEventType::SubscriptionUpdated, ProviderEventData::Subscription(data)) => {
            let Some(tenant) = find_by_subscription(conn, Some(&data.subscription_id)).await?
            else {
                return Ok(None);
            };
            let was_paying = tenant.subscription_status_enum().is_paying();

            // Mirror the provider-reported status verbatim; unknown strings
            // are stored as-is and treated as non-paying downstream.
            let new_status = data
                .status
                .parse::<SubscriptionStatus>()
                .unwrap_or(SubscriptionStatus::None);

            let update = TenantUpdate {
                subscription_status: Some(data.status.clone()),
                renewal_at: data.current_period_end.map(Some),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };
            let tenant = Tenant::update(conn, tenant.id, update).await?;

            Ok(Some(TrackerOutcome {
                tenant_id: tenant.id,
                new_status,
                became_paying: !was_paying && new_status.is_paying(),
            }))
        }

        (ProviderEventType::SubscriptionDeleted, ProviderEventData::Subscription(data)) => {
            let Some(tenant) = find_by_subscription(conn, Some(&data.subscription_id)).await?
            else {
                return Ok(None);
            };

            let update = TenantUpdate {
                subscription_status: Some(SubscriptionStatus::Canceled.as_str().to_string()),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };
            let tenant = Tenant::update(conn, tenant.id, update).await?;

            LifecycleEvent::create(
                conn,
                NewLifecycleEvent {
                    owner_id: tenant.id,
                    event_type: event_types::SUBSCRIPTION_CANCELED.to_string(),
                    message: "Subscription canceled".to_string(),
                    reference_id: None,
                    resolved_at: None,
                },
            )
            .await?;

            info!(tenant_id = %tenant.id, "Subscription deleted, tenant marked canceled");
            Ok(Some(TrackerOutcome {
                tenant_id: tenant.id,
                new_status: SubscriptionStatus::Canceled,
                became_paying: false,
            }))
        }

        _ => Ok(None),
    }
}

/// Build the tenant changeset for a completed checkout
///
/// The provider reports the opened subscription's status on the session;
/// a checkout that starts a trial must not mark the tenant active. When
/// the status is absent the checkout is treated as opening an active
/// subscription. A missing period end leaves the stored renewal date
/// untouched, same as the invoice path.
fn checkout_update(
    data: &CheckoutSessionData,
    now: DateTime<Utc>,
) -> (TenantUpdate, SubscriptionStatus) {
    let status_str = data
        .subscription_status
        .clone()
        .unwrap_or_else(|| SubscriptionStatus::Active.as_str().to_string());
    let new_status = status_str
        .parse::<SubscriptionStatus>()
        .unwrap_or(SubscriptionStatus::None);

    let update = TenantUpdate {
        subscription_status: Some(status_str),
        provider_customer_id: data.customer_id.clone().map(Some),
        provider_subscription_id: data.subscription_id.clone().map(Some),
        plan_type: data.plan.clone(),
        renewal_at: data.period_end.map(Some),
        updated_at: Some(now),
        ..Default::default()
    };

    (update, new_status)
}

async fn find_by_subscription(
    conn: &mut AsyncPgConnection,
    subscription_id: Option<&str>,
) -> Result<Option<Tenant>, TrackerError> {
    let Some(subscription_id) = subscription_id else {
        warn!("Provider event without a subscription id, skipping");
        return Ok(None);
    };

    match Tenant::find_by_provider_subscription_id(conn, subscription_id).await {
        Ok(tenant) => Ok(Some(tenant)),
        Err(TenantError::NotFound) => {
            warn!(%subscription_id, "No tenant bound to subscription, skipping");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(
        status: Option<&str>,
        period_end: Option<DateTime<Utc>>,
    ) -> CheckoutSessionData {
        CheckoutSessionData {
            tenant_id: Some(Uuid::new_v4()),
            customer_id: Some("cus_123".to_string()),
            subscription_id: Some("sub_456".to_string()),
            plan: Some("pro".to_string()),
            subscription_status: status.map(str::to_string),
            period_end,
        }
    }

    #[test]
    fn test_checkout_without_status_defaults_to_active() {
        let now = Utc::now();
        let (update, new_status) = checkout_update(&session(None, None), now);

        assert_eq!(new_status, SubscriptionStatus::Active);
        assert_eq!(update.subscription_status.as_deref(), Some("active"));
        assert_eq!(update.plan_type.as_deref(), Some("pro"));
        assert_eq!(
            update.provider_subscription_id,
            Some(Some("sub_456".to_string()))
        );
    }

    #[test]
    fn test_checkout_preserves_trialing_status() {
        let now = Utc::now();
        let (update, new_status) = checkout_update(&session(Some("trialing"), None), now);

        assert_eq!(new_status, SubscriptionStatus::Trialing);
        assert_eq!(update.subscription_status.as_deref(), Some("trialing"));
        assert!(!new_status.is_paying());
    }

    #[test]
    fn test_checkout_records_period_end_as_renewal() {
        let now = Utc::now();
        let period_end = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let (update, _) = checkout_update(&session(Some("active"), Some(period_end)), now);

        assert_eq!(update.renewal_at, Some(Some(period_end)));
    }

    #[test]
    fn test_checkout_without_period_end_leaves_renewal_untouched() {
        let now = Utc::now();
        let (update, _) = checkout_update(&session(Some("active"), None), now);

        // None means the changeset skips the column entirely
        assert_eq!(update.renewal_at, None);
    }

    #[test]
    fn test_checkout_with_unknown_status_is_not_paying() {
        let now = Utc::now();
        let (update, new_status) = checkout_update(&session(Some("incomplete"), None), now);

        // Stored verbatim, treated as non-paying downstream
        assert_eq!(update.subscription_status.as_deref(), Some("incomplete"));
        assert!(!new_status.is_paying());
    }
}
