// Lifecycle event log
// Audit trail for subscription and referral activity. Rows tagged with a
// reference_id double as idempotency markers: a partial unique index on
// (owner_id, event_type, reference_id) rejects duplicate processing.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::lifecycle_events;

/// Event type tags stored in lifecycle_events.event_type
pub mod event_types {
    pub const SUBSCRIPTION_STARTED: &str = "subscription_started";
    pub const SUBSCRIPTION_RENEWED: &str = "subscription_renewed";
    pub const PAYMENT_FAILED: &str = "payment_failed";
    pub const SUBSCRIPTION_CANCELED: &str = "subscription_canceled";
    pub const REFERRAL_CREDITED: &str = "referral_credited";
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = lifecycle_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LifecycleEvent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub event_type: String,
    pub message: String,
    pub reference_id: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = lifecycle_events)]
pub struct NewLifecycleEvent {
    pub owner_id: Uuid,
    pub event_type: String,
    pub message: String,
    pub reference_id: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(thiserror::Error, Debug)]
pub enum LifecycleEventError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl LifecycleEvent {
    pub async fn create(
        conn: &mut AsyncPgConnection,
        event: NewLifecycleEvent,
    ) -> Result<Self, LifecycleEventError> {
        use crate::schema::lifecycle_events::dsl::*;

        diesel::insert_into(lifecycle_events)
            .values(&event)
            .get_result::<LifecycleEvent>(conn)
            .await
            .map_err(LifecycleEventError::Database)
    }

    /// Check whether an event with this idempotency key was already recorded
    pub async fn exists_for_reference(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        kind: &str,
        reference: Uuid,
    ) -> Result<bool, LifecycleEventError> {
        use crate::schema::lifecycle_events::dsl::*;

        let count: i64 = lifecycle_events
            .filter(owner_id.eq(owner))
            .filter(event_type.eq(kind))
            .filter(reference_id.eq(reference))
            .count()
            .get_result(conn)
            .await
            .map_err(LifecycleEventError::Database)?;

        Ok(count > 0)
    }

    /// Recent events for a tenant, newest first
    pub async fn list_for_owner(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, LifecycleEventError> {
        use crate::schema::lifecycle_events::dsl::*;

        lifecycle_events
            .filter(owner_id.eq(owner))
            .order(created_at.desc())
            .limit(limit)
            .load::<LifecycleEvent>(conn)
            .await
            .map_err(LifecycleEventError::Database)
    }
}
