// Payment ledger records
// Rows are append-only; corrections are made with compensating entries,
// never by updating or deleting existing rows.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::payment_records;

/// Ledger entry for a single member payment
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payment_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub member_id: Uuid,
    pub amount_cents: i32,
    pub method: String,
    pub note: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payment_records)]
pub struct NewPaymentRecord {
    pub tenant_id: Uuid,
    pub member_id: Uuid,
    pub amount_cents: i32,
    pub method: String,
    pub note: Option<String>,
    pub paid_at: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug)]
pub enum PaymentRecordError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl PaymentRecord {
    pub async fn create(
        conn: &mut AsyncPgConnection,
        record: NewPaymentRecord,
    ) -> Result<Self, PaymentRecordError> {
        use crate::schema::payment_records::dsl::*;

        diesel::insert_into(payment_records)
            .values(&record)
            .get_result::<PaymentRecord>(conn)
            .await
            .map_err(PaymentRecordError::Database)
    }

    /// Payment history for one member, newest first
    pub async fn list_for_member(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
        member: Uuid,
    ) -> Result<Vec<Self>, PaymentRecordError> {
        use crate::schema::payment_records::dsl::*;

        payment_records
            .filter(tenant_id.eq(tenant))
            .filter(member_id.eq(member))
            .order(paid_at.desc())
            .load::<PaymentRecord>(conn)
            .await
            .map_err(PaymentRecordError::Database)
    }

    /// All payments for a tenant, newest first
    pub async fn list_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
    ) -> Result<Vec<Self>, PaymentRecordError> {
        use crate::schema::payment_records::dsl::*;

        payment_records
            .filter(tenant_id.eq(tenant))
            .order(paid_at.desc())
            .load::<PaymentRecord>(conn)
            .await
            .map_err(PaymentRecordError::Database)
    }
}

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

/// Request body for recording a payment
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    /// Amount in cents; zero and negative amounts are rejected
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount_cents: i32,

    #[validate(length(min = 1, max = 50, message = "Method must be 1-50 characters"))]
    pub method: String,

    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,

    /// Defaults to the current time when omitted
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentRecordResponse {
    pub id: Uuid,
    pub member_id: Uuid,
    pub amount_cents: i32,
    pub method: String,
    pub note: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRecord> for PaymentRecordResponse {
    fn from(r: PaymentRecord) -> Self {
        Self {
            id: r.id,
            member_id: r.member_id,
            amount_cents: r.amount_cents,
            method: r.method,
            note: r.note,
            paid_at: r.paid_at,
            created_at: r.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_payment_request_rejects_non_positive_amounts() {
        let zero = RecordPaymentRequest {
            amount_cents: 0,
            method: "cash".to_string(),
            note: None,
            paid_at: None,
        };
        assert!(zero.validate().is_err());

        let negative = RecordPaymentRequest {
            amount_cents: -500,
            method: "cash".to_string(),
            note: None,
            paid_at: None,
        };
        assert!(negative.validate().is_err());

        let valid = RecordPaymentRequest {
            amount_cents: 4500,
            method: "card".to_string(),
            note: Some("June dues".to_string()),
            paid_at: None,
        };
        assert!(valid.validate().is_ok());
    }
}
