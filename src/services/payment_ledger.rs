// Payment ledger
// Records a member payment and reactivates overdue members. The record
// insert and the member update happen in one transaction.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::member::{Member, MemberError, MemberStatus};
use crate::models::payment_record::{NewPaymentRecord, PaymentRecord};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Member not found")]
    MemberNotFound,
}

impl From<MemberError> for LedgerError {
    fn from(e: MemberError) -> Self {
        match e {
            MemberError::NotFound => LedgerError::MemberNotFound,
            MemberError::Database(e) => LedgerError::Database(e),
        }
    }
}

/// Result of recording a payment
#[derive(Debug)]
pub struct PaymentOutcome {
    pub record: PaymentRecord,
    /// True when the payment moved the member out of overdue
    pub reactivated: bool,
}

/// Record a payment against a member and update its billing state
///
/// Atomic unit: the ledger insert, last_paid_at stamp, and the
/// overdue-to-active transition commit together or not at all. A member
/// owned by another tenant is reported as not found.
#[instrument(skip(conn, note))]
pub async fn record_payment(
    conn: &mut AsyncPgConnection,
    tenant: Uuid,
    member: Uuid,
    amount_cents: i32,
    method: String,
    note: Option<String>,
    paid_at: Option<DateTime<Utc>>,
) -> Result<PaymentOutcome, LedgerError> {
    let paid_at = paid_at.unwrap_or_else(Utc::now);

    let outcome = conn
        .transaction::<_, LedgerError, _>(|conn| {
            async move {
                let existing = Member::find_for_tenant(conn, tenant, member).await?;
                let was_overdue = existing.status_enum() == MemberStatus::Overdue;

                let record = PaymentRecord::create(
                    conn,
                    NewPaymentRecord {
                        tenant_id: tenant,
                        member_id: member,
                        amount_cents,
                        method,
                        note,
                        paid_at,
                    },
                )
                .await
                .map_err(|e| match e {
                    crate::models::payment_record::PaymentRecordError::Database(e) => {
                        LedgerError::Database(e)
                    }
                })?;

                use crate::schema::members;
                let now = Utc::now();
                if was_overdue {
                    diesel::update(members::table.filter(members::id.eq(member)))
                        .set((
                            members::last_paid_at.eq(Some(paid_at)),
                            members::status.eq(MemberStatus::Active.as_str()),
                            members::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .await?;
                } else {
                    diesel::update(members::table.filter(members::id.eq(member)))
                        .set((
                            members::last_paid_at.eq(Some(paid_at)),
                            members::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .await?;
                }

                Ok(PaymentOutcome {
                    record,
                    reactivated: was_overdue,
                })
            }
            .scope_boxed()
        })
        .await?;

    info!(
        member_id = %member,
        amount_cents,
        reactivated = outcome.reactivated,
        "Payment recorded"
    );
    Ok(outcome)
}
