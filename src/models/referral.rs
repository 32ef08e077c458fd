// Referral tracking
// Each tenant carries one referral row with its code and (optionally) the
// tenant that referred it. credited_months counts reward months granted
// to the referrer, for bookkeeping only.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::referrals;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = referrals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Referral {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub referral_code: String,
    pub referred_by_owner_id: Option<Uuid>,
    pub credited_months: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug)]
pub enum ReferralError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Referral not found")]
    NotFound,
}

impl Referral {
    pub async fn find_by_owner_id(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
    ) -> Result<Option<Self>, ReferralError> {
        use crate::schema::referrals::dsl::*;

        referrals
            .filter(owner_id.eq(owner))
            .first::<Referral>(conn)
            .await
            .optional()
            .map_err(ReferralError::Database)
    }

    /// Bump the referrer's credited month counter
    pub async fn increment_credited_months(
        conn: &mut AsyncPgConnection,
        referral_id: Uuid,
    ) -> Result<Self, ReferralError> {
        use crate::schema::referrals::dsl::*;

        diesel::update(referrals.filter(id.eq(referral_id)))
            .set((
                credited_months.eq(credited_months + 1),
                updated_at.eq(Utc::now()),
            ))
            .get_result::<Referral>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => ReferralError::NotFound,
                _ => ReferralError::Database(e),
            })
    }
}
