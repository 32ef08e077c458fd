// Member check-in records

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::check_ins;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = check_ins)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CheckIn {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub member_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = check_ins)]
pub struct NewCheckIn {
    pub tenant_id: Uuid,
    pub member_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug)]
pub enum CheckInError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl CheckIn {
    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_check_in: NewCheckIn,
    ) -> Result<Self, CheckInError> {
        use crate::schema::check_ins::dsl::*;

        diesel::insert_into(check_ins)
            .values(&new_check_in)
            .get_result::<CheckIn>(conn)
            .await
            .map_err(CheckInError::Database)
    }

    /// Recent check-ins for one member, newest first
    pub async fn list_for_member(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
        member: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, CheckInError> {
        use crate::schema::check_ins::dsl::*;

        check_ins
            .filter(tenant_id.eq(tenant))
            .filter(member_id.eq(member))
            .order(checked_in_at.desc())
            .limit(limit)
            .load::<CheckIn>(conn)
            .await
            .map_err(CheckInError::Database)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckInResponse {
    pub id: Uuid,
    pub member_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub current_streak: i32,
    pub longest_streak: i32,
}
