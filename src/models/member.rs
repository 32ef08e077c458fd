// Member database model
// Members belong to exactly one tenant; every query here is tenant-scoped
// so a member id from another tenant behaves as if it does not exist.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::members;

/// Member lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MemberStatus {
    Active,
    Inactive, // Soft-disabled
    Overdue,
    Paused,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
            MemberStatus::Overdue => "overdue",
            MemberStatus::Paused => "paused",
        }
    }
}

impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MemberStatus::Active),
            "inactive" => Ok(MemberStatus::Inactive),
            "overdue" => Ok(MemberStatus::Overdue),
            "paused" => Ok(MemberStatus::Paused),
            _ => Err(format!("Invalid member status: {}", s)),
        }
    }
}

/// Member database model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Member {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub monthly_fee_cents: Option<i32>,
    pub billing_day_of_month: Option<i32>,
    pub payment_method: Option<String>,
    pub billing_enabled: bool,
    pub last_paid_at: Option<DateTime<Utc>>,
    pub last_reminder_sent_at: Option<DateTime<Utc>>,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_streak_check_date: Option<NaiveDate>,
    pub last_check_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New member for insertion
#[derive(Debug, Insertable)]
#[diesel(table_name = members)]
pub struct NewMember {
    pub tenant_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub monthly_fee_cents: Option<i32>,
    pub billing_day_of_month: Option<i32>,
    pub payment_method: Option<String>,
    pub billing_enabled: bool,
}

/// Partial member update; `None` fields are left untouched
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = members)]
pub struct MemberUpdate {
    pub full_name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub status: Option<String>,
    pub monthly_fee_cents: Option<Option<i32>>,
    pub billing_day_of_month: Option<Option<i32>>,
    pub payment_method: Option<Option<String>>,
    pub billing_enabled: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Errors for member operations
#[derive(thiserror::Error, Debug)]
pub enum MemberError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Member not found")]
    NotFound,
}

impl Member {
    /// Find a member scoped to its tenant
    /// A member owned by another tenant is reported as not found
    pub async fn find_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
        member_id: Uuid,
    ) -> Result<Self, MemberError> {
        use crate::schema::members::dsl::*;

        members
            .filter(id.eq(member_id))
            .filter(tenant_id.eq(tenant))
            .first::<Member>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => MemberError::NotFound,
                _ => MemberError::Database(e),
            })
    }

    /// Create a new member
    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_member: NewMember,
    ) -> Result<Self, MemberError> {
        use crate::schema::members::dsl::*;

        diesel::insert_into(members)
            .values(&new_member)
            .get_result::<Member>(conn)
            .await
            .map_err(MemberError::Database)
    }

    /// Apply a partial update, scoped to the tenant
    pub async fn update_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
        member_id: Uuid,
        update: MemberUpdate,
    ) -> Result<Self, MemberError> {
        use crate::schema::members::dsl::*;

        diesel::update(
            members
                .filter(id.eq(member_id))
                .filter(tenant_id.eq(tenant)),
        )
        .set(&update)
        .get_result::<Member>(conn)
        .await
        .map_err(|e| match e {
            diesel::result::Error::NotFound => MemberError::NotFound,
            _ => MemberError::Database(e),
        })
    }

    /// List members for a tenant, newest first
    pub async fn list_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
    ) -> Result<Vec<Self>, MemberError> {
        use crate::schema::members::dsl::*;

        members
            .filter(tenant_id.eq(tenant))
            .order(created_at.desc())
            .load::<Member>(conn)
            .await
            .map_err(MemberError::Database)
    }

    /// Count members for a tenant (excluding soft-disabled)
    pub async fn count_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
    ) -> Result<i64, MemberError> {
        use crate::schema::members::dsl::*;

        members
            .filter(tenant_id.eq(tenant))
            .filter(status.ne(MemberStatus::Inactive.as_str()))
            .count()
            .get_result::<i64>(conn)
            .await
            .map_err(MemberError::Database)
    }

    /// Get status as enum, warning on unknown values
    pub fn status_enum(&self) -> MemberStatus {
        MemberStatus::from_str(&self.status).unwrap_or_else(|e| {
            tracing::warn!(
                "Invalid status '{}' for member {}, treating as inactive: {}",
                self.status,
                self.id,
                e
            );
            MemberStatus::Inactive
        })
    }
}

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

/// Request body for creating a member
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub full_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    #[validate(range(min = 0, message = "Monthly fee must be non-negative"))]
    pub monthly_fee_cents: Option<i32>,

    /// Day of month the fee is due; clamped to 1-28 to avoid
    /// month-length ambiguity
    #[validate(range(min = 1, max = 28, message = "Billing day must be between 1 and 28"))]
    pub billing_day_of_month: Option<i32>,

    #[validate(length(max = 50))]
    pub payment_method: Option<String>,

    #[serde(default)]
    pub billing_enabled: bool,
}

/// Request body for updating a member
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMemberRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub full_name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    /// One of active, inactive, overdue, paused
    pub status: Option<String>,

    #[validate(range(min = 0, message = "Monthly fee must be non-negative"))]
    pub monthly_fee_cents: Option<i32>,

    #[validate(range(min = 1, max = 28, message = "Billing day must be between 1 and 28"))]
    pub billing_day_of_month: Option<i32>,

    #[validate(length(max = 50))]
    pub payment_method: Option<String>,

    pub billing_enabled: Option<bool>,
}

/// Member representation returned by the API
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub monthly_fee_cents: Option<i32>,
    pub billing_day_of_month: Option<i32>,
    pub payment_method: Option<String>,
    pub billing_enabled: bool,
    pub last_paid_at: Option<DateTime<Utc>>,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_check_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MemberResponse {
    fn from(m: Member) -> Self {
        Self {
            id: m.id,
            full_name: m.full_name,
            email: m.email,
            phone: m.phone,
            status: m.status,
            monthly_fee_cents: m.monthly_fee_cents,
            billing_day_of_month: m.billing_day_of_month,
            payment_method: m.payment_method,
            billing_enabled: m.billing_enabled,
            last_paid_at: m.last_paid_at,
            current_streak: m.current_streak,
            longest_streak: m.longest_streak,
            last_check_in_at: m.last_check_in_at,
            created_at: m.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_status_conversion() {
        assert_eq!(MemberStatus::Active.as_str(), "active");
        assert_eq!(MemberStatus::Overdue.as_str(), "overdue");

        assert_eq!(MemberStatus::from_str("paused"), Ok(MemberStatus::Paused));
        assert_eq!(
            MemberStatus::from_str("inactive"),
            Ok(MemberStatus::Inactive)
        );
        assert!(MemberStatus::from_str("expelled").is_err());
    }

    #[test]
    fn test_create_member_request_validation() {
        let valid = CreateMemberRequest {
            full_name: "Dana Ruiz".to_string(),
            email: Some("dana@example.com".to_string()),
            phone: None,
            monthly_fee_cents: Some(4500),
            billing_day_of_month: Some(15),
            payment_method: Some("card".to_string()),
            billing_enabled: true,
        };
        assert!(valid.validate().is_ok());

        let bad_day = CreateMemberRequest {
            full_name: "Dana Ruiz".to_string(),
            email: None,
            phone: None,
            monthly_fee_cents: Some(4500),
            billing_day_of_month: Some(31),
            payment_method: None,
            billing_enabled: true,
        };
        assert!(bad_day.validate().is_err());

        let negative_fee = CreateMemberRequest {
            full_name: "Dana Ruiz".to_string(),
            email: None,
            phone: None,
            monthly_fee_cents: Some(-100),
            billing_day_of_month: Some(1),
            payment_method: None,
            billing_enabled: true,
        };
        assert!(negative_fee.validate().is_err());
    }
}
