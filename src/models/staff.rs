// Staff database model

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::staff;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = staff)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Staff {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = staff)]
pub struct NewStaff {
    pub tenant_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = staff)]
pub struct StaffUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(thiserror::Error, Debug)]
pub enum StaffError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Staff member not found")]
    NotFound,
}

impl Staff {
    pub async fn find_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
        staff_id: Uuid,
    ) -> Result<Self, StaffError> {
        use crate::schema::staff::dsl::*;

        staff
            .filter(id.eq(staff_id))
            .filter(tenant_id.eq(tenant))
            .first::<Staff>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => StaffError::NotFound,
                _ => StaffError::Database(e),
            })
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_staff: NewStaff,
    ) -> Result<Self, StaffError> {
        use crate::schema::staff::dsl::*;

        diesel::insert_into(staff)
            .values(&new_staff)
            .get_result::<Staff>(conn)
            .await
            .map_err(StaffError::Database)
    }

    pub async fn update_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
        staff_id: Uuid,
        update: StaffUpdate,
    ) -> Result<Self, StaffError> {
        use crate::schema::staff::dsl::*;

        diesel::update(staff.filter(id.eq(staff_id)).filter(tenant_id.eq(tenant)))
            .set(&update)
            .get_result::<Staff>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => StaffError::NotFound,
                _ => StaffError::Database(e),
            })
    }

    pub async fn delete_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
        staff_id: Uuid,
    ) -> Result<(), StaffError> {
        use crate::schema::staff::dsl::*;

        let deleted =
            diesel::delete(staff.filter(id.eq(staff_id)).filter(tenant_id.eq(tenant)))
                .execute(conn)
                .await
                .map_err(StaffError::Database)?;

        if deleted == 0 {
            return Err(StaffError::NotFound);
        }
        Ok(())
    }

    pub async fn list_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
    ) -> Result<Vec<Self>, StaffError> {
        use crate::schema::staff::dsl::*;

        staff
            .filter(tenant_id.eq(tenant))
            .order(created_at.asc())
            .load::<Staff>(conn)
            .await
            .map_err(StaffError::Database)
    }
}

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStaffRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub full_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, max = 50, message = "Role must be 1-50 characters"))]
    pub role: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStaffRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub full_name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Role must be 1-50 characters"))]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StaffResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<Staff> for StaffResponse {
    fn from(s: Staff) -> Self {
        Self {
            id: s.id,
            full_name: s.full_name,
            email: s.email,
            role: s.role,
            created_at: s.created_at,
        }
    }
}
