// Prospect (lead) database model

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::prospects;

/// Lead pipeline stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProspectStatus {
    New,
    Contacted,
    Toured,
    Converted,
    Lost,
}

impl ProspectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProspectStatus::New => "new",
            ProspectStatus::Contacted => "contacted",
            ProspectStatus::Toured => "toured",
            ProspectStatus::Converted => "converted",
            ProspectStatus::Lost => "lost",
        }
    }
}

impl FromStr for ProspectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ProspectStatus::New),
            "contacted" => Ok(ProspectStatus::Contacted),
            "toured" => Ok(ProspectStatus::Toured),
            "converted" => Ok(ProspectStatus::Converted),
            "lost" => Ok(ProspectStatus::Lost),
            _ => Err(format!("Invalid prospect status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = prospects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Prospect {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub converted_member_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = prospects)]
pub struct NewProspect {
    pub tenant_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = prospects)]
pub struct ProspectUpdate {
    pub full_name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub status: Option<String>,
    pub converted_member_id: Option<Option<Uuid>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(thiserror::Error, Debug)]
pub enum ProspectError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Prospect not found")]
    NotFound,
}

impl Prospect {
    pub async fn find_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
        prospect_id: Uuid,
    ) -> Result<Self, ProspectError> {
        use crate::schema::prospects::dsl::*;

        prospects
            .filter(id.eq(prospect_id))
            .filter(tenant_id.eq(tenant))
            .first::<Prospect>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => ProspectError::NotFound,
                _ => ProspectError::Database(e),
            })
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_prospect: NewProspect,
    ) -> Result<Self, ProspectError> {
        use crate::schema::prospects::dsl::*;

        diesel::insert_into(prospects)
            .values(&new_prospect)
            .get_result::<Prospect>(conn)
            .await
            .map_err(ProspectError::Database)
    }

    pub async fn update_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
        prospect_id: Uuid,
        update: ProspectUpdate,
    ) -> Result<Self, ProspectError> {
        use crate::schema::prospects::dsl::*;

        diesel::update(
            prospects
                .filter(id.eq(prospect_id))
                .filter(tenant_id.eq(tenant)),
        )
        .set(&update)
        .get_result::<Prospect>(conn)
        .await
        .map_err(|e| match e {
            diesel::result::Error::NotFound => ProspectError::NotFound,
            _ => ProspectError::Database(e),
        })
    }

    pub async fn list_for_tenant(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
    ) -> Result<Vec<Self>, ProspectError> {
        use crate::schema::prospects::dsl::*;

        prospects
            .filter(tenant_id.eq(tenant))
            .order(created_at.desc())
            .load::<Prospect>(conn)
            .await
            .map_err(ProspectError::Database)
    }
}

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProspectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub full_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProspectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub full_name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    /// One of new, contacted, toured, converted, lost
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProspectResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub converted_member_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Prospect> for ProspectResponse {
    fn from(p: Prospect) -> Self {
        Self {
            id: p.id,
            full_name: p.full_name,
            email: p.email,
            phone: p.phone,
            status: p.status,
            converted_member_id: p.converted_member_id,
            created_at: p.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prospect_status_conversion() {
        assert_eq!(ProspectStatus::New.as_str(), "new");
        assert_eq!(
            ProspectStatus::from_str("converted"),
            Ok(ProspectStatus::Converted)
        );
        assert!(ProspectStatus::from_str("ghosted").is_err());
    }
}
