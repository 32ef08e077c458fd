// Tenant database model
// A tenant is a gym operator account: the top-level billing and
// data-isolation unit. Subscription state is mutated only by the
// subscription tracker and trial-start events.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::schema::{gym_profiles, tenants};

/// Subscription status as reported by the payment provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubscriptionStatus {
    None,     // Never subscribed (trial-only tenants)
    Trialing,
    Active,
    PastDue,
    Unpaid,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::None => "none",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    /// Whether this status counts as a paying state
    pub fn is_paying(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(SubscriptionStatus::None),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "active" => Ok(SubscriptionStatus::Active),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "unpaid" => Ok(SubscriptionStatus::Unpaid),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            _ => Err(format!("Invalid subscription status: {}", s)),
        }
    }
}

/// Plan type with associated limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlanType {
    Starter, // $29/month - up to 200 members
    Pro,     // $79/month - up to 2000 members
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Starter => "starter",
            PlanType::Pro => "pro",
        }
    }

    /// Maximum number of members for this plan
    pub fn member_limit(&self) -> u32 {
        match self {
            PlanType::Starter => 200,
            PlanType::Pro => 2000,
        }
    }

    /// Monthly price in cents; also the value of one referral credit month
    pub fn monthly_price_cents(&self) -> i64 {
        match self {
            PlanType::Starter => 2900,
            PlanType::Pro => 7900,
        }
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(PlanType::Starter),
            "pro" => Ok(PlanType::Pro),
            _ => Err(format!("Invalid plan type: {}", s)),
        }
    }
}

/// How the tenant is billed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BillingMode {
    /// Billed outside the platform; credits land on gym_profiles.free_until
    External,
    /// Billed through the payment provider
    Provider,
}

impl BillingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingMode::External => "external",
            BillingMode::Provider => "provider",
        }
    }
}

impl FromStr for BillingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "external" => Ok(BillingMode::External),
            "provider" => Ok(BillingMode::Provider),
            _ => Err(format!("Invalid billing mode: {}", s)),
        }
    }
}

/// Tenant database model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = tenants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Tenant {
    pub id: Uuid,
    pub email: String,
    pub gym_name: String,
    pub subscription_status: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub plan_type: String,
    pub provider_customer_id: Option<String>,
    pub provider_subscription_id: Option<String>,
    pub renewal_at: Option<DateTime<Utc>>,
    pub reminder_days_before: i32,
    pub is_demo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial tenant update; `None` fields are left untouched
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = tenants)]
pub struct TenantUpdate {
    pub gym_name: Option<String>,
    pub subscription_status: Option<String>,
    pub trial_ends_at: Option<Option<DateTime<Utc>>>,
    pub plan_type: Option<String>,
    pub provider_customer_id: Option<Option<String>>,
    pub provider_subscription_id: Option<Option<String>>,
    pub renewal_at: Option<Option<DateTime<Utc>>>,
    pub reminder_days_before: Option<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Errors for tenant operations
#[derive(thiserror::Error, Debug)]
pub enum TenantError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Tenant not found")]
    NotFound,
}

impl Tenant {
    /// Find tenant by ID
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        tenant_id: Uuid,
    ) -> Result<Self, TenantError> {
        use crate::schema::tenants::dsl::*;

        tenants
            .filter(id.eq(tenant_id))
            .first::<Tenant>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => TenantError::NotFound,
                _ => TenantError::Database(e),
            })
    }

    /// Find tenant by provider subscription id
    pub async fn find_by_provider_subscription_id(
        conn: &mut AsyncPgConnection,
        subscription_id: &str,
    ) -> Result<Self, TenantError> {
        use crate::schema::tenants::dsl::*;

        tenants
            .filter(provider_subscription_id.eq(subscription_id))
            .first::<Tenant>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => TenantError::NotFound,
                _ => TenantError::Database(e),
            })
    }

    /// Apply a partial update
    pub async fn update(
        conn: &mut AsyncPgConnection,
        tenant_id: Uuid,
        update: TenantUpdate,
    ) -> Result<Self, TenantError> {
        use crate::schema::tenants::dsl::*;

        diesel::update(tenants.filter(id.eq(tenant_id)))
            .set(&update)
            .get_result::<Tenant>(conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => TenantError::NotFound,
                _ => TenantError::Database(e),
            })
    }

    /// Get subscription status as enum, warning on unknown values
    pub fn subscription_status_enum(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_str(&self.subscription_status).unwrap_or_else(|e| {
            tracing::warn!(
                "Invalid subscription status '{}' for tenant {}, treating as none: {}",
                self.subscription_status,
                self.id,
                e
            );
            SubscriptionStatus::None
        })
    }

    /// Get plan type as enum, warning on unknown values
    pub fn plan_type_enum(&self) -> PlanType {
        PlanType::from_str(&self.plan_type).unwrap_or_else(|e| {
            tracing::warn!(
                "Invalid plan type '{}' for tenant {}, defaulting to starter: {}",
                self.plan_type,
                self.id,
                e
            );
            PlanType::Starter
        })
    }
}

/// Gym profile: 1:1 extension of a tenant holding billing mode and the
/// non-monetary credit ledger (free_until)
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = gym_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GymProfile {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub billing_mode: String,
    pub free_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GymProfile {
    /// Find profile for a tenant
    pub async fn find_by_tenant_id(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::gym_profiles::dsl::*;

        gym_profiles
            .filter(tenant_id.eq(tenant))
            .first::<GymProfile>(conn)
            .await
            .optional()
    }

    /// Overwrite the free_until grace window
    pub async fn set_free_until(
        conn: &mut AsyncPgConnection,
        tenant: Uuid,
        until: DateTime<Utc>,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::gym_profiles::dsl::*;

        diesel::update(gym_profiles.filter(tenant_id.eq(tenant)))
            .set((free_until.eq(Some(until)), updated_at.eq(Utc::now())))
            .execute(conn)
            .await
    }

    /// Get billing mode as enum, warning on unknown values
    pub fn billing_mode_enum(&self) -> BillingMode {
        BillingMode::from_str(&self.billing_mode).unwrap_or_else(|e| {
            tracing::warn!(
                "Invalid billing mode '{}' for tenant {}, treating as external: {}",
                self.billing_mode,
                self.tenant_id,
                e
            );
            BillingMode::External
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_status_conversion() {
        assert_eq!(SubscriptionStatus::Active.as_str(), "active");
        assert_eq!(SubscriptionStatus::PastDue.as_str(), "past_due");

        assert_eq!(
            SubscriptionStatus::from_str("trialing"),
            Ok(SubscriptionStatus::Trialing)
        );
        assert_eq!(
            SubscriptionStatus::from_str("canceled"),
            Ok(SubscriptionStatus::Canceled)
        );
        assert!(SubscriptionStatus::from_str("invalid").is_err());
    }

    #[test]
    fn test_only_active_is_paying() {
        assert!(SubscriptionStatus::Active.is_paying());
        assert!(!SubscriptionStatus::Trialing.is_paying());
        assert!(!SubscriptionStatus::PastDue.is_paying());
        assert!(!SubscriptionStatus::Unpaid.is_paying());
        assert!(!SubscriptionStatus::Canceled.is_paying());
        assert!(!SubscriptionStatus::None.is_paying());
    }

    #[test]
    fn test_plan_limits() {
        assert_eq!(PlanType::Starter.member_limit(), 200);
        assert_eq!(PlanType::Pro.member_limit(), 2000);
        assert!(PlanType::Pro.monthly_price_cents() > PlanType::Starter.monthly_price_cents());
    }

    #[test]
    fn test_billing_mode_conversion() {
        assert_eq!(BillingMode::from_str("external"), Ok(BillingMode::External));
        assert_eq!(BillingMode::from_str("provider"), Ok(BillingMode::Provider));
        assert!(BillingMode::from_str("cash").is_err());
    }
}
