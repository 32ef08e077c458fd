// Service error type shared by all HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::write_gate::DenialReason;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found")]
    NotFound,

    #[error("Write access denied: {0}")]
    WriteAccessDenied(String),

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Member limit reached")]
    MemberLimitReached,

    #[error("Invalid webhook signature")]
    InvalidWebhookSignature,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    InternalError,
}

impl ServiceError {
    /// Map a gate denial to a user-visible error; past-due payments use
    /// 402 so the UI can offer a payment-method fix, everything else 403
    pub fn from_denial(reason: DenialReason) -> Self {
        match reason {
            DenialReason::PaymentPastDue => {
                ServiceError::PaymentRequired(reason.message().to_string())
            }
            _ => ServiceError::WriteAccessDenied(reason.message().to_string()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServiceError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ServiceError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            ServiceError::WriteAccessDenied(msg) => (StatusCode::FORBIDDEN, msg),
            ServiceError::PaymentRequired(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            ServiceError::MemberLimitReached => (
                StatusCode::PAYMENT_REQUIRED,
                "Your plan's member limit has been reached. Upgrade to add more members."
                    .to_string(),
            ),
            ServiceError::InvalidWebhookSignature => (
                StatusCode::BAD_REQUEST,
                "Webhook signature verification failed".to_string(),
            ),
            ServiceError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ServiceError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded".to_string(),
            ),
            ServiceError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ServiceError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

// Conversion from various error types
impl From<diesel::result::Error> for ServiceError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => ServiceError::NotFound,
            _ => ServiceError::DatabaseError(error.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(error: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(error.to_string())
    }
}

impl From<crate::models::tenant::TenantError> for ServiceError {
    fn from(error: crate::models::tenant::TenantError) -> Self {
        match error {
            crate::models::tenant::TenantError::NotFound => ServiceError::NotFound,
            crate::models::tenant::TenantError::Database(e) => {
                ServiceError::DatabaseError(e.to_string())
            }
        }
    }
}

impl From<crate::models::member::MemberError> for ServiceError {
    fn from(error: crate::models::member::MemberError) -> Self {
        match error {
            crate::models::member::MemberError::NotFound => ServiceError::NotFound,
            crate::models::member::MemberError::Database(e) => {
                ServiceError::DatabaseError(e.to_string())
            }
        }
    }
}

impl From<crate::models::staff::StaffError> for ServiceError {
    fn from(error: crate::models::staff::StaffError) -> Self {
        match error {
            crate::models::staff::StaffError::NotFound => ServiceError::NotFound,
            crate::models::staff::StaffError::Database(e) => {
                ServiceError::DatabaseError(e.to_string())
            }
        }
    }
}

impl From<crate::models::prospect::ProspectError> for ServiceError {
    fn from(error: crate::models::prospect::ProspectError) -> Self {
        match error {
            crate::models::prospect::ProspectError::NotFound => ServiceError::NotFound,
            crate::models::prospect::ProspectError::Database(e) => {
                ServiceError::DatabaseError(e.to_string())
            }
        }
    }
}

impl From<crate::models::payment_record::PaymentRecordError> for ServiceError {
    fn from(error: crate::models::payment_record::PaymentRecordError) -> Self {
        match error {
            crate::models::payment_record::PaymentRecordError::Database(e) => {
                ServiceError::DatabaseError(e.to_string())
            }
        }
    }
}

impl From<crate::models::check_in::CheckInError> for ServiceError {
    fn from(error: crate::models::check_in::CheckInError) -> Self {
        match error {
            crate::models::check_in::CheckInError::Database(e) => {
                ServiceError::DatabaseError(e.to_string())
            }
        }
    }
}

impl From<crate::models::lifecycle_event::LifecycleEventError> for ServiceError {
    fn from(error: crate::models::lifecycle_event::LifecycleEventError) -> Self {
        match error {
            crate::models::lifecycle_event::LifecycleEventError::Database(e) => {
                ServiceError::DatabaseError(e.to_string())
            }
        }
    }
}

impl From<crate::services::write_gate::GateError> for ServiceError {
    fn from(error: crate::services::write_gate::GateError) -> Self {
        use crate::services::write_gate::GateError;
        match error {
            GateError::Tenant(e) => e.into(),
            GateError::Member(e) => e.into(),
            GateError::Database(e) => e.into(),
        }
    }
}

impl From<crate::services::payment_ledger::LedgerError> for ServiceError {
    fn from(error: crate::services::payment_ledger::LedgerError) -> Self {
        use crate::services::payment_ledger::LedgerError;
        match error {
            LedgerError::MemberNotFound => ServiceError::NotFound,
            LedgerError::Database(e) => e.into(),
        }
    }
}

impl From<crate::services::streak::StreakError> for ServiceError {
    fn from(error: crate::services::streak::StreakError) -> Self {
        use crate::services::streak::StreakError;
        match error {
            StreakError::MemberNotFound => ServiceError::NotFound,
            StreakError::Database(e) => e.into(),
        }
    }
}

impl From<crate::services::subscription_tracker::TrackerError> for ServiceError {
    fn from(error: crate::services::subscription_tracker::TrackerError) -> Self {
        use crate::services::subscription_tracker::TrackerError;
        match error {
            TrackerError::Tenant(e) => e.into(),
            TrackerError::EventLog(e) => e.into(),
        }
    }
}

impl From<crate::services::referral_credit::CreditError> for ServiceError {
    fn from(error: crate::services::referral_credit::CreditError) -> Self {
        use crate::services::referral_credit::CreditError;
        match error {
            CreditError::Referral(crate::models::referral::ReferralError::NotFound) => {
                ServiceError::NotFound
            }
            CreditError::Referral(crate::models::referral::ReferralError::Database(e)) => {
                e.into()
            }
            CreditError::Tenant(e) => e.into(),
            CreditError::EventLog(e) => e.into(),
            CreditError::Database(e) => e.into(),
        }
    }
}

impl From<crate::services::billing_cycle::CycleError> for ServiceError {
    fn from(error: crate::services::billing_cycle::CycleError) -> Self {
        match error {
            crate::services::billing_cycle::CycleError::Database(e) => e.into(),
        }
    }
}
