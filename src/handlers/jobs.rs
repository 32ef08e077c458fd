// Periodic job triggers
// The daily billing cycle is driven by an external scheduler hitting an
// authenticated endpoint with a shared-secret header.

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::net::SocketAddr;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::{
    app::AppState,
    services::{billing_cycle, rate_limit::RateLimitConfig},
    utils::service_error::ServiceError,
};

pub const JOB_TOKEN_HEADER: &str = "x-job-token";

/// Run the daily billing cycle (reminder pass + overdue pass)
/// POST /api/v1/jobs/billing-cycle
#[utoipa::path(
    post,
    path = "/v1/jobs/billing-cycle",
    tag = "Jobs",
    operation_id = "runBillingCycle",
    responses(
        (status = 200, description = "Cycle completed", body = billing_cycle::CycleReport),
        (status = 401, description = "Missing or invalid job token"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn run_billing_cycle(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServiceError> {
    let presented = headers
        .get(JOB_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(ServiceError::Unauthorized)?;

    let expected = &crate::app_config::config().jobs.job_token;
    if presented
        .as_bytes()
        .ct_eq(expected.as_bytes())
        .unwrap_u8()
        != 1
    {
        warn!("Billing cycle trigger with invalid job token");
        return Err(ServiceError::Unauthorized);
    }

    let rate_key = format!("job:billing-cycle:{}", addr.ip());
    let rate = state
        .rate_limit_service
        .check(&rate_key, &RateLimitConfig::job_endpoint())
        .await;
    if !rate.allowed {
        return Err(ServiceError::RateLimited);
    }

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let report =
        billing_cycle::run_billing_cycle(&mut conn, state.email_service.as_ref()).await?;

    Ok((StatusCode::OK, Json(report)))
}
