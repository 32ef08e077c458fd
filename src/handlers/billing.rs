// Billing status read model and lifecycle event feed

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedTenant,
    models::LifecycleEvent,
    services::write_gate,
    utils::service_error::ServiceError,
};

/// Billing status summary for the current tenant
/// GET /api/v1/billing/status
#[utoipa::path(
    get,
    path = "/v1/billing/status",
    tag = "Billing",
    operation_id = "getBillingStatus",
    responses(
        (status = 200, description = "Billing status", body = write_gate::BillingStatus),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tenant not found")
    )
)]
pub async fn get_billing_status(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let status = write_gate::billing_status(&mut conn, tenant.tenant_id).await?;
    Ok((StatusCode::OK, Json(status)))
}

/// Recent lifecycle events for the current tenant
/// GET /api/v1/billing/events
#[utoipa::path(
    get,
    path = "/v1/billing/events",
    tag = "Billing",
    operation_id = "listBillingEvents",
    responses(
        (status = 200, description = "Recent lifecycle events"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_billing_events(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let events = LifecycleEvent::list_for_owner(&mut conn, tenant.tenant_id, 50).await?;
    Ok((StatusCode::OK, Json(events)))
}
