// HTTP handlers and route builders

pub mod billing;
pub mod docs;
pub mod jobs;
pub mod members;
pub mod prospects;
pub mod settings;
pub mod staff;
pub mod webhook;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use diesel_async::AsyncPgConnection;
use serde_json::json;
use uuid::Uuid;

use crate::{
    app::AppState,
    db::check_diesel_health,
    models::Tenant,
    services::write_gate::{self, GateDecision},
    utils::service_error::ServiceError,
};

/// Reject mutating requests when the tenant is demo/read-only or its
/// subscription does not permit writes. Reads stay open regardless of
/// billing state.
pub(crate) async fn require_write_access(
    conn: &mut AsyncPgConnection,
    tenant_id: Uuid,
) -> Result<(), ServiceError> {
    let tenant = Tenant::find_by_id(conn, tenant_id).await?;

    if tenant.is_demo {
        return Err(ServiceError::WriteAccessDenied(
            "Demo accounts are read-only.".to_string(),
        ));
    }

    match write_gate::evaluate_for(conn, &tenant).await? {
        GateDecision::Allowed => Ok(()),
        GateDecision::Denied(reason) => Err(ServiceError::from_denial(reason)),
    }
}

/// Component health: Postgres and Redis
/// GET /api/v1/health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut overall_healthy = true;

    let postgres_health = match check_diesel_health(&state.diesel_pool).await {
        Ok(_) => json!({ "status": "healthy", "error": null }),
        Err(e) => {
            overall_healthy = false;
            json!({
                "status": "unhealthy",
                "error": format!("Database connection failed: {}", e)
            })
        }
    };

    let redis_health = state.redis_pool.health_check().await;
    if !redis_health.is_healthy {
        overall_healthy = false;
    }

    let status = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if overall_healthy { "healthy" } else { "degraded" },
            "service": "gymkit-backend",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "components": {
                "postgresql": postgres_health,
                "redis": {
                    "status": if redis_health.is_healthy { "healthy" } else { "unhealthy" },
                    "latency_ms": redis_health.latency_ms,
                    "error": redis_health.error
                }
            }
        })),
    )
}

// Webhook ingress (signature-authenticated, no tenant middleware)
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/billing", post(webhook::ingest_billing_webhook))
}

// Job triggers (token-authenticated, no tenant middleware)
pub fn job_routes() -> Router<AppState> {
    Router::new().route("/billing-cycle", post(jobs::run_billing_cycle))
}

pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(billing::get_billing_status))
        .route("/events", get(billing::list_billing_events))
}

pub fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(members::list_members))
        .route("/", post(members::create_member))
        .route("/{id}", get(members::get_member))
        .route("/{id}", patch(members::update_member))
        .route("/{id}/payments", post(members::record_member_payment))
        .route("/{id}/payments", get(members::list_member_payments))
        .route("/{id}/check-ins", post(members::record_member_check_in))
        .route("/{id}/check-ins", get(members::list_member_check_ins))
}

pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(staff::list_staff))
        .route("/", post(staff::create_staff))
        .route("/{id}", patch(staff::update_staff))
        .route("/{id}", delete(staff::delete_staff))
}

pub fn prospect_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(prospects::list_prospects))
        .route("/", post(prospects::create_prospect))
        .route("/{id}", patch(prospects::update_prospect))
        .route("/{id}/convert", post(prospects::convert_prospect))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(settings::get_settings))
        .route("/", patch(settings::update_settings))
}
