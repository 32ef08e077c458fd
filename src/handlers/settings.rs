// Tenant settings

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    app::AppState,
    handlers::require_write_access,
    middleware::auth::AuthenticatedTenant,
    models::tenant::{GymProfile, Tenant, TenantUpdate},
    utils::service_error::ServiceError,
};

/// Tenant settings view
#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub gym_name: String,
    pub email: String,
    pub plan_type: String,
    pub subscription_status: String,
    pub reminder_days_before: i32,
    pub billing_mode: Option<String>,
    pub free_until: Option<DateTime<Utc>>,
}

/// Request body for updating settings
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 255, message = "Gym name must be 1-255 characters"))]
    pub gym_name: Option<String>,

    /// Lead time for payment reminders, in days
    #[validate(range(min = 0, max = 28, message = "Reminder lead must be 0-28 days"))]
    pub reminder_days_before: Option<i32>,
}

/// Get tenant settings
/// GET /api/v1/settings
#[utoipa::path(
    get,
    path = "/v1/settings",
    tag = "Settings",
    operation_id = "getSettings",
    responses(
        (status = 200, description = "Tenant settings", body = SettingsResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_settings(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let tenant_row = Tenant::find_by_id(&mut conn, tenant.tenant_id).await?;
    let profile = GymProfile::find_by_tenant_id(&mut conn, tenant.tenant_id).await?;

    Ok((
        StatusCode::OK,
        Json(SettingsResponse {
            gym_name: tenant_row.gym_name,
            email: tenant_row.email,
            plan_type: tenant_row.plan_type,
            subscription_status: tenant_row.subscription_status,
            reminder_days_before: tenant_row.reminder_days_before,
            billing_mode: profile.as_ref().map(|p| p.billing_mode.clone()),
            free_until: profile.and_then(|p| p.free_until),
        }),
    ))
}

/// Update tenant settings
/// PATCH /api/v1/settings
#[utoipa::path(
    patch,
    path = "/v1/settings",
    tag = "Settings",
    operation_id = "updateSettings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = SettingsResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Write access denied")
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    require_write_access(&mut conn, tenant.tenant_id).await?;

    let update = TenantUpdate {
        gym_name: request.gym_name.map(|n| n.trim().to_string()),
        reminder_days_before: request.reminder_days_before,
        updated_at: Some(Utc::now()),
        ..Default::default()
    };

    let tenant_row = Tenant::update(&mut conn, tenant.tenant_id, update).await?;
    let profile = GymProfile::find_by_tenant_id(&mut conn, tenant.tenant_id).await?;

    Ok((
        StatusCode::OK,
        Json(SettingsResponse {
            gym_name: tenant_row.gym_name,
            email: tenant_row.email,
            plan_type: tenant_row.plan_type,
            subscription_status: tenant_row.subscription_status,
            reminder_days_before: tenant_row.reminder_days_before,
            billing_mode: profile.as_ref().map(|p| p.billing_mode.clone()),
            free_until: profile.and_then(|p| p.free_until),
        }),
    ))
}
