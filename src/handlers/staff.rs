// Staff CRUD

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    handlers::require_write_access,
    middleware::auth::AuthenticatedTenant,
    models::{
        staff::{CreateStaffRequest, StaffUpdate, UpdateStaffRequest},
        Staff, StaffResponse,
    },
    utils::service_error::ServiceError,
};

/// List staff
/// GET /api/v1/staff
#[utoipa::path(
    get,
    path = "/v1/staff",
    tag = "Staff",
    operation_id = "listStaff",
    responses(
        (status = 200, description = "Staff for the current tenant", body = [StaffResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_staff(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let staff = Staff::list_for_tenant(&mut conn, tenant.tenant_id).await?;
    let response: Vec<StaffResponse> = staff.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(response)))
}

/// Create a staff member
/// POST /api/v1/staff
#[utoipa::path(
    post,
    path = "/v1/staff",
    tag = "Staff",
    operation_id = "createStaff",
    request_body = CreateStaffRequest,
    responses(
        (status = 201, description = "Staff member created", body = StaffResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Write access denied")
    )
)]
pub async fn create_staff(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Json(request): Json<CreateStaffRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    require_write_access(&mut conn, tenant.tenant_id).await?;

    let staff = Staff::create(
        &mut conn,
        crate::models::NewStaff {
            tenant_id: tenant.tenant_id,
            full_name: request.full_name.trim().to_string(),
            email: request.email.trim().to_string(),
            role: request.role.trim().to_string(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(StaffResponse::from(staff))))
}

/// Update a staff member
/// PATCH /api/v1/staff/:id
#[utoipa::path(
    patch,
    path = "/v1/staff/{id}",
    tag = "Staff",
    operation_id = "updateStaff",
    params(("id" = Uuid, Path, description = "Staff ID")),
    request_body = UpdateStaffRequest,
    responses(
        (status = 200, description = "Staff member updated", body = StaffResponse),
        (status = 403, description = "Write access denied"),
        (status = 404, description = "Staff member not found")
    )
)]
pub async fn update_staff(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Path(staff_id): Path<Uuid>,
    Json(request): Json<UpdateStaffRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    require_write_access(&mut conn, tenant.tenant_id).await?;

    let update = StaffUpdate {
        full_name: request.full_name.map(|n| n.trim().to_string()),
        email: request.email.map(|e| e.trim().to_string()),
        role: request.role.map(|r| r.trim().to_string()),
        updated_at: Some(Utc::now()),
    };

    let staff = Staff::update_for_tenant(&mut conn, tenant.tenant_id, staff_id, update).await?;
    Ok((StatusCode::OK, Json(StaffResponse::from(staff))))
}

/// Delete a staff member
/// DELETE /api/v1/staff/:id
#[utoipa::path(
    delete,
    path = "/v1/staff/{id}",
    tag = "Staff",
    operation_id = "deleteStaff",
    params(("id" = Uuid, Path, description = "Staff ID")),
    responses(
        (status = 204, description = "Staff member deleted"),
        (status = 403, description = "Write access denied"),
        (status = 404, description = "Staff member not found")
    )
)]
pub async fn delete_staff(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Path(staff_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    require_write_access(&mut conn, tenant.tenant_id).await?;

    Staff::delete_for_tenant(&mut conn, tenant.tenant_id, staff_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
