// Prospect (lead) CRUD and conversion to member

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
        member::MemberStatus,
        prospect::{
            CreateProspectRequest, ProspectStatus, ProspectUpdate, UpdateProspectRequest,
        },
        Member, MemberResponse, NewMember, Prospect, ProspectResponse, Tenant,
    },
    utils::{service_error::ServiceError, trim_optional_field},
};

/// List prospects
/// GET /api/v1/prospects
#[utoipa::path(
    get,
    path = "/v1/prospects",
    tag = "Prospects",
    operation_id = "listProspects",
    responses(
        (status = 200, description = "Prospects for the current tenant", body = [ProspectResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_prospects(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let prospects = Prospect::list_for_tenant(&mut conn, tenant.tenant_id).await?;
    let response: Vec<ProspectResponse> = prospects.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(response)))
}

/// Create a prospect
/// POST /api/v1/prospects
#[utoipa::path(
    post,
    path = "/v1/prospects",
    tag = "Prospects",
    operation_id = "createProspect",
    request_body = CreateProspectRequest,
    responses(
        (status = 201, description = "Prospect created", body = ProspectResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Write access denied")
    )
)]
pub async fn create_prospect(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Json(request): Json<CreateProspectRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    require_write_access(&mut conn, tenant.tenant_id).await?;

    let prospect = Prospect::create(
        &mut conn,
        crate::models::NewProspect {
            tenant_id: tenant.tenant_id,
            full_name: request.full_name.trim().to_string(),
            email: trim_optional_field(request.email.as_ref()),
            phone: trim_optional_field(request.phone.as_ref()),
            status: ProspectStatus::New.as_str().to_string(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ProspectResponse::from(prospect))))
}

/// Update a prospect
/// PATCH /api/v1/prospects/:id
#[utoipa::path(
    patch,
    path = "/v1/prospects/{id}",
    tag = "Prospects",
    operation_id = "updateProspect",
    params(("id" = Uuid, Path, description = "Prospect ID")),
    request_body = UpdateProspectRequest,
    responses(
        (status = 200, description = "Prospect updated", body = ProspectResponse),
        (status = 403, description = "Write access denied"),
        (status = 404, description = "Prospect not found")
    )
)]
pub async fn update_prospect(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Path(prospect_id): Path<Uuid>,
    Json(request): Json<UpdateProspectRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;

    if let Some(ref status) = request.status {
        if status.parse::<ProspectStatus>().is_err() {
            return Err(ServiceError::ValidationError(format!(
                "Invalid prospect status: {}",
                status
            )));
        }
    }

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    require_write_access(&mut conn, tenant.tenant_id).await?;

    let update = ProspectUpdate {
        full_name: request.full_name.map(|n| n.trim().to_string()),
        email: request.email.map(|e| Some(e.trim().to_string())),
        phone: request.phone.map(|p| Some(p.trim().to_string())),
        status: request.status,
        converted_member_id: None,
        updated_at: Some(Utc::now()),
    };

    let prospect =
        Prospect::update_for_tenant(&mut conn, tenant.tenant_id, prospect_id, update).await?;
    Ok((StatusCode::OK, Json(ProspectResponse::from(prospect))))
}

/// Convert a prospect into a member
/// POST /api/v1/prospects/:id/convert
#[utoipa::path(
    post,
    path = "/v1/prospects/{id}/convert",
    tag = "Prospects",
    operation_id = "convertProspect",
    params(("id" = Uuid, Path, description = "Prospect ID")),
    responses(
        (status = 201, description = "Prospect converted", body = MemberResponse),
        (status = 402, description = "Member limit reached"),
        (status = 403, description = "Write access denied"),
        (status = 404, description = "Prospect not found"),
        (status = 409, description = "Prospect already converted")
    )
)]
pub async fn convert_prospect(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Path(prospect_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    require_write_access(&mut conn, tenant.tenant_id).await?;

    let prospect = Prospect::find_for_tenant(&mut conn, tenant.tenant_id, prospect_id).await?;
    if prospect.converted_member_id.is_some() {
        return Err(ServiceError::Conflict(
            "Prospect has already been converted".to_string(),
        ));
    }

    let tenant_row = Tenant::find_by_id(&mut conn, tenant.tenant_id).await?;
    let count = Member::count_for_tenant(&mut conn, tenant.tenant_id).await?;
    if count >= tenant_row.plan_type_enum().member_limit() as i64 {
        return Err(ServiceError::MemberLimitReached);
    }

    let member = Member::create(
        &mut conn,
        NewMember {
            tenant_id: tenant.tenant_id,
            full_name: prospect.full_name.clone(),
            email: prospect.email.clone(),
            phone: prospect.phone.clone(),
            status: MemberStatus::Active.as_str().to_string(),
            monthly_fee_cents: None,
            billing_day_of_month: None,
            payment_method: None,
            billing_enabled: false,
        },
    )
    .await?;

    Prospect::update_for_tenant(
        &mut conn,
        tenant.tenant_id,
        prospect_id,
        ProspectUpdate {
            status: Some(ProspectStatus::Converted.as_str().to_string()),
            converted_member_id: Some(Some(member.id)),
            updated_at: Some(Utc::now()),
            ..Default::default()
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}
