// Member CRUD, payments, and check-ins

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
        member::{CreateMemberRequest, MemberStatus, MemberUpdate, UpdateMemberRequest},
        CheckIn, CheckInResponse, Member, MemberResponse, NewMember, PaymentRecord,
        PaymentRecordResponse, RecordPaymentRequest, Tenant,
    },
    services::{payment_ledger, streak},
    utils::{service_error::ServiceError, trim_optional_field},
};

/// List members
/// GET /api/v1/members
#[utoipa::path(
    get,
    path = "/v1/members",
    tag = "Members",
    operation_id = "listMembers",
    responses(
        (status = 200, description = "Members for the current tenant", body = [MemberResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let members = Member::list_for_tenant(&mut conn, tenant.tenant_id).await?;
    let response: Vec<MemberResponse> = members.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(response)))
}

/// Create a member
/// POST /api/v1/members
#[utoipa::path(
    post,
    path = "/v1/members",
    tag = "Members",
    operation_id = "createMember",
    request_body = CreateMemberRequest,
    responses(
        (status = 201, description = "Member created", body = MemberResponse),
        (status = 400, description = "Validation failed"),
        (status = 402, description = "Payment required or member limit reached"),
        (status = 403, description = "Write access denied")
    )
)]
pub async fn create_member(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Json(request): Json<CreateMemberRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    require_write_access(&mut conn, tenant.tenant_id).await?;

    // Plan limit check
    let tenant_row = Tenant::find_by_id(&mut conn, tenant.tenant_id).await?;
    let count = Member::count_for_tenant(&mut conn, tenant.tenant_id).await?;
    if count >= tenant_row.plan_type_enum().member_limit() as i64 {
        return Err(ServiceError::MemberLimitReached);
    }

    let member = Member::create(
        &mut conn,
        NewMember {
            tenant_id: tenant.tenant_id,
            full_name: request.full_name.trim().to_string(),
            email: trim_optional_field(request.email.as_ref()),
            phone: trim_optional_field(request.phone.as_ref()),
            status: MemberStatus::Active.as_str().to_string(),
            monthly_fee_cents: request.monthly_fee_cents,
            billing_day_of_month: request.billing_day_of_month,
            payment_method: trim_optional_field(request.payment_method.as_ref()),
            billing_enabled: request.billing_enabled,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

/// Get one member
/// GET /api/v1/members/:id
#[utoipa::path(
    get,
    path = "/v1/members/{id}",
    tag = "Members",
    operation_id = "getMember",
    params(("id" = Uuid, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member", body = MemberResponse),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Path(member_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let member = Member::find_for_tenant(&mut conn, tenant.tenant_id, member_id).await?;
    Ok((StatusCode::OK, Json(MemberResponse::from(member))))
}

/// Update a member
/// PATCH /api/v1/members/:id
#[utoipa::path(
    patch,
    path = "/v1/members/{id}",
    tag = "Members",
    operation_id = "updateMember",
    params(("id" = Uuid, Path, description = "Member ID")),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, description = "Member updated", body = MemberResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Write access denied"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn update_member(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Path(member_id): Path<Uuid>,
    Json(request): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;

    if let Some(ref status) = request.status {
        if status.parse::<MemberStatus>().is_err() {
            return Err(ServiceError::ValidationError(format!(
                "Invalid member status: {}",
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

    let update = MemberUpdate {
        full_name: request.full_name.map(|n| n.trim().to_string()),
        email: request.email.map(|e| Some(e.trim().to_string())),
        phone: request.phone.map(|p| Some(p.trim().to_string())),
        status: request.status,
        monthly_fee_cents: request.monthly_fee_cents.map(Some),
        billing_day_of_month: request.billing_day_of_month.map(Some),
        payment_method: request.payment_method.map(Some),
        billing_enabled: request.billing_enabled,
        updated_at: Some(Utc::now()),
    };

    let member =
        Member::update_for_tenant(&mut conn, tenant.tenant_id, member_id, update).await?;
    Ok((StatusCode::OK, Json(MemberResponse::from(member))))
}

/// Record a payment for a member
/// POST /api/v1/members/:id/payments
#[utoipa::path(
    post,
    path = "/v1/members/{id}/payments",
    tag = "Members",
    operation_id = "recordPayment",
    params(("id" = Uuid, Path, description = "Member ID")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentRecordResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Write access denied"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn record_member_payment(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Path(member_id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    require_write_access(&mut conn, tenant.tenant_id).await?;

    let outcome = payment_ledger::record_payment(
        &mut conn,
        tenant.tenant_id,
        member_id,
        request.amount_cents,
        request.method.trim().to_string(),
        trim_optional_field(request.note.as_ref()),
        request.paid_at,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentRecordResponse::from(outcome.record)),
    ))
}

/// Payment history for a member
/// GET /api/v1/members/:id/payments
#[utoipa::path(
    get,
    path = "/v1/members/{id}/payments",
    tag = "Members",
    operation_id = "listMemberPayments",
    params(("id" = Uuid, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Payment history", body = [PaymentRecordResponse]),
        (status = 404, description = "Member not found")
    )
)]
pub async fn list_member_payments(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Path(member_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    // Verify ownership before listing
    Member::find_for_tenant(&mut conn, tenant.tenant_id, member_id).await?;

    let records =
        PaymentRecord::list_for_member(&mut conn, tenant.tenant_id, member_id).await?;
    let response: Vec<PaymentRecordResponse> = records.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, Json(response)))
}

/// Record a member check-in and update streaks
/// POST /api/v1/members/:id/check-ins
#[utoipa::path(
    post,
    path = "/v1/members/{id}/check-ins",
    tag = "Members",
    operation_id = "recordCheckIn",
    params(("id" = Uuid, Path, description = "Member ID")),
    responses(
        (status = 201, description = "Check-in recorded", body = CheckInResponse),
        (status = 403, description = "Write access denied"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn record_member_check_in(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Path(member_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    require_write_access(&mut conn, tenant.tenant_id).await?;

    let outcome =
        streak::record_check_in(&mut conn, tenant.tenant_id, member_id, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckInResponse {
            id: outcome.check_in.id,
            member_id: outcome.check_in.member_id,
            checked_in_at: outcome.check_in.checked_in_at,
            current_streak: outcome.current_streak,
            longest_streak: outcome.longest_streak,
        }),
    ))
}

/// Recent check-ins for a member
/// GET /api/v1/members/:id/check-ins
#[utoipa::path(
    get,
    path = "/v1/members/{id}/check-ins",
    tag = "Members",
    operation_id = "listMemberCheckIns",
    params(("id" = Uuid, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Recent check-ins"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn list_member_check_ins(
    State(state): State<AppState>,
    tenant: AuthenticatedTenant,
    Path(member_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    Member::find_for_tenant(&mut conn, tenant.tenant_id, member_id).await?;

    let check_ins = CheckIn::list_for_member(&mut conn, tenant.tenant_id, member_id, 30).await?;
    Ok((StatusCode::OK, Json(check_ins)))
}
