// OpenAPI document served at /api/v1/docs/openapi.json

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use crate::{
    handlers::settings::{SettingsResponse, UpdateSettingsRequest},
    models::{
        member::{CreateMemberRequest, MemberResponse, UpdateMemberRequest},
        payment_record::{PaymentRecordResponse, RecordPaymentRequest},
        prospect::{CreateProspectRequest, ProspectResponse, UpdateProspectRequest},
        staff::{CreateStaffRequest, StaffResponse, UpdateStaffRequest},
        CheckInResponse,
    },
    services::{billing_cycle::CycleReport, write_gate::BillingStatus},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GymKit Backend API",
        description = "Gym membership management with provider-driven billing",
        version = "1.0.0"
    ),
    paths(
        crate::handlers::webhook::ingest_billing_webhook,
        crate::handlers::jobs::run_billing_cycle,
        crate::handlers::billing::get_billing_status,
        crate::handlers::billing::list_billing_events,
        crate::handlers::members::list_members,
        crate::handlers::members::create_member,
        crate::handlers::members::get_member,
        crate::handlers::members::update_member,
        crate::handlers::members::record_member_payment,
        crate::handlers::members::list_member_payments,
        crate::handlers::members::record_member_check_in,
        crate::handlers::members::list_member_check_ins,
        crate::handlers::staff::list_staff,
        crate::handlers::staff::create_staff,
        crate::handlers::staff::update_staff,
        crate::handlers::staff::delete_staff,
        crate::handlers::prospects::list_prospects,
        crate::handlers::prospects::create_prospect,
        crate::handlers::prospects::update_prospect,
        crate::handlers::prospects::convert_prospect,
        crate::handlers::settings::get_settings,
        crate::handlers::settings::update_settings,
    ),
    components(schemas(
        BillingStatus,
        CheckInResponse,
        CreateMemberRequest,
        CreateProspectRequest,
        CreateStaffRequest,
        CycleReport,
        MemberResponse,
        PaymentRecordResponse,
        ProspectResponse,
        RecordPaymentRequest,
        SettingsResponse,
        StaffResponse,
        UpdateMemberRequest,
        UpdateProspectRequest,
        UpdateSettingsRequest,
        UpdateStaffRequest,
    )),
    tags(
        (name = "Webhooks", description = "Payment provider event ingress"),
        (name = "Jobs", description = "Scheduler-triggered periodic jobs"),
        (name = "Billing", description = "Subscription and billing status"),
        (name = "Members", description = "Member management, payments, and check-ins"),
        (name = "Staff", description = "Staff management"),
        (name = "Prospects", description = "Lead tracking and conversion"),
        (name = "Settings", description = "Tenant settings")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI JSON document
pub async fn serve_openapi_spec() -> Response {
    match ApiDoc::openapi().to_json() {
        Ok(spec) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            spec,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render OpenAPI document: {}", e),
        )
            .into_response(),
    }
}
