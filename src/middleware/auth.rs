// Tenant identification middleware
// Session handling lives in an upstream gateway; it forwards the resolved
// tenant in the x-tenant-id header. This middleware validates the header
// and injects AuthenticatedTenant into request extensions.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Tenant identity attached to each authenticated request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedTenant {
    pub tenant_id: Uuid,
}

/// Middleware that resolves the tenant header and adds AuthenticatedTenant
/// to request extensions
pub async fn tenant_middleware(mut request: Request<Body>, next: Next) -> Response {
    let header_value = request
        .headers()
        .get(TENANT_HEADER)
        .and_then(|h| h.to_str().ok());

    let tenant_id = match header_value.and_then(|v| Uuid::parse_str(v).ok()) {
        Some(id) => id,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Missing or invalid tenant header",
                    "status": 401
                })),
            )
                .into_response();
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedTenant { tenant_id });

    next.run(request).await
}

/// Extractor so handlers can take AuthenticatedTenant directly
impl FromRequestParts<AppState> for AuthenticatedTenant {
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedTenant>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "Authentication required",
                        "status": 401
                    })),
                )
            })
    }
}
