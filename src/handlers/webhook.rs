// Payment provider webhook ingress
// The raw body is needed for signature verification, so this handler takes
// Bytes rather than a typed JSON extractor.

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::{error, info, warn};

use crate::{
    app::AppState,
    services::{
        provider, rate_limit::RateLimitConfig, referral_credit, subscription_tracker,
    },
    utils::service_error::ServiceError,
};

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Ingest a signed billing event from the payment provider
/// POST /api/v1/webhooks/billing
#[utoipa::path(
    post,
    path = "/v1/webhooks/billing",
    tag = "Webhooks",
    operation_id = "ingestBillingWebhook",
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Signature verification failed or malformed payload"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn ingest_billing_webhook(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let rate_key = format!("webhook:{}", addr.ip());
    let rate = state
        .rate_limit_service
        .check(&rate_key, &RateLimitConfig::webhook_endpoint())
        .await;
    if !rate.allowed {
        return Err(ServiceError::RateLimited);
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(ServiceError::InvalidWebhookSignature)?;

    // Hard rejection: the provider retries failed deliveries itself
    state
        .webhook_verifier
        .verify(&body, signature)
        .map_err(|e| {
            warn!("Webhook rejected: {}", e);
            ServiceError::InvalidWebhookSignature
        })?;

    let event = provider::parse_event(&body).map_err(|e| {
        warn!("Webhook payload rejected: {}", e);
        ServiceError::ValidationError("malformed event payload".to_string())
    })?;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

    let outcome = subscription_tracker::apply_event(&mut conn, &event).await?;

    if let Some(outcome) = outcome {
        info!(
            tenant_id = %outcome.tenant_id,
            status = outcome.new_status.as_str(),
            "Subscription state updated"
        );

        // Referral credit fires once, on the transition into a paying
        // state; the engine's own idempotency check backstops redelivery
        if outcome.became_paying {
            match referral_credit::apply_credit(
                &mut conn,
                state.provider_client.as_ref(),
                outcome.tenant_id,
            )
            .await
            {
                Ok(credit) => {
                    info!(tenant_id = %outcome.tenant_id, ?credit, "Referral credit evaluated")
                }
                Err(e) => {
                    // The subscription update already committed; credit
                    // failures must not make the provider redeliver
                    error!(tenant_id = %outcome.tenant_id, "Referral credit failed: {}", e);
                }
            }
        }
    }

    Ok((StatusCode::OK, Json(json!({ "received": true }))))
}
