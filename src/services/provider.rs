// Payment provider integration: webhook signature verification, event
// parsing, and the outbound API client used for referral credits.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Maximum age of a webhook timestamp before it is rejected as stale
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Webhook verification failed: {0}")]
    InvalidSignature(String),

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("Provider API error: {0}")]
    ApiError(String),

    #[error("Provider request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

// =============================================================================
// WEBHOOK VERIFICATION
// =============================================================================

/// Verifies provider webhook signatures
///
/// The signature header has the form `t=<unix>,v1=<hex hmac>`, where the
/// HMAC-SHA256 is computed over `{t}.{payload}` with the shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify a webhook signature against the raw request body
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), ProviderError> {
        self.verify_at(payload, signature_header, Utc::now().timestamp())
    }

    /// Verification with an injectable clock for tests
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_unix: i64,
    ) -> Result<(), ProviderError> {
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature_header.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key.trim() {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature header");
            ProviderError::InvalidSignature("missing timestamp".to_string())
        })?;
        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in webhook signature header");
            ProviderError::InvalidSignature("missing signature".to_string())
        })?;

        let body = std::str::from_utf8(payload).map_err(|_| {
            ProviderError::InvalidSignature("payload is not valid UTF-8".to_string())
        })?;
        let signed_payload = format!("{}.{}", timestamp, body);

        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .map_err(|_| ProviderError::InvalidSignature("HMAC init failed".to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        // Constant-time comparison
        if expected.as_bytes().ct_eq(sig_v1.as_bytes()).unwrap_u8() != 1 {
            error!("Webhook signature verification failed");
            return Err(ProviderError::InvalidSignature(
                "signature mismatch".to_string(),
            ));
        }

        let ts: i64 = timestamp.parse().map_err(|_| {
            ProviderError::InvalidSignature("invalid timestamp format".to_string())
        })?;
        if (now_unix - ts).abs() > SIGNATURE_TOLERANCE_SECS {
            warn!(timestamp = ts, now = now_unix, "Webhook timestamp too old");
            return Err(ProviderError::InvalidSignature(
                "timestamp outside tolerance".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// EVENT PARSING
// =============================================================================

/// Provider event types the tracker handles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEventType {
    CheckoutSessionCompleted,
    InvoicePaid,
    InvoicePaymentFailed,
    SubscriptionUpdated,
    SubscriptionDeleted,
    Unknown(String),
}

impl From<&str> for ProviderEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "invoice.paid" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed provider event
#[derive(Debug, Clone)]
pub struct ProviderEvent {
    pub id: String,
    pub event_type: ProviderEventType,
    pub data: ProviderEventData,
}

#[derive(Debug, Clone)]
pub enum ProviderEventData {
    CheckoutSession(CheckoutSessionData),
    Subscription(SubscriptionData),
    Invoice(InvoiceData),
    Raw(serde_json::Value),
}

/// Checkout completion binds a provider subscription to a tenant
#[derive(Debug, Clone)]
pub struct CheckoutSessionData {
    /// Tenant id carried through checkout as client_reference_id
    pub tenant_id: Option<Uuid>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    /// Plan name from checkout metadata
    pub plan: Option<String>,
    /// Status of the subscription the checkout opened, when reported
    pub subscription_status: Option<String>,
    /// End of the first billing period, when reported
    pub period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SubscriptionData {
    pub subscription_id: String,
    pub customer_id: Option<String>,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct InvoiceData {
    pub subscription_id: Option<String>,
    pub customer_id: Option<String>,
    /// End of the paid period; absent on some invoice payloads
    pub period_end: Option<DateTime<Utc>>,
}

/// Parse a verified webhook body into a typed event
#[instrument(skip(payload))]
pub fn parse_event(payload: &[u8]) -> Result<ProviderEvent, ProviderError> {
    let raw: RawProviderEvent = serde_json::from_slice(payload)
        .map_err(|e| ProviderError::MalformedPayload(e.to_string()))?;

    debug!(event_id = %raw.id, event_type = %raw.event_type, "Parsed provider event");

    let event_type = ProviderEventType::from(raw.event_type.as_str());
    let data = parse_event_data(&event_type, raw.data.object)?;

    Ok(ProviderEvent {
        id: raw.id,
        event_type,
        data,
    })
}

fn parse_event_data(
    event_type: &ProviderEventType,
    object: serde_json::Value,
) -> Result<ProviderEventData, ProviderError> {
    match event_type {
        ProviderEventType::CheckoutSessionCompleted => {
            let session: RawCheckoutSession = serde_json::from_value(object)
                .map_err(|e| ProviderError::MalformedPayload(e.to_string()))?;

            let tenant_id = session
                .client_reference_id
                .as_deref()
                .and_then(|s| Uuid::parse_str(s).ok());

            Ok(ProviderEventData::CheckoutSession(CheckoutSessionData {
                tenant_id,
                customer_id: session.customer,
                subscription_id: session.subscription,
                plan: session.metadata.and_then(|m| m.plan),
                subscription_status: session.subscription_status,
                period_end: session
                    .current_period_end
                    .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
            }))
        }
        ProviderEventType::SubscriptionUpdated | ProviderEventType::SubscriptionDeleted => {
            let sub: RawSubscription = serde_json::from_value(object)
                .map_err(|e| ProviderError::MalformedPayload(e.to_string()))?;

            Ok(ProviderEventData::Subscription(SubscriptionData {
                subscription_id: sub.id,
                customer_id: sub.customer,
                status: sub.status,
                current_period_end: sub
                    .current_period_end
                    .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
            }))
        }
        ProviderEventType::InvoicePaid | ProviderEventType::InvoicePaymentFailed => {
            let inv: RawInvoice = serde_json::from_value(object)
                .map_err(|e| ProviderError::MalformedPayload(e.to_string()))?;

            Ok(ProviderEventData::Invoice(InvoiceData {
                subscription_id: inv.subscription,
                customer_id: inv.customer,
                period_end: inv
                    .period_end
                    .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
            }))
        }
        ProviderEventType::Unknown(t) => {
            info!(event_type = %t, "Ignoring unknown provider event type");
            Ok(ProviderEventData::Raw(object))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProviderEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    customer: Option<String>,
    subscription: Option<String>,
    client_reference_id: Option<String>,
    metadata: Option<RawCheckoutMetadata>,
    subscription_status: Option<String>,
    current_period_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutMetadata {
    plan: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSubscription {
    id: String,
    customer: Option<String>,
    status: String,
    current_period_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawInvoice {
    customer: Option<String>,
    subscription: Option<String>,
    period_end: Option<i64>,
}

// =============================================================================
// OUTBOUND API CLIENT
// =============================================================================

/// Outbound calls to the payment provider
///
/// Behind a trait so the referral credit engine can be tested without
/// touching the network.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Credit a customer's account balance by `amount_cents`
    async fn credit_customer_balance(
        &self,
        customer_id: &str,
        amount_cents: i64,
        description: &str,
    ) -> Result<(), ProviderError>;
}

/// HTTP client for the payment provider API
#[derive(Clone)]
pub struct ProviderClient {
    client: Client,
    api_url: String,
    secret_key: String,
}

impl ProviderClient {
    pub fn new(api_url: String, secret_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url,
            secret_key,
        }
    }

    pub fn from_config() -> Self {
        let billing = &crate::app_config::config().billing;
        Self::new(
            billing.provider_api_url.clone(),
            billing.provider_secret_key.clone(),
            Duration::from_secs(billing.provider_timeout_secs),
        )
    }
}

#[async_trait]
impl BillingProvider for ProviderClient {
    #[instrument(skip(self))]
    async fn credit_customer_balance(
        &self,
        customer_id: &str,
        amount_cents: i64,
        description: &str,
    ) -> Result<(), ProviderError> {
        let url = format!(
            "{}/v1/customers/{}/balance_transactions",
            self.api_url, customer_id
        );

        // Provider semantics: a negative balance transaction is a credit
        let params = [
            ("amount", (-amount_cents).to_string()),
            ("currency", "usd".to_string()),
            ("description", description.to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!(
                "Provider balance credit failed. Status: {}, Body: {}",
                status, body
            );
            return Err(ProviderError::ApiError(format!(
                "balance credit failed with status {}",
                status
            )));
        }

        info!(customer_id = %customer_id, amount_cents, "Credited provider customer balance");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: i64, payload: &str) -> String {
        let signed = format!("{}.{}", timestamp, payload);
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_valid_signature_accepted() {
        let verifier = WebhookVerifier::new("whsec_test_secret");
        let payload = r#"{"id":"evt_1","type":"invoice.paid","data":{"object":{}}}"#;
        let now = 1_700_000_000;
        let header = sign("whsec_test_secret", now, payload);

        assert!(verifier.verify_at(payload.as_bytes(), &header, now).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = WebhookVerifier::new("whsec_test_secret");
        let payload = r#"{"id":"evt_1"}"#;
        let now = 1_700_000_000;
        let header = sign("whsec_other_secret", now, payload);

        assert!(matches!(
            verifier.verify_at(payload.as_bytes(), &header, now),
            Err(ProviderError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let verifier = WebhookVerifier::new("whsec_test_secret");
        let now = 1_700_000_000;
        let header = sign("whsec_test_secret", now, r#"{"amount":100}"#);

        assert!(verifier
            .verify_at(br#"{"amount":99999}"#, &header, now)
            .is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let verifier = WebhookVerifier::new("whsec_test_secret");
        let payload = r#"{"id":"evt_1"}"#;
        let signed_at = 1_700_000_000;
        let header = sign("whsec_test_secret", signed_at, payload);

        let now = signed_at + SIGNATURE_TOLERANCE_SECS + 1;
        assert!(verifier.verify_at(payload.as_bytes(), &header, now).is_err());
    }

    #[test]
    fn test_missing_header_parts_rejected() {
        let verifier = WebhookVerifier::new("whsec_test_secret");
        assert!(verifier.verify_at(b"{}", "t=12345", 12345).is_err());
        assert!(verifier.verify_at(b"{}", "v1=abcdef", 12345).is_err());
        assert!(verifier.verify_at(b"{}", "", 12345).is_err());
    }

    #[test]
    fn test_parse_checkout_event() {
        let tenant_id = Uuid::new_v4();
        let payload = serde_json::json!({
            "id": "evt_checkout_1",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "customer": "cus_123",
                    "subscription": "sub_456",
                    "client_reference_id": tenant_id.to_string(),
                    "metadata": { "plan": "pro" },
                    "subscription_status": "trialing",
                    "current_period_end": 1_700_000_000
                }
            }
        });

        let event = parse_event(payload.to_string().as_bytes()).unwrap();
        assert_eq!(event.event_type, ProviderEventType::CheckoutSessionCompleted);
        match event.data {
            ProviderEventData::CheckoutSession(data) => {
                assert_eq!(data.tenant_id, Some(tenant_id));
                assert_eq!(data.customer_id.as_deref(), Some("cus_123"));
                assert_eq!(data.subscription_id.as_deref(), Some("sub_456"));
                assert_eq!(data.plan.as_deref(), Some("pro"));
                assert_eq!(data.subscription_status.as_deref(), Some("trialing"));
                assert!(data.period_end.is_some());
            }
            other => panic!("Unexpected event data: {:?}", other),
        }
    }

    #[test]
    fn test_parse_checkout_event_without_subscription_details() {
        let payload = serde_json::json!({
            "id": "evt_checkout_2",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "customer": "cus_123",
                    "subscription": "sub_456",
                    "client_reference_id": Uuid::new_v4().to_string()
                }
            }
        });

        let event = parse_event(payload.to_string().as_bytes()).unwrap();
        match event.data {
            ProviderEventData::CheckoutSession(data) => {
                assert!(data.subscription_status.is_none());
                assert!(data.period_end.is_none());
            }
            other => panic!("Unexpected event data: {:?}", other),
        }
    }

    #[test]
    fn test_parse_subscription_deleted_event() {
        let payload = serde_json::json!({
            "id": "evt_sub_1",
            "type": "customer.subscription.deleted",
            "data": {
                "object": {
                    "id": "sub_456",
                    "customer": "cus_123",
                    "status": "canceled",
                    "current_period_end": 1_700_000_000
                }
            }
        });

        let event = parse_event(payload.to_string().as_bytes()).unwrap();
        assert_eq!(event.event_type, ProviderEventType::SubscriptionDeleted);
        match event.data {
            ProviderEventData::Subscription(data) => {
                assert_eq!(data.subscription_id, "sub_456");
                assert_eq!(data.status, "canceled");
                assert!(data.current_period_end.is_some());
            }
            other => panic!("Unexpected event data: {:?}", other),
        }
    }

    #[test]
    fn test_parse_invoice_without_period_end() {
        let payload = serde_json::json!({
            "id": "evt_inv_1",
            "type": "invoice.paid",
            "data": {
                "object": {
                    "customer": "cus_123",
                    "subscription": "sub_456"
                }
            }
        });

        let event = parse_event(payload.to_string().as_bytes()).unwrap();
        match event.data {
            ProviderEventData::Invoice(data) => {
                assert_eq!(data.subscription_id.as_deref(), Some("sub_456"));
                assert!(data.period_end.is_none());
            }
            other => panic!("Unexpected event data: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_type_parses_as_raw() {
        let payload = serde_json::json!({
            "id": "evt_x",
            "type": "charge.refunded",
            "data": { "object": { "id": "ch_1" } }
        });

        let event = parse_event(payload.to_string().as_bytes()).unwrap();
        assert!(matches!(
            event.event_type,
            ProviderEventType::Unknown(ref t) if t == "charge.refunded"
        ));
        assert!(matches!(event.data, ProviderEventData::Raw(_)));
    }
}
