// Application state and configuration
use std::sync::Arc;

use crate::{
    db::DieselPool,
    services::{EmailService, ProviderClient, RateLimitService, WebhookVerifier},
    RedisPool,
};

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub diesel_pool: DieselPool,
    pub redis_pool: RedisPool,
    pub webhook_verifier: Arc<WebhookVerifier>,
    pub provider_client: Arc<ProviderClient>,
    pub email_service: Arc<EmailService>,
    pub rate_limit_service: Arc<RateLimitService>,
}
