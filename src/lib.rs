// Library exports for the GymKit backend

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

use std::sync::Arc;
use tracing::info;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use db::{DieselPool, RedisConfig, RedisPool};
pub use middleware::auth::{tenant_middleware, AuthenticatedTenant};
pub use services::{
    BillingProvider, BillingStatus, CycleReport, EmailService, GateDecision, ProviderClient,
    RateLimitConfig, RateLimitService, ReminderSender, WebhookVerifier,
};
pub use utils::service_error::ServiceError;

/// Build the shared application state: pools, migrations, and services
pub async fn initialize_app_state() -> Result<AppState, Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = app_config::config();

    info!("Initializing database pool...");
    let db_config = db::DieselDatabaseConfig::default();
    let diesel_pool = db::create_diesel_pool(db_config).await?;

    if migrations::should_run_migrations() {
        info!("Running embedded migrations...");
        let migration_config = migrations::MigrationConfig::default();
        migrations::run_all_migrations(&diesel_pool, migration_config)
            .await
            .map_err(|e| format!("Migration failed: {}", e))?;
    }

    info!("Initializing Redis pool...");
    let redis_config = RedisConfig::from_env();
    let redis_pool = RedisPool::new(redis_config).await?;

    let webhook_verifier = Arc::new(WebhookVerifier::new(config.billing.webhook_secret.clone()));
    let provider_client = Arc::new(ProviderClient::from_config());
    let email_service = Arc::new(EmailService::new(config.email.clone())?);
    let rate_limit_service = Arc::new(RateLimitService::new(
        Box::new(services::RedisRateLimitStore::new(redis_pool.clone())),
        config.enable_rate_limiting,
    ));

    Ok(AppState {
        diesel_pool,
        redis_pool,
        webhook_verifier,
        provider_client,
        email_service,
        rate_limit_service,
    })
}
