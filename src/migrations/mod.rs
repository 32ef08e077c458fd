// Migration orchestrator for the GymKit backend
// Embedded in the application binary for distroless container compatibility

pub mod diesel;

use crate::db::DieselPool;
use std::error::Error;
use tracing::info;

/// Configuration for migration execution
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub skip_diesel: bool,
    pub environment: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        let config = crate::app_config::config();

        Self {
            skip_diesel: false,
            environment: config.environment.to_string(),
        }
    }
}

/// Run all pending migrations
pub async fn run_all_migrations(
    diesel_pool: &DieselPool,
    config: MigrationConfig,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!(
        "[MIGRATIONS] Starting migration process for environment: {}",
        config.environment
    );

    if !config.skip_diesel {
        let applied = diesel::run_migrations(diesel_pool).await?;
        info!("[MIGRATIONS] Applied {} PostgreSQL migrations", applied);
    }

    Ok(())
}

/// Whether embedded migrations should run at startup
pub fn should_run_migrations() -> bool {
    !crate::app_config::config().disable_embedded_migrations
}
