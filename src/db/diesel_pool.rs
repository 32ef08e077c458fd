// Diesel database pool configuration
// Diesel-async + bb8 connection pooling over PostgreSQL

use bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};
use std::time::Duration;

// Embed migrations at compile time
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/diesel");

pub type DieselPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DieselDatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub test_on_checkout: bool,
}

impl Default for DieselDatabaseConfig {
    fn default() -> Self {
        let config = crate::app_config::config();
        Self {
            url: config.database_url.clone(),
            max_connections: config.database_max_connections,
            min_connections: config.database_min_connections,
            connection_timeout: Duration::from_secs(config.database_connect_timeout),
            idle_timeout: Duration::from_secs(config.database_idle_timeout),
            max_lifetime: Duration::from_secs(config.database_max_lifetime),
            test_on_checkout: true,
        }
    }
}

/// Create Diesel connection pool
pub async fn create_diesel_pool(
    config: DieselDatabaseConfig,
) -> Result<DieselPool, Box<dyn std::error::Error>> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.clone());

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(config.connection_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .test_on_check_out(config.test_on_checkout)
        .build(manager)
        .await?;

    // Test the connection
    let conn = pool.get().await?;
    drop(conn);

    tracing::info!(
        "Diesel pool initialized with {} max connections",
        config.max_connections
    );

    Ok(pool)
}

/// Health check for database pool
pub async fn check_diesel_health(pool: &DieselPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get().await?;

    // Getting a connection is enough; test_on_checkout validates it
    drop(conn);

    Ok(())
}

/// Mask database connection string for logging
pub fn mask_connection_string(url: &str) -> String {
    match url.split_once('@') {
        Some((scheme_and_creds, rest)) => {
            let scheme = scheme_and_creds
                .split_once("://")
                .map(|(s, _)| s)
                .unwrap_or("postgresql");
            format!("{}://***:***@{}", scheme, rest)
        },
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_connection_string_hides_credentials() {
        let masked = mask_connection_string("postgresql://user:secret@db:5432/gymkit");
        assert_eq!(masked, "postgresql://***:***@db:5432/gymkit");
        assert!(!masked.contains("secret"));
    }

    #[test]
    fn test_mask_connection_string_without_credentials() {
        let masked = mask_connection_string("postgresql://db:5432/gymkit");
        assert_eq!(masked, "postgresql://db:5432/gymkit");
    }
}
