use std::net::SocketAddr;

use axum::{http::HeaderValue, middleware, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gymkit_backend_core::{
    app_config, handlers, initialize_app_state, middleware::auth::tenant_middleware, AppState,
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gymkit_backend_core=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = app_config::config();
    info!(
        "Starting GymKit Backend on {} ({})",
        config.bind_address, config.environment
    );

    let state = match initialize_app_state().await {
        Ok(state) => state,
        Err(e) => {
            error!("Startup failed: {}", e);
            return Err(std::io::Error::other(format!("Startup failed: {}", e)));
        },
    };

    let app = build_router(state, &config.security.cors_allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on {}", config.bind_address);

    // ConnectInfo is required: webhook and job handlers rate-limit by peer IP
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    // Tenant-scoped API surface; the gateway forwards the resolved tenant
    let tenant_api = Router::new()
        .nest("/billing", handlers::billing_routes())
        .nest("/members", handlers::member_routes())
        .nest("/staff", handlers::staff_routes())
        .nest("/prospects", handlers::prospect_routes())
        .nest("/settings", handlers::settings_routes())
        .layer(middleware::from_fn(tenant_middleware));

    // Webhooks and job triggers carry their own authentication
    let api = Router::new()
        .route("/health", get(handlers::health))
        .nest("/webhooks", handlers::webhook_routes())
        .nest("/jobs", handlers::job_routes())
        .route("/docs/openapi.json", get(handlers::docs::serve_openapi_spec))
        .merge(tenant_api);

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
        .with_state(state)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}
