//! GymLink messaging server entry point.
//!
//! Wires configuration, the PostgreSQL pool, the messaging engine, the REST
//! facade, and the WebSocket gateway into one axum application.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use sqlx::postgres::PgPoolOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use gymlink::adapters::auth::JwtSessionValidator;
use gymlink::adapters::http::middleware::{auth_middleware, AuthState};
use gymlink::adapters::http::{chat_routes, ChatHandlers};
use gymlink::adapters::postgres::{
    PostgresConversationStore, PostgresMessageStore, PostgresUserDirectory,
};
use gymlink::adapters::websocket::{gateway_router, ConnectionRegistry, GatewayState};
use gymlink::application::chat::ChatService;
use gymlink::config::{AppConfig, ServerConfig};
use gymlink::ports::SessionValidator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database migrations applied");

    let validator: Arc<dyn SessionValidator> =
        Arc::new(JwtSessionValidator::new(&config.auth.jwt_secret));
    let registry = Arc::new(ConnectionRegistry::with_default_capacity());

    let service = Arc::new(ChatService::new(
        Arc::new(PostgresConversationStore::new(pool.clone())),
        Arc::new(PostgresMessageStore::new(pool.clone())),
        Arc::new(PostgresUserDirectory::new(pool.clone())),
        registry.clone(),
        registry.clone(),
    ));

    let auth_state: AuthState = validator.clone();
    let api = chat_routes(ChatHandlers::new(service.clone()))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let gateway = gateway_router(GatewayState::new(service, registry, validator));

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .merge(gateway)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server));

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "GymLink messaging listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Liveness probe.
async fn health() -> &'static str {
    "OK"
}

/// CORS policy: explicit origins when configured, permissive in development.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins = server.cors_origins_list();
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<http::HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
