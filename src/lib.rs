pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod csrf;
pub mod db;
pub mod jwt;
pub mod rate_limit;

use api::create_api_router;
use auth::AuthService;
use axum::{Json, Router, routing::get};
use config::AuthConfig;
use db::Database;
use rate_limit::RateLimitConfig;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Signing keys and cookie policy
    pub auth: AuthConfig,
    /// Login attempts allowed per client per minute
    pub login_rate_per_minute: u32,
    /// bcrypt cost for new password hashes
    pub password_cost: u32,
    /// Proxy header for client IPs; `None` uses the socket address
    pub ip_extractor: Option<cli::IpExtractor>,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let auth = Arc::new(AuthService::new(&config.auth));
    let rate_limit_config = Arc::new(RateLimitConfig::new(
        config.login_rate_per_minute,
        config.ip_extractor,
    ));

    let api_router = create_api_router(
        config.db.clone(),
        auth,
        rate_limit_config,
        config.password_cost,
    );

    Router::new()
        .route("/", get(root))
        .nest("/api", api_router)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "welcome to the todo API" }))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> std::io::Result<(tokio::task::JoinHandle<()>, SocketAddr)> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
