//! Axum web server implementation for the trace API.

use std::net::SocketAddr;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::visualize::{list_languages, visualize};
use super::state::WebAppState;
use crate::config::ServerSettings;

/// Server configuration options.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable CORS for any origin.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerSettings::default().into()
    }
}

impl From<ServerSettings> for ServerConfig {
    fn from(settings: ServerSettings) -> Self {
        Self {
            host: settings.host,
            port: settings.port,
            cors_permissive: settings.cors_permissive,
        }
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint handler.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the Axum router with all routes.
pub fn build_router(state: WebAppState, cors_permissive: bool) -> Router {
    let cors = if cors_permissive {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    };

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/languages", get(list_languages))
        .route("/visualize", post(visualize));

    Router::new()
        .route("/visualize", post(visualize))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the web server.
///
/// This starts the Axum server and blocks until shutdown.
pub async fn run_server(state: WebAppState, config: ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let missing = state.core().tools().missing();
    for tool in missing {
        tracing::warn!(
            tool = tool.display_name(),
            "{} not found; {}",
            tool.display_name(),
            tool.install_instructions()
        );
    }
    let app = build_router(state, config.cors_permissive);

    tracing::info!("Starting web server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
