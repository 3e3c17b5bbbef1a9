mod comments;
pub mod error;
mod posts;
mod routes;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::FromRef;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::TokenService;
use crate::config::Config;
use crate::db::Database;

/// Shared application state, constructed once at startup and cloned into
/// every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub tokens: TokenService,
    pub started_at: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, db: Database) -> Self {
        let tokens = TokenService::new(&config.jwt_secret);
        Self {
            db,
            config: Arc::new(config),
            tokens,
            started_at: Instant::now(),
        }
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Build the router with all routes, CORS, and request tracing.
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    routes::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(config: Config, db: Database) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.web_host, config.web_port)
        .parse()
        .context("Invalid web server address")?;

    if config.using_dev_secret() {
        warn!("JWT_SECRET not set - using the insecure development secret");
    }

    let state = AppState::new(config, db);
    let app = create_app(state);

    info!(addr = %addr, "Starting HTTP web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app).await.context("Web server error")?;

    Ok(())
}
