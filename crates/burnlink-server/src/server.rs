use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    handlers::{create_secret, get_secret, health},
    store::Store,
    AppState,
};

/// JSON request bodies larger than this are refused (100 KiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024;

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Comma-separated allowed origins ($BURNLINK_CORS_ORIGINS). `None` allows any.
    pub cors_origins: Option<String>,
    /// Request body limit in bytes ($BURNLINK_MAX_BODY_BYTES).
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("BURNLINK_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("BURNLINK_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            cors_origins: std::env::var("BURNLINK_CORS_ORIGINS").ok(),
            max_body_bytes: std::env::var("BURNLINK_MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
        }
    }
}

/// Assemble the HTTP surface around `state`.
pub fn build_router(state: AppState, cfg: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/secret", post(create_secret))
        .route("/api/secret/{id}", get(get_secret))
        .with_state(state)
        .layer(DefaultBodyLimit::max(cfg.max_body_bytes))
        .layer(build_cors(cfg.cors_origins.as_deref()))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(cfg: ServerConfig) -> Result<()> {
    // The store lives for the whole process; nothing survives a restart.
    let state = AppState {
        store: Store::new(),
    };
    let app = build_router(state, &cfg);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, max_body_bytes = cfg.max_body_bytes, "burnlink server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;

    axum::serve(listener, app).await.context("server error")
}

fn build_cors(origins: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(Any);

    match origins {
        Some(o) => {
            let origins: Vec<_> = o.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            cors.allow_origin(origins)
        }
        None => cors.allow_origin(Any),
    }
}
