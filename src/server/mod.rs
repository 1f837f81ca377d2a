//! HTTP surface over the pipeline.

mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{PexError, Result};
use crate::pipeline::{DocumentSource, Pipeline};

pub use error::ApiError;

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub source: Arc<dyn DocumentSource>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, source: Arc<dyn DocumentSource>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            source,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/export", post(handlers::export))
        .route("/api/batch", post(handlers::batch))
        .route("/api/platforms", get(handlers::platforms))
        .route("/api/formats", get(handlers::formats))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|err| PexError::Config(format!("invalid bind address '{addr}': {err}")))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "promptex server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            // Resolves on Ctrl-C; a failed signal handler shuts down immediately.
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    info!("server stopped");
    Ok(())
}
