//! `/metrics` and `/health` over HTTP for a running replay.

use crate::capture::OutputConfig;
use crate::metrics::{MetricsError, MetricsRegistry, MetricsSnapshot};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Errors from binding or serving the metrics endpoint.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind metrics listener: {0}")]
    Bind(#[from] std::io::Error),

    #[error("metrics server failed: {0}")]
    Server(String),
}

/// Where the metrics endpoint listens.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Listener address.
    pub bind_addr: SocketAddr,
}

impl MetricsServerConfig {
    /// Listener for the session's `[output]` table. `None` when
    /// `metrics_port` is 0.
    pub fn from_output(output: &OutputConfig) -> Option<Self> {
        (output.metrics_port != 0).then(|| Self {
            bind_addr: ([0, 0, 0, 0], output.metrics_port).into(),
        })
    }
}

/// Registry shared between the frame loop and the HTTP handlers.
pub struct MetricsState {
    registry: MetricsRegistry,
}

impl MetricsState {
    /// Pushes the latest engine snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.registry.update(snapshot);
    }

    /// Encodes the registry in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        self.registry.encode()
    }
}

/// Serves the PredictK registry to Prometheus scrapers.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: Arc<RwLock<MetricsState>>,
}

impl MetricsServer {
    /// Wraps `registry` for serving on `config.bind_addr`.
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState { registry })),
        }
    }

    /// Handle the frame loop publishes through.
    ///
    /// Threads outside the runtime call `state.blocking_read().update(..)`.
    pub fn state(&self) -> Arc<RwLock<MetricsState>> {
        Arc::clone(&self.state)
    }

    /// Serves until the runtime shuts down.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Serving PredictK metrics");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }
}

fn router(state: Arc<RwLock<MetricsState>>) -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .route("/health", get(|| async { (StatusCode::OK, "OK") }))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn scrape(State(state): State<Arc<RwLock<MetricsState>>>) -> impl IntoResponse {
    match state.read().await.encode() {
        Ok(text) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            text,
        ),
        Err(e) => {
            tracing::warn!("Metrics encoding failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                e.to_string(),
            )
        }
    }
}
