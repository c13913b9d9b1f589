//! Scrape Server
//!
//! HTTP endpoint that runs a fresh collection cycle on every request and
//! returns it in the Prometheus text format.

use super::exposition::{render, CONTENT_TYPE};
use crate::application::Collector;
use crate::domain::entities::BackendAddress;
use crate::domain::metrics::MetricRegistry;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backends: usize,
}

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct ScrapeState {
    pub collector: Arc<Collector>,
    pub registry: Arc<MetricRegistry>,
    pub addresses: Arc<[BackendAddress]>,
    pub metrics_path: String,
    /// Upper bound for one whole collection cycle
    pub scrape_timeout: Duration,
}

impl ScrapeState {
    pub fn new(
        collector: Arc<Collector>,
        registry: Arc<MetricRegistry>,
        addresses: Vec<BackendAddress>,
        metrics_path: impl Into<String>,
        scrape_timeout: Duration,
    ) -> Self {
        Self {
            collector,
            registry,
            addresses: addresses.into(),
            metrics_path: metrics_path.into(),
            scrape_timeout,
        }
    }
}

/// Build the router: landing page, health, and the metrics path.
pub fn router(state: ScrapeState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(&state.metrics_path, get(metrics_handler))
        .with_state(state)
}

/// Scrape endpoint server.
pub struct ScrapeServer {
    listen_addr: String,
    state: ScrapeState,
}

impl ScrapeServer {
    pub fn new(listen_addr: String, state: ScrapeState) -> Self {
        Self { listen_addr, state }
    }

    /// Serve until `shutdown` completes, then drain in-flight requests.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run<F>(&self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state.clone()).layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!(
            "serving metrics on http://{}{}",
            self.listen_addr,
            self.state.metrics_path
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("metrics server stopped");
        Ok(())
    }
}

// Handler functions

async fn root_handler(State(state): State<ScrapeState>) -> Html<String> {
    Html(format!(
        r#"<html>
<head><title>SSDB Exporter</title></head>
<body>
<h1>SSDB Exporter</h1>
<p><a href="{}">Metrics</a></p>
</body>
</html>
"#,
        state.metrics_path
    ))
}

async fn health_handler(State(state): State<ScrapeState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backends: state.addresses.len(),
    })
}

async fn metrics_handler(State(state): State<ScrapeState>) -> Response {
    let cycle = state.collector.collect(&state.addresses);

    match tokio::time::timeout(state.scrape_timeout, cycle).await {
        Ok(snapshot) => (
            [(header::CONTENT_TYPE, CONTENT_TYPE)],
            render(&state.registry, &snapshot),
        )
            .into_response(),
        Err(_) => {
            tracing::warn!(
                "scrape exceeded {:?}, discarding partial results",
                state.scrape_timeout
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("scrape timed out after {:?}\n", state.scrape_timeout),
            )
                .into_response()
        }
    }
}
