//! ssdb-exporter - Prometheus exporter for SSDB
//!
//! This is the composition root that wires together all the components.

use ssdb_exporter::adapters::inbound::{ScrapeServer, ScrapeState};
use ssdb_exporter::adapters::outbound::SsdbTransport;
use ssdb_exporter::application::Collector;
use ssdb_exporter::config::load_config;
use ssdb_exporter::domain::metrics::MetricRegistry;
use ssdb_exporter::infrastructure::shutdown_signal;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from flags and environment; invalid settings are fatal
    let cfg = load_config()?;

    tracing_subscriber::fmt()
        .with_max_level(cfg.log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting ssdb_exporter version={} backends={}",
        env!("CARGO_PKG_VERSION"),
        cfg.ssdb_list.len()
    );
    for addr in &cfg.duplicate_backends {
        tracing::warn!("ignoring duplicate backend address {}", addr);
    }
    for addr in &cfg.ssdb_list {
        tracing::debug!("scraping backend {}", addr);
    }

    // ===== COMPOSITION ROOT =====

    let transport = Arc::new(SsdbTransport::new());
    let collector = Arc::new(Collector::new(transport, cfg.backend_timeout));
    let registry = Arc::new(MetricRegistry::new());

    let state = ScrapeState::new(
        collector,
        registry,
        cfg.ssdb_list.clone(),
        cfg.metrics_path.clone(),
        cfg.scrape_timeout,
    );

    let server = ScrapeServer::new(cfg.bind_addr.clone(), state);
    server.run(shutdown_signal()).await
}
