//! ssdb-exporter Library
//!
//! Polls SSDB servers with the `info` command and republishes their
//! statistics as Prometheus metrics. Exposed as a library for integration
//! tests.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use adapters::inbound::{ScrapeServer, ScrapeState};
pub use adapters::outbound::SsdbTransport;
pub use application::{BackendReport, Collector};
pub use config::{load_config, CliArgs, Config, ConfigError};
pub use domain::entities::{BackendAddress, CommandStats, ParsedStatus};
pub use domain::metrics::{MetricDefinition, MetricId, MetricKind, MetricRegistry, Sample, Snapshot};
pub use domain::ports::{StatusTransport, TransportError};
