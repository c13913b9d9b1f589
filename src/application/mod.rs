//! Application Layer
//!
//! Use cases orchestrating the domain: one scrape cycle across all backends.

mod collector;

pub use collector::{probe_backend, BackendReport, Collector};
