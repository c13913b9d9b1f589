//! Status Transport Port
//!
//! Defines the interface for fetching a backend's raw status report.

use crate::domain::entities::{BackendAddress, StatusTokens};
use async_trait::async_trait;
use std::time::Duration;

/// Fetches the `info` response of one backend.
///
/// This is an outbound port. Implementations must give up after `timeout`
/// so a single hung backend cannot stall a scrape cycle.
#[async_trait]
pub trait StatusTransport: Send + Sync {
    async fn fetch_status(
        &self,
        addr: &BackendAddress,
        timeout: Duration,
    ) -> Result<StatusTokens, TransportError>;
}

/// Failure to obtain a status response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(#[source] std::io::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
}
