//! Collector - the scrape use case
//!
//! Fans out one probe per backend, parses each response, and merges the
//! per-backend results into a single [`Snapshot`].

use crate::domain::entities::{BackendAddress, ParsedStatus};
use crate::domain::metrics::{MetricId, Sample, Snapshot};
use crate::domain::ports::StatusTransport;
use crate::domain::services::{parse, parse_float_or_zero};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Outcome of probing one backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReport {
    pub addr: BackendAddress,
    /// Transport call succeeded
    pub reachable: bool,
    pub status: ParsedStatus,
}

impl BackendReport {
    pub fn unreachable(addr: BackendAddress) -> Self {
        Self {
            addr,
            reachable: false,
            status: ParsedStatus::default(),
        }
    }

    /// Liveness: reachable and the response was well formed.
    pub fn is_up(&self) -> bool {
        self.reachable && self.status.well_formed
    }

    /// Translate into labeled samples.
    ///
    /// Always yields `up`, `db_size` and `links`; map entries only when present.
    pub fn into_samples(self) -> Vec<Sample> {
        let addr = self.addr.to_string();
        let up = if self.is_up() { 1.0 } else { 0.0 };
        let status = self.status;

        let mut samples = vec![
            Sample::new(MetricId::Up, vec![addr.clone()], up),
            Sample::new(MetricId::DbSize, vec![addr.clone()], coerce(&status.db_size)),
            Sample::new(MetricId::Links, vec![addr.clone()], coerce(&status.links)),
        ];

        for (client, sync) in status.replication {
            samples.push(Sample::new(
                MetricId::ReplicationStatus,
                vec![addr.clone(), client],
                f64::from(sync),
            ));
        }

        for (command, stats) in status.commands {
            samples.push(Sample::new(
                MetricId::CommandCallTotal,
                vec![addr.clone(), command.clone()],
                parse_float_or_zero(&stats.calls),
            ));
            samples.push(Sample::new(
                MetricId::CommandTimeWaitTotal,
                vec![addr.clone(), command.clone()],
                parse_float_or_zero(&stats.wait_time),
            ));
            samples.push(Sample::new(
                MetricId::CommandTimeProcTotal,
                vec![addr.clone(), command],
                parse_float_or_zero(&stats.proc_time),
            ));
        }

        samples
    }
}

fn coerce(value: &Option<String>) -> f64 {
    value.as_deref().map_or(0.0, parse_float_or_zero)
}

/// Collects one snapshot per call; holds no state between cycles.
pub struct Collector {
    transport: Arc<dyn StatusTransport>,
    backend_timeout: Duration,
}

impl Collector {
    pub fn new(transport: Arc<dyn StatusTransport>, backend_timeout: Duration) -> Self {
        Self {
            transport,
            backend_timeout,
        }
    }

    /// Run one collection cycle across `addresses`.
    ///
    /// Each address is probed in its own task; the cycle returns once every
    /// task has finished. Dropping the returned future aborts all probes.
    pub async fn collect(&self, addresses: &[BackendAddress]) -> Snapshot {
        let mut tasks = JoinSet::new();
        for (idx, addr) in addresses.iter().enumerate() {
            let transport = self.transport.clone();
            let addr = addr.clone();
            let timeout = self.backend_timeout;
            tasks.spawn(async move { (idx, probe_backend(&*transport, addr, timeout).await) });
        }

        let mut reports: Vec<Option<BackendReport>> = vec![None; addresses.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, report)) => reports[idx] = Some(report),
                Err(e) => tracing::error!("backend probe task failed: {}", e),
            }
        }

        let mut snapshot = Snapshot::new();
        snapshot.push(Sample::new(
            MetricId::BuildInfo,
            vec![env!("CARGO_PKG_VERSION").to_string()],
            1.0,
        ));
        for (addr, report) in addresses.iter().zip(reports) {
            let report = report.unwrap_or_else(|| BackendReport::unreachable(addr.clone()));
            snapshot.extend(report.into_samples());
        }

        let up = snapshot
            .samples_for(MetricId::Up)
            .filter(|s| s.value > 0.0)
            .count();
        tracing::debug!(
            "collected {} samples, {}/{} backends up",
            snapshot.len(),
            up,
            addresses.len()
        );

        snapshot
    }
}

/// Fetch and parse the status of a single backend.
pub async fn probe_backend(
    transport: &dyn StatusTransport,
    addr: BackendAddress,
    timeout: Duration,
) -> BackendReport {
    match transport.fetch_status(&addr, timeout).await {
        Ok(tokens) => {
            let status = parse(&tokens);
            if !status.well_formed {
                tracing::warn!("backend {} returned a malformed status response", addr);
            }
            BackendReport {
                addr,
                reachable: true,
                status,
            }
        }
        Err(e) => {
            tracing::warn!("backend {} unreachable: {}", addr, e);
            BackendReport::unreachable(addr)
        }
    }
}
