//! Metric Registry
//!
//! The fixed set of metrics this exporter exposes, and the snapshot type a
//! collection cycle produces.

use std::fmt;

/// Prefix applied to every exposed metric name.
pub const NAMESPACE: &str = "ssdb";

/// Identifies one exposed metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricId {
    Up,
    DbSize,
    Links,
    ReplicationStatus,
    CommandCallTotal,
    CommandTimeWaitTotal,
    CommandTimeProcTotal,
    BuildInfo,
}

/// Prometheus value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    pub id: MetricId,
    /// Fully-qualified name, namespace included
    pub name: String,
    pub help: &'static str,
    /// Label names, in the order sample label values are given
    pub labels: &'static [&'static str],
    pub kind: MetricKind,
}

/// (id, subsystem, short name, help, labels, kind)
type DefinitionRow = (
    MetricId,
    &'static str,
    &'static str,
    &'static str,
    &'static [&'static str],
    MetricKind,
);

const DEFINITIONS: &[DefinitionRow] = &[
    (
        MetricId::Up,
        "",
        "up",
        "Whether the backend was reachable and its status response parsed successfully.",
        &["addr"],
        MetricKind::Gauge,
    ),
    (
        MetricId::DbSize,
        "",
        "db_size",
        "The estimated size of the database in bytes (may differ from disk usage). If the server has compression enabled, this is the compressed size.",
        &["addr"],
        MetricKind::Gauge,
    ),
    (
        MetricId::Links,
        "",
        "links",
        "The number of connections to the server.",
        &["addr"],
        MetricKind::Counter,
    ),
    (
        MetricId::ReplicationStatus,
        "",
        "replication_status",
        "Replication status for connected clients (1 = synchronous).",
        &["addr", "client"],
        MetricKind::Counter,
    ),
    (
        MetricId::CommandCallTotal,
        "",
        "command_call_total",
        "Total command calls.",
        &["addr", "command"],
        MetricKind::Counter,
    ),
    (
        MetricId::CommandTimeWaitTotal,
        "",
        "command_time_wait_total",
        "The time commands waited for processing.",
        &["addr", "command"],
        MetricKind::Counter,
    ),
    (
        MetricId::CommandTimeProcTotal,
        "",
        "command_time_proc_total",
        "The time consumed by command execution.",
        &["addr", "command"],
        MetricKind::Counter,
    ),
    (
        MetricId::BuildInfo,
        "exporter",
        "build_info",
        "A metric with a constant '1' value labeled by the exporter version.",
        &["version"],
        MetricKind::Gauge,
    ),
];

/// Join non-empty name parts with `_`.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Read-only table of metric definitions.
///
/// Built once at startup and shared by handle; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    definitions: Vec<MetricDefinition>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        let definitions = DEFINITIONS
            .iter()
            .map(|&(id, subsystem, name, help, labels, kind)| MetricDefinition {
                id,
                name: build_fq_name(NAMESPACE, subsystem, name),
                help,
                labels,
                kind,
            })
            .collect();
        Self { definitions }
    }

    /// Look up a definition. Every [`MetricId`] is registered.
    pub fn get(&self, id: MetricId) -> &MetricDefinition {
        &self.definitions[id as usize]
    }

    /// All definitions in registration order.
    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// One labeled value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: MetricId,
    /// Values matching the definition's label schema
    pub label_values: Vec<String>,
    pub value: f64,
}

impl Sample {
    pub fn new(metric: MetricId, label_values: Vec<String>, value: f64) -> Self {
        Self {
            metric,
            label_values,
            value,
        }
    }
}

/// All samples of one collection cycle. Order is not significant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    samples: Vec<Sample>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = Sample>) {
        self.samples.extend(samples);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Samples of a single metric.
    pub fn samples_for(&self, metric: MetricId) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(move |s| s.metric == metric)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fq_name() {
        assert_eq!(build_fq_name("ssdb", "", "up"), "ssdb_up");
        assert_eq!(
            build_fq_name("ssdb", "exporter", "build_info"),
            "ssdb_exporter_build_info"
        );
        assert_eq!(build_fq_name("", "", "x"), "x");
    }

    #[test]
    fn test_registry_indexes_match_ids() {
        let registry = MetricRegistry::new();
        for def in registry.definitions() {
            assert_eq!(registry.get(def.id).id, def.id);
        }
        assert_eq!(registry.definitions().len(), 8);
    }

    #[test]
    fn test_registry_schema() {
        let registry = MetricRegistry::new();

        let up = registry.get(MetricId::Up);
        assert_eq!(up.name, "ssdb_up");
        assert_eq!(up.labels, &["addr"]);
        assert_eq!(up.kind, MetricKind::Gauge);

        let links = registry.get(MetricId::Links);
        assert_eq!(links.name, "ssdb_links");
        assert_eq!(links.kind, MetricKind::Counter);

        let replication = registry.get(MetricId::ReplicationStatus);
        assert_eq!(replication.labels, &["addr", "client"]);

        for id in [
            MetricId::CommandCallTotal,
            MetricId::CommandTimeWaitTotal,
            MetricId::CommandTimeProcTotal,
        ] {
            let def = registry.get(id);
            assert_eq!(def.labels, &["addr", "command"]);
            assert_eq!(def.kind, MetricKind::Counter);
        }
    }

    #[test]
    fn test_metric_names_unique() {
        let registry = MetricRegistry::new();
        let mut names: Vec<_> = registry.definitions().iter().map(|d| &d.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), registry.definitions().len());
    }

    #[test]
    fn test_metric_kind_display() {
        assert_eq!(MetricKind::Gauge.to_string(), "gauge");
        assert_eq!(MetricKind::Counter.to_string(), "counter");
    }

    #[test]
    fn test_snapshot_samples_for() {
        let mut snapshot = Snapshot::new();
        assert!(snapshot.is_empty());

        snapshot.push(Sample::new(MetricId::Up, vec!["a:1".into()], 1.0));
        snapshot.extend(vec![
            Sample::new(MetricId::Up, vec!["b:2".into()], 0.0),
            Sample::new(MetricId::DbSize, vec!["a:1".into()], 10.0),
        ]);

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.samples_for(MetricId::Up).count(), 2);
        assert_eq!(snapshot.samples_for(MetricId::Links).count(), 0);
    }
}
