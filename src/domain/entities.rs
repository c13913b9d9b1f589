//! Domain Entities
//!
//! Core data types for backends and their parsed status reports.

use std::collections::BTreeMap;
use std::fmt;

/// Network address of one SSDB instance (`host:port`).
///
/// Used verbatim as the `addr` label, so it is never normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendAddress(String);

impl BackendAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a comma-separated address list, dropping blank entries.
    pub fn parse_list(list: &str) -> Vec<BackendAddress> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(BackendAddress::new)
            .collect()
    }
}

impl fmt::Display for BackendAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Raw decoded response blocks for one backend.
pub type StatusTokens = Vec<String>;

/// Cumulative per-command counters, as reported (numeric text, not coerced).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandStats {
    pub calls: String,
    pub wait_time: String,
    pub proc_time: String,
}

/// Structured result of parsing one backend's `info` response.
///
/// Absent fields mean "no value", never an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedStatus {
    /// Estimated database size in bytes
    pub db_size: Option<String>,
    /// Open connection count
    pub links: Option<String>,
    /// Replication client id -> 1 when synchronous, else 0
    pub replication: BTreeMap<String, u8>,
    /// Command name -> counters
    pub commands: BTreeMap<String, CommandStats>,
    /// Success marker and required fields were all found
    pub well_formed: bool,
}
