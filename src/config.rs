use crate::domain::entities::BackendAddress;
use clap::Parser;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_SSDB_LIST: &str = "localhost:8888";
const DEFAULT_BIND_ADDR: &str = ":9142";
const DEFAULT_METRICS_PATH: &str = "/metrics";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_SSDB_TIMEOUT_MS: u64 = 3000;
const DEFAULT_SCRAPE_TIMEOUT_MS: u64 = 10000;

/// Prometheus exporter for SSDB servers.
///
/// Environment variables of the same name (`SSDB_LIST`, `BIND_ADDR`,
/// `METRICS_PATH`, `LOG_LEVEL`) take priority over these flags.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "ssdb_exporter")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Bind address for the metrics server
    #[arg(long = "bind-addr", default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: String,

    /// Path to the metrics endpoint
    #[arg(long = "metrics-path", default_value = DEFAULT_METRICS_PATH)]
    pub metrics_path: String,

    /// host1:port1,host2:port2 of the SSDB servers to scrape
    #[arg(long = "ssdb-list", default_value = DEFAULT_SSDB_LIST)]
    pub ssdb_list: String,

    /// Log level
    #[arg(long = "log-level", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            ssdb_list: DEFAULT_SSDB_LIST.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Backends to scrape, in configuration order
    pub ssdb_list: Vec<BackendAddress>,
    /// Repeated entries dropped from `ssdb_list`
    pub duplicate_backends: Vec<BackendAddress>,
    pub bind_addr: String,
    pub metrics_path: String,
    pub log_level: tracing::Level,
    /// Per-backend transport timeout
    pub backend_timeout: Duration,
    /// Whole-cycle timeout for one scrape
    pub scrape_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ssdb_list: vec![BackendAddress::new(DEFAULT_SSDB_LIST)],
            duplicate_backends: Vec::new(),
            bind_addr: normalize_bind_addr(DEFAULT_BIND_ADDR),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            log_level: tracing::Level::INFO,
            backend_timeout: Duration::from_millis(DEFAULT_SSDB_TIMEOUT_MS),
            scrape_timeout: Duration::from_millis(DEFAULT_SCRAPE_TIMEOUT_MS),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("SSDB_LIST contains no backend addresses")]
    NoBackends,
    #[error("invalid metrics path {0:?}: must start with '/' and not clash with '/' or '/health'")]
    InvalidMetricsPath(String),
    #[error("not a valid log level: {0:?}")]
    InvalidLogLevel(String),
    #[error("backend timeout {backend:?} must be shorter than scrape timeout {scrape:?}")]
    TimeoutOrder { backend: Duration, scrape: Duration },
}

impl Config {
    /// Build a configuration from a variable lookup alone, with flag defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(&CliArgs::default(), lookup)
    }

    /// Merge command-line flags with a variable lookup (the environment, in
    /// production). Set, non-empty variables win over flags.
    pub fn resolve<F>(cli: &CliArgs, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let (ssdb_list, duplicate_backends) = dedup(BackendAddress::parse_list(
            &var("SSDB_LIST").unwrap_or_else(|| cli.ssdb_list.clone()),
        ));
        if ssdb_list.is_empty() {
            return Err(ConfigError::NoBackends);
        }

        let bind_addr =
            normalize_bind_addr(&var("BIND_ADDR").unwrap_or_else(|| cli.bind_addr.clone()));

        let metrics_path = var("METRICS_PATH").unwrap_or_else(|| cli.metrics_path.clone());
        if !metrics_path.starts_with('/') || metrics_path == "/" || metrics_path == "/health" {
            return Err(ConfigError::InvalidMetricsPath(metrics_path));
        }

        let log_level =
            parse_log_level(&var("LOG_LEVEL").unwrap_or_else(|| cli.log_level.clone()))?;

        let backend_timeout = Duration::from_millis(
            var("SSDB_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SSDB_TIMEOUT_MS),
        );

        let scrape_timeout = Duration::from_millis(
            var("SCRAPE_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SCRAPE_TIMEOUT_MS),
        );

        // A hung backend must time out on its own before the scrape does
        if backend_timeout >= scrape_timeout {
            return Err(ConfigError::TimeoutOrder {
                backend: backend_timeout,
                scrape: scrape_timeout,
            });
        }

        Ok(Config {
            ssdb_list,
            duplicate_backends,
            bind_addr,
            metrics_path,
            log_level,
            backend_timeout,
            scrape_timeout,
        })
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    let cli = CliArgs::parse();
    Ok(Config::resolve(&cli, |key| std::env::var(key).ok())?)
}

/// Accepts the usual level names plus `warning`, `fatal` and `panic`.
fn parse_log_level(raw: &str) -> Result<tracing::Level, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "warning" => Ok(tracing::Level::WARN),
        "fatal" | "panic" => Ok(tracing::Level::ERROR),
        other => tracing::Level::from_str(other)
            .map_err(|_| ConfigError::InvalidLogLevel(raw.to_string())),
    }
}

/// A bare `:port` listens on all interfaces.
fn normalize_bind_addr(addr: &str) -> String {
    let addr = addr.trim();
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}

/// Split into first occurrences and the repeats that were dropped.
fn dedup(addrs: Vec<BackendAddress>) -> (Vec<BackendAddress>, Vec<BackendAddress>) {
    let mut unique: Vec<BackendAddress> = Vec::with_capacity(addrs.len());
    let mut duplicates = Vec::new();
    for addr in addrs {
        if unique.contains(&addr) {
            duplicates.push(addr);
        } else {
            unique.push(addr);
        }
    }
    (unique, duplicates)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9142");
        assert_eq!(cfg.metrics_path, "/metrics");
        assert_eq!(cfg.ssdb_list, vec![BackendAddress::new("localhost:8888")]);
        assert_eq!(cfg.log_level, tracing::Level::INFO);
    }

    #[test]
    fn test_load_config_defaults() {
        let cfg = load(&[]).unwrap();
        let default = Config::default();
        assert_eq!(cfg.ssdb_list, default.ssdb_list);
        assert_eq!(cfg.bind_addr, default.bind_addr);
        assert_eq!(cfg.metrics_path, default.metrics_path);
        assert_eq!(cfg.backend_timeout, default.backend_timeout);
        assert_eq!(cfg.scrape_timeout, default.scrape_timeout);
    }

    #[test]
    fn test_load_config_with_ssdb_list() {
        let cfg = load(&[("SSDB_LIST", "10.0.0.1:8888, 10.0.0.2:8888")]).unwrap();
        assert_eq!(
            cfg.ssdb_list,
            vec![
                BackendAddress::new("10.0.0.1:8888"),
                BackendAddress::new("10.0.0.2:8888"),
            ]
        );
    }

    #[test]
    fn test_load_config_dedups_ssdb_list() {
        let cfg = load(&[("SSDB_LIST", "a:1,b:2,a:1")]).unwrap();
        assert_eq!(cfg.ssdb_list.len(), 2);
        assert_eq!(cfg.ssdb_list[0].as_str(), "a:1");
        assert_eq!(cfg.ssdb_list[1].as_str(), "b:2");
        assert_eq!(cfg.duplicate_backends, vec![BackendAddress::new("a:1")]);
    }

    #[test]
    fn test_load_config_no_duplicates() {
        let cfg = load(&[("SSDB_LIST", "a:1,b:2")]).unwrap();
        assert!(cfg.duplicate_backends.is_empty());
    }

    #[test]
    fn test_load_config_empty_ssdb_list() {
        assert_eq!(load(&[("SSDB_LIST", " , ")]).unwrap_err(), ConfigError::NoBackends);
    }

    #[test]
    fn test_load_config_with_bind_addr() {
        let cfg = load(&[("BIND_ADDR", "127.0.0.1:9000")]).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");

        let cfg = load(&[("BIND_ADDR", ":9100")]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9100");
    }

    #[test]
    fn test_load_config_with_metrics_path() {
        let cfg = load(&[("METRICS_PATH", "/probe")]).unwrap();
        assert_eq!(cfg.metrics_path, "/probe");
    }

    #[test]
    fn test_load_config_invalid_metrics_path() {
        for path in ["metrics", "/", "/health"] {
            assert_eq!(
                load(&[("METRICS_PATH", path)]).unwrap_err(),
                ConfigError::InvalidMetricsPath(path.to_string())
            );
        }
    }

    #[test]
    fn test_load_config_log_levels() {
        let cases = [
            ("debug", tracing::Level::DEBUG),
            ("INFO", tracing::Level::INFO),
            ("warn", tracing::Level::WARN),
            ("warning", tracing::Level::WARN),
            ("error", tracing::Level::ERROR),
            ("fatal", tracing::Level::ERROR),
            ("trace", tracing::Level::TRACE),
        ];
        for (raw, level) in cases {
            assert_eq!(load(&[("LOG_LEVEL", raw)]).unwrap().log_level, level);
        }
    }

    #[test]
    fn test_load_config_invalid_log_level() {
        let err = load(&[("LOG_LEVEL", "loud")]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidLogLevel("loud".to_string()));
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_load_config_with_timeouts() {
        let cfg = load(&[("SSDB_TIMEOUT_MS", "500"), ("SCRAPE_TIMEOUT_MS", "2000")]).unwrap();
        assert_eq!(cfg.backend_timeout, Duration::from_millis(500));
        assert_eq!(cfg.scrape_timeout, Duration::from_millis(2000));
    }

    #[test]
    fn test_load_config_parse_error_uses_default() {
        let cfg = load(&[("SSDB_TIMEOUT_MS", "not_a_number")]).unwrap();
        assert_eq!(cfg.backend_timeout, Duration::from_millis(3000)); // default
    }

    #[test]
    fn test_load_config_empty_vars_use_defaults() {
        let cfg = load(&[
            ("SSDB_LIST", ""),
            ("BIND_ADDR", ""),
            ("METRICS_PATH", ""),
            ("LOG_LEVEL", ""),
            ("SSDB_TIMEOUT_MS", ""),
        ])
        .unwrap();
        let default = Config::default();
        assert_eq!(cfg.ssdb_list, default.ssdb_list);
        assert_eq!(cfg.bind_addr, default.bind_addr);
        assert_eq!(cfg.metrics_path, default.metrics_path);
        assert_eq!(cfg.log_level, default.log_level);
        assert_eq!(cfg.backend_timeout, default.backend_timeout);
    }

    #[test]
    fn test_load_config_backend_timeout_not_below_scrape_timeout() {
        let err = load(&[("SSDB_TIMEOUT_MS", "15000")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::TimeoutOrder {
                backend: Duration::from_secs(15),
                scrape: Duration::from_secs(10),
            }
        );

        let err = load(&[("SSDB_TIMEOUT_MS", "2000"), ("SCRAPE_TIMEOUT_MS", "2000")]).unwrap_err();
        assert!(matches!(err, ConfigError::TimeoutOrder { .. }));
        assert!(err.to_string().contains("shorter than scrape timeout"));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = CliArgs::try_parse_from(["ssdb_exporter"]).unwrap();
        assert_eq!(cli, CliArgs::default());
    }

    #[test]
    fn test_cli_flags() {
        let cli = CliArgs::try_parse_from([
            "ssdb_exporter",
            "--bind-addr",
            ":9200",
            "--metrics-path",
            "/ssdb",
            "--ssdb-list",
            "10.0.0.1:8888,10.0.0.2:8888",
            "--log-level",
            "debug",
        ])
        .unwrap();

        let cfg = Config::resolve(&cli, |_| None).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9200");
        assert_eq!(cfg.metrics_path, "/ssdb");
        assert_eq!(cfg.ssdb_list.len(), 2);
        assert_eq!(cfg.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_env_overrides_cli_flags() {
        let cli = CliArgs::try_parse_from([
            "ssdb_exporter",
            "--ssdb-list",
            "flag:1",
            "--log-level",
            "debug",
            "--metrics-path",
            "/ssdb",
        ])
        .unwrap();
        let env: HashMap<String, String> = [
            ("SSDB_LIST", "env:1,env:2"),
            ("LOG_LEVEL", "warn"),
            ("METRICS_PATH", ""),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let cfg = Config::resolve(&cli, |key| env.get(key).cloned()).unwrap();
        assert_eq!(
            cfg.ssdb_list,
            vec![BackendAddress::new("env:1"), BackendAddress::new("env:2")]
        );
        assert_eq!(cfg.log_level, tracing::Level::WARN);
        // Empty variable leaves the flag in place
        assert_eq!(cfg.metrics_path, "/ssdb");
        assert_eq!(cfg.bind_addr, "0.0.0.0:9142");
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(CliArgs::try_parse_from(["ssdb_exporter", "--port", "1"]).is_err());
    }

    #[test]
    fn test_config_debug() {
        let cfg = Config::default();
        let debug_str = format!("{:?}", cfg);
        assert!(debug_str.contains("bind_addr"));
        assert!(debug_str.contains("0.0.0.0:9142"));
    }
}
