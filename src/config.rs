//! Runtime configuration from `KUV_*` environment variables (optionally via `.env`).

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 8;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub refresh_interval: Duration,
    pub auto_refresh: bool,
    pub fetch_timeout: Duration,
    /// kubeconfig context; `None` uses the current one (or in-cluster config)
    pub kube_context: Option<String>,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            auto_refresh: true,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            kube_context: None,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn load() -> Self {
        // a missing .env file is normal
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; invalid values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let refresh_interval = parse_secs(&lookup, "KUV_REFRESH_INTERVAL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.refresh_interval);

        let fetch_timeout = parse_secs(&lookup, "KUV_FETCH_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);

        let auto_refresh = match lookup("KUV_AUTO_REFRESH") {
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                warn!("Ignoring KUV_AUTO_REFRESH={:?}: expected a boolean", raw);
                defaults.auto_refresh
            }),
            None => defaults.auto_refresh,
        };

        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            refresh_interval,
            auto_refresh,
            fetch_timeout,
            kube_context: non_empty("KUV_KUBE_CONTEXT"),
            log_dir: non_empty("KUV_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_level: non_empty("KUV_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }
}

/// Whole seconds, at least 1.
fn parse_secs<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs >= 1 => Some(secs),
        _ => {
            warn!("Ignoring {}={:?}: expected whole seconds >= 1", key, raw);
            None
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
