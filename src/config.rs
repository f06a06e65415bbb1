//! Environment configuration

use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::ClientLookup;

pub const DEFAULT_REPORT_URL: &str = "https://analytics.schoolgram.io/issues/report-bug/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Service configuration, read once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub report_url: String,
    pub report_timeout: Duration,
    pub cache_ttl: Duration,
    /// `None` disables the background refresh task
    pub refresh_interval: Option<Duration>,
    pub client_map_path: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = get("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .context("Invalid LISTEN_ADDR")?;

        let report_url = get("REPORT_URL").unwrap_or_else(|| DEFAULT_REPORT_URL.to_string());

        let report_timeout = Duration::from_secs(secs(&get, "REPORT_TIMEOUT_SECS", 30)?);
        let cache_ttl = Duration::from_secs(secs(&get, "CACHE_TTL_SECS", 3600)?);

        let refresh_interval = match secs(&get, "REFRESH_INTERVAL_SECS", 0)? {
            0 => None,
            n => Some(Duration::from_secs(n)),
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("Invalid LOG_FORMAT '{}'. Valid options: text, json", other),
        };

        Ok(Self {
            listen_addr,
            report_url,
            report_timeout,
            cache_ttl,
            refresh_interval,
            client_map_path: get("CLIENT_MAP_PATH").map(PathBuf::from),
            log_format,
        })
    }

    /// Load the host lookup table, or an empty one when no path is configured.
    pub fn client_lookup(&self) -> Result<ClientLookup> {
        match &self.client_map_path {
            Some(path) => load_client_lookup(path),
            None => Ok(ClientLookup::default()),
        }
    }
}

fn secs<F>(get: &F, key: &str, default: u64) -> anyhow::Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

/// Read a `{"<host id>": "<client name>"}` JSON file.
pub fn load_client_lookup(path: &Path) -> Result<ClientLookup> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    serde_json::from_str(&raw)
        .map_err(|e| AppError::Config(format!("Invalid client map {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HostRef;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.report_url, DEFAULT_REPORT_URL);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.refresh_interval, None);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.client_lookup().unwrap().is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("CACHE_TTL_SECS", "60"),
            ("REFRESH_INTERVAL_SECS", "300"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(300)));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config(&[("CACHE_TTL_SECS", "an hour")]).is_err());
        assert!(config(&[("LISTEN_ADDR", "nowhere")]).is_err());
        assert!(config(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_load_client_lookup() {
        let path = std::env::temp_dir().join(format!("clients-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"5": "hhrd"}"#).unwrap();

        let lookup = load_client_lookup(&path).unwrap();
        assert_eq!(lookup.label(HostRef::Id(5)), "hhrd");

        std::fs::write(&path, r#"{"five": "hhrd"}"#).unwrap();
        assert!(matches!(load_client_lookup(&path), Err(AppError::Config(_))));

        std::fs::remove_file(&path).unwrap();
        assert!(load_client_lookup(&path).is_err());
    }
}
