//! Configuration management for the relay
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, a YAML configuration file,
//! `PROWL_RELAY_*` environment variables and command-line arguments.

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::notification::prowl::DEFAULT_PROWL_URL;
pub use crate::quiet_hours::Period;

/// Configuration file picked up from the working directory when present.
pub const LOCAL_CONFIG_FILE: &str = "./configuration.yaml";
/// Environment variable naming the configuration file.
pub const CONFIG_FILE_ENV: &str = "PROWL_RELAY_CONFIGURATION_FILE";
/// Older name of `CONFIG_FILE_ENV`, still honoured when that is unset.
pub const LEGACY_CONFIG_FILE_ENV: &str = "LOGGER_CONFIGURATION_FILE";
/// Fallback configuration file location.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/prowl-relay/configuration.yaml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The Prowl API key.
    #[serde(default)]
    pub token: String,
    /// Where delivered notifications are mirrored. Mirroring is off when absent.
    #[serde(
        rename = "elasticSearch",
        alias = "elastic_search",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub elastic_search: Option<ElasticsearchConfig>,
    /// Identifier of this relay instance, used in mirror document ids.
    #[serde(default)]
    pub host: String,
    /// The port the relay listens on.
    pub port: u16,
    /// Quiet hours during which notifications are dropped.
    #[serde(default)]
    pub ignore: Vec<Period>,
    /// The Prowl endpoint notifications are sent to.
    pub prowl_url: String,
    /// Timeout applied to each outbound request, in seconds.
    pub request_timeout_seconds: u64,
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the Prometheus exporter.
    pub metrics: MetricsConfig,
}

/// Configuration for the mirror store.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ElasticsearchConfig {
    /// Base URL of the store; `/_bulk` is appended.
    #[serde(default)]
    pub url: String,
}

/// Configuration for the Prometheus exporter.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Serve `/metrics` when set.
    pub enabled: bool,
    /// Address the metrics server binds to.
    pub listen_address: SocketAddr,
}

impl Config {
    /// Loads the application configuration.
    ///
    /// The file is `cli.config` when given, otherwise the first of
    /// `./configuration.yaml` (if it exists), `$PROWL_RELAY_CONFIGURATION_FILE`,
    /// `$LOGGER_CONFIGURATION_FILE` and `/etc/prowl-relay/configuration.yaml`.
    /// The chosen file must exist.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.clone().unwrap_or_else(resolve_config_path);
        if !config_path.is_file() {
            bail!("configuration file {} not found", config_path.display());
        }
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_path))
            // Allow overriding with environment variables, e.g., PROWL_RELAY_PORT=9000
            .merge(Env::prefixed("PROWL_RELAY_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }

    /// Returns the mirror store URL, if mirroring is configured.
    pub fn mirror_url(&self) -> Option<&str> {
        self.elastic_search
            .as_ref()
            .map(|es| es.url.as_str())
            .filter(|url| !url.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn resolve_config_path() -> PathBuf {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    [CONFIG_FILE_ENV, LEGACY_CONFIG_FILE_ENV]
        .iter()
        .filter_map(std::env::var_os)
        .find(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            elastic_search: None,
            host: String::new(),
            port: 8080,
            ignore: vec![],
            prowl_url: DEFAULT_PROWL_URL.to_string(),
            request_timeout_seconds: 30,
            log_level: "info".to_string(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_address: SocketAddr::from(([127, 0, 0, 1], 9090)),
        }
    }
}
