//! Configuration loaded from the YAML settings file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::core::ImageConfig;
use crate::utils::validate_config;

pub const DEFAULT_CONFIG_PATH: &str = "optimizer.yaml";
pub const DEFAULT_FTP_PORT: u16 = 21;
pub const DEFAULT_TRANSFORM_ENDPOINT: &str = "https://api.tinify.com";
const API_KEY_ENV: &str = "TINIFY_API_KEY";

/// Directory listing format the remote server produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingDialect {
    #[default]
    Windows,
    Posix,
}

/// Settings for the external transform service.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// HTTP timeout per request; transport default when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Everything a run needs to know about the remote store, the public
/// image url and the variant sizes.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Public url the remote directories are served under
    pub base_url: String,
    #[serde(default)]
    pub listing_dialect: ListingDialect,
    /// Remote directories to scan, in order
    pub directories: Vec<String>,
    pub image_settings: ImageConfig,
    pub transform: TransformConfig,
}

fn default_port() -> u16 {
    DEFAULT_FTP_PORT
}

fn default_endpoint() -> String {
    DEFAULT_TRANSFORM_ENDPOINT.to_string()
}

impl AppConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: AppConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML config")?;
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                debug!("Using transform api key from {}", API_KEY_ENV);
                config.transform.api_key = key;
            }
        }
        validate_config(&config)?;
        Ok(config)
    }

    /// `host:port` string for the FTP connection.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    AppConfig::from_yaml(&content)
        .with_context(|| format!("Invalid config in {}", path.display()))
}
