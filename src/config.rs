use crate::collectors::CommonLabels;
use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub vsa: VsaConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VsaConfig {
    /// Base URL of the management API, e.g. `https://vsa.local`
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: SecretString,
    /// Skip TLS certificate validation (self-signed appliances)
    #[serde(default)]
    pub ignore_certs: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_collector_timeout")]
    pub collector_timeout_seconds: u64,
    #[serde(default = "default_common_labels")]
    pub common_labels: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            collector_timeout_seconds: default_collector_timeout(),
            common_labels: default_common_labels(),
        }
    }
}

fn default_password() -> SecretString {
    SecretString::from("")
}

fn default_request_timeout() -> u64 {
    30
}

fn default_login_path() -> String {
    "api/v1/login".to_string()
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9192
}

fn default_poll_interval() -> u64 {
    10
}

fn default_collector_timeout() -> u64 {
    30
}

fn default_common_labels() -> Vec<String> {
    vec!["node_name".to_string()]
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("vsa.url", "")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VSA_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Check the settings the poll loop cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.vsa.url.is_empty() {
            bail!("VSA URL is not set (use --vsa-url or VSA_URL)");
        }
        if !(self.vsa.url.starts_with("http://") || self.vsa.url.starts_with("https://")) {
            bail!("VSA URL must start with http:// or https://: {}", self.vsa.url);
        }
        if self.metrics.poll_interval_seconds == 0 {
            bail!("poll_interval_seconds must be greater than zero");
        }
        if self.metrics.collector_timeout_seconds == 0 {
            bail!("collector_timeout_seconds must be greater than zero");
        }
        self.common_labels()?;
        Ok(())
    }

    /// Parse the configured common label names.
    pub fn common_labels(&self) -> Result<CommonLabels> {
        CommonLabels::parse(&self.metrics.common_labels).context("Invalid common_labels")
    }
}

/// Parse a boolean switch given as `1`/`0`, `true`/`false`, `yes`/`no` or `on`/`off`.
pub fn parse_flag(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(format!("expected 0/1 or true/false, got '{}'", other)),
    }
}
