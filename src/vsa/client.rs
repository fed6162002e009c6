//! VSA REST API Client
//!
//! This module provides the client the collectors fetch data through.
//!
//! # Architecture
//!
//! - **Transport**: HTTPS (or HTTP) via a single pooled `reqwest::Client`
//! - **Authentication**: username/password login once at startup, bearer token on every request
//! - **Session expiry**: a `401` on a GET triggers one re-login and one retry
//!
//! Collectors only see the [`DataSource`] trait. It answers `GET(path)` with a JSON
//! document or nothing; every failure below that seam is logged here and turned into
//! an absent response, so a collector never has to distinguish transport errors from
//! bad statuses.
//!
//! # Example
//!
//! ```no_run
//! use vsa_exporter::config::VsaConfig;
//! use vsa_exporter::vsa::{DataSource, VsaClient};
//! use secrecy::SecretString;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = VsaConfig {
//!     url: "https://vsa.local".to_string(),
//!     user: "admin".to_string(),
//!     password: SecretString::from("secret"),
//!     ignore_certs: true,
//!     request_timeout_seconds: 30,
//!     login_path: "api/v1/login".to_string(),
//! };
//!
//! let client = VsaClient::new(config)?;
//! client.login().await?;
//! let disks = client.get("api/v1/disks").await;
//! # Ok(())
//! # }
//! ```

use crate::config::VsaConfig;
use crate::error::{ExporterError, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Read-only source of JSON documents, keyed by API path
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch `path`; `None` means no usable response this time
    async fn get(&self, path: &str) -> Option<Value>;
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

/// Client for the VSA management API
///
/// Shared by all collectors; GET requests only. The bearer token sits behind an
/// async `RwLock` so a re-login can swap it while the client is shared.
pub struct VsaClient {
    config: VsaConfig,
    http: reqwest::Client,
    token: RwLock<Option<SecretString>>,
}

impl VsaClient {
    pub fn new(config: VsaConfig) -> Result<Self> {
        if config.ignore_certs {
            warn!("TLS certificate validation is disabled for {}", config.url);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .danger_accept_invalid_certs(config.ignore_certs)
            .build()?;

        Ok(Self {
            config,
            http,
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Authenticate and store the session token
    pub async fn login(&self) -> Result<()> {
        let body = serde_json::json!({
            "username": self.config.user,
            "password": self.config.password.expose_secret(),
        });

        debug!("Sending login request for user {}", self.config.user);
        let response = self
            .http
            .post(self.url(&self.config.login_path))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::Auth(format!(
                "login rejected with status {}",
                status
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ExporterError::Auth(format!("unreadable login response: {}", e)))?;

        let token = login
            .access_token
            .or(login.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExporterError::Auth("login response carried no token".to_string()))?;

        *self.token.write().await = Some(SecretString::new(token.into()));
        info!("Successfully authenticated to VSA API");
        Ok(())
    }

    async fn send_get(&self, path: &str) -> Result<reqwest::Response> {
        let token = self
            .token
            .read()
            .await
            .as_ref()
            .map(|t| t.expose_secret().to_string());

        let mut request = self.http.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    /// Fetch `path` and decode the body as JSON
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The decoded document
    /// * `Err(ExporterError::VsaApi)` - Non-success status, after one re-login on `401`
    /// * `Err(ExporterError::Auth)` - The re-login itself failed
    /// * `Err(ExporterError::Http)` - Transport failure or undecodable body
    pub async fn fetch(&self, path: &str) -> Result<Value> {
        let mut response = self.send_get(path).await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Session expired, re-authenticating");
            self.login().await?;
            response = self.send_get(path).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::VsaApi(format!(
                "GET {} returned {}",
                path, status
            )));
        }

        debug!("{} response received", path);
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl DataSource for VsaClient {
    async fn get(&self, path: &str) -> Option<Value> {
        match self.fetch(path).await {
            Ok(document) => Some(document),
            Err(e) => {
                warn!("Failed to query {}: {}", path, e);
                None
            }
        }
    }
}
