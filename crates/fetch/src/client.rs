//! HTTP client for the Wanguard anomalies endpoint.

use std::time::Duration;

use digest_core::config::MonitorConfig;
use digest_core::{parse_records, AnomalyRecord, QueryWindow};

use crate::source::{AnomalySource, FetchError};

/// Fixed projection requested from the anomalies endpoint.
pub const ANOMALY_FIELDS: &str = "anomaly_id,prefix,ip_group,anomaly,unit,from,duration,pkts/s,bits/s";

const ANOMALIES_PATH: &str = "/wanguard-api/v1/anomalies";

/// Client for the Wanguard REST API, authenticated with HTTP Basic.
pub struct WanguardClient {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    http: reqwest::Client,
}

impl std::fmt::Debug for WanguardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WanguardClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl WanguardClient {
    /// Create a client for the console at `base_url` (scheme included).
    pub fn new(
        base_url: &str,
        username: Option<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
            http,
        })
    }

    /// Build a client from the monitoring section of the runtime config.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, FetchError> {
        let base_url = config
            .base_url()
            .ok_or_else(|| FetchError::Config("WANGUARD_ADDR is not set".to_string()))?;
        Self::new(
            &base_url,
            config.username.clone(),
            config.password.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn anomalies_url(&self) -> String {
        format!("{}{}", self.base_url, ANOMALIES_PATH)
    }
}

#[async_trait::async_trait]
impl AnomalySource for WanguardClient {
    /// Issue one authenticated GET for the window.
    async fn fetch(&self, window: &QueryWindow) -> Result<Vec<AnomalyRecord>, FetchError> {
        let url = self.anomalies_url();
        let request = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("from", window.from_param()),
                ("until", window.until_param()),
                ("fields", ANOMALY_FIELDS.to_string()),
            ])
            // Always sent, with empty parts when credentials are unset.
            .basic_auth(
                self.username.as_deref().unwrap_or(""),
                Some(self.password.as_deref().unwrap_or("")),
            );

        tracing::debug!(url = %url, from = %window.from, until = %window.until, "Requesting anomalies");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        Ok(parse_records(&body)?)
    }

    fn source_name(&self) -> &str {
        "wanguard"
    }
}
