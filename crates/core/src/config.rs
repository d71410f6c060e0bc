use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn require(value: &Option<String>, key: &str) -> Result<String, CoreError> {
    value
        .clone()
        .ok_or_else(|| CoreError::MissingKey(key.to_string()))
}

pub const DEFAULT_MESSAGING_BASE_URL: &str = "https://api-whatsapp.wascript.com.br";
pub const DEFAULT_TITLE_TEMPLATE: &str = "Anomaly Report - {{ customer }} - {{ date }}";
pub const DEFAULT_FILE_TEMPLATE: &str = "{{ customer }}-Anomalias-{{ file_date }}";

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Customer name shown in titles and file names.
    pub customer: String,
    pub monitor: MonitorConfig,
    pub report: ReportConfig,
    pub delivery: DeliveryConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `DIGEST_PROFILE`. When set (e.g. `ACME`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("DIGEST_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            customer: profiled_env_or(p, "CUSTOMER", ""),
            monitor: MonitorConfig::from_env_profiled(p),
            report: ReportConfig::from_env_profiled(p),
            delivery: DeliveryConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Check the keys every run needs regardless of channel.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.customer.is_empty() {
            return Err(CoreError::MissingKey("CUSTOMER".to_string()));
        }
        if self.monitor.address.is_none() {
            return Err(CoreError::MissingKey("WANGUARD_ADDR".to_string()));
        }
        Ok(())
    }

    /// Resolve the configured channel into a closed [`DeliveryTarget`].
    pub fn delivery_target(&self) -> Result<DeliveryTarget, CoreError> {
        self.delivery.target(&self.delivery.channel)
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  customer:    {}", self.customer);
        tracing::info!(
            "  monitor:     url={}, user={}",
            self.monitor.base_url().unwrap_or_else(|| "(none)".to_string()),
            self.monitor.username.as_deref().unwrap_or("(none)")
        );
        tracing::info!(
            "  report:      output_dir={}, logo={}",
            self.report.output_dir.display(),
            self.report
                .logo_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        );
        tracing::info!("  delivery:    channel={}", self.delivery.channel);
    }
}

// ── Monitoring API ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Host (and optional port or scheme) of the Wanguard console.
    pub address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl MonitorConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            address: profiled_env_opt(p, "WANGUARD_ADDR"),
            username: profiled_env_opt(p, "WANGUARD_USER"),
            password: profiled_env_opt(p, "WANGUARD_PASS"),
            timeout_secs: profiled_env_u64(p, "HTTP_TIMEOUT_SECS", 30),
        }
    }

    /// Base URL of the console. Bare hosts are assumed to speak plain HTTP.
    pub fn base_url(&self) -> Option<String> {
        let addr = self.address.as_deref()?.trim_end_matches('/');
        if addr.starts_with("http://") || addr.starts_with("https://") {
            Some(addr.to_string())
        } else {
            Some(format!("http://{}", addr))
        }
    }
}

// ── Report rendering ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub logo_path: Option<PathBuf>,
    pub title_template: String,
    pub file_template: String,
}

impl ReportConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            output_dir: PathBuf::from(profiled_env_or(p, "REPORT_OUTPUT_DIR", ".")),
            logo_path: profiled_env_opt(p, "REPORT_LOGO_PATH").map(PathBuf::from),
            title_template: profiled_env_or(p, "REPORT_TITLE_TEMPLATE", DEFAULT_TITLE_TEMPLATE),
            file_template: profiled_env_or(p, "REPORT_FILE_TEMPLATE", DEFAULT_FILE_TEMPLATE),
        }
    }
}

// ── Delivery ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// "messaging" or "ftp"
    pub channel: String,
    pub recipient: Option<String>,
    pub api_token: Option<String>,
    pub messaging_base_url: String,
    pub http_timeout_secs: u64,
    pub ftp_host: Option<String>,
    pub ftp_port: u16,
    pub ftp_username: Option<String>,
    pub ftp_password: Option<String>,
    pub ftp_remote_root: String,
}

impl DeliveryConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            channel: profiled_env_or(p, "DELIVERY_CHANNEL", "messaging").to_lowercase(),
            recipient: profiled_env_opt(p, "CUSTOMER_NUMBER"),
            api_token: profiled_env_opt(p, "API_TOKEN"),
            messaging_base_url: profiled_env_or(p, "MESSAGING_BASE_URL", DEFAULT_MESSAGING_BASE_URL),
            http_timeout_secs: profiled_env_u64(p, "HTTP_TIMEOUT_SECS", 30),
            ftp_host: profiled_env_opt(p, "FTP_HOST"),
            ftp_port: profiled_env_u16(p, "FTP_PORT", 21),
            ftp_username: profiled_env_opt(p, "FTP_USER"),
            ftp_password: profiled_env_opt(p, "FTP_PASS"),
            ftp_remote_root: profiled_env_or(p, "FTP_REMOTE_ROOT", "Relatorios"),
        }
    }

    /// Build the target for `channel`, naming the first missing key on failure.
    pub fn target(&self, channel: &str) -> Result<DeliveryTarget, CoreError> {
        match channel.to_lowercase().as_str() {
            "messaging" | "whatsapp" => Ok(DeliveryTarget::Messaging {
                recipient: require(&self.recipient, "CUSTOMER_NUMBER")?,
                api_token: require(&self.api_token, "API_TOKEN")?,
                base_url: self.messaging_base_url.trim_end_matches('/').to_string(),
                timeout_secs: self.http_timeout_secs,
            }),
            "ftp" => Ok(DeliveryTarget::FtpUpload {
                host: require(&self.ftp_host, "FTP_HOST")?,
                port: self.ftp_port,
                credentials: FtpCredentials {
                    username: require(&self.ftp_username, "FTP_USER")?,
                    password: self.ftp_password.clone().unwrap_or_default(),
                },
                remote_root: self.ftp_remote_root.clone(),
            }),
            other => Err(CoreError::Invalid {
                key: "DELIVERY_CHANNEL".to_string(),
                reason: format!("unknown channel '{other}' (expected messaging or ftp)"),
            }),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct FtpCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for FtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Where the finished report goes. Exactly one is active per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeliveryTarget {
    Messaging {
        recipient: String,
        api_token: String,
        base_url: String,
        timeout_secs: u64,
    },
    FtpUpload {
        host: String,
        port: u16,
        credentials: FtpCredentials,
        remote_root: String,
    },
}

impl DeliveryTarget {
    pub fn channel_name(&self) -> &'static str {
        match self {
            DeliveryTarget::Messaging { .. } => "messaging",
            DeliveryTarget::FtpUpload { .. } => "ftp",
        }
    }
}
