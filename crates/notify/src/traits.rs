//! Deliverer trait definition and shared error types.

use digest_report::{ReportError, ReportFile};

/// Errors that can occur during report delivery.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Report could not be read back: {0}")]
    Encode(#[source] ReportError),

    #[error("{channel} rejected the report with {status}: {body}")]
    Rejected {
        channel: String,
        status: u16,
        body: String,
    },

    #[error("FTP {operation} failed: {message}")]
    Ftp { operation: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DeliveryError {
    pub fn ftp(operation: &str, err: impl std::fmt::Display) -> Self {
        DeliveryError::Ftp {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }
}

/// Trait for delivery channel implementations.
#[async_trait::async_trait]
pub trait Deliverer: Send + Sync {
    /// Hand the finished report to its recipient. One attempt, no retry.
    async fn deliver(&self, report: &ReportFile) -> Result<(), DeliveryError>;

    /// Human-readable name for this channel (e.g., "messaging", "ftp").
    fn channel_name(&self) -> &str;
}

/// Outcome of one dispatch: the delivery attempt plus the cleanup.
#[derive(Debug)]
pub struct DispatchResult {
    pub channel: String,
    pub report_name: String,
    pub success: bool,
    pub error: Option<String>,
    pub cleaned_up: bool,
    pub cleanup_error: Option<String>,
    pub duration_ms: u64,
}
