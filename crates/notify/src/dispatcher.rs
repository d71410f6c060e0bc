//! Routes the finished report to the configured channel.
//!
//! The dispatcher owns the report once delivery starts: it delivers through
//! its single channel and then removes the local file, whatever the outcome.

use std::sync::Arc;
use std::time::Duration;

use digest_core::DeliveryTarget;
use digest_report::ReportFile;

use crate::ftp::{FtpDeliverer, SuppaFtpConnector};
use crate::messaging::MessagingDeliverer;
use crate::traits::{Deliverer, DeliveryError, DispatchResult};

/// Delivers reports through one channel.
pub struct DeliveryDispatcher {
    channel: Box<dyn Deliverer>,
}

impl DeliveryDispatcher {
    pub fn new(channel: Box<dyn Deliverer>) -> Self {
        Self { channel }
    }

    /// Build the channel described by `target`.
    pub fn for_target(target: &DeliveryTarget) -> Result<Self, DeliveryError> {
        let channel: Box<dyn Deliverer> = match target {
            DeliveryTarget::Messaging {
                recipient,
                api_token,
                base_url,
                timeout_secs,
            } => Box::new(MessagingDeliverer::new(
                base_url,
                api_token.clone(),
                recipient.clone(),
                Duration::from_secs(*timeout_secs),
            )?),
            DeliveryTarget::FtpUpload {
                host,
                port,
                credentials,
                remote_root,
            } => Box::new(FtpDeliverer::new(
                host.clone(),
                *port,
                credentials.clone(),
                remote_root.clone(),
                Arc::new(SuppaFtpConnector),
            )?),
        };
        Ok(Self::new(channel))
    }

    pub fn channel_name(&self) -> &str {
        self.channel.channel_name()
    }

    /// Deliver `report`, then discard it.
    ///
    /// Delivery failures and cleanup failures are both captured in the
    /// result; neither is returned as an error.
    pub async fn dispatch(&self, report: ReportFile) -> DispatchResult {
        let channel = self.channel.channel_name().to_string();
        let report_name = report.name().to_string();

        let start = std::time::Instant::now();
        let outcome = self.channel.deliver(&report).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (success, error) = match outcome {
            Ok(()) => {
                tracing::info!(
                    channel = %channel,
                    report = %report_name,
                    duration_ms,
                    "Report delivered"
                );
                (true, None)
            }
            Err(e) => {
                tracing::warn!(
                    channel = %channel,
                    report = %report_name,
                    error = %e,
                    duration_ms,
                    "Report delivery failed"
                );
                (false, Some(e.to_string()))
            }
        };

        let path = report.path().to_path_buf();
        let (cleaned_up, cleanup_error) = match report.discard().await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Report file removed");
                (true, None)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove report file");
                (false, Some(e.to_string()))
            }
        };

        DispatchResult {
            channel,
            report_name,
            success,
            error,
            cleaned_up,
            cleanup_error,
            duration_ms,
        }
    }
}
