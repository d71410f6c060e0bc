//! AnomalySource trait definition and shared error types.

use digest_core::{AnomalyRecord, QueryWindow};

/// Errors that can occur while retrieving anomalies.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("monitoring API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed anomalies response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Anything that can list the anomalies detected inside a window.
#[async_trait::async_trait]
pub trait AnomalySource: Send + Sync {
    /// Fetch anomalies in fetch order. An empty vec means "no data".
    async fn fetch(&self, window: &QueryWindow) -> Result<Vec<AnomalyRecord>, FetchError>;

    /// Human-readable name for this source (e.g., "wanguard").
    fn source_name(&self) -> &str;
}

/// Fetch from `source`, logging failures and degrading them to "no data"
/// so the run can still produce and deliver an empty report.
pub async fn fetch_or_empty(source: &dyn AnomalySource, window: &QueryWindow) -> Vec<AnomalyRecord> {
    let start = std::time::Instant::now();
    match source.fetch(window).await {
        Ok(records) => {
            tracing::info!(
                source = source.source_name(),
                records = records.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Anomalies fetched"
            );
            records
        }
        Err(e) => {
            tracing::warn!(
                source = source.source_name(),
                error = %e,
                "Anomaly fetch failed, continuing with an empty report"
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct FixedSource {
        result: fn() -> Result<Vec<AnomalyRecord>, FetchError>,
    }

    #[async_trait::async_trait]
    impl AnomalySource for FixedSource {
        async fn fetch(&self, _window: &QueryWindow) -> Result<Vec<AnomalyRecord>, FetchError> {
            (self.result)()
        }
        fn source_name(&self) -> &str {
            "fixed"
        }
    }

    fn window() -> QueryWindow {
        QueryWindow::ending_on(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
    }

    #[tokio::test]
    async fn failure_degrades_to_empty() {
        let source = FixedSource {
            result: || Err(FetchError::Status { status: 502, body: "bad gateway".into() }),
        };
        assert!(fetch_or_empty(&source, &window()).await.is_empty());
    }

    #[tokio::test]
    async fn success_passes_records_through() {
        let source = FixedSource {
            result: || Ok(digest_core::parse_records(br#"[{"anomaly_id": "A1"}, {"anomaly_id": "A2"}]"#)?),
        };
        let records = fetch_or_empty(&source, &window()).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "A2");
    }
}
