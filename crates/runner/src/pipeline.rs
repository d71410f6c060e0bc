//! One report run, start to finish.
//!
//! Stages run strictly in order: fetch, format, render, write, dispatch.
//! Fetch failures degrade to an empty report and delivery failures are
//! recorded in the summary. Only a report that cannot be produced locally
//! aborts the run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;

use digest_core::{Config, QueryWindow};
use digest_fetch::{fetch_or_empty, AnomalySource, WanguardClient};
use digest_notify::{DeliveryDispatcher, DispatchResult};
use digest_report::{format_records, ReportError, ReportFile, ReportMeta, ReportRenderer};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("report rendering failed: {0}")]
    Render(#[source] ReportError),

    #[error("report file could not be written: {0}")]
    Write(#[source] ReportError),
}

/// What happened during a run.
#[derive(Debug)]
pub struct RunSummary {
    pub report_date: NaiveDate,
    pub window: QueryWindow,
    pub records: usize,
    pub pages: usize,
    pub delivery: DispatchResult,
}

impl RunSummary {
    pub fn log(&self) {
        tracing::info!(
            date = %self.report_date,
            records = self.records,
            pages = self.pages,
            channel = %self.delivery.channel,
            delivered = self.delivery.success,
            cleaned_up = self.delivery.cleaned_up,
            "Run complete"
        );
    }
}

pub struct Pipeline {
    source: Arc<dyn AnomalySource>,
    renderer: ReportRenderer,
    dispatcher: DeliveryDispatcher,
    customer: String,
    output_dir: PathBuf,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn AnomalySource>,
        renderer: ReportRenderer,
        dispatcher: DeliveryDispatcher,
        customer: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            renderer,
            dispatcher,
            customer: customer.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Wire up the Wanguard client, renderer and delivery channel from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source = WanguardClient::from_config(&config.monitor)
            .context("failed to build monitoring client")?;
        let renderer =
            ReportRenderer::from_config(&config.report).context("failed to build report renderer")?;
        let target = config
            .delivery_target()
            .context("delivery channel is not fully configured")?;
        let dispatcher =
            DeliveryDispatcher::for_target(&target).context("failed to build delivery channel")?;

        Ok(Self::new(
            Arc::new(source),
            renderer,
            dispatcher,
            config.customer.clone(),
            config.report.output_dir.clone(),
        ))
    }

    /// Produce and deliver the report for `report_date`.
    pub async fn run(&self, report_date: NaiveDate) -> Result<RunSummary, PipelineError> {
        let window = QueryWindow::ending_on(report_date);
        tracing::info!(
            customer = %self.customer,
            from = %window.from_param(),
            until = %window.until_param(),
            "Starting anomaly report run"
        );

        let records = fetch_or_empty(self.source.as_ref(), &window).await;
        let rows = format_records(&records);

        let meta = ReportMeta {
            customer: self.customer.clone(),
            report_date,
        };
        let rendered = self.renderer.render(&rows, &meta).map_err(PipelineError::Render)?;
        tracing::info!(
            name = %rendered.name,
            pages = rendered.page_count,
            rows = rendered.row_count,
            "Report rendered"
        );

        let report = ReportFile::write(&self.output_dir, &rendered.name, report_date, &rendered.bytes)
            .await
            .map_err(PipelineError::Write)?;

        let delivery = self.dispatcher.dispatch(report).await;

        Ok(RunSummary {
            report_date,
            window,
            records: records.len(),
            pages: rendered.page_count,
            delivery,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use digest_core::AnomalyRecord;
    use digest_fetch::FetchError;
    use digest_notify::{Deliverer, DeliveryError};

    struct StaticSource(Option<Vec<AnomalyRecord>>);

    #[async_trait::async_trait]
    impl AnomalySource for StaticSource {
        async fn fetch(&self, _window: &QueryWindow) -> Result<Vec<AnomalyRecord>, FetchError> {
            self.0
                .clone()
                .ok_or_else(|| FetchError::Config("unreachable".to_string()))
        }
        fn source_name(&self) -> &str {
            "static"
        }
    }

    struct CountingDeliverer {
        count: Arc<AtomicUsize>,
        seen_bytes: Arc<std::sync::Mutex<Vec<u8>>>,
    }

    #[async_trait::async_trait]
    impl Deliverer for CountingDeliverer {
        async fn deliver(&self, report: &ReportFile) -> Result<(), DeliveryError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            let bytes = report.read_bytes().await.map_err(DeliveryError::Encode)?;
            *self.seen_bytes.lock().unwrap() = bytes;
            Ok(())
        }
        fn channel_name(&self) -> &str {
            "counting"
        }
    }

    fn record(id: &str) -> AnomalyRecord {
        let body = format!(
            r#"[{{"anomaly_id": "{id}", "ip_group": "G1", "prefix": "10.0.0.0/24", "anomaly": "SYN Flood", "duration": 120, "from": {{"iso_8601": "2024-01-01T00:00:00Z"}}, "pkts/s": 1500000, "bits/s": 12000000000}}]"#
        );
        digest_core::parse_records(body.as_bytes()).unwrap().remove(0)
    }

    fn pipeline(
        source: StaticSource,
        dir: &std::path::Path,
    ) -> (Pipeline, Arc<AtomicUsize>, Arc<std::sync::Mutex<Vec<u8>>>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let dispatcher = DeliveryDispatcher::new(Box::new(CountingDeliverer {
            count: count.clone(),
            seen_bytes: seen.clone(),
        }));
        let p = Pipeline::new(Arc::new(source), ReportRenderer::default(), dispatcher, "Acme", dir);
        (p, count, seen)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[tokio::test]
    async fn records_flow_into_delivered_report() {
        let dir = tempfile::tempdir().unwrap();
        let (p, count, seen) = pipeline(StaticSource(Some(vec![record("A1"), record("A2")])), dir.path());

        let summary = p.run(date()).await.unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.pages, 1);
        assert!(summary.delivery.success);
        assert!(summary.delivery.cleaned_up);
        assert_eq!(summary.delivery.report_name, "Acme-Anomalias-02-01-2024");
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(seen.lock().unwrap().starts_with(b"%PDF"));
        assert!(!dir.path().join("Acme-Anomalias-02-01-2024").exists());
    }

    #[tokio::test]
    async fn fetch_failure_still_delivers_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let (p, count, _) = pipeline(StaticSource(None), dir.path());

        let summary = p.run(date()).await.unwrap();

        assert_eq!(summary.records, 0);
        assert!(summary.delivery.success);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn window_ends_on_report_date() {
        let dir = tempfile::tempdir().unwrap();
        let (p, _, _) = pipeline(StaticSource(Some(Vec::new())), dir.path());

        let summary = p.run(date()).await.unwrap();

        assert_eq!(summary.window.until_param(), "<=2024-01-02T21:00:00.000Z");
        assert_eq!(summary.window.from_param(), ">=2024-01-01T21:00:00.000Z");
    }

    #[tokio::test]
    async fn unwritable_output_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let (p, count, _) = pipeline(StaticSource(Some(Vec::new())), &blocker);

        let err = p.run(date()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Write(_)));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
