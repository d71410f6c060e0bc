//! Document delivery through the messaging gateway.
//!
//! The gateway exposes `POST {base}/api/enviar-documento/{token}` and takes
//! the recipient, the document as a PDF data URI, and a display name.

use std::time::Duration;

use digest_report::encode::encode_report;
use digest_report::ReportFile;

use crate::traits::{Deliverer, DeliveryError};

#[derive(Debug, serde::Serialize)]
struct SendDocument<'a> {
    phone: &'a str,
    base64: String,
    name: &'a str,
}

/// Sends the report as a document message to one recipient.
#[derive(Debug)]
pub struct MessagingDeliverer {
    base_url: String,
    api_token: String,
    recipient: String,
    client: reqwest::Client,
}

impl MessagingDeliverer {
    /// Returns [`DeliveryError::Config`] if the token or recipient is empty.
    pub fn new(
        base_url: &str,
        api_token: String,
        recipient: String,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        if api_token.trim().is_empty() {
            return Err(DeliveryError::Config(
                "Messaging API token must not be empty".to_string(),
            ));
        }
        if recipient.trim().is_empty() {
            return Err(DeliveryError::Config(
                "Messaging recipient must not be empty".to_string(),
            ));
        }

        let base_url = base_url.trim().trim_end_matches('/');
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url.to_string()
        } else {
            format!("http://{base_url}")
        };

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_token,
            recipient,
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/enviar-documento/{}", self.base_url, self.api_token)
    }
}

#[async_trait::async_trait]
impl Deliverer for MessagingDeliverer {
    async fn deliver(&self, report: &ReportFile) -> Result<(), DeliveryError> {
        let base64 = encode_report(report).await.map_err(DeliveryError::Encode)?;
        let body = SendDocument {
            phone: &self.recipient,
            base64,
            name: report.name(),
        };

        tracing::debug!(
            recipient = %self.recipient,
            name = report.name(),
            "Sending report document"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                channel: self.channel_name().to_string(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            recipient = %self.recipient,
            name = report.name(),
            status = status.as_u16(),
            "Report document sent"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "messaging"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::NaiveDate;

    #[derive(Default)]
    struct Captured {
        token: Option<String>,
        accept: Option<String>,
        body: Option<serde_json::Value>,
    }

    type Shared = Arc<Mutex<Captured>>;

    async fn spawn_gateway(status: StatusCode) -> (String, Shared) {
        let captured: Shared = Arc::new(Mutex::new(Captured::default()));
        let app = Router::new()
            .route(
                "/api/enviar-documento/{token}",
                post(
                    move |State(c): State<Shared>,
                          Path(token): Path<String>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        let mut c = c.lock().unwrap();
                        c.token = Some(token);
                        c.accept = headers
                            .get("accept")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        c.body = Some(body);
                        (status, "gateway says hi")
                    },
                ),
            )
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    async fn report(dir: &std::path::Path) -> ReportFile {
        ReportFile::write(
            dir,
            "Acme-Anomalias-02-01-2024",
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            b"%PDF-1.4 test",
        )
        .await
        .unwrap()
    }

    fn deliverer(base: &str) -> MessagingDeliverer {
        MessagingDeliverer::new(
            base,
            "tok123".to_string(),
            "5511999999999".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_adds_scheme_and_strips_slash() {
        let d = deliverer("msg.example.com/");
        assert_eq!(
            d.endpoint(),
            "http://msg.example.com/api/enviar-documento/tok123"
        );
    }

    #[test]
    fn empty_token_rejected() {
        let err = MessagingDeliverer::new(
            "http://x",
            " ".to_string(),
            "1".to_string(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn posts_document_payload() {
        let (base, captured) = spawn_gateway(StatusCode::OK).await;
        let dir = tempfile::tempdir().unwrap();
        let report = report(dir.path()).await;

        deliverer(&base).deliver(&report).await.unwrap();

        let c = captured.lock().unwrap();
        assert_eq!(c.token.as_deref(), Some("tok123"));
        assert_eq!(c.accept.as_deref(), Some("application/json"));
        let body = c.body.as_ref().unwrap();
        assert_eq!(body["phone"], "5511999999999");
        assert_eq!(body["name"], "Acme-Anomalias-02-01-2024");
        assert_eq!(
            body["base64"],
            "data:application/pdf;base64,JVBERi0xLjQgdGVzdA=="
        );
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (base, _) = spawn_gateway(StatusCode::INTERNAL_SERVER_ERROR).await;
        let dir = tempfile::tempdir().unwrap();
        let report = report(dir.path()).await;

        let err = deliverer(&base).deliver(&report).await.unwrap_err();
        match err {
            DeliveryError::Rejected { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "gateway says hi");
            }
            other => panic!("expected Rejected, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreadable_report_fails_before_request() {
        let (base, captured) = spawn_gateway(StatusCode::OK).await;
        let dir = tempfile::tempdir().unwrap();
        let report = report(dir.path()).await;
        std::fs::remove_file(report.path()).unwrap();

        let err = deliverer(&base).deliver(&report).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Encode(_)));
        assert!(captured.lock().unwrap().body.is_none());
    }
}
