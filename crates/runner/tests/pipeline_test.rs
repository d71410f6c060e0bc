//! End-to-end runs against in-process monitoring and messaging servers.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;

use digest_core::config::{DEFAULT_FILE_TEMPLATE, DEFAULT_TITLE_TEMPLATE};
use digest_core::Config;
use digest_runner::Pipeline;

const ANOMALIES: &str = r#"[
    {"anomaly_id": 101, "ip_group": "G1", "prefix": "10.0.0.0/24", "anomaly": "SYN Flood",
     "duration": 120, "from": {"iso_8601": "2024-01-01T22:10:00Z"}, "pkts/s": 1500000, "bits/s": 12000000000},
    {"anomaly_id": "102", "ip_group": "G2", "prefix": "10.0.1.0/24", "anomaly": "UDP Flood",
     "duration": "45", "from": {"iso_8601": "2024-01-02T03:00:00Z"}, "pkts/s": "800", "bits/s": 640000}
]"#;

#[derive(Default)]
struct Sent {
    token: Option<String>,
    body: Option<serde_json::Value>,
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}")
}

async fn monitor(status: StatusCode, body: &'static str) -> String {
    serve(Router::new().route(
        "/wanguard-api/v1/anomalies",
        get(move || async move { (status, body) }),
    ))
    .await
}

async fn gateway(status: StatusCode) -> (String, Arc<Mutex<Sent>>) {
    let sent = Arc::new(Mutex::new(Sent::default()));
    let app = Router::new()
        .route(
            "/api/enviar-documento/{token}",
            post(
                move |State(sent): State<Arc<Mutex<Sent>>>,
                      Path(token): Path<String>,
                      Json(body): Json<serde_json::Value>| async move {
                    let mut s = sent.lock().unwrap();
                    s.token = Some(token);
                    s.body = Some(body);
                    status
                },
            ),
        )
        .with_state(sent.clone());
    (serve(app).await, sent)
}

fn config(monitor: &str, gateway: &str, out: &std::path::Path) -> Config {
    let mut config = Config::for_profile("E2ETESTUNUSED");
    config.customer = "Acme".to_string();
    config.monitor.address = Some(monitor.to_string());
    config.monitor.username = Some("wg".to_string());
    config.monitor.password = Some("secret".to_string());
    config.monitor.timeout_secs = 5;
    config.report.output_dir = out.to_path_buf();
    config.report.logo_path = None;
    config.report.title_template = DEFAULT_TITLE_TEMPLATE.to_string();
    config.report.file_template = DEFAULT_FILE_TEMPLATE.to_string();
    config.delivery.channel = "messaging".to_string();
    config.delivery.recipient = Some("5511999999999".to_string());
    config.delivery.api_token = Some("tok".to_string());
    config.delivery.messaging_base_url = gateway.to_string();
    config.delivery.http_timeout_secs = 5;
    config
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

fn dir_is_empty(dir: &std::path::Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn anomalies_are_rendered_and_sent() {
    let monitor = monitor(StatusCode::OK, ANOMALIES).await;
    let (gateway, sent) = gateway(StatusCode::OK).await;
    let out = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::from_config(&config(&monitor, &gateway, out.path())).unwrap();
    let summary = pipeline.run(date()).await.unwrap();

    assert_eq!(summary.records, 2);
    assert!(summary.delivery.success, "{:?}", summary.delivery.error);
    assert!(summary.delivery.cleaned_up);
    assert!(dir_is_empty(out.path()));

    let sent = sent.lock().unwrap();
    assert_eq!(sent.token.as_deref(), Some("tok"));
    let body = sent.body.as_ref().unwrap();
    assert_eq!(body["phone"], "5511999999999");
    assert_eq!(body["name"], "Acme-Anomalias-02-01-2024");
    assert!(body["base64"]
        .as_str()
        .unwrap()
        .starts_with("data:application/pdf;base64,JVBERi"));
}

#[tokio::test]
async fn monitor_outage_sends_empty_report() {
    let monitor = monitor(StatusCode::SERVICE_UNAVAILABLE, "down").await;
    let (gateway, sent) = gateway(StatusCode::OK).await;
    let out = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::from_config(&config(&monitor, &gateway, out.path())).unwrap();
    let summary = pipeline.run(date()).await.unwrap();

    assert_eq!(summary.records, 0);
    assert_eq!(summary.pages, 1);
    assert!(summary.delivery.success);
    assert!(sent.lock().unwrap().body.is_some());
    assert!(dir_is_empty(out.path()));
}

#[tokio::test]
async fn null_response_is_an_empty_report() {
    let monitor = monitor(StatusCode::OK, "null").await;
    let (gateway, _) = gateway(StatusCode::OK).await;
    let out = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::from_config(&config(&monitor, &gateway, out.path())).unwrap();
    let summary = pipeline.run(date()).await.unwrap();

    assert_eq!(summary.records, 0);
    assert!(summary.delivery.success);
}

#[tokio::test]
async fn rejected_delivery_is_not_fatal_and_cleans_up() {
    let monitor = monitor(StatusCode::OK, ANOMALIES).await;
    let (gateway, _) = gateway(StatusCode::BAD_GATEWAY).await;
    let out = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::from_config(&config(&monitor, &gateway, out.path())).unwrap();
    let summary = pipeline.run(date()).await.unwrap();

    assert!(!summary.delivery.success);
    assert!(summary.delivery.error.as_deref().unwrap().contains("502"));
    assert!(summary.delivery.cleaned_up);
    assert!(dir_is_empty(out.path()));
}

#[test]
fn missing_channel_keys_fail_wiring() {
    let out = tempfile::tempdir().unwrap();
    let mut config = config("http://127.0.0.1:9", "http://127.0.0.1:9", out.path());
    config.delivery.channel = "ftp".to_string();
    config.delivery.ftp_host = None;

    let err = Pipeline::from_config(&config).err().unwrap();
    assert!(format!("{err:#}").contains("FTP_HOST"));
}
