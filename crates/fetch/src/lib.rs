//! Anomaly retrieval from the Wanguard REST API.
//!
//! This crate provides:
//! - `AnomalySource` trait for anything that can list anomalies in a window
//! - `WanguardClient`, the HTTP implementation
//! - `fetch_or_empty`, which degrades fetch failures to an empty report

pub mod client;
pub mod source;

pub use client::WanguardClient;
pub use source::{fetch_or_empty, AnomalySource, FetchError};
