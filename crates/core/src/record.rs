//! Anomaly records as returned by the Wanguard anomalies endpoint.
//!
//! Everything except the rate and duration columns is an opaque display
//! string. Deserialization never rejects a record because of a field's
//! type: identifiers may arrive as numbers, rates as numeric strings, and
//! anything missing or unusable falls back to an empty string or zero.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One detected traffic anomaly. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnomalyRecord {
    #[serde(rename = "anomaly_id", default, deserialize_with = "display_string")]
    pub id: String,
    #[serde(default, deserialize_with = "display_string")]
    pub ip_group: String,
    #[serde(default, deserialize_with = "display_string")]
    pub prefix: String,
    #[serde(rename = "anomaly", default, deserialize_with = "display_string")]
    pub anomaly_type: String,
    #[serde(rename = "duration", default, deserialize_with = "lenient_seconds")]
    pub duration_secs: u64,
    #[serde(rename = "from", default, deserialize_with = "start_timestamp")]
    pub start: String,
    #[serde(rename = "pkts/s", default, deserialize_with = "lenient_rate")]
    pub packet_rate: f64,
    #[serde(rename = "bits/s", default, deserialize_with = "lenient_rate")]
    pub bit_rate: f64,
    #[serde(default, deserialize_with = "optional_display_string")]
    pub unit: Option<String>,
}

/// Parse an anomalies response body.
///
/// An empty body, `null` and `[]` all mean "no anomalies".
pub fn parse_records(body: &[u8]) -> Result<Vec<AnomalyRecord>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let parsed: Option<Vec<AnomalyRecord>> = serde_json::from_slice(body)?;
    Ok(parsed.unwrap_or_default())
}

/// Coerce a JSON value into a non-negative finite rate. Anything else is `0`.
pub fn rate_from_value(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        0.0
    }
}

fn value_to_display(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn display_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<Value>::deserialize(d)?
        .map(value_to_display)
        .unwrap_or_default())
}

fn optional_display_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?
        .map(value_to_display)
        .filter(|s| !s.is_empty()))
}

fn lenient_rate<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<Value>::deserialize(d)?
        .map(|v| rate_from_value(&v))
        .unwrap_or(0.0))
}

fn lenient_seconds<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    let secs = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
                .unwrap_or(0)
        }
        _ => 0,
    };
    Ok(secs)
}

/// `from` is an object of timestamp renderings; only `iso_8601` is shown.
fn start_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Object(mut map)) => map
            .remove("iso_8601")
            .map(value_to_display)
            .unwrap_or_default(),
        Some(other) => value_to_display(other),
        None => String::new(),
    })
}
