//! Record → display row formatting.
//!
//! Packet and bit rates share one base-1000, three-significant-digit
//! scaling rule and differ only in the unit table.

use digest_core::AnomalyRecord;

pub const PACKET_UNITS: &[&str] = &["pkts", "Kpkts", "Mpkts", "Gpkts", "Tpkts", "Ppkts"];
pub const BIT_UNITS: &[&str] = &["b", "kbit", "Mbit", "Gbit", "Tbit", "Pbit"];

const DEFAULT_FONT_SIZE: f32 = 10.0;
const SMALL_FONT_SIZE: f32 = 8.0;

/// One table cell: literal text plus a font-size hint.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayCell {
    pub text: String,
    pub font_size: f32,
}

impl DisplayCell {
    fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }

    fn small(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: SMALL_FONT_SIZE,
        }
    }
}

/// A formatted anomaly, one cell per table column.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub id: DisplayCell,
    pub ip_group: DisplayCell,
    pub prefix: DisplayCell,
    pub anomaly_type: DisplayCell,
    pub duration: DisplayCell,
    pub start: DisplayCell,
    pub packet_rate: DisplayCell,
    pub bit_rate: DisplayCell,
}

impl DisplayRow {
    /// Cells in table column order.
    pub fn cells(&self) -> [&DisplayCell; 8] {
        [
            &self.id,
            &self.ip_group,
            &self.prefix,
            &self.anomaly_type,
            &self.duration,
            &self.start,
            &self.packet_rate,
            &self.bit_rate,
        ]
    }
}

pub fn format_record(record: &AnomalyRecord) -> DisplayRow {
    DisplayRow {
        id: DisplayCell::new(record.id.as_str()),
        ip_group: DisplayCell::small(record.ip_group.as_str()),
        prefix: DisplayCell::new(record.prefix.as_str()),
        anomaly_type: DisplayCell::new(record.anomaly_type.as_str()),
        duration: DisplayCell::new(format!("{}s", record.duration_secs)),
        start: DisplayCell::small(record.start.as_str()),
        packet_rate: DisplayCell::new(format_packets(record.packet_rate)),
        bit_rate: DisplayCell::new(format_bits(record.bit_rate)),
    }
}

/// Format records in fetch order.
pub fn format_records(records: &[AnomalyRecord]) -> Vec<DisplayRow> {
    records.iter().map(format_record).collect()
}

pub fn format_packets(value: f64) -> String {
    scale_metric(value, PACKET_UNITS)
}

pub fn format_bits(value: f64) -> String {
    scale_metric(value, BIT_UNITS)
}

/// Scale `value` by powers of 1000 and append the matching unit.
///
/// Values below 1 stay unscaled. Negative or non-finite input formats as
/// zero of the base unit.
pub fn scale_metric(value: f64, units: &[&str]) -> String {
    let mut v = if value.is_finite() && value > 0.0 { value } else { 0.0 };
    let mut exponent = 0;
    while v >= 1000.0 && exponent + 1 < units.len() {
        v /= 1000.0;
        exponent += 1;
    }
    format!("{} {}", three_significant(v), units[exponent])
}

fn three_significant(v: f64) -> String {
    let decimals = if v >= 100.0 {
        0
    } else if v >= 10.0 {
        1
    } else {
        2
    };
    let s = format!("{:.*}", decimals, v);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
