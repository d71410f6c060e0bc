use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Hour (UTC) at which each daily window closes.
const CUTOFF_HOUR: i64 = 21;

/// The 24-hour range covered by one report: previous day 21:00Z to
/// `date` 21:00Z, both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl QueryWindow {
    /// Window closing at 21:00Z on `date`.
    pub fn ending_on(date: NaiveDate) -> Self {
        let until = (date.and_time(NaiveTime::MIN) + Duration::hours(CUTOFF_HOUR)).and_utc();
        Self {
            from: until - Duration::days(1),
            until,
        }
    }

    /// Value for the `from` query parameter (inclusive lower bound).
    pub fn from_param(&self) -> String {
        format!(">={}", format_bound(&self.from))
    }

    /// Value for the `until` query parameter (inclusive upper bound).
    pub fn until_param(&self) -> String {
        format!("<={}", format_bound(&self.until))
    }
}

fn format_bound(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
