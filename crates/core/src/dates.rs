//! Inclusive `YYYY-MM-DD` date ranges used by the export tools

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid date range: end {end} is before start {start}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Parse a strict `YYYY-MM-DD` literal.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateRangeError> {
    let trimmed = input.trim();
    if trimmed.len() != 10 {
        return Err(DateRangeError::InvalidDate(input.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| DateRangeError::InvalidDate(input.to_string()))
}

/// An inclusive date range. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Parse optional `since`/`until` arguments, rejecting inverted ranges.
    pub fn parse(since: Option<&str>, until: Option<&str>) -> Result<Self, DateRangeError> {
        let start = since.map(parse_date).transpose()?;
        let end = until.map(parse_date).transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(DateRangeError::Inverted { start, end });
            }
        }

        Ok(Self { start, end })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }

    /// Whether an RFC 3339 timestamp falls on a day inside the range.
    /// Unparseable timestamps are outside every bounded range.
    pub fn contains_timestamp(&self, timestamp: &str) -> bool {
        if self.is_unbounded() {
            return true;
        }
        DateTime::parse_from_rfc3339(timestamp)
            .map(|dt| self.contains(dt.with_timezone(&Utc).date_naive()))
            .unwrap_or(false)
    }

    /// Start of the range as an RFC 3339 UTC timestamp (`...T00:00:00Z`).
    pub fn start_timestamp(&self) -> Option<String> {
        self.start
            .map(|d| format_utc(d.and_time(NaiveTime::MIN).and_utc()))
    }

    /// End of the range as an RFC 3339 UTC timestamp (`...T23:59:59Z`).
    pub fn end_timestamp(&self) -> Option<String> {
        self.end.and_then(|d| {
            let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
            Some(format_utc(d.and_time(end_of_day).and_utc()))
        })
    }
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
