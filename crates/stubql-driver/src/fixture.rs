//! Delimited-text fixtures
//!
//! A fixture is a CSV-like block of text, one record per line, that becomes a
//! [`RowSet`]. Fields are trimmed, blank lines are skipped, and every record
//! must have exactly one field per column.
//!
//! ```ignore
//! let rows = CsvFixture::new(["id", "name", "age", "created"]).parse(
//!     "1,tim,20,2012-10-01 01:00:01
//!      2,joe,25,2012-10-02 02:00:02",
//! )?;
//! ```
//!
//! Field values stay text unless the active [`DatePolicy`] recognises them
//! as timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use stubql_core::{Result, StubqlError, Value};

use crate::RowSet;

static TIMESTAMP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4}-[0-9]{2}-[0-9]{2})(?: ([0-9]{2}:[0-9]{2}:[0-9]{2}))?$")
        .expect("timestamp pattern is a valid regex")
});

/// Process-wide policy used by fixtures that don't pick one explicitly
static DATE_POLICY: AtomicU8 = AtomicU8::new(DatePolicy::Pattern as u8);

/// How fixture fields are recognised as timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePolicy {
    /// `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`, read as UTC
    #[default]
    Pattern = 0,
    /// RFC 3339 only, e.g. `2012-10-01T01:00:01Z`
    Rfc3339 = 1,
}

impl DatePolicy {
    /// Turn one trimmed field into a value
    pub fn infer(self, field: &str) -> Value {
        let parsed = match self {
            DatePolicy::Pattern => parse_pattern_timestamp(field).map(Value::DateTime),
            DatePolicy::Rfc3339 => DateTime::parse_from_rfc3339(field)
                .ok()
                .map(|dt| Value::DateTimeUtc(dt.with_timezone(&Utc))),
        };
        parsed.unwrap_or_else(|| Value::String(field.to_string()))
    }
}

impl FromStr for DatePolicy {
    type Err = StubqlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" => Ok(DatePolicy::Pattern),
            "rfc3339" => Ok(DatePolicy::Rfc3339),
            other => Err(StubqlError::Configuration(format!(
                "unknown date policy '{}', expected 'pattern' or 'rfc3339'",
                other
            ))),
        }
    }
}

/// Select the process-wide date policy
pub fn set_date_policy(policy: DatePolicy) {
    tracing::debug!(?policy, "setting fixture date policy");
    DATE_POLICY.store(policy as u8, Ordering::SeqCst);
}

/// The process-wide date policy
pub fn date_policy() -> DatePolicy {
    match DATE_POLICY.load(Ordering::SeqCst) {
        1 => DatePolicy::Rfc3339,
        _ => DatePolicy::Pattern,
    }
}

fn parse_pattern_timestamp(field: &str) -> Option<NaiveDateTime> {
    let captures = TIMESTAMP_PATTERN.captures(field)?;
    let date = NaiveDate::parse_from_str(captures.get(1)?.as_str(), "%Y-%m-%d").ok()?;
    let time = match captures.get(2) {
        Some(time) => NaiveTime::parse_from_str(time.as_str(), "%H:%M:%S").ok()?,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    Some(date.and_time(time))
}

/// Builder that parses delimited text into a [`RowSet`]
#[derive(Debug, Clone)]
pub struct CsvFixture {
    columns: Arc<[String]>,
    delimiter: u8,
    date_policy: Option<DatePolicy>,
}

impl CsvFixture {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            delimiter: b',',
            date_policy: None,
        }
    }

    /// Field delimiter, `,` by default
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Pin the date policy instead of following [`date_policy`]
    pub fn date_policy(mut self, policy: DatePolicy) -> Self {
        self.date_policy = Some(policy);
        self
    }

    pub fn parse(&self, text: &str) -> Result<RowSet> {
        let policy = self.date_policy.unwrap_or_else(date_policy);
        // Blank lines are dropped before reading so a quoted "" record survives trimming.
        let text = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| StubqlError::Fixture(e.to_string()))?;
            if record.len() != self.columns.len() {
                return Err(StubqlError::MalformedFixture {
                    record: rows.len() + 1,
                    expected: self.columns.len(),
                    found: record.len(),
                });
            }
            rows.push(record.iter().map(|field| policy.infer(field)).collect());
        }

        tracing::debug!(
            columns = self.columns.len(),
            rows = rows.len(),
            ?policy,
            "fixture parsed"
        );
        RowSet::from_parts(Arc::clone(&self.columns), rows)
    }
}

/// Parse comma-separated `text` into rows for `columns`
pub fn rows_from_csv<I, S>(columns: I, text: &str) -> Result<RowSet>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CsvFixture::new(columns).parse(text)
}

/// Like [`rows_from_csv`], with a custom field delimiter
pub fn rows_from_csv_with_delimiter<I, S>(columns: I, text: &str, delimiter: u8) -> Result<RowSet>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CsvFixture::new(columns).delimiter(delimiter).parse(text)
}
