//! Date boundary detection
//!
//! Finds where a newest-first page crosses the cutoff date.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Index of the first item dated strictly before `cutoff`.
///
/// Items whose date is missing or unreadable never match. With no cutoff
/// nothing matches.
pub fn scan<T, F>(items: &[T], date_of: F, cutoff: Option<NaiveDate>) -> Option<usize>
where
    F: Fn(&T) -> Option<NaiveDate>,
{
    let cutoff = cutoff?;
    items
        .iter()
        .position(|item| date_of(item).is_some_and(|date| date < cutoff))
}

/// Parse an upstream date string down to its calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 and `YYYY-MM-DDTHH:MM:SS` with or without
/// an offset.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }

    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Boundary scan over raw JSON items for one source's date field
#[derive(Debug, Clone)]
pub struct BoundaryScanner {
    date_field: String,
    cutoff: Option<NaiveDate>,
}

impl BoundaryScanner {
    pub fn new(date_field: impl Into<String>, cutoff: Option<NaiveDate>) -> Self {
        Self {
            date_field: date_field.into(),
            cutoff,
        }
    }

    /// Date of one raw item, if present and readable
    pub fn date_of(&self, item: &Value) -> Option<NaiveDate> {
        item.get(&self.date_field)
            .and_then(Value::as_str)
            .and_then(parse_date)
    }

    /// Index of the first item before the cutoff
    pub fn scan(&self, items: &[Value]) -> Option<usize> {
        scan(items, |item| self.date_of(item), self.cutoff)
    }

    /// Whether the dated items of a page are in newest-first order
    pub fn is_newest_first(&self, items: &[Value]) -> bool {
        let dates: Vec<NaiveDate> = items.iter().filter_map(|i| self.date_of(i)).collect();
        dates.windows(2).all(|pair| pair[0] >= pair[1])
    }
}
