//! Tests for the pagination module

use super::*;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, Session};
use crate::record::Review;
use crate::types::LocationId;
use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

// ============================================================================
// Helpers
// ============================================================================

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn offline_session() -> Session {
    let client =
        HttpClient::with_config(HttpClientConfig::builder().no_rate_limit().build()).unwrap();
    Session::from_client("test", client, None)
}

fn items(dates: &[&str]) -> Vec<Value> {
    dates
        .iter()
        .enumerate()
        .map(|(i, d)| json!({"title": format!("review {i}"), "publishedDate": d}))
        .collect()
}

fn repeat(d: &str, n: usize) -> Vec<Value> {
    items(&vec![d; n])
}

/// Serves pages by index (`offset / limit`); `None` fails the fetch
struct ScriptedSource {
    limit: u32,
    pages: Vec<Option<Page<Value>>>,
    offsets: Mutex<Vec<u64>>,
}

impl ScriptedSource {
    fn new(limit: u32, pages: Vec<Option<Page<Value>>>) -> Self {
        Self {
            limit,
            pages,
            offsets: Mutex::new(Vec::new()),
        }
    }

    fn offsets(&self) -> Vec<u64> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl PagedFetcher for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn page_size(&self) -> u32 {
        self.limit
    }

    async fn fetch(
        &self,
        _location_id: LocationId,
        cursor: PaginationCursor,
        _session: &Session,
    ) -> Result<Page<Value>> {
        assert_eq!(cursor.limit, self.limit);
        self.offsets.lock().unwrap().push(cursor.offset);

        let index = (cursor.offset / u64::from(self.limit)) as usize;
        match self.pages.get(index) {
            Some(Some(page)) => Ok(page.clone()),
            Some(None) => Err(Error::http_status(500, "upstream down")),
            None => Ok(Page::empty()),
        }
    }
}

impl ReviewSource for ScriptedSource {
    fn date_field(&self) -> &str {
        "publishedDate"
    }

    fn to_review(&self, raw: &Value) -> Review {
        Review::from_graphql(raw)
    }
}

fn collector() -> ReviewCollector {
    ReviewCollector::new(Duration::ZERO)
}

/// Fields of every event logged while installed
#[derive(Clone, Default)]
struct CapturedEvents(Arc<Mutex<Vec<BTreeMap<String, String>>>>);

impl CapturedEvents {
    fn with_message(&self, needle: &str) -> Vec<BTreeMap<String, String>> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.get("message").is_some_and(|m| m.contains(needle)))
            .cloned()
            .collect()
    }
}

struct FieldMap(BTreeMap<String, String>);

impl tracing::field::Visit for FieldMap {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

impl<S: tracing::Subscriber> Layer<S> for CapturedEvents {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = FieldMap(BTreeMap::new());
        event.record(&mut fields);
        self.0.lock().unwrap().push(fields.0);
    }
}

// ============================================================================
// Boundary Scan
// ============================================================================

#[test_case(&["2023-07-01", "2023-06-15", "2023-05-01"], Some("2023-06-01"), Some(2) ; "middle of page")]
#[test_case(&["2023-05-01", "2023-04-01"], Some("2023-06-01"), Some(0) ; "first item already old")]
#[test_case(&["2023-07-01", "2023-06-01"], Some("2023-06-01"), None ; "same day is not before")]
#[test_case(&["2023-07-01", "2023-05-01"], None, None ; "no cutoff")]
#[test_case(&[], Some("2023-06-01"), None ; "empty page")]
#[test_case(&["", "garbage", "2023-05-31"], Some("2023-06-01"), Some(2) ; "unreadable dates never match")]
fn test_scan(dates: &[&str], cutoff: Option<&str>, expected: Option<usize>) {
    let scanner = BoundaryScanner::new("publishedDate", cutoff.map(date));
    assert_eq!(scanner.scan(&items(dates)), expected);
}

#[test]
fn test_scan_generic_items() {
    let dates = [date("2023-03-01"), date("2023-02-01"), date("2023-01-01")];
    assert_eq!(scan(&dates, |d| Some(*d), Some(date("2023-02-15"))), Some(1));
    assert_eq!(scan(&dates, |_| None, Some(date("2023-02-15"))), None);
}

#[test]
fn test_scan_missing_field() {
    let scanner = BoundaryScanner::new("published_date", Some(date("2023-06-01")));
    let page = vec![json!({"publishedDate": "2020-01-01"}), json!({"published_date": null})];
    assert_eq!(scanner.scan(&page), None);
}

#[test_case("2023-06-01", Some("2023-06-01") ; "plain date")]
#[test_case("2023-06-01T23:59:59Z", Some("2023-06-01") ; "rfc3339 utc")]
#[test_case("2023-06-01T10:00:00-04:00", Some("2023-06-01") ; "rfc3339 offset")]
#[test_case("2023-06-01T10:00:00-0400", Some("2023-06-01") ; "compact offset")]
#[test_case("2023-06-01T10:00:00", Some("2023-06-01") ; "no offset")]
#[test_case("2023-06-01 extra", Some("2023-06-01") ; "date prefix")]
#[test_case("June 1st", None ; "prose")]
#[test_case("", None ; "empty")]
fn test_parse_date(raw: &str, expected: Option<&str>) {
    assert_eq!(parse_date(raw), expected.map(date));
}

#[test]
fn test_is_newest_first() {
    let scanner = BoundaryScanner::new("publishedDate", None);
    assert!(scanner.is_newest_first(&items(&["2023-03-01", "2023-03-01", "2023-01-01"])));
    assert!(scanner.is_newest_first(&items(&["2023-03-01", "bad", "2023-01-01"])));
    assert!(!scanner.is_newest_first(&items(&["2023-01-01", "2023-03-01"])));
}

// ============================================================================
// Cursor
// ============================================================================

#[test_case(55, 20, 2 ; "partial last page")]
#[test_case(60, 20, 2 ; "exact pages")]
#[test_case(20, 20, 0 ; "single full page")]
#[test_case(5, 20, 0 ; "less than a page")]
#[test_case(0, 20, 0 ; "nothing")]
#[test_case(10, 0, 9 ; "zero limit treated as one")]
fn test_remaining_pages(total: u64, limit: u32, expected: u64) {
    assert_eq!(PaginationCursor::remaining_pages(total, limit), expected);
}

#[test]
fn test_cursor_advance() {
    let mut cursor = PaginationCursor::first(20);
    cursor.advance();
    cursor.advance();
    assert_eq!(cursor, PaginationCursor { offset: 40, limit: 20 });
}

// ============================================================================
// Review Collection
// ============================================================================

#[tokio::test]
async fn test_stops_inside_second_page() {
    let mut second = repeat("2023-07-01", 20);
    second[5] = json!({"title": "old", "publishedDate": "2023-01-01"});

    let source = ScriptedSource::new(
        20,
        vec![
            Some(Page::new(repeat("2023-08-01", 20), 55, true)),
            Some(Page::new(second, 55, true)),
            Some(Page::new(repeat("2022-12-01", 15), 55, false)),
        ],
    );

    let reviews = collector()
        .collect(1, &source, &offline_session(), Some(date("2023-06-01")))
        .await
        .unwrap();

    assert_eq!(reviews.len(), 25);
    assert_eq!(source.offsets(), vec![0, 20]);
    assert!(reviews.iter().all(|r| r.published_on() >= Some(date("2023-06-01"))));
}

#[tokio::test]
async fn test_unordered_page_is_reported_with_location() {
    let events = CapturedEvents::default();
    let subscriber = tracing_subscriber::registry().with(events.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let source = ScriptedSource::new(
        2,
        vec![
            Some(Page::new(items(&["2023-08-02", "2023-08-01"]), 4, true)),
            Some(Page::new(items(&["2023-07-01", "2023-07-20"]), 4, true)),
        ],
    );

    let reviews = collector()
        .collect(314, &source, &offline_session(), None)
        .await
        .unwrap();
    assert_eq!(reviews.len(), 4);

    let warnings = events.with_message("not ordered newest-first");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].get("location_id").map(String::as_str), Some("314"));
    assert_eq!(warnings[0].get("offset").map(String::as_str), Some("2"));
    assert_eq!(warnings[0].get("source").map(String::as_str), Some("scripted"));
}

#[tokio::test]
async fn test_without_cutoff_fetches_everything() {
    let source = ScriptedSource::new(
        20,
        vec![
            Some(Page::new(repeat("2023-08-01", 20), 55, true)),
            Some(Page::new(repeat("2023-07-01", 20), 55, true)),
            Some(Page::new(repeat("2023-06-01", 15), 55, false)),
        ],
    );

    let reviews = collector()
        .collect(1, &source, &offline_session(), None)
        .await
        .unwrap();

    assert_eq!(reviews.len(), 55);
    assert_eq!(source.offsets(), vec![0, 20, 40]);
}

#[tokio::test]
async fn test_boundary_on_first_page_skips_rest() {
    let source = ScriptedSource::new(
        20,
        vec![
            Some(Page::new(items(&["2023-08-01", "2023-01-01", "2023-09-01"]), 100, true)),
            Some(Page::new(repeat("2023-07-01", 20), 100, true)),
        ],
    );

    let reviews = collector()
        .collect(1, &source, &offline_session(), Some(date("2023-06-01")))
        .await
        .unwrap();

    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].title, "review 0");
    assert_eq!(source.offsets(), vec![0]);
}

#[tokio::test]
async fn test_everything_older_than_cutoff() {
    let source = ScriptedSource::new(
        20,
        vec![Some(Page::new(repeat("2020-01-01", 20), 40, true))],
    );

    let reviews = collector()
        .collect(1, &source, &offline_session(), Some(date("2023-06-01")))
        .await
        .unwrap();

    assert!(reviews.is_empty());
    assert_eq!(source.offsets(), vec![0]);
}

#[tokio::test]
async fn test_first_page_failure_propagates() {
    let source = ScriptedSource::new(20, vec![None]);

    let err = collector()
        .collect(1, &source, &offline_session(), None)
        .await
        .unwrap_err();

    assert!(err.is_fetch());
}

#[tokio::test]
async fn test_later_failure_keeps_partial_result() {
    let source = ScriptedSource::new(
        20,
        vec![
            Some(Page::new(repeat("2023-08-01", 20), 60, true)),
            None,
            Some(Page::new(repeat("2023-06-01", 20), 60, false)),
        ],
    );

    let reviews = collector()
        .collect(1, &source, &offline_session(), None)
        .await
        .unwrap();

    assert_eq!(reviews.len(), 20);
    assert_eq!(source.offsets(), vec![0, 20]);
}

#[tokio::test]
async fn test_no_next_page_on_first() {
    let source = ScriptedSource::new(
        20,
        vec![
            Some(Page::new(repeat("2023-08-01", 20), 80, false)),
            Some(Page::new(repeat("2023-07-01", 20), 80, true)),
        ],
    );

    let reviews = collector()
        .collect(1, &source, &offline_session(), None)
        .await
        .unwrap();

    assert_eq!(reviews.len(), 20);
    assert_eq!(source.offsets(), vec![0]);
}

#[tokio::test]
async fn test_result_capped_at_first_total() {
    let source = ScriptedSource::new(
        20,
        vec![
            Some(Page::new(repeat("2023-08-01", 20), 30, true)),
            Some(Page::new(repeat("2023-07-01", 20), 45, true)),
        ],
    );

    let reviews = collector()
        .collect(1, &source, &offline_session(), None)
        .await
        .unwrap();

    assert_eq!(reviews.len(), 30);
    assert_eq!(source.offsets(), vec![0, 20]);
}

#[tokio::test]
async fn test_empty_page_ends_loop() {
    let source = ScriptedSource::new(
        20,
        vec![
            Some(Page::new(repeat("2023-08-01", 20), 100, true)),
            Some(Page::new(vec![], 100, true)),
            Some(Page::new(repeat("2023-07-01", 20), 100, true)),
        ],
    );

    let reviews = collector()
        .collect(1, &source, &offline_session(), None)
        .await
        .unwrap();

    assert_eq!(reviews.len(), 20);
    assert_eq!(source.offsets(), vec![0, 20]);
}

#[tokio::test]
async fn test_delay_between_pages() {
    let source = ScriptedSource::new(
        20,
        vec![
            Some(Page::new(repeat("2023-08-01", 20), 60, true)),
            Some(Page::new(repeat("2023-07-01", 20), 60, true)),
            Some(Page::new(repeat("2023-06-01", 20), 60, false)),
        ],
    );

    let start = std::time::Instant::now();
    let reviews = ReviewCollector::new(Duration::from_millis(25))
        .collect(1, &source, &offline_session(), None)
        .await
        .unwrap();

    assert_eq!(reviews.len(), 60);
    assert!(start.elapsed() >= Duration::from_millis(50));
}

// ============================================================================
// Page Accumulation
// ============================================================================

#[tokio::test]
async fn test_accumulates_until_no_next() {
    let source = ScriptedSource::new(
        2,
        vec![
            Some(Page::new(items(&["a", "b"]), 5, true)),
            Some(Page::new(items(&["c", "d"]), 5, true)),
            Some(Page::new(items(&["e"]), 5, false)),
            Some(Page::new(items(&["never"]), 5, false)),
        ],
    );

    let all = PageAccumulator::new(Duration::ZERO, 50)
        .accumulate(1, &source, &offline_session())
        .await
        .unwrap();

    assert_eq!(all.len(), 5);
    assert_eq!(source.offsets(), vec![0, 2, 4]);
}

#[tokio::test]
async fn test_accumulator_partial_on_later_failure() {
    let source = ScriptedSource::new(
        2,
        vec![Some(Page::new(items(&["a", "b"]), 6, true)), None],
    );

    let all = PageAccumulator::new(Duration::ZERO, 50)
        .accumulate(1, &source, &offline_session())
        .await
        .unwrap();

    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_accumulator_respects_page_limit() {
    let source = ScriptedSource::new(
        1,
        (0..10)
            .map(|_| Some(Page::new(items(&["x"]), 10, true)))
            .collect(),
    );

    let all = PageAccumulator::new(Duration::ZERO, 3)
        .accumulate(1, &source, &offline_session())
        .await
        .unwrap();

    assert_eq!(all.len(), 3);
    assert_eq!(source.offsets(), vec![0, 1, 2]);
}
