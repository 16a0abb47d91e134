//! Integration tests for the memoized series loader.
//!
//! A counting mock stands in for the network source; the call counter is
//! shared with the test through an `Arc`.

use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use quotelens_core::data::{
    ColumnLabel, DataError, Interval, MarketDataSource, Period, RawTable, SeriesCache,
    SeriesLoader,
};

// ── Mock source ──────────────────────────────────────────────────────

struct CountingSource {
    calls: Arc<AtomicUsize>,
    /// Errors to return before succeeding, consumed front to back.
    failures: Mutex<Vec<DataError>>,
    rows: usize,
}

impl CountingSource {
    fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            failures: Mutex::new(Vec::new()),
            rows: 3,
        }
    }

    fn failing_first(calls: Arc<AtomicUsize>, error: DataError) -> Self {
        Self {
            failures: Mutex::new(vec![error]),
            ..Self::new(calls)
        }
    }

    fn empty(calls: Arc<AtomicUsize>) -> Self {
        Self {
            rows: 0,
            ..Self::new(calls)
        }
    }
}

impl MarketDataSource for CountingSource {
    fn name(&self) -> &str {
        "counting_mock"
    }

    fn fetch(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<RawTable, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.lock().unwrap().pop() {
            return Err(err);
        }

        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let dates: Vec<NaiveDate> = (0..self.rows as i64)
            .map(|i| base + chrono::Duration::days(i))
            .collect();
        // Encode the request in the values so cached tables are distinguishable.
        let marker = (period.index() * 10 + interval.index()) as f64;
        let closes = (0..self.rows).map(|i| Some(marker + i as f64)).collect();
        RawTable::new("Date", dates).with_f64(ColumnLabel::pair("Close", ticker), closes)
    }
}

fn loader(source: CountingSource) -> SeriesLoader {
    SeriesLoader::new(Box::new(source), "AAPL", SeriesCache::new())
}

// ── Memoization ──────────────────────────────────────────────────────

#[test]
fn identical_requests_fetch_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut loader = loader(CountingSource::new(calls.clone()));

    let first = loader.load(Period::OneYear, Interval::OneDay).unwrap();
    let second = loader.load(Period::OneYear, Interval::OneDay).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
}

#[test]
fn different_request_fetches_again() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut loader = loader(CountingSource::new(calls.clone()));

    loader.load(Period::OneYear, Interval::OneDay).unwrap();
    loader.load(Period::OneYear, Interval::OneDay).unwrap();
    let weekly = loader.load(Period::OneYear, Interval::OneWeek).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(loader.cache().len(), 2);
    assert_eq!(weekly.f64_values("Close_AAPL").unwrap()[0], Some(31.0));
}

#[test]
fn every_combination_is_cached_with_default_capacity() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut loader = loader(CountingSource::new(calls.clone()));

    for _ in 0..2 {
        for period in Period::ALL {
            for interval in Interval::ALL {
                loader.load(period, interval).unwrap();
            }
        }
    }
    assert_eq!(calls.load(Ordering::SeqCst), 18);
}

#[test]
fn evicted_entry_is_fetched_again() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut loader = SeriesLoader::new(
        Box::new(CountingSource::new(calls.clone())),
        "AAPL",
        SeriesCache::with_capacity(1),
    );

    loader.load(Period::OneYear, Interval::OneDay).unwrap();
    loader.load(Period::TwoYears, Interval::OneDay).unwrap();
    loader.load(Period::OneYear, Interval::OneDay).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn loaded_table_is_normalized() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut loader = loader(CountingSource::new(calls));
    let table = loader.load(Period::OneMonth, Interval::OneDay).unwrap();
    assert_eq!(table.column_names(), vec!["Date", "Close_AAPL"]);
    assert_eq!(table.height(), 3);
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn failures_propagate_and_are_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut loader = loader(CountingSource::failing_first(
        calls.clone(),
        DataError::NetworkUnreachable("connection refused".into()),
    ));

    let err = loader.load(Period::OneYear, Interval::OneDay).unwrap_err();
    assert!(matches!(err, DataError::NetworkUnreachable(_)));
    assert!(loader.cache().is_empty());

    // Next interaction retries through the source and succeeds.
    loader.load(Period::OneYear, Interval::OneDay).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn empty_result_is_an_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut loader = loader(CountingSource::empty(calls.clone()));

    let err = loader.load(Period::FiveYears, Interval::OneMonth).unwrap_err();
    match err {
        DataError::EmptyResult {
            symbol,
            period,
            interval,
        } => {
            assert_eq!(symbol, "AAPL");
            assert_eq!(period, Period::FiveYears);
            assert_eq!(interval, Interval::OneMonth);
        }
        other => panic!("expected EmptyResult, got {other:?}"),
    }
    assert!(loader.cache().is_empty());
}
