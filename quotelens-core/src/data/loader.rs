//! Memoized series loading for the fixed ticker.
//!
//! Flow per request: cache lookup → on miss, fetch from the source →
//! normalize → store. At most one fetch happens per distinct
//! (period, interval) pair for as long as the cache lives. Failures are
//! returned unchanged and nothing is cached for them.

use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

use super::normalize::normalize;
use super::provider::{DataError, Interval, MarketDataSource, Period};
use super::table::FlatTable;

/// Cache key: the request parameters.
pub type SeriesKey = (Period, Interval);

/// Bounded memo cache from request parameters to normalized tables.
///
/// When full, the oldest inserted entry is evicted.
#[derive(Debug, Clone)]
pub struct SeriesCache {
    entries: HashMap<SeriesKey, FlatTable>,
    order: VecDeque<SeriesKey>,
    capacity: usize,
}

impl SeriesCache {
    /// Room for every (period, interval) combination.
    pub const DEFAULT_CAPACITY: usize = Period::ALL.len() * Interval::ALL.len();

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Capacity is clamped to at least one entry.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&FlatTable> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &SeriesKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: SeriesKey, table: FlatTable) {
        if self.entries.insert(key, table).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                debug!(period = %oldest.0, interval = %oldest.1, "evicted cached series");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads normalized quote tables for one ticker, memoized by request.
pub struct SeriesLoader {
    source: Box<dyn MarketDataSource>,
    ticker: String,
    cache: SeriesCache,
}

impl SeriesLoader {
    pub fn new(
        source: Box<dyn MarketDataSource>,
        ticker: impl Into<String>,
        cache: SeriesCache,
    ) -> Self {
        Self {
            source,
            ticker: ticker.into(),
            cache,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    /// Load the flat table for a request, fetching only on a cache miss.
    pub fn load(&mut self, period: Period, interval: Interval) -> Result<FlatTable, DataError> {
        let key = (period, interval);
        if let Some(table) = self.cache.get(&key) {
            debug!(ticker = %self.ticker, %period, %interval, "series cache hit");
            return Ok(table.clone());
        }

        debug!(
            ticker = %self.ticker,
            %period,
            %interval,
            source = self.source.name(),
            "series cache miss, fetching"
        );
        let raw = self.source.fetch(&self.ticker, period, interval)?;
        if raw.height() == 0 {
            return Err(DataError::EmptyResult {
                symbol: self.ticker.clone(),
                period,
                interval,
            });
        }

        let table = normalize(raw)?;
        info!(
            ticker = %self.ticker,
            %period,
            %interval,
            rows = table.height(),
            "loaded series"
        );
        self.cache.insert(key, table.clone());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::{ColumnLabel, RawTable};
    use chrono::NaiveDate;

    fn one_row_table() -> FlatTable {
        let raw = RawTable::new("Date", vec![NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()])
            .with_f64(ColumnLabel::pair("Close", "AAPL"), vec![Some(1.0)])
            .unwrap();
        normalize(raw).unwrap()
    }

    #[test]
    fn default_capacity_covers_all_requests() {
        assert_eq!(SeriesCache::DEFAULT_CAPACITY, 18);
        assert_eq!(SeriesCache::new().capacity(), 18);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut cache = SeriesCache::with_capacity(2);
        cache.insert((Period::OneMonth, Interval::OneDay), one_row_table());
        cache.insert((Period::OneYear, Interval::OneDay), one_row_table());
        cache.insert((Period::TwoYears, Interval::OneWeek), one_row_table());

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&(Period::OneMonth, Interval::OneDay)));
        assert!(cache.contains(&(Period::OneYear, Interval::OneDay)));
        assert!(cache.contains(&(Period::TwoYears, Interval::OneWeek)));
    }

    #[test]
    fn reinsert_does_not_grow_order() {
        let mut cache = SeriesCache::with_capacity(2);
        let key = (Period::OneYear, Interval::OneDay);
        cache.insert(key, one_row_table());
        cache.insert(key, one_row_table());
        cache.insert((Period::FiveYears, Interval::OneMonth), one_row_table());
        assert!(cache.contains(&key));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = SeriesCache::with_capacity(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn clear_empties_cache() {
        let mut cache = SeriesCache::new();
        cache.insert((Period::OneYear, Interval::OneDay), one_row_table());
        cache.clear();
        assert!(cache.is_empty());
    }
}
