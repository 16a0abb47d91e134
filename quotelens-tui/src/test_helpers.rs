//! Test helpers: an in-memory market-data source and a ready AppState.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use quotelens_core::config::DashboardConfig;
use quotelens_core::data::{
    ColumnLabel, DataError, Interval, MarketDataSource, Period, RawTable, SeriesCache,
    SeriesLoader,
};

use crate::app::AppState;

pub struct StubSource {
    calls: Arc<AtomicUsize>,
    offline: bool,
}

impl StubSource {
    pub fn ok() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            offline: false,
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::ok()
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl MarketDataSource for StubSource {
    fn name(&self) -> &str {
        "stub"
    }

    fn fetch(&self, ticker: &str, _: Period, _: Interval) -> Result<RawTable, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(DataError::NetworkUnreachable("offline".into()));
        }
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let dates = (0..6).map(|i| base + chrono::Duration::days(i)).collect();
        let closes = (0..6).map(|i| Some(180.0 + i as f64)).collect();
        RawTable::new("Date", dates).with_f64(ColumnLabel::pair("Close", ticker), closes)
    }
}

/// App over `source` with small charts and exports into a temp dir.
pub fn app_with_source(source: StubSource) -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = DashboardConfig::default();
    config.chart.width = 200;
    config.chart.height = 120;
    config.chart.margin = 10;
    let loader = SeriesLoader::new(Box::new(source), config.ticker.clone(), SeriesCache::new());
    let app = AppState::new(config, loader, dir.path().to_path_buf());
    (app, dir)
}
