//! End-to-end: captured provider payload → normalizer → loader → view → PNG.

use chrono::NaiveDate;

use quotelens_core::config::DashboardConfig;
use quotelens_core::data::{
    normalize, ColumnLabel, DataError, Interval, MarketDataSource, Period, RawTable, SeriesCache,
    SeriesLoader, YahooProvider,
};
use quotelens_core::view::QuotesView;

const CAPTURED: &str = include_str!("fixtures/aapl_chart_1mo_1d.json");

/// Replays the captured payload for any request.
struct ReplaySource;

impl MarketDataSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    fn fetch(
        &self,
        ticker: &str,
        _period: Period,
        _interval: Interval,
    ) -> Result<RawTable, DataError> {
        YahooProvider::parse_chart_json(ticker, CAPTURED)
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn date_level_is_dropped_not_left_dangling() {
    // Columns [("Close","AAPL"), ("Date","")], two rows.
    let raw = RawTable::new("Date", vec![d(2024, 1, 2), d(2024, 1, 3)])
        .with_f64(ColumnLabel::pair("Close", "AAPL"), vec![Some(185.64), Some(184.25)])
        .unwrap();
    let flat = normalize(raw).unwrap();

    assert_eq!(flat.column_names(), vec!["Date", "Close_AAPL"]);
    assert!(!flat.column_names().iter().any(|n| n == "Date_"));
    assert_eq!(flat.height(), 2);
}

#[test]
fn captured_payload_flows_to_view_and_png() {
    let mut config = DashboardConfig::default();
    config.chart.width = 320;
    config.chart.height = 200;
    config.chart.margin = 20;

    let mut loader = SeriesLoader::new(
        Box::new(ReplaySource),
        config.ticker.clone(),
        SeriesCache::with_capacity(config.cache_capacity),
    );
    let table = loader.load(Period::OneMonth, Interval::OneDay).unwrap();
    assert_eq!(
        table.column_names(),
        vec!["Date", "Close_AAPL", "High_AAPL", "Low_AAPL", "Open_AAPL", "Volume_AAPL"]
    );
    assert_eq!(table.height(), 7);
    assert_eq!(table.dates("Date").unwrap()[0], d(2023, 12, 28));

    let view = QuotesView::build(&table, &config, Period::OneMonth, Interval::OneDay).unwrap();
    assert_eq!(view.preview.rows.len(), 5);
    assert_eq!(view.preview.rows[4][0], "2024-01-08");
    assert_eq!(view.line.points.len(), 7);

    let artifact = view.export_png(&config).unwrap();
    assert_eq!(artifact.file_name, "apple_chart.png");
    assert_eq!(&artifact.bytes[1..4], b"PNG");
}

#[test]
fn csv_export_round_trips_header() {
    let raw = YahooProvider::parse_chart_json("AAPL", CAPTURED).unwrap();
    let table = normalize(raw).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aapl.csv");
    let file = std::fs::File::create(&path).unwrap();
    table.write_csv(file).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Close_AAPL,High_AAPL,Low_AAPL,Open_AAPL,Volume_AAPL")
    );
    assert_eq!(lines.next(), Some("2023-12-28,193.58,194.66,193.17,194.14,34049900"));
    assert_eq!(text.lines().count(), 8);
}
