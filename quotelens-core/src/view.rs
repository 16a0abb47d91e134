//! What the front ends display for each interaction.
//!
//! Quotes: the last rows of the normalized table, its column list, and the
//! close-price chart. Tips: the first rows of the upload.

use tracing::info;

use crate::chart::{render_line_png, ChartError, ImageArtifact, LineSpec};
use crate::config::DashboardConfig;
use crate::data::{FlatTable, Interval, Period};
use crate::upload::UploadedTable;

/// Rows shown in table previews.
pub const PREVIEW_ROWS: usize = 5;

/// Header plus display rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TablePreview {
    /// Last `PREVIEW_ROWS` rows of a quote table.
    pub fn tail_of(table: &FlatTable) -> Self {
        let tail = table.tail(PREVIEW_ROWS);
        Self {
            columns: tail.column_names(),
            rows: tail.rows_text(),
        }
    }

    /// First `PREVIEW_ROWS` rows of an upload.
    pub fn head_of(table: &UploadedTable) -> Self {
        Self {
            columns: table.column_names(),
            rows: table.head_rows(PREVIEW_ROWS),
        }
    }
}

/// Everything shown for one (period, interval) selection.
#[derive(Debug, Clone)]
pub struct QuotesView {
    pub period: Period,
    pub interval: Interval,
    pub rows: usize,
    pub columns: Vec<String>,
    pub preview: TablePreview,
    pub line: LineSpec,
}

impl QuotesView {
    /// Fails fast when the configured close column is missing.
    pub fn build(
        table: &FlatTable,
        config: &DashboardConfig,
        period: Period,
        interval: Interval,
    ) -> Result<Self, ChartError> {
        let line = LineSpec::close_price(table, &config.ticker, &config.close_column())?;
        Ok(Self {
            period,
            interval,
            rows: table.height(),
            columns: table.column_names(),
            preview: TablePreview::tail_of(table),
            line,
        })
    }

    /// Encode the close-price chart for download.
    pub fn export_png(&self, config: &DashboardConfig) -> Result<ImageArtifact, ChartError> {
        let artifact = render_line_png(&self.line, &config.chart, &config.export_file_name)?;
        info!(
            period = %self.period,
            interval = %self.interval,
            file = %artifact.file_name,
            "close chart exported"
        );
        Ok(artifact)
    }
}
