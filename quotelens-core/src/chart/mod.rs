//! Chart specifications and image export.
//!
//! A spec is the plotted data plus labels and colors. Front ends draw specs
//! however they like; `png` renders them to a downloadable image.

pub mod png;

pub use png::{render_line_png, render_scatter_png, PngStyle};

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::data::{DataError, FlatTable};
use crate::upload::UploadedTable;

/// MIME type of exported chart images.
pub const PNG_MIME: &str = "image/png";

/// File name offered for the close-price chart download.
pub const DEFAULT_EXPORT_NAME: &str = "apple_chart.png";

/// Errors raised while building or exporting a chart.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("column '{column}' not found (available: {})", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("nothing to plot: {0}")]
    NoData(String),

    #[error(transparent)]
    Table(#[from] DataError),

    #[error("image encoding failed: {0}")]
    Encode(String),
}

// ── Colors ──────────────────────────────────────────────────────────

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ChartColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for ChartColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub mod colors {
    use super::ChartColor;

    pub const BACKGROUND: ChartColor = ChartColor::rgb(0x1e, 0x1e, 0x1e);
    pub const FOREGROUND: ChartColor = ChartColor::rgb(0xff, 0xff, 0xff);
    pub const CLOSE_LINE: ChartColor = ChartColor::rgb(0x5c, 0x59, 0xc5);
    pub const MALE: ChartColor = ChartColor::rgb(0x56, 0x49, 0xe0);
    pub const FEMALE: ChartColor = ChartColor::rgb(0xdf, 0x4a, 0xc6);

    /// Used for categories without a fixed color, in order of appearance.
    pub const FALLBACK: [ChartColor; 6] = [
        ChartColor::rgb(0x63, 0x6e, 0xfa),
        ChartColor::rgb(0xef, 0x55, 0x3b),
        ChartColor::rgb(0x00, 0xcc, 0x96),
        ChartColor::rgb(0xab, 0x63, 0xfa),
        ChartColor::rgb(0xff, 0xa1, 0x5a),
        ChartColor::rgb(0x19, 0xd3, 0xf3),
    ];
}

/// Maps category values to colors: fixed entries first, then the fallback
/// palette cycled over unknown categories.
#[derive(Debug, Clone)]
pub struct CategoryPalette {
    fixed: Vec<(String, ChartColor)>,
    fallback: Vec<ChartColor>,
}

impl CategoryPalette {
    pub fn new(fixed: Vec<(String, ChartColor)>, fallback: Vec<ChartColor>) -> Self {
        Self { fixed, fallback }
    }

    /// `Male` and `Female` pinned, everything else from the fallback palette.
    pub fn tips() -> Self {
        Self::new(
            vec![
                ("Male".to_string(), colors::MALE),
                ("Female".to_string(), colors::FEMALE),
            ],
            colors::FALLBACK.to_vec(),
        )
    }

    /// Color for `category`; `unknown_seen` is how many unpinned categories
    /// were assigned before this one.
    pub fn color_for(&self, category: &str, unknown_seen: usize) -> ChartColor {
        if let Some((_, color)) = self.fixed.iter().find(|(name, _)| name == category) {
            return *color;
        }
        if self.fallback.is_empty() {
            return colors::FOREGROUND;
        }
        self.fallback[unknown_seen % self.fallback.len()]
    }

    fn is_pinned(&self, category: &str) -> bool {
        self.fixed.iter().any(|(name, _)| name == category)
    }
}

// ── Line chart ──────────────────────────────────────────────────────

/// Close price over time.
#[derive(Debug, Clone)]
pub struct LineSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series_label: String,
    pub color: ChartColor,
    pub points: Vec<(NaiveDate, f64)>,
    /// Rows dropped because the value was null or not finite.
    pub skipped_rows: usize,
}

impl LineSpec {
    /// Build from the leading date column and `close_column` of a normalized
    /// table. Fails with `MissingColumn` when the close column is absent.
    pub fn close_price(
        table: &FlatTable,
        ticker: &str,
        close_column: &str,
    ) -> Result<Self, ChartError> {
        let available = table.column_names();
        if !table.contains(close_column) {
            return Err(ChartError::MissingColumn {
                column: close_column.to_string(),
                available,
            });
        }
        let date_column = available
            .first()
            .cloned()
            .ok_or_else(|| ChartError::NoData("table has no columns".into()))?;

        let dates = table.dates(&date_column)?;
        let values = table.f64_values(close_column)?;
        let mut skipped_rows = 0;
        let points: Vec<(NaiveDate, f64)> = dates
            .into_iter()
            .zip(values)
            .filter_map(|(date, value)| match value {
                Some(v) if v.is_finite() => Some((date, v)),
                _ => {
                    skipped_rows += 1;
                    None
                }
            })
            .collect();
        if skipped_rows > 0 {
            warn!(column = close_column, skipped_rows, "skipped empty close values");
        }

        Ok(Self {
            title: format!("{ticker} Close Price"),
            x_label: "Date".to_string(),
            y_label: "Price $".to_string(),
            series_label: "Close price".to_string(),
            color: colors::CLOSE_LINE,
            points,
            skipped_rows,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn x_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.points.first()?.0;
        let last = self.points.last()?.0;
        Some((first.min(last), first.max(last)))
    }

    /// Value range with 5% padding on each side.
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        padded_bounds(self.points.iter().map(|(_, v)| *v))
    }
}

// ── Scatter chart ───────────────────────────────────────────────────

/// Points sharing one category value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterGroup {
    pub category: String,
    pub color: ChartColor,
    pub points: Vec<(f64, f64)>,
}

/// Tip against total bill, grouped by category.
#[derive(Debug, Clone)]
pub struct ScatterSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub color_by: Option<String>,
    /// Groups in order of first appearance.
    pub groups: Vec<ScatterGroup>,
    /// Rows dropped because x, y or the category could not be read.
    pub skipped_rows: usize,
}

impl ScatterSpec {
    /// `tip` against `total_bill`, colored by `sex` when that column exists.
    pub fn tips(table: &UploadedTable) -> Result<Self, ChartError> {
        let color_by = table.has_column("sex").then_some("sex");
        let mut spec = Self::build(
            table,
            "total_bill",
            "tip",
            color_by,
            &CategoryPalette::tips(),
        )?;
        spec.title = "Tips vs total bill".to_string();
        Ok(spec)
    }

    /// Group `(x, y)` pairs by `color_by` (a single group when `None`).
    pub fn build(
        table: &UploadedTable,
        x: &str,
        y: &str,
        color_by: Option<&str>,
        palette: &CategoryPalette,
    ) -> Result<Self, ChartError> {
        for name in [Some(x), Some(y), color_by].into_iter().flatten() {
            if !table.has_column(name) {
                return Err(ChartError::MissingColumn {
                    column: name.to_string(),
                    available: table.column_names(),
                });
            }
        }

        let xs = table.f64_values(x)?;
        let ys = table.f64_values(y)?;
        let categories = match color_by {
            Some(name) => table.text_values(name)?,
            None => vec![Some(String::new()); table.height()],
        };

        let mut groups: Vec<ScatterGroup> = Vec::new();
        let mut unknown_seen = 0;
        let mut skipped_rows = 0;
        for ((xv, yv), category) in xs.into_iter().zip(ys).zip(categories) {
            let (Some(xv), Some(yv), Some(category)) = (xv, yv, category) else {
                skipped_rows += 1;
                continue;
            };
            if !xv.is_finite() || !yv.is_finite() {
                skipped_rows += 1;
                continue;
            }
            match groups.iter_mut().find(|g| g.category == category) {
                Some(group) => group.points.push((xv, yv)),
                None => {
                    let color = palette.color_for(&category, unknown_seen);
                    if !palette.is_pinned(&category) {
                        unknown_seen += 1;
                    }
                    groups.push(ScatterGroup {
                        category,
                        color,
                        points: vec![(xv, yv)],
                    });
                }
            }
        }
        if skipped_rows > 0 {
            warn!(skipped_rows, "skipped unreadable scatter rows");
        }

        Ok(Self {
            title: format!("{y} vs {x}"),
            x_label: x.to_string(),
            y_label: y.to_string(),
            color_by: color_by.map(str::to_string),
            groups,
            skipped_rows,
        })
    }

    pub fn point_count(&self) -> usize {
        self.groups.iter().map(|g| g.points.len()).sum()
    }

    pub fn x_bounds(&self) -> Option<(f64, f64)> {
        padded_bounds(self.all_points().map(|(x, _)| x))
    }

    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        padded_bounds(self.all_points().map(|(_, y)| y))
    }

    fn all_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.groups.iter().flat_map(|g| g.points.iter().copied())
    }
}

/// Min/max with 5% padding; a flat range is widened by one unit.
fn padded_bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })?;
    let span = hi - lo;
    if span <= f64::EPSILON {
        return Some((lo - 1.0, hi + 1.0));
    }
    let pad = span * 0.05;
    Some((lo - pad, hi + pad))
}

// ── Export artifact ─────────────────────────────────────────────────

/// Encoded image ready to be saved or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageArtifact {
    pub fn png(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: PNG_MIME,
            bytes,
        }
    }
}
