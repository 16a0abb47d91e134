//! Raw and flat table types.
//!
//! A `RawTable` is what a data source hands back: a date index plus columns
//! whose labels may have one or two levels. A `FlatTable` is the normalized
//! form the front ends consume: a polars `DataFrame` with unique, single-level
//! column names and the date as an ordinary leading column.

use chrono::NaiveDate;
use polars::prelude::*;
use std::io::Write;

use super::provider::DataError;

/// A column label: one entry per header level, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnLabel(Vec<String>);

impl ColumnLabel {
    /// Single-level label.
    pub fn flat(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Two-level label, e.g. `("Close", "AAPL")`.
    pub fn pair(field: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self(vec![field.into(), ticker.into()])
    }

    /// Label of a promoted index column: its name followed by empty levels.
    pub(crate) fn promoted(name: &str, depth: usize) -> Self {
        let mut levels = vec![name.to_string()];
        levels.resize(depth.max(1), String::new());
        Self(levels)
    }

    pub fn levels(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

/// Provider-returned table, before normalization.
#[derive(Debug, Clone)]
pub struct RawTable {
    index_name: String,
    index: Vec<NaiveDate>,
    labels: Vec<ColumnLabel>,
    columns: Vec<Column>,
}

impl RawTable {
    /// Empty table over a chronological date index.
    pub fn new(index_name: impl Into<String>, index: Vec<NaiveDate>) -> Self {
        Self {
            index_name: index_name.into(),
            index,
            labels: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Append a column. Rejects ragged lengths and mixed header depths.
    pub fn with_column(mut self, label: ColumnLabel, data: Column) -> Result<Self, DataError> {
        if label.depth() == 0 {
            return Err(DataError::Table("column label has no levels".into()));
        }
        if data.len() != self.index.len() {
            return Err(DataError::Table(format!(
                "column {:?} has {} rows, index has {}",
                label.levels(),
                data.len(),
                self.index.len()
            )));
        }
        if let Some(first) = self.labels.first() {
            if first.depth() != label.depth() {
                return Err(DataError::Table(format!(
                    "column {:?} has {} header levels, expected {}",
                    label.levels(),
                    label.depth(),
                    first.depth()
                )));
            }
        }
        self.labels.push(label);
        self.columns.push(data);
        Ok(self)
    }

    /// Append a float column.
    pub fn with_f64(self, label: ColumnLabel, values: Vec<Option<f64>>) -> Result<Self, DataError> {
        self.with_column(label, Column::new(PlSmallStr::EMPTY, values))
    }

    /// Append an integer column.
    pub fn with_i64(self, label: ColumnLabel, values: Vec<Option<i64>>) -> Result<Self, DataError> {
        self.with_column(label, Column::new(PlSmallStr::EMPTY, values))
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn labels(&self) -> &[ColumnLabel] {
        &self.labels
    }

    /// Number of header levels (1 when there are no columns).
    pub fn depth(&self) -> usize {
        self.labels.first().map_or(1, ColumnLabel::depth)
    }

    /// True when the header has more than one level.
    pub fn is_hierarchical(&self) -> bool {
        self.depth() > 1
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn into_parts(self) -> (String, Vec<NaiveDate>, Vec<ColumnLabel>, Vec<Column>) {
        (self.index_name, self.index, self.labels, self.columns)
    }
}

/// Normalized table: unique single-level names, date as a leading column,
/// chronological row order.
#[derive(Debug, Clone)]
pub struct FlatTable {
    df: DataFrame,
}

impl FlatTable {
    pub(crate) fn from_frame(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn as_frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn column_names(&self) -> Vec<String> {
        frame_column_names(&self.df)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> FlatTable {
        Self::from_frame(self.df.head(Some(n)))
    }

    /// Last `n` rows.
    pub fn tail(&self, n: usize) -> FlatTable {
        Self::from_frame(self.df.tail(Some(n)))
    }

    /// Date column values. Errors if the column is missing or not a date.
    pub fn dates(&self, name: &str) -> Result<Vec<NaiveDate>, DataError> {
        let column = self.df.column(name)?;
        let date_ca = column.date()?;
        let epoch = epoch();

        (0..self.df.height())
            .map(|i| {
                date_ca
                    .get(i)
                    .map(|days| epoch + chrono::Duration::days(days as i64))
                    .ok_or_else(|| DataError::Table(format!("null date in '{name}' at row {i}")))
            })
            .collect()
    }

    /// Numeric column values cast to f64; nulls stay `None`.
    pub fn f64_values(&self, name: &str) -> Result<Vec<Option<f64>>, DataError> {
        frame_f64_values(&self.df, name)
    }

    /// Display text for every cell, row-major.
    pub fn rows_text(&self) -> Vec<Vec<String>> {
        frame_rows_text(&self.df)
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), DataError> {
        write_frame_csv(&self.df, writer)
    }

    /// BLAKE3 content hash over the CSV rendering. Same table, same hash.
    pub fn fingerprint(&self) -> Result<String, DataError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(blake3::hash(&buf).to_hex().to_string())
    }
}

// ── DataFrame helpers shared with uploaded tables ───────────────────

pub(crate) fn epoch() -> NaiveDate {
    NaiveDate::default()
}

pub(crate) fn frame_column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

pub(crate) fn frame_f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, DataError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let ca = column.f64()?;
    Ok((0..ca.len()).map(|i| ca.get(i)).collect())
}

pub(crate) fn cell_text(column: &Column, row: usize) -> String {
    match column.as_materialized_series().get(row) {
        Ok(AnyValue::Null) | Err(_) => String::new(),
        Ok(AnyValue::String(s)) => s.to_string(),
        Ok(AnyValue::StringOwned(s)) => s.to_string(),
        Ok(AnyValue::Float64(v)) => format_float(v),
        Ok(AnyValue::Float32(v)) => format_float(v as f64),
        Ok(other) => other.to_string(),
    }
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

pub(crate) fn frame_rows_text(df: &DataFrame) -> Vec<Vec<String>> {
    let columns = df.get_columns();
    (0..df.height())
        .map(|row| columns.iter().map(|c| cell_text(c, row)).collect())
        .collect()
}

pub(crate) fn write_frame_csv<W: Write>(df: &DataFrame, writer: W) -> Result<(), DataError> {
    let map_err = |e: csv::Error| DataError::Other(format!("csv write: {e}"));
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(frame_column_names(df)).map_err(map_err)?;
    for row in frame_rows_text(df) {
        wtr.write_record(&row).map_err(map_err)?;
    }
    wtr.flush()
        .map_err(|e| DataError::Other(format!("csv flush: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn epoch_is_unix_epoch() {
        assert_eq!(epoch(), d(1970, 1, 1));
    }

    #[test]
    fn promoted_label_pads_empty_levels() {
        let label = ColumnLabel::promoted("Date", 2);
        assert_eq!(label.levels(), &["Date".to_string(), String::new()]);
        assert_eq!(ColumnLabel::promoted("Date", 1).depth(), 1);
    }

    #[test]
    fn rejects_ragged_column() {
        let raw = RawTable::new("Date", vec![d(2024, 1, 2), d(2024, 1, 3)]);
        let result = raw.with_f64(ColumnLabel::pair("Close", "AAPL"), vec![Some(1.0)]);
        assert!(matches!(result, Err(DataError::Table(_))));
    }

    #[test]
    fn rejects_mixed_header_depth() {
        let raw = RawTable::new("Date", vec![d(2024, 1, 2)])
            .with_f64(ColumnLabel::pair("Close", "AAPL"), vec![Some(1.0)])
            .unwrap();
        let result = raw.with_f64(ColumnLabel::flat("Open"), vec![Some(1.0)]);
        assert!(matches!(result, Err(DataError::Table(_))));
    }

    #[test]
    fn depth_defaults_to_flat_without_columns() {
        let raw = RawTable::new("Date", vec![d(2024, 1, 2)]);
        assert_eq!(raw.depth(), 1);
        assert!(!raw.is_hierarchical());
    }

    #[test]
    fn cell_text_blanks_nulls() {
        let column = Column::new("x".into(), vec![Some(1.5), None]);
        assert_eq!(cell_text(&column, 0), "1.5");
        assert_eq!(cell_text(&column, 1), "");
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), vec![1i64, 2]),
            Column::new("b".into(), vec!["x", "y"]),
        ])
        .unwrap();
        let mut buf = Vec::new();
        write_frame_csv(&df, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a,b\n1,x\n2,y\n");
    }
}
