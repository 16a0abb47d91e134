//! Uploaded tables and required-column validation.
//!
//! An uploaded file is parsed into an `UploadedTable` of unknown shape. Before
//! any chart is built, `can_render_scatter` checks that every required column
//! name is present (exact, case-sensitive; contents are not inspected).

pub mod flow;

pub use flow::{UploadFlow, UploadPhase, UploadState};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

use crate::chart::ChartError;
use crate::data::table::{frame_column_names, frame_f64_values, frame_rows_text};
use crate::data::DataError;

/// Errors from loading or driving an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("could not read '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("could not parse CSV: {0}")]
    Parse(String),

    #[error("upload is {state}, cannot {action}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("chart error: {0}")]
    Chart(#[from] ChartError),
}

/// A table parsed from a user-supplied delimited file with a header row.
#[derive(Debug, Clone)]
pub struct UploadedTable {
    df: DataFrame,
    file_name: Option<String>,
}

impl UploadedTable {
    /// Parse CSV bytes (header row required).
    ///
    /// Column types are inferred from every row, so a stray non-numeric cell
    /// late in the file turns that column into text instead of failing.
    pub fn from_csv_bytes(bytes: Vec<u8>) -> Result<Self, UploadError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| UploadError::Parse(e.to_string()))?;
        Ok(Self::from_frame(df))
    }

    /// Read and parse a CSV file from disk.
    pub fn from_csv_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = std::fs::read(path).map_err(|e| UploadError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut table = Self::from_csv_bytes(bytes)?;
        table.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(table)
    }

    pub fn from_frame(df: DataFrame) -> Self {
        Self {
            df,
            file_name: None,
        }
    }

    /// An upload with no columns and no rows.
    pub fn empty() -> Self {
        Self::from_frame(DataFrame::empty())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn as_frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn column_names(&self) -> Vec<String> {
        frame_column_names(&self.df)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    /// Display text for the first `n` rows.
    pub fn head_rows(&self, n: usize) -> Vec<Vec<String>> {
        frame_rows_text(&self.df.head(Some(n)))
    }

    /// Column cast to f64; cells that don't parse become `None`.
    pub fn f64_values(&self, name: &str) -> Result<Vec<Option<f64>>, DataError> {
        frame_f64_values(&self.df, name)
    }

    /// Column as text; nulls stay `None`.
    pub fn text_values(&self, name: &str) -> Result<Vec<Option<String>>, DataError> {
        let column = self.df.column(name)?.cast(&DataType::String)?;
        let ca = column.str()?;
        Ok((0..ca.len()).map(|i| ca.get(i).map(str::to_string)).collect())
    }
}

/// The column names a chart needs, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredColumns {
    names: Vec<String>,
}

impl RequiredColumns {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| seen.insert(name.clone()))
            .collect();
        Self { names }
    }

    /// `total_bill`, `tip` and the `sex` category.
    pub fn tips() -> Self {
        Self::new(["total_bill", "tip", "sex"])
    }

    /// `total_bill` and `tip` only.
    pub fn tips_basic() -> Self {
        Self::new(["total_bill", "tip"])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Human-readable rejection naming every required column.
    pub fn rejection_message(&self) -> String {
        let quoted: Vec<String> = self.names.iter().map(|n| format!("'{n}'")).collect();
        let list = match quoted.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            [init @ .., last] => format!("{} and {last}", init.join(", ")),
        };
        format!("The file must contain the columns {list}.")
    }
}

/// Which required-column set the tips chart uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipsRequirement {
    #[default]
    WithSex,
    Basic,
}

impl TipsRequirement {
    pub fn columns(self) -> RequiredColumns {
        match self {
            TipsRequirement::WithSex => RequiredColumns::tips(),
            TipsRequirement::Basic => RequiredColumns::tips_basic(),
        }
    }
}

/// Required names absent from the table, in required order.
pub fn missing_columns(table: &UploadedTable, required: &RequiredColumns) -> Vec<String> {
    let present: HashSet<String> = table.column_names().into_iter().collect();
    required
        .names()
        .iter()
        .filter(|name| !present.contains(*name))
        .cloned()
        .collect()
}

/// True iff every required column is present in the table.
pub fn can_render_scatter(table: &UploadedTable, required: &RequiredColumns) -> bool {
    missing_columns(table, required).is_empty()
}
