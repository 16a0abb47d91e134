//! Column normalization: RawTable → FlatTable.
//!
//! 1. The date index becomes the leading column.
//! 2. Two-level headers are flattened: levels joined with `_`, then any `_`
//!    left at either end is trimmed (`("Date", "")` → `Date`,
//!    `("Close", "AAPL")` → `Close_AAPL`).
//! 3. Single-level headers pass through unchanged.
//!
//! The mapping is deterministic. Names that would collide after flattening
//! get a numeric suffix so every column stays addressable.

use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::provider::DataError;
use super::table::{epoch, ColumnLabel, FlatTable, RawTable};

const SEPARATOR: &str = "_";

/// Flatten one multi-level label into a single column name.
pub fn flatten_label(levels: &[String]) -> String {
    levels.join(SEPARATOR).trim_matches('_').to_string()
}

/// Normalize a provider table into a flat, addressable one.
pub fn normalize(raw: RawTable) -> Result<FlatTable, DataError> {
    let hierarchical = raw.is_hierarchical();
    let depth = raw.depth();
    let (index_name, index, labels, columns) = raw.into_parts();

    let index_label = ColumnLabel::promoted(&index_name, depth);
    let names: Vec<String> = std::iter::once(&index_label)
        .chain(labels.iter())
        .map(|label| {
            if hierarchical {
                flatten_label(label.levels())
            } else {
                label.levels()[0].clone()
            }
        })
        .collect();
    let names = make_unique(names);
    debug!(hierarchical, columns = ?names, "normalized column names");

    let epoch = epoch();
    let days: Vec<i32> = index
        .iter()
        .map(|date| (*date - epoch).num_days() as i32)
        .collect();

    let mut out = Vec::with_capacity(names.len());
    out.push(Column::new(names[0].as_str().into(), days).cast(&DataType::Date)?);
    for (column, name) in columns.into_iter().zip(names.iter().skip(1)) {
        out.push(column.with_name(name.as_str().into()));
    }

    Ok(FlatTable::from_frame(DataFrame::new(out)?))
}

/// Suffix repeated names with `_1`, `_2`, … The first occurrence keeps its name.
fn make_unique(names: Vec<String>) -> Vec<String> {
    let originals: HashSet<String> = names.iter().cloned().collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        if taken.insert(name.clone()) {
            out.push(name);
            continue;
        }
        let mut n = 1;
        let renamed = loop {
            let candidate = format!("{name}{SEPARATOR}{n}");
            if !originals.contains(&candidate) && !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        warn!(column = %name, renamed = %renamed, "duplicate column name after flattening");
        taken.insert(renamed.clone());
        out.push(renamed);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn levels(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flatten_joins_and_trims() {
        assert_eq!(flatten_label(&levels(&["Close", "AAPL"])), "Close_AAPL");
        assert_eq!(flatten_label(&levels(&["Date", ""])), "Date");
        assert_eq!(flatten_label(&levels(&["", "AAPL"])), "AAPL");
    }

    #[test]
    fn flatten_keeps_inner_separators() {
        assert_eq!(flatten_label(&levels(&["Adj_Close", "AAPL"])), "Adj_Close_AAPL");
    }

    #[test]
    fn make_unique_suffixes_repeats() {
        let out = make_unique(levels(&["Date", "Close", "Close", "Close"]));
        assert_eq!(out, levels(&["Date", "Close", "Close_1", "Close_2"]));
    }

    #[test]
    fn make_unique_skips_suffix_already_in_use() {
        let out = make_unique(levels(&["Close", "Close", "Close_1"]));
        assert_eq!(out, levels(&["Close", "Close_2", "Close_1"]));
    }

    #[test]
    fn promoted_date_is_first_and_typed() {
        let raw = RawTable::new("Date", vec![d(2024, 1, 2), d(2024, 1, 3)])
            .with_f64(ColumnLabel::pair("Close", "AAPL"), vec![Some(185.6), Some(184.3)])
            .unwrap();
        let flat = normalize(raw).unwrap();

        assert_eq!(flat.column_names(), vec!["Date", "Close_AAPL"]);
        assert_eq!(flat.dates("Date").unwrap(), vec![d(2024, 1, 2), d(2024, 1, 3)]);
        assert_eq!(
            flat.f64_values("Close_AAPL").unwrap(),
            vec![Some(185.6), Some(184.3)]
        );
    }

    #[test]
    fn flat_header_passes_through() {
        let raw = RawTable::new("Date", vec![d(2024, 1, 2)])
            .with_f64(ColumnLabel::flat("Close"), vec![Some(1.0)])
            .unwrap()
            .with_i64(ColumnLabel::flat("Volume"), vec![Some(10)])
            .unwrap();
        let flat = normalize(raw).unwrap();
        assert_eq!(flat.column_names(), vec!["Date", "Close", "Volume"]);
    }

    #[test]
    fn index_name_collision_is_renamed() {
        let raw = RawTable::new("Date", vec![d(2024, 1, 2)])
            .with_f64(ColumnLabel::pair("Date", ""), vec![Some(1.0)])
            .unwrap();
        let flat = normalize(raw).unwrap();
        assert_eq!(flat.column_names(), vec!["Date", "Date_1"]);
    }

    #[test]
    fn empty_table_keeps_date_column() {
        let raw = RawTable::new("Date", Vec::new());
        let flat = normalize(raw).unwrap();
        assert_eq!(flat.column_names(), vec!["Date"]);
        assert_eq!(flat.height(), 0);
    }
}
