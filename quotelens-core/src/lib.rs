//! quotelens core: market-data loading, column normalization, upload validation, chart export.
//!
//! This crate holds everything the front ends share:
//! - Provider abstraction and the Yahoo Finance chart client
//! - Raw/flat table types and the column normalizer
//! - Memoized series loader keyed by (period, interval)
//! - Uploaded-table validation and the per-upload state machine
//! - Line/scatter chart specs and PNG export
//! - TOML dashboard configuration
//! - Table previews and the per-selection quotes view

pub mod chart;
pub mod config;
pub mod data;
pub mod upload;
pub mod view;
