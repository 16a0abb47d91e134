//! Data source trait, request parameters, and structured error types.
//!
//! The MarketDataSource trait abstracts over where quotes come from (Yahoo
//! Finance in production, counting mocks in tests). Memoization sits above
//! this trait in the loader; sources don't know about the cache.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::table::RawTable;

/// Time span requested from the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Period {
    /// All periods in selector order.
    pub const ALL: [Period; 6] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
    ];

    /// Provider code, e.g. `"1y"`.
    pub fn code(self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Period {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Period {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Period {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.code() == s)
            .ok_or_else(|| DataError::UnknownParameter {
                kind: "period",
                value: s.to_string(),
                expected: codes(Self::ALL.iter().map(|p| p.code())),
            })
    }
}

/// Sampling granularity requested from the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
}

impl Interval {
    /// All intervals in selector order.
    pub const ALL: [Interval; 3] = [Interval::OneDay, Interval::OneWeek, Interval::OneMonth];

    /// Provider code, e.g. `"1wk"`.
    pub fn code(self) -> &'static str {
        match self {
            Interval::OneDay => "1d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|i| *i == self).unwrap_or(0)
    }

    pub fn next(self) -> Interval {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Interval {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Interval {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|i| i.code() == s)
            .ok_or_else(|| DataError::UnknownParameter {
                kind: "interval",
                value: s.to_string(),
                expected: codes(Self::ALL.iter().map(|i| i.code())),
            })
    }
}

fn codes<'a>(iter: impl Iterator<Item = &'a str>) -> String {
    iter.collect::<Vec<_>>().join(", ")
}

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider returned no rows for {symbol} ({period}, {interval})")]
    EmptyResult {
        symbol: String,
        period: Period,
        interval: Interval,
    },

    #[error("unknown {kind} '{value}' (expected one of: {expected})")]
    UnknownParameter {
        kind: &'static str,
        value: String,
        expected: String,
    },

    #[error("table error: {0}")]
    Table(String),

    #[error("data error: {0}")]
    Other(String),
}

impl From<polars::prelude::PolarsError> for DataError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        DataError::Table(e.to_string())
    }
}

/// Trait for market-data sources.
///
/// A fetch is a single blocking call. Implementations must not retry on their
/// own: failures go straight back to the caller.
pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the raw quote table for one ticker.
    fn fetch(&self, ticker: &str, period: Period, interval: Interval)
        -> Result<RawTable, DataError>;
}
