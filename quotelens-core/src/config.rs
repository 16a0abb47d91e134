//! Dashboard configuration, loaded from TOML.
//!
//! Every field has a default, so an absent or partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::chart::{PngStyle, DEFAULT_EXPORT_NAME};
use crate::data::{Interval, Period, SeriesCache};
use crate::upload::TipsRequirement;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("invalid config TOML: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings shared by the CLI and the TUI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Ticker whose quotes are charted.
    pub ticker: String,

    pub default_period: Period,
    pub default_interval: Interval,

    /// Close column override. Derived as `Close_{ticker}` when unset.
    pub close_column: Option<String>,

    /// Download name for the close-price PNG.
    pub export_file_name: String,

    /// Which columns an uploaded tips file must carry.
    pub tips_requirement: TipsRequirement,

    /// Max memoized (period, interval) tables.
    pub cache_capacity: usize,

    pub chart: PngStyle,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            ticker: "AAPL".to_string(),
            default_period: Period::default(),
            default_interval: Interval::default(),
            close_column: None,
            export_file_name: DEFAULT_EXPORT_NAME.to_string(),
            tips_requirement: TipsRequirement::default(),
            cache_capacity: SeriesCache::DEFAULT_CAPACITY,
            chart: PngStyle::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from a TOML file and validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.trim().is_empty() {
            return Err(ConfigError::Invalid("ticker must not be empty".into()));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid("cache_capacity must be at least 1".into()));
        }
        if self.export_file_name.trim().is_empty() {
            return Err(ConfigError::Invalid("export_file_name must not be empty".into()));
        }
        let min_side = self.chart.margin.saturating_mul(2).saturating_add(1);
        if self.chart.width <= min_side || self.chart.height <= min_side {
            return Err(ConfigError::Invalid(format!(
                "chart {}x{} is too small for margin {}",
                self.chart.width, self.chart.height, self.chart.margin
            )));
        }
        Ok(())
    }

    /// Close-price column name in the normalized table.
    pub fn close_column(&self) -> String {
        self.close_column
            .clone()
            .unwrap_or_else(|| format!("Close_{}", self.ticker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard() {
        let config = DashboardConfig::default();
        assert_eq!(config.ticker, "AAPL");
        assert_eq!(config.default_period, Period::OneYear);
        assert_eq!(config.default_interval, Interval::OneDay);
        assert_eq!(config.close_column(), "Close_AAPL");
        assert_eq!(config.export_file_name, "apple_chart.png");
        assert_eq!(config.cache_capacity, 18);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = DashboardConfig::from_toml_str(
            r#"
ticker = "MSFT"
default_period = "6mo"
default_interval = "1wk"
tips_requirement = "basic"

[chart]
width = 640
"#,
        )
        .unwrap();
        assert_eq!(config.ticker, "MSFT");
        assert_eq!(config.close_column(), "Close_MSFT");
        assert_eq!(config.default_period, Period::SixMonths);
        assert_eq!(config.default_interval, Interval::OneWeek);
        assert_eq!(config.tips_requirement, TipsRequirement::Basic);
        assert_eq!(config.chart.width, 640);
        assert_eq!(config.chart.height, 500);
    }

    #[test]
    fn close_column_override_wins() {
        let config = DashboardConfig::from_toml_str("close_column = \"Close\"").unwrap();
        assert_eq!(config.close_column(), "Close");
    }

    #[test]
    fn unknown_period_is_parse_error() {
        let result = DashboardConfig::from_toml_str("default_period = \"7y\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let result = DashboardConfig::from_toml_str("cache_capacity = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn huge_margin_is_invalid_not_overflow() {
        let mut config = DashboardConfig::default();
        config.chart.margin = u32::MAX / 2 + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.chart.margin = u32::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn toml_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotelens.toml");
        let mut config = DashboardConfig::default();
        config.close_column = Some("Adj_Close_AAPL".into());
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        assert_eq!(DashboardConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = DashboardConfig::from_file(Path::new("/nonexistent/quotelens.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
