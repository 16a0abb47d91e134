//! App state persistence: JSON save/load across restarts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use quotelens_core::data::{Interval, Period};

use crate::app::{AppState, Overlay, Panel};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub period: Option<Period>,
    pub interval: Option<Interval>,
    pub active_panel: Panel,
    pub last_csv_path: Option<PathBuf>,
    pub welcome_dismissed: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            period: None,
            interval: None,
            active_panel: Panel::Quotes,
            last_csv_path: None,
            welcome_dismissed: false,
        }
    }
}

/// Load persisted state from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn extract(app: &AppState) -> PersistedState {
    PersistedState {
        period: Some(app.quotes.period),
        interval: Some(app.quotes.interval),
        active_panel: app.active_panel,
        last_csv_path: app.tips.last_path.clone(),
        welcome_dismissed: app.overlay != Overlay::Welcome,
    }
}

/// Apply persisted state. Unset selectors keep the configured defaults.
pub fn apply(app: &mut AppState, state: PersistedState) {
    if let Some(period) = state.period {
        app.quotes.period = period;
    }
    if let Some(interval) = state.interval {
        app.quotes.interval = interval;
    }
    app.active_panel = state.active_panel;
    app.tips.last_path = state.last_csv_path;
    if !state.welcome_dismissed {
        app.overlay = Overlay::Welcome;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{app_with_source, StubSource};

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let state = PersistedState {
            period: Some(Period::FiveYears),
            interval: Some(Interval::OneWeek),
            active_panel: Panel::Tips,
            last_csv_path: Some(PathBuf::from("/data/tips.csv")),
            welcome_dismissed: true,
        };

        save(&path, &state).unwrap();
        assert_eq!(load(&path), state);
    }

    #[test]
    fn missing_file_returns_defaults() {
        let loaded = load(Path::new("/nonexistent/path/state.json"));
        assert_eq!(loaded, PersistedState::default());
        assert!(!loaded.welcome_dismissed);
    }

    #[test]
    fn corrupt_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not valid json {{{").unwrap();
        assert_eq!(load(&path), PersistedState::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"period": "6mo"}"#).unwrap();
        let loaded = load(&path);
        assert_eq!(loaded.period, Some(Period::SixMonths));
        assert_eq!(loaded.interval, None);
    }

    #[test]
    fn apply_then_extract_preserves_selection() {
        let (mut app, _dir) = app_with_source(StubSource::ok());
        apply(
            &mut app,
            PersistedState {
                period: Some(Period::ThreeMonths),
                interval: Some(Interval::OneMonth),
                active_panel: Panel::Tips,
                last_csv_path: None,
                welcome_dismissed: false,
            },
        );
        assert_eq!(app.overlay, Overlay::Welcome);
        let out = extract(&app);
        assert_eq!(out.period, Some(Period::ThreeMonths));
        assert_eq!(out.interval, Some(Interval::OneMonth));
        assert_eq!(out.active_panel, Panel::Tips);
        assert!(!out.welcome_dismissed);
    }
}
