//! Application state. Single owner, main thread only.
//!
//! Every interaction runs synchronously: a parameter change reloads the
//! series (from cache or network), an upload runs the validation flow.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use quotelens_core::chart::{render_scatter_png, ImageArtifact};
use quotelens_core::config::DashboardConfig;
use quotelens_core::data::{DataError, Interval, Period, SeriesLoader};
use quotelens_core::upload::{RequiredColumns, UploadFlow, UploadPhase, UploadedTable};
use quotelens_core::view::{QuotesView, TablePreview};

/// Max entries kept in the error history overlay.
pub const ERROR_HISTORY_CAP: usize = 50;

/// File name for the exported tips scatter.
pub const SCATTER_EXPORT_NAME: &str = "tips_chart.png";

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Panel {
    Quotes,
    Tips,
    Help,
}

impl Panel {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            Panel::Quotes => 0,
            Panel::Tips => 1,
            Panel::Help => 2,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::Quotes),
            1 => Some(Panel::Tips),
            2 => Some(Panel::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Quotes => "Quotes",
            Panel::Tips => "Tips",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        Panel::from_index((self.index() + 1) % Self::COUNT).unwrap_or(Panel::Quotes)
    }

    pub fn prev(self) -> Panel {
        Panel::from_index((self.index() + Self::COUNT - 1) % Self::COUNT).unwrap_or(Panel::Quotes)
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Chart,
    Upload,
    Io,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Chart => "CHART",
            ErrorCategory::Upload => "UPLD",
            ErrorCategory::Io => "IO",
        }
    }

    /// Provider failures are network problems unless the payload itself was bad.
    pub fn of_data_error(err: &DataError) -> Self {
        match err {
            DataError::NetworkUnreachable(_)
            | DataError::RateLimited { .. }
            | DataError::AuthenticationRequired(_) => ErrorCategory::Network,
            _ => ErrorCategory::Data,
        }
    }
}

/// Quotes panel state.
#[derive(Debug, Clone)]
pub struct QuotesPanelState {
    pub period: Period,
    pub interval: Interval,
    pub view: Option<QuotesView>,
    /// Set by input; the main loop reloads after the next draw.
    pub reload_requested: bool,
    pub last_export: Option<PathBuf>,
}

impl QuotesPanelState {
    pub fn new(period: Period, interval: Interval) -> Self {
        Self {
            period,
            interval,
            view: None,
            reload_requested: true,
            last_export: None,
        }
    }
}

/// Tips panel state.
#[derive(Debug, Clone)]
pub struct TipsPanelState {
    pub flow: UploadFlow,
    pub required: RequiredColumns,
    pub preview: Option<TablePreview>,
    pub last_path: Option<PathBuf>,
    pub last_export: Option<PathBuf>,
}

impl TipsPanelState {
    pub fn new(required: RequiredColumns) -> Self {
        Self {
            flow: UploadFlow::new(),
            required,
            preview: None,
            last_path: None,
            last_export: None,
        }
    }
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Welcome,
    ErrorHistory,
    PathInput,
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,

    // Panel states
    pub quotes: QuotesPanelState,
    pub tips: TipsPanelState,

    // Services
    pub config: DashboardConfig,
    pub loader: SeriesLoader,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,
    pub path_input: String,

    // Paths
    pub export_dir: PathBuf,
}

impl AppState {
    pub fn new(config: DashboardConfig, loader: SeriesLoader, export_dir: PathBuf) -> Self {
        let quotes = QuotesPanelState::new(config.default_period, config.default_interval);
        let tips = TipsPanelState::new(config.tips_requirement.columns());
        Self {
            active_panel: Panel::Quotes,
            running: true,
            quotes,
            tips,
            config,
            loader,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
            path_input: String::new(),
            export_dir,
        }
    }

    /// Push an error to the history, capping at `ERROR_HISTORY_CAP`.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        warn!(category = category.label(), %message, %context, "interaction failed");
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    fn selection_label(&self) -> String {
        format!(
            "{} {}/{}",
            self.loader.ticker(),
            self.quotes.period,
            self.quotes.interval
        )
    }

    // ── Quotes ───────────────────────────────────────────────────────

    /// Step the period selector and schedule a reload.
    pub fn cycle_period(&mut self, forward: bool) {
        self.quotes.period = if forward {
            self.quotes.period.next()
        } else {
            self.quotes.period.prev()
        };
        self.request_reload();
    }

    /// Step the interval selector and schedule a reload.
    pub fn cycle_interval(&mut self, forward: bool) {
        self.quotes.interval = if forward {
            self.quotes.interval.next()
        } else {
            self.quotes.interval.prev()
        };
        self.request_reload();
    }

    pub fn request_reload(&mut self) {
        self.quotes.reload_requested = true;
        let label = self.selection_label();
        self.set_status(format!("Loading {label}..."));
    }

    /// Load the selected series and rebuild the view.
    ///
    /// Failures clear the view and land in the error history.
    pub fn reload_quotes(&mut self) {
        self.quotes.reload_requested = false;
        let (period, interval) = (self.quotes.period, self.quotes.interval);
        let label = self.selection_label();

        let table = match self.loader.load(period, interval) {
            Ok(table) => table,
            Err(e) => {
                self.quotes.view = None;
                self.push_error(ErrorCategory::of_data_error(&e), e.to_string(), label);
                return;
            }
        };

        match QuotesView::build(&table, &self.config, period, interval) {
            Ok(view) => {
                let rows = view.rows;
                self.quotes.view = Some(view);
                self.set_status(format!("{label}: {rows} rows"));
            }
            Err(e) => {
                self.quotes.view = None;
                self.push_error(ErrorCategory::Chart, e.to_string(), label);
            }
        }
    }

    /// Write the close-price PNG into the export directory.
    pub fn export_quotes_chart(&mut self) {
        let Some(view) = &self.quotes.view else {
            self.set_warning("Nothing to export: no chart loaded");
            return;
        };
        match view.export_png(&self.config) {
            Ok(artifact) => {
                if let Some(path) = self.write_artifact(&artifact) {
                    self.quotes.last_export = Some(path);
                }
            }
            Err(e) => self.push_error(ErrorCategory::Chart, e.to_string(), "export".into()),
        }
    }

    // ── Tips upload ──────────────────────────────────────────────────

    /// Open the path prompt, prefilled with the last uploaded path.
    pub fn open_path_input(&mut self) {
        self.path_input = self
            .tips
            .last_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.overlay = Overlay::PathInput;
    }

    /// Treat the file at `path` as a new upload.
    pub fn upload(&mut self, path: &Path) {
        self.tips.last_path = Some(path.to_path_buf());
        self.tips.last_export = None;
        let context = path.display().to_string();

        let table = match UploadedTable::from_csv_path(path) {
            Ok(table) => table,
            Err(e) => {
                self.tips.flow.reset();
                self.tips.preview = None;
                self.push_error(ErrorCategory::Upload, e.to_string(), context);
                return;
            }
        };
        self.tips.preview = Some(TablePreview::head_of(&table));

        match self.tips.flow.process(table, &self.tips.required) {
            Ok(UploadPhase::Rendered) => {
                let points = self.tips.flow.scatter().map_or(0, |s| s.point_count());
                info!(path = %context, points, "tips chart ready");
                self.set_status(format!("Loaded {context}: {points} points"));
            }
            Ok(_) => {
                let message = self
                    .tips
                    .flow
                    .rejection()
                    .unwrap_or("upload rejected")
                    .to_string();
                self.set_warning(message);
            }
            Err(e) => self.push_error(ErrorCategory::Upload, e.to_string(), context),
        }
    }

    /// Write the tips scatter PNG into the export directory.
    pub fn export_tips_chart(&mut self) {
        let Some(scatter) = self.tips.flow.scatter() else {
            self.set_warning("Nothing to export: no tips chart rendered");
            return;
        };
        match render_scatter_png(scatter, &self.config.chart, SCATTER_EXPORT_NAME) {
            Ok(artifact) => {
                if let Some(path) = self.write_artifact(&artifact) {
                    self.tips.last_export = Some(path);
                }
            }
            Err(e) => self.push_error(ErrorCategory::Chart, e.to_string(), "export".into()),
        }
    }

    fn write_artifact(&mut self, artifact: &ImageArtifact) -> Option<PathBuf> {
        let path = self.export_dir.join(&artifact.file_name);
        let written = std::fs::create_dir_all(&self.export_dir)
            .and_then(|_| std::fs::write(&path, &artifact.bytes));
        match written {
            Ok(()) => {
                self.set_status(format!(
                    "Saved {} ({}, {} bytes)",
                    path.display(),
                    artifact.mime,
                    artifact.bytes.len()
                ));
                Some(path)
            }
            Err(e) => {
                self.push_error(ErrorCategory::Io, e.to_string(), path.display().to_string());
                None
            }
        }
    }
}
