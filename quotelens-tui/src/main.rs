//! QuoteLens TUI: three-panel terminal dashboard.
//!
//! Panels:
//! 1. Quotes: period/interval selectors, close-price chart, table tail
//! 2. Tips: CSV upload, validation, scatter chart
//! 3. Help: keyboard shortcuts

mod app;
mod input;
mod persistence;
mod theme;
mod ui;

#[cfg(test)]
mod test_helpers;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quotelens_core::config::DashboardConfig;
use quotelens_core::data::{SeriesCache, SeriesLoader, YahooProvider};

use crate::app::AppState;

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // Paths
    let app_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotelens");
    let state_path = app_dir.join("state.json");
    let config_path = app_dir.join("quotelens.toml");
    let export_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    init_logging(&app_dir)?;

    let config = load_config(&config_path)?;
    info!(
        ticker = %config.ticker,
        cache_capacity = config.cache_capacity,
        "starting dashboard"
    );

    let provider = YahooProvider::new().context("building market data client")?;
    let loader = SeriesLoader::new(
        Box::new(provider),
        config.ticker.clone(),
        SeriesCache::with_capacity(config.cache_capacity),
    );
    info!(source = loader.source_name(), "market data source ready");

    // Build app state and apply persisted selections
    let mut app = AppState::new(config, loader, export_dir);
    persistence::apply(&mut app, persistence::load(&state_path));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the main event loop
    let result = run_app(&mut terminal, &mut app);

    // Save state before exit
    let persisted = persistence::extract(&app);
    if let Err(e) = persistence::save(&state_path, &persisted) {
        warn!(error = %e, "failed to save state");
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Reload after the "Loading" status has been drawn
        if app.quotes.reload_requested && app.overlay != app::Overlay::Welcome {
            app.reload_quotes();
            continue;
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

/// Log to a file in the app directory; the terminal belongs to the UI.
fn init_logging(app_dir: &Path) -> Result<()> {
    fs::create_dir_all(app_dir)
        .with_context(|| format!("creating {}", app_dir.display()))?;
    let log_path = app_dir.join("quotelens.log");
    let file = File::create(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// The config file is optional; a missing file means defaults.
fn load_config(path: &Path) -> Result<DashboardConfig> {
    if !path.exists() {
        return Ok(DashboardConfig::default());
    }
    let config = DashboardConfig::from_file(path)
        .with_context(|| format!("loading config {}", path.display()))?;
    info!(path = %path.display(), "config loaded");
    Ok(config)
}
