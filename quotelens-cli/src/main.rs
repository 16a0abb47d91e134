//! QuoteLens CLI: quotes, tips and config commands.
//!
//! Commands:
//! - `quotes`: load a close-price series, print the table tail, export PNG/CSV
//! - `tips`: validate an uploaded CSV and export the scatter chart
//! - `config`: print the effective configuration as TOML

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quotelens_core::chart::{render_scatter_png, ImageArtifact};
use quotelens_core::config::DashboardConfig;
use quotelens_core::data::{
    DataError, Interval, MarketDataSource, Period, RawTable, SeriesCache, SeriesLoader,
    YahooProvider,
};
use quotelens_core::upload::{RequiredColumns, UploadFlow, UploadPhase, UploadedTable};
use quotelens_core::view::{QuotesView, TablePreview};

#[derive(Parser)]
#[command(name = "quotelens", about = "QuoteLens CLI: stock close prices and tips charts")]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the close-price series for one period/interval selection.
    Quotes {
        /// Period code: 1mo, 3mo, 6mo, 1y, 2y, 5y. Defaults to the config value.
        #[arg(long)]
        period: Option<Period>,

        /// Interval code: 1d, 1wk, 1mo. Defaults to the config value.
        #[arg(long)]
        interval: Option<Interval>,

        /// Write the close-price chart as PNG to this path.
        #[arg(long)]
        png: Option<PathBuf>,

        /// Write the normalized table as CSV to this path.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Replay a captured chart API response instead of using the network.
        #[arg(long)]
        from_json: Option<PathBuf>,
    },
    /// Validate a tips CSV and render its scatter chart.
    Tips {
        /// CSV file with a header row.
        file: PathBuf,

        /// Only require total_bill and tip (no sex column).
        #[arg(long, default_value_t = false)]
        basic: bool,

        /// Write the scatter chart as PNG to this path.
        #[arg(long)]
        png: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Quotes {
            period,
            interval,
            png,
            csv,
            from_json,
        } => {
            let period = period.unwrap_or(config.default_period);
            let interval = interval.unwrap_or(config.default_interval);
            let source: Box<dyn MarketDataSource> = match from_json {
                Some(path) => Box::new(CapturedSource::from_file(&path)?),
                None => Box::new(YahooProvider::new()?),
            };
            let summary = run_quotes(&config, source, period, interval, png, csv)?;
            print!("{summary}");
            Ok(())
        }
        Commands::Tips { file, basic, png } => {
            let required = if basic {
                RequiredColumns::tips_basic()
            } else {
                config.tips_requirement.columns()
            };
            let summary = run_tips(&config, &file, &required, png)?;
            print!("{summary}");
            Ok(())
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

/// Diagnostics go to stderr so stdout stays clean for piping.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(DashboardConfig::default()),
    }
}

/// A chart API body captured to disk, replayed for any selection.
struct CapturedSource {
    body: String,
}

impl CapturedSource {
    fn from_file(path: &Path) -> Result<Self> {
        let body = fs::read_to_string(path)
            .with_context(|| format!("reading captured response {}", path.display()))?;
        Ok(Self { body })
    }
}

impl MarketDataSource for CapturedSource {
    fn name(&self) -> &str {
        "captured"
    }

    fn fetch(&self, ticker: &str, _: Period, _: Interval) -> Result<RawTable, DataError> {
        YahooProvider::parse_chart_json(ticker, &self.body)
    }
}

fn run_quotes(
    config: &DashboardConfig,
    source: Box<dyn MarketDataSource>,
    period: Period,
    interval: Interval,
    png: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<String> {
    let mut loader = SeriesLoader::new(
        source,
        config.ticker.clone(),
        SeriesCache::with_capacity(config.cache_capacity),
    );
    let table = loader.load(period, interval)?;
    let view = QuotesView::build(&table, config, period, interval)?;

    let mut out = format!(
        "{} {period}/{interval}: {} rows\nColumns: {}\n\n",
        config.ticker,
        view.rows,
        view.columns.join(", ")
    );
    out.push_str(&format_preview(&view.preview));

    if let Some(path) = png {
        let artifact = view.export_png(config)?;
        write_artifact(&path, &artifact)?;
        out.push_str(&format!("\nChart saved to: {}\n", path.display()));
    }
    if let Some(path) = csv {
        let file = fs::File::create(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        table.write_csv(file)?;
        info!(path = %path.display(), rows = table.height(), "table exported");
        out.push_str(&format!("Table saved to: {}\n", path.display()));
    }
    Ok(out)
}

fn run_tips(
    config: &DashboardConfig,
    file: &Path,
    required: &RequiredColumns,
    png: Option<PathBuf>,
) -> Result<String> {
    let table = UploadedTable::from_csv_path(file)?;
    let preview = TablePreview::head_of(&table);

    let mut flow = UploadFlow::new();
    match flow.process(table, required)? {
        UploadPhase::Rendered => {}
        _ => {
            let message = flow.rejection().unwrap_or("upload rejected").to_string();
            bail!("{message}");
        }
    }

    let mut out = format_preview(&preview);
    if let Some(scatter) = flow.scatter() {
        out.push_str(&format!(
            "\n{}: {} points in {} group(s)\n",
            scatter.title,
            scatter.point_count(),
            scatter.groups.len()
        ));
        for group in &scatter.groups {
            out.push_str(&format!(
                "  {:<12} {:>5}  {}\n",
                group.category,
                group.points.len(),
                group.color
            ));
        }
        if let Some(path) = png {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "tips_chart.png".to_string());
            let artifact = render_scatter_png(scatter, &config.chart, &name)?;
            write_artifact(&path, &artifact)?;
            out.push_str(&format!("Chart saved to: {}\n", path.display()));
        }
    }
    Ok(out)
}

fn write_artifact(path: &Path, artifact: &ImageArtifact) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &artifact.bytes).with_context(|| format!("writing {}", path.display()))?;
    info!(
        path = %path.display(),
        mime = artifact.mime,
        bytes = artifact.bytes.len(),
        "chart written"
    );
    Ok(())
}

/// Fixed-width text table.
fn format_preview(preview: &TablePreview) -> String {
    let widths: Vec<usize> = preview
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            preview
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|v| v.len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(&preview.columns);
    out.push_str(&format!(
        "{}\n",
        "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1))
    ));
    for row in &preview.rows {
        out.push_str(&line(row));
    }
    out
}
