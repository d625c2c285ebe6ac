//! Sale-Pager main entry point
//!
//! This is the command-line interface for the Sale-Pager scraper. Artifact
//! paths go to stdout, one per line; everything else goes to stderr and the
//! per-run log file.

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand};
use sale_pager::config::{load_settings_with_hash, RetailerStore, Settings, DEFAULT_SETTINGS_PATH};
use sale_pager::crawler::{run_scrape, RunMode};
use sale_pager::output::write_paths;
use sale_pager::{ConfigError, PagerError, RunReport};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Sale-Pager: paginated sale listing scraper
///
/// Scrapes the paginated sale listings of configured retailers through a
/// scrape provider, stopping each category when its pages run dry or a stop
/// predicate says so.
#[derive(Parser, Debug)]
#[command(name = "sale-pager")]
#[command(version)]
#[command(about = "Paginated sale listing scraper", long_about = None)]
struct Cli {
    /// Path to the TOML settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Scrape provider API key
    #[arg(long, env = "FIRECRAWL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape one retailer, every enabled retailer, or a single URL
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Retailer id, or `all` for every enabled retailer
    #[arg(value_name = "RETAILER", conflicts_with_all = ["url", "product"])]
    retailer: Option<String>,

    /// Fetch one page for discovery (main content only)
    #[arg(long, value_name = "URL", conflicts_with = "product")]
    url: Option<String>,

    /// Fetch one product page with the full content
    #[arg(long, value_name = "URL")]
    product: Option<String>,
}

impl RunArgs {
    fn mode(&self) -> Option<RunMode> {
        if let Some(url) = &self.url {
            return Some(RunMode::Discovery(url.clone()));
        }
        if let Some(url) = &self.product {
            return Some(RunMode::Product(url.clone()));
        }
        match self.retailer.as_deref() {
            Some("all") => Some(RunMode::All),
            Some(id) => Some(RunMode::Retailer(id.to_string())),
            None => None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut settings, config_hash) = match load_run_settings(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            setup_logging(cli.verbose, cli.quiet, None);
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Keeps the log file writer alive until exit
    let _guard = setup_logging(cli.verbose, cli.quiet, Some(&settings.output.log_dir));

    if let Some(hash) = config_hash {
        tracing::info!("Configuration loaded (hash: {})", hash);
    } else {
        tracing::info!("No settings file, using defaults");
    }

    if cli.api_key.is_some() {
        settings.provider.api_key = cli.api_key.clone();
    }

    let mode = match cli.command.as_ref().map(|Command::Run(args)| args.mode()) {
        Some(Some(mode)) => mode,
        Some(None) => {
            let error = PagerError::Usage(
                "run needs a retailer, `all`, --url or --product".to_string(),
            );
            tracing::error!("{}", error);
            print_usage(&settings);
            return ExitCode::FAILURE;
        }
        None => {
            print_usage(&settings);
            return ExitCode::FAILURE;
        }
    };

    match handle_run(&settings, &mode).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Loads the explicit settings file, the default one if present, or defaults
fn load_run_settings(path: Option<&Path>) -> Result<(Settings, Option<String>), ConfigError> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_SETTINGS_PATH).exists() => Path::new(DEFAULT_SETTINGS_PATH),
        None => return Ok((Settings::default(), None)),
    };

    let (settings, hash) = load_settings_with_hash(path)?;
    Ok((settings, Some(hash)))
}

/// Sets up the logging/tracing subscriber
///
/// Logs go to stderr and, when a log directory is given, to a per-run file
/// named after the start time.
fn setup_logging(verbose: u8, quiet: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sale_pager=info,warn"),
            1 => EnvFilter::new("sale_pager=debug,info"),
            2 => EnvFilter::new("sale_pager=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir.map(open_run_log) {
        Some(Ok((writer, guard))) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("Could not open run log: {}", e);
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn open_run_log(
    log_dir: &Path,
) -> std::io::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::never(log_dir, run_log_file_name(Local::now()));
    Ok(tracing_appender::non_blocking(appender))
}

/// `run_<YYYYmmdd_HHMMSS>.log` for a run started at `started`
fn run_log_file_name(started: DateTime<Local>) -> String {
    format!("run_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Process exit status for a finished run: 1 when any retailer failed
fn exit_status(report: &RunReport) -> u8 {
    if report.is_success() {
        0
    } else {
        1
    }
}

/// Prints usage and the known retailer ids to stderr
fn print_usage(settings: &Settings) {
    eprintln!("Usage:");
    eprintln!("  sale-pager run <retailer>        Scrape one retailer");
    eprintln!("  sale-pager run all               Scrape every enabled retailer");
    eprintln!("  sale-pager run --url <URL>       Discovery fetch of one page");
    eprintln!("  sale-pager run --product <URL>   Fetch one product page in full");
    eprintln!();

    let store = RetailerStore::new(&settings.retailers.dir);
    match store.list() {
        Ok(ids) if ids.is_empty() => {
            eprintln!("No retailers configured in {}", store.dir().display());
        }
        Ok(ids) => {
            eprintln!("Known retailers ({}):", store.dir().display());
            for id in ids {
                match store.load(&id) {
                    Ok(config) if config.enabled => eprintln!("  {} ({})", id, config.name),
                    Ok(config) => eprintln!("  {} ({}, disabled)", id, config.name),
                    Err(e) => eprintln!("  {} (unreadable: {})", id, e),
                }
            }
        }
        Err(e) => eprintln!("Could not list {}: {}", store.dir().display(), e),
    }
}

/// Handles the main scrape operation
async fn handle_run(settings: &Settings, mode: &RunMode) -> anyhow::Result<ExitCode> {
    tracing::info!("Starting run: {:?}", mode);

    let report = run_scrape(settings, mode).await.context("Run failed")?;

    let stdout = std::io::stdout();
    write_paths(&mut stdout.lock(), &report.artifacts)
        .context("Failed to write artifact list")?;

    for failure in &report.failures {
        tracing::error!(retailer = %failure.id, "{}", failure.error);
    }

    let status = exit_status(&report);
    if status == 0 {
        tracing::info!("Run completed: {} artifacts", report.artifacts.len());
    } else {
        tracing::error!(
            "Run completed with {} failed retailers",
            report.failures.len()
        );
    }
    Ok(ExitCode::from(status))
}
