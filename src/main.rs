// src/main.rs
mod config;
mod extractors;
mod pipeline;
mod storage;
mod utils;
mod webdriver;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use config::profiles::FIVE_YEAR_SUMMARY;
use config::{ScrapeOptions, CONFIG_SHEET};
use extractors::controls::{LabelLocator, Locator, PositionalLocator};
use storage::local::LocalWorkbook;
use storage::sheets::SheetsClient;
use storage::{ConfigSource, SyncTarget};
use utils::AppError;
use webdriver::client::WebDriverLauncher;
use webdriver::html::HtmlLauncher;
use webdriver::models::Timeouts;
use webdriver::SessionFactory;

/// Scrapes quotes, fund prices and five-year financial summaries into a spreadsheet
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Where rows are written and the config is read from
    #[arg(long, value_enum, default_value_t = Backend::Sheets)]
    backend: Backend,

    /// Google spreadsheet id (sheets backend)
    #[arg(long, env = "SPREADSHEET_ID")]
    spreadsheet_id: Option<String>,

    /// OAuth access token with the spreadsheets scope (sheets backend)
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Directory of worksheet JSON files (local backend)
    #[arg(long, default_value = "./workbook")]
    workbook_dir: PathBuf,

    /// Treat the first config row as a header
    #[arg(long)]
    config_has_header: bool,

    /// How pages are loaded
    #[arg(long, value_enum, default_value_t = BrowserKind::Webdriver)]
    browser: BrowserKind,

    /// Endpoint of a running WebDriver (chromedriver) server
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    webdriver_url: String,

    /// Start this driver executable instead of connecting to --webdriver-url
    #[arg(long)]
    driver_path: Option<PathBuf>,

    /// Port for a driver started with --driver-path
    #[arg(long, default_value = "9515")]
    driver_port: u16,

    /// Show the browser window
    #[arg(long)]
    no_headless: bool,

    /// Upper bound on waiting for page elements to render, in milliseconds
    #[arg(long, default_value = "3000")]
    render_wait_ms: u64,

    /// Pause after each button click, in milliseconds
    #[arg(long, default_value = "500")]
    settle_ms: u64,

    /// How statement-panel buttons are identified
    #[arg(long, value_enum, default_value_t = LocatorKind::Positional)]
    locator: LocatorKind,

    /// Fixed number of year columns (default: read from the page)
    #[arg(long)]
    year_columns: Option<usize>,

    /// Save annotated page snapshots of failed keys under <output-dir>/debug
    #[arg(short, long)]
    debug: bool,

    /// Output directory for debug snapshots
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// Debug-level logging unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Update stock quotes and fund prices
    Records,
    /// Update the five-year financial summaries
    Summary,
    /// Print the configured lookup keys
    ShowConfig,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Sheets,
    Local,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum BrowserKind {
    Webdriver,
    Static,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LocatorKind {
    Positional,
    Label,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments and set up logging (reads RUST_LOG env var)
    let args = Args::parse();
    utils::logging::setup_logging(args.verbose);
    tracing::debug!("Starting with args: {:?}", args);

    // 2. Run the action; every failure ends here as a single notice
    if let Err(e) = run(&args).await {
        tracing::error!("{}", e);
        if let Some(help) = e.remediation() {
            eprintln!("\n{}", help);
        }
        return Err(e);
    }
    Ok(())
}

async fn run(args: &Args) -> Result<(), AppError> {
    match args.backend {
        Backend::Sheets => {
            let spreadsheet_id = args
                .spreadsheet_id
                .as_deref()
                .ok_or_else(|| AppError::Config("--spreadsheet-id (or SPREADSHEET_ID) is required".to_string()))?;
            let token = args
                .access_token
                .as_deref()
                .ok_or_else(|| AppError::Config("--access-token (or GOOGLE_ACCESS_TOKEN) is required".to_string()))?;
            let mut workbook = SheetsClient::new(spreadsheet_id, token, CONFIG_SHEET, args.config_has_header)?;
            with_browser(args, &mut workbook).await
        }
        Backend::Local => {
            let mut workbook = LocalWorkbook::new(&args.workbook_dir, CONFIG_SHEET, args.config_has_header)?;
            with_browser(args, &mut workbook).await
        }
    }
}

async fn with_browser<W: ConfigSource + SyncTarget>(args: &Args, workbook: &mut W) -> Result<(), AppError> {
    if args.command == Command::ShowConfig {
        let config = workbook.read_config().await?;
        println!("stocks:  {}", config.stocks.join(", "));
        println!("funds:   {}", config.funds.join(", "));
        println!("summary: {}", config.summary_tickers.join(", "));
        return Ok(());
    }

    let timeouts = Timeouts {
        implicit: args.render_wait_ms,
        page_load: args.render_wait_ms.max(30_000),
    };
    let settle = Duration::from_millis(args.settle_ms);

    match args.browser {
        BrowserKind::Webdriver => {
            let launcher = match &args.driver_path {
                Some(path) => WebDriverLauncher::spawn(path, args.driver_port, !args.no_headless, timeouts, settle).await?,
                None => WebDriverLauncher::new(&args.webdriver_url, !args.no_headless, timeouts, settle)?,
            };
            dispatch(args, &launcher, workbook).await
        }
        BrowserKind::Static => {
            if args.command == Command::Summary {
                return Err(AppError::Config(
                    "the five-year summary clicks through the page and needs --browser webdriver".to_string(),
                ));
            }
            let launcher = HtmlLauncher::new(Duration::from_millis(timeouts.page_load))?;
            dispatch(args, &launcher, workbook).await
        }
    }
}

async fn dispatch<F, W>(args: &Args, factory: &F, workbook: &mut W) -> Result<(), AppError>
where
    F: SessionFactory,
    W: ConfigSource + SyncTarget,
{
    let options = ScrapeOptions {
        debug_dir: args.debug.then(|| args.output_dir.join("debug")),
    };

    match args.command {
        Command::Records => {
            tracing::info!("Updating stock and fund records; please allow up to a minute");
            let report = pipeline::update_flat_records(factory, workbook, &options).await?;
            for skipped in report.stocks.skipped.iter().chain(&report.funds.skipped) {
                tracing::warn!("Skipped {}: {}", skipped.key, skipped.reason);
            }
            tracing::info!(
                "Done: {} stocks, {} funds",
                report.stocks.records.len(),
                report.funds.records.len()
            );
        }
        Command::Summary => {
            tracing::info!("Updating five-year summaries; please allow up to a minute");
            let locator = match args.locator {
                LocatorKind::Positional => Locator::Positional(PositionalLocator {
                    class: FIVE_YEAR_SUMMARY.control_class.to_string(),
                    annual_index: FIVE_YEAR_SUMMARY.annual_index,
                    year_count: args.year_columns,
                }),
                LocatorKind::Label => Locator::Label(LabelLocator {
                    class: FIVE_YEAR_SUMMARY.control_class.to_string(),
                    annual_label: FIVE_YEAR_SUMMARY.annual_label.to_string(),
                }),
            };
            let set = pipeline::update_five_year_summary(factory, workbook, &FIVE_YEAR_SUMMARY, &locator, &options).await?;
            let failed: Vec<&str> = set.non_working.iter().map(|s| s.key.as_str()).collect();
            tracing::info!("Done: {} tables written; not working: {:?}", set.working.len(), failed);
        }
        Command::ShowConfig => {}
    }
    Ok(())
}
