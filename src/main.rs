//! Sumi-Distill main entry point
//!
//! Command-line interface for extracting content from a URL. The result (or
//! an error object) is printed as JSON on stdout; logs go to stderr.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use sumi_distill::config::{load_config_with_hash, Config};
use sumi_distill::ConfigError;
use sumi_distill::request::{ExtractionRequest, FilterKind, SelectorConfig};
use sumi_distill::{DistillError, Extractor};
use tracing_subscriber::EnvFilter;

/// Sumi-Distill: a polite web content distiller
///
/// Fetches a page (statically or in a headless browser) after checking
/// robots.txt, and prints clean markdown, HTML, and structured data as JSON.
#[derive(Parser, Debug)]
#[command(name = "sumi-distill")]
#[command(version = "1.0.0")]
#[command(about = "A polite web content distiller", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract content from a URL
    Extract(ExtractArgs),

    /// Check whether robots.txt permits fetching a URL
    Robots {
        url: String,

        /// Identity to check (defaults to the configured robots user agent)
        #[arg(long)]
        user_agent: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// URL to extract
    #[arg(required_unless_present = "request")]
    url: Option<String>,

    /// Read the request from a JSON file; other flags are applied on top
    #[arg(long, value_name = "FILE")]
    request: Option<PathBuf>,

    /// Render the page in a browser
    #[arg(long)]
    browser: bool,

    /// Element to extract (implies --browser)
    #[arg(long, value_name = "SELECTOR")]
    selector: Option<String>,

    /// Restrict markdown to matching elements
    #[arg(long = "include", value_name = "SELECTOR")]
    include: Vec<String>,

    /// Remove matching elements before conversion
    #[arg(long = "exclude", value_name = "SELECTOR")]
    exclude: Vec<String>,

    /// Content filter
    #[arg(long, value_enum)]
    filter: Option<FilterArg>,

    /// Filter threshold (pruning: 0-1, bm25: minimum score)
    #[arg(long)]
    threshold: Option<f64>,

    /// Query for the bm25 filter
    #[arg(long)]
    query: Option<String>,

    /// Structured extraction schema (JSON file)
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,

    /// Wait for a selector before capturing (browser only)
    #[arg(long = "wait-for", value_name = "SELECTOR")]
    wait_for: Vec<String>,

    /// Script to run after navigation (browser only)
    #[arg(long = "script", value_name = "JS")]
    scripts: Vec<String>,

    #[arg(long)]
    user_agent: Option<String>,

    /// Navigation timeout in milliseconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Hide automation markers from page scripts
    #[arg(long)]
    stealth: bool,

    #[arg(long)]
    viewport_width: Option<u32>,

    #[arg(long)]
    viewport_height: Option<u32>,

    /// Ask HTTP caches to revalidate
    #[arg(long)]
    no_cache: bool,

    /// Skip the robots.txt check
    #[arg(long)]
    ignore_robots: bool,

    /// Skip per-domain rate limiting
    #[arg(long)]
    no_rate_limit: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FilterArg {
    Pruning,
    Bm25,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_distill=info,warn"),
            1 => EnvFilter::new("sumi_distill=debug,info"),
            2 => EnvFilter::new("sumi_distill=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load(cli.config.as_deref())?;
    let extractor = Extractor::from_config(config).context("failed to initialize extractor")?;

    match cli.command {
        Command::Robots { url, user_agent } => {
            let decision = extractor.check_robots(&url, user_agent.as_deref()).await;
            println!("{}", serde_json::to_string_pretty(&decision)?);
            Ok(())
        }
        Command::Extract(args) => {
            let pretty = args.pretty;
            let request = build_request(args)?;
            match extractor.extract(&request).await {
                Ok(result) => {
                    print_json(&result, pretty)?;
                    Ok(())
                }
                Err(e) => {
                    print_json(
                        &serde_json::json!({
                            "error": e.to_string(),
                            "status": e.status_code(),
                        }),
                        pretty,
                    )?;
                    Err(e.into())
                }
            }
        }
    }
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

fn build_request(args: ExtractArgs) -> anyhow::Result<ExtractionRequest> {
    let mut request = match &args.request {
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read request file {}", path.display()))?;
            serde_json::from_str::<ExtractionRequest>(&body)
                .with_context(|| format!("invalid request file {}", path.display()))?
        }
        None => ExtractionRequest::default(),
    };

    if let Some(url) = args.url {
        request.url = url;
    }

    if args.selector.is_some() || !args.include.is_empty() || !args.exclude.is_empty() {
        let selectors = request.selectors.get_or_insert_with(SelectorConfig::default);
        if args.selector.is_some() {
            selectors.base_selector = args.selector;
        }
        selectors.include_selectors.extend(args.include);
        selectors.exclude_selectors.extend(args.exclude);
    }

    if let Some(path) = &args.schema {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema file {}", path.display()))?;
        request.extraction_schema = Some(
            serde_json::from_str(&body)
                .with_context(|| format!("invalid schema file {}", path.display()))?,
        );
    }

    if let Some(filter) = args.filter {
        request.filter.kind = match filter {
            FilterArg::Pruning => FilterKind::Pruning,
            FilterArg::Bm25 => FilterKind::Bm25,
        };
    }
    if args.threshold.is_some() {
        request.filter.threshold = args.threshold;
    }
    if args.query.is_some() {
        request.filter.query = args.query;
    }

    if args.user_agent.is_some() {
        request.browser.user_agent = args.user_agent;
    }
    if args.timeout.is_some() {
        request.browser.timeout = args.timeout;
    }
    if args.viewport_width.is_some() {
        request.browser.viewport_width = args.viewport_width;
    }
    if args.viewport_height.is_some() {
        request.browser.viewport_height = args.viewport_height;
    }
    request.browser.headless &= !args.headed;
    request.browser.stealth_mode |= args.stealth;

    request.wait_selectors.extend(args.wait_for);
    request.scripts.extend(args.scripts);

    request.behavior.use_browser |= args.browser;
    request.behavior.use_cache &= !args.no_cache;
    request.behavior.check_robots_txt &= !args.ignore_robots;
    request.behavior.respect_rate_limits &= !args.no_rate_limit;

    Ok(request)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

/// 0 success, 1 internal, 2 invalid input, 3 robots refusal, 4 rate limited
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<DistillError>() {
        return match e {
            DistillError::RobotsDenied { .. } => 3,
            DistillError::RateLimited { .. } => 4,
            DistillError::InvalidRequest(_) | DistillError::Url(_) | DistillError::Config(_) => 2,
            _ => 1,
        };
    }

    if err.downcast_ref::<ConfigError>().is_some()
        || err.downcast_ref::<serde_json::Error>().is_some()
        || err.downcast_ref::<std::io::Error>().is_some()
    {
        2
    } else {
        1
    }
}
