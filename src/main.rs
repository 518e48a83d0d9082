//! Doc-Harvest main entry point
//!
//! This is the command-line interface for the Doc-Harvest documentation and
//! media harvester.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use doc_harvest::config::{load_config_with_hash, Config};
use doc_harvest::{Harvester, RunReport};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// What a run harvests
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Documentation pages rendered to plain text
    Docs,
    /// Audio and video files found in fetched pages
    Media,
    /// Audio and video files found in browser-rendered pages
    Dynamic,
}

impl Mode {
    fn default_output(self) -> PathBuf {
        match self {
            Mode::Docs => PathBuf::from("./docs-output"),
            Mode::Media | Mode::Dynamic => PathBuf::from("./media-output"),
        }
    }
}

/// Doc-Harvest: a documentation and media harvester
///
/// Doc-Harvest fetches a seed page, follows its same-site links one level
/// deep and saves each linked page as structured text, or downloads the
/// media files the pages reference, into a directory tree mirroring the
/// site's URL layout.
#[derive(Parser, Debug)]
#[command(name = "doc-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A documentation and media harvester", long_about = None)]
struct Cli {
    /// Page to start from
    #[arg(value_name = "SEED_URL")]
    seed_url: String,

    /// Directory to write results to (default depends on the mode)
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// What to harvest
    #[arg(value_name = "MODE", value_enum, default_value_t = Mode::Docs)]
    mode: Mode,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// WebDriver server used by the dynamic mode
    #[arg(long, value_name = "URL", default_value = "http://localhost:4444")]
    webdriver_url: String,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration and show what would run, without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| cli.mode.default_output());

    let mut harvester = Harvester::new(config.clone(), &cli.seed_url, &output_dir)
        .context("Failed to set up the harvest")?;

    if cli.dry_run {
        print_dry_run(&cli, &config, &harvester);
        return Ok(());
    }

    let report = match cli.mode {
        Mode::Docs => harvester.run_documents().await,
        Mode::Media => harvester.run_media().await,
        Mode::Dynamic => run_dynamic(&mut harvester, &config, &cli.webdriver_url).await?,
    }
    .context("Harvest aborted")?;

    report.print_summary(harvester.output_root());
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_harvest=info,warn"),
            1 => EnvFilter::new("doc_harvest=debug,info"),
            2 => EnvFilter::new("doc_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the dynamic mode: connects a browser session and runs the harvest
#[cfg(feature = "webdriver")]
async fn run_dynamic(
    harvester: &mut Harvester,
    config: &Config,
    webdriver_url: &str,
) -> anyhow::Result<doc_harvest::Result<RunReport>> {
    use doc_harvest::crawler::WebDriverBackend;
    use std::time::Duration;

    let backend = WebDriverBackend::connect(
        webdriver_url,
        Duration::from_millis(config.pipeline.render_wait_ms),
    )
    .await
    .with_context(|| format!("Failed to connect to WebDriver at {}", webdriver_url))?;

    let report = harvester.run_media_dynamic(&backend).await;

    if let Err(e) = backend.close().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }
    Ok(report)
}

#[cfg(not(feature = "webdriver"))]
async fn run_dynamic(
    _harvester: &mut Harvester,
    _config: &Config,
    _webdriver_url: &str,
) -> anyhow::Result<doc_harvest::Result<RunReport>> {
    anyhow::bail!("The dynamic mode needs a build with the `webdriver` feature enabled")
}

/// Handles --dry-run: shows the effective settings
fn print_dry_run(cli: &Cli, config: &Config, harvester: &Harvester) {
    println!("=== Doc-Harvest Dry Run ===\n");

    println!("Run:");
    println!("  Seed: {}", harvester.seed());
    println!("  Mode: {:?}", cli.mode);
    println!("  Output: {}", harvester.output_root().display());
    if cli.mode == Mode::Dynamic {
        println!("  WebDriver: {}", cli.webdriver_url);
    }

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!(
        "  Timeouts: connect {}s, read {}s, write {}s",
        config.http.connect_timeout_secs,
        config.http.read_timeout_secs,
        config.http.write_timeout_secs
    );

    println!("\nDiscovery:");
    if config.discovery.allowed_hosts.is_empty() {
        println!("  Allowed hosts: seed host only");
    } else {
        println!(
            "  Allowed hosts: seed host, {}",
            config.discovery.allowed_hosts.join(", ")
        );
    }
    println!(
        "  Denied substrings: {}",
        config.discovery.deny_substrings.join(", ")
    );

    println!("\nMedia:");
    println!("  Extensions: {}", config.media.extensions.join(", "));
    println!(
        "  Max concurrent items: {}",
        config.pipeline.max_concurrent_items
    );

    println!("\n✓ Configuration is valid");
}
