//! Magpie main entry point
//!
//! This is the command-line interface for the two-stage media pipeline:
//! `crawl` discovers media links by driving a browser over an account's
//! feed, `fetch` downloads a previously discovered link file.

use clap::{Parser, Subcommand};
use magpie::browser::{response_channel, ChromiumDriver};
use magpie::config::load_config_with_hash;
use magpie::crawl::{run_discovery, CrawlSession};
use magpie::fetch::run_acquisition;
use magpie::output::{unique_path, LinkSink};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Magpie: a two-stage media hoarder for paginated social feeds
///
/// The crawl stage drives a real browser over an account's media timeline
/// and streams every discovered link into an append-only file. The fetch
/// stage downloads such a file under bounded concurrency with retry and
/// format-rescue logic. The stages are independent; only the link file
/// connects them.
#[derive(Parser, Debug)]
#[command(name = "magpie")]
#[command(version = "0.2.0")]
#[command(about = "Feed media discovery and acquisition", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl an account's feed and write discovered media links to a file
    Crawl {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Download every link from a link file into the output directory
    Fetch {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Link file to download; overrides configuration and auto-detection
        #[arg(long)]
        links: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Crawl { config } => handle_crawl(&config).await?,
        Command::Fetch { config, links } => handle_fetch(&config, links.as_deref()).await?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("magpie=info,warn"),
            1 => EnvFilter::new("magpie=debug,info"),
            2 => EnvFilter::new("magpie=trace,debug"),
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

/// Loads and validates the configuration, logging its integrity hash
fn load_config(path: &Path) -> Result<magpie::Config, Box<dyn std::error::Error>> {
    tracing::info!("Loading configuration from: {}", path.display());
    match load_config_with_hash(path) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the crawl subcommand: discovery stage
async fn handle_crawl(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let discovery = &config.discovery;

    let links_path = match &discovery.links_path {
        Some(path) => PathBuf::from(path),
        None => unique_path(Path::new(&format!("{}_links.txt", discovery.handle))),
    };
    tracing::info!("Saving links to: {}", links_path.display());

    let (tx, rx) = response_channel();
    let sink = LinkSink::open(&links_path)?;
    let mut session = CrawlSession::new(sink, rx);

    tracing::info!("Launching browser");
    let mut driver = ChromiumDriver::launch(discovery, tx).await?;

    let result = run_discovery(&mut driver, &mut session, discovery).await;
    driver.close().await?;
    let report = result?;

    tracing::info!(
        "Discovery complete: {} links via {:?} saved to {}",
        report.discovered,
        report.strategy,
        links_path.display()
    );
    Ok(())
}

/// Handles the fetch subcommand: acquisition stage
async fn handle_fetch(
    config_path: &Path,
    links: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    let report = run_acquisition(&config.acquisition, links).await?;

    tracing::info!(
        "Acquisition complete: {} saved, {} skipped, {} failed of {}",
        report.saved,
        report.skipped,
        report.failed,
        report.total()
    );
    if report.failed > 0 {
        tracing::warn!(
            "Check {} for the failed links",
            config.acquisition.failure_log
        );
    }
    Ok(())
}
