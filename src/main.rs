//! Flag-Harvester main entry point
//!
//! This is the command-line interface for the Flag-Harvester crawler.

use anyhow::Context;
use clap::Parser;
use flag_harvester::config::{load_config_with_hash, validate, Config};
use flag_harvester::crawler::{harvest, Credentials};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Flag-Harvester: an authenticated same-origin crawler
///
/// Logs into the configured web application, crawls outward from the start
/// page and prints every secret flag it finds, one per line.
#[derive(Parser, Debug)]
#[command(name = "flag-harvester")]
#[command(version)]
#[command(about = "Authenticated same-origin flag crawler", long_about = None)]
struct Cli {
    /// Account username for the login form
    #[arg(value_name = "USERNAME")]
    username: String,

    /// Account password for the login form
    #[arg(value_name = "PASSWORD")]
    password: String,

    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of distinct flags to collect before stopping
    #[arg(short, long, value_name = "N")]
    target: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
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

    if let Some(target) = cli.target {
        config.crawler.target_flags = target;
        validate(&config).context("Invalid --target")?;
    }

    tracing::info!(
        "Harvesting {} flags from {}:{}",
        config.crawler.target_flags,
        config.server.host,
        config.server.port
    );

    let credentials = Credentials::new(cli.username, cli.password);
    let flags = harvest(&config, credentials).context("Crawl failed")?;

    for flag in flags.iter() {
        println!("{}", flag);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that stdout carries nothing but flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("flag_harvester=info,warn"),
            1 => EnvFilter::new("flag_harvester=debug,info"),
            2 => EnvFilter::new("flag_harvester=trace,debug"),
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
