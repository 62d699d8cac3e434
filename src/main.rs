//! Indirect-Image main entry point
//!
//! Command-line front end: resolve the image behind one link and print it.

use anyhow::{bail, Context};
use clap::Parser;
use indirect_image::config::{load_config, Config};
use indirect_image::extract::{ContextDocument, RuleSet};
use indirect_image::{LookupFlags, PipelineCoordinator, RequestEpoch};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Indirect-Image: find the image a link points at
///
/// Fetches the linked page, applies the configured site rules (or generic
/// page metadata) and prints the image URL it found.
#[derive(Parser, Debug)]
#[command(name = "indirect-image")]
#[command(version)]
#[command(about = "Find the image behind a link", long_about = None)]
struct Cli {
    /// The linked page to inspect
    #[arg(value_name = "LINK")]
    link: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// The page the link was found on (defaults to the link itself)
    #[arg(long, value_name = "URL")]
    page: Option<Url>,

    /// Print every candidate instead of the best one
    #[arg(long)]
    all: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    let coordinator =
        PipelineCoordinator::from_config(&config).context("Failed to build HTTP client")?;
    let rules = RuleSet::from_config(&config.rules);
    tracing::debug!("{} site rules loaded", rules.len());

    let page = match cli.page {
        Some(page) => page,
        None => Url::parse(&cli.link).with_context(|| format!("Invalid link {}", cli.link))?,
    };
    let flags = if cli.all {
        LookupFlags::ALL_CANDIDATES
    } else {
        LookupFlags::NONE
    };

    let epoch = RequestEpoch::new();
    let (tx, rx) = oneshot::channel();

    let accepted = coordinator.start(
        ContextDocument::new(page),
        &cli.link,
        flags,
        epoch.advance(),
        move |result| {
            let _ = tx.send(result);
        },
        Arc::new(rules),
    );

    if accepted.is_none() {
        bail!("Protocol of {} is not allowed", cli.link);
    }

    match rx.await {
        Ok(Some(result)) => {
            for url in result.urls() {
                println!("{}", url);
            }
            Ok(())
        }
        Ok(None) => bail!("No image found behind {}", cli.link),
        Err(_) => bail!("Lookup of {} was abandoned", cli.link),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("indirect_image=info,warn"),
            1 => EnvFilter::new("indirect_image=debug,info"),
            2 => EnvFilter::new("indirect_image=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
