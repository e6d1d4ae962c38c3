//! Catalog-Ripple main entry point
//!
//! This is the command-line interface for the Catalog-Ripple product harvester.

use anyhow::Context;
use catalog_ripple::config::{load_config_with_hash, validate, Config};
use catalog_ripple::crawler::run_crawl;
use catalog_ripple::output::print_report;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Ripple: a concurrent product catalog harvester
///
/// Crawls a category listing and all of its pages, visits every in-stock
/// product and writes id, name, brand and prices to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "catalog-ripple")]
#[command(version)]
#[command(about = "A concurrent product catalog harvester", long_about = None)]
struct Cli {
    /// Category listing URL to start from (overrides the config file)
    #[arg(value_name = "START_URL")]
    start_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// CSV file to write (overrides the config file)
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Pickup store identifier sent with every request
    #[arg(long, value_name = "ID")]
    pickup_store: Option<String>,

    /// Store identifier sent with every request
    #[arg(long, value_name = "ID")]
    store_id: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = resolve_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available; never cancel
            std::future::pending::<()>().await;
        }
    };

    let report = run_crawl(&config, shutdown).await.map_err(|e| {
        tracing::error!("Crawl failed: {}", e);
        e
    })?;

    if report.is_degraded() {
        tracing::warn!(
            "Crawl completed with {} skipped products and {} lost listing pages",
            report.skipped_products(),
            report.listing_failures
        );
    } else {
        tracing::info!("Crawl completed successfully");
    }

    if !cli.quiet {
        print_report(&report);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_ripple=info,warn"),
            1 => EnvFilter::new("catalog_ripple=debug,info"),
            2 => EnvFilter::new("catalog_ripple=trace,debug"),
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

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(start_url) = &cli.start_url {
        config.crawler.start_url = start_url.clone();
    }
    if let Some(output) = &cli.output {
        config.output.csv_path = output.clone();
    }
    if let Some(pickup_store) = &cli.pickup_store {
        config.session.pickup_store = pickup_store.clone();
    }
    if let Some(store_id) = &cli.store_id {
        config.session.store_id = store_id.clone();
    }

    validate(&config).context("invalid settings")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Ripple Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!(
        "  Max concurrent listing pages: {}",
        config.crawler.max_concurrent_listing_pages
    );
    println!(
        "  Max concurrent detail pages: {}",
        config.crawler.max_concurrent_detail_pages
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    if config.crawler.crawl_timeout_secs > 0 {
        println!("  Crawl timeout: {}s", config.crawler.crawl_timeout_secs);
    }

    println!("\nStore Identity:");
    println!("  Pickup store: {}", config.session.pickup_store);
    println!("  Store id: {}", config.session.store_id);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);

    println!("\n✓ Configuration is valid");
}
