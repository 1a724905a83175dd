//! orgcrawl main entry point
//!
//! This is the command-line interface for the organizational website crawler.

use anyhow::Context;
use clap::Parser;
use orgcrawl::checkpoint::{self, checkpoint_path};
use orgcrawl::config::{load_config_with_hash, Config};
use orgcrawl::crawler::{crawl, selected_organizations, CrawlOptions};
use orgcrawl::output::{
    organization_log_layer, print_checkpoint_summary, print_report, write_overall_summary,
    OrganizationLog,
};
use orgcrawl::CrawlState;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// orgcrawl: a polite, resumable crawler for organizational websites
///
/// Crawls each configured organization within its depth and page budget,
/// respecting robots.txt and a fixed request delay. Progress is
/// checkpointed so an interrupted crawl can be resumed.
#[derive(Parser, Debug)]
#[command(name = "orgcrawl")]
#[command(version)]
#[command(about = "A polite, resumable crawler for organizational websites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume each organization from its checkpoint if one exists
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Delete existing checkpoints and start over
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Only crawl the named organizations
    #[arg(long, value_name = "NAME", num_args = 1..)]
    only: Vec<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show checkpoint statistics per organization and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let organization_log = OrganizationLog::new();
    setup_logging(cli.verbose, cli.quiet, organization_log.clone());

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.only);
        return Ok(());
    }

    if cli.stats {
        handle_stats(&config, &cli.only);
        return Ok(());
    }

    let options = CrawlOptions {
        resume: cli.resume,
        fresh: cli.fresh,
        only: cli.only,
        log_file: config.logging.file_output.then_some(organization_log),
    };
    handle_crawl(&config, &config_hash, &options).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// The console follows `-v`/`-q`. `organization_log` receives DEBUG events
/// whenever a crawl opens a log file for an organization.
fn setup_logging(verbose: u8, quiet: bool, organization_log: OrganizationLog) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("orgcrawl=info,warn"),
            1 => EnvFilter::new("orgcrawl=debug,info"),
            2 => EnvFilter::new("orgcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(console)
        .with(organization_log_layer(organization_log))
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config, only: &[String]) {
    println!("=== orgcrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Follow external links: {}", config.crawler.follow_external_links);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);
    println!(
        "  Delay: {}ms between requests, {}ms after errors",
        config.rate_limiting.delay_between_requests, config.rate_limiting.delay_on_error
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Data directory: {}", config.output.data_dir);
    println!("  Checkpoints: {}", config.session.checkpoint_dir);
    if config.logging.file_output {
        println!("  Log files: {}", config.logging.log_dir);
    }

    let organizations = selected_organizations(config, only);
    println!("\nOrganizations ({}):", organizations.len());
    for org in &organizations {
        println!(
            "  - {} (priority {}, depth {}, {} pages)",
            org.name,
            org.scrape_priority,
            org.max_depth.unwrap_or(config.crawler.max_depth),
            org.max_pages.unwrap_or(config.crawler.max_pages)
        );
        for seed in &org.seeds {
            println!("    * {}", seed);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        organizations.iter().map(|o| o.seeds.len()).sum::<usize>()
    );
}

/// Handles the --stats mode: shows what each checkpoint holds
fn handle_stats(config: &Config, only: &[String]) {
    let dir = Path::new(&config.session.checkpoint_dir);
    println!("Checkpoints: {}\n", dir.display());

    for org in selected_organizations(config, only) {
        let loaded = checkpoint::load(&checkpoint_path(dir, &org.name));
        print_checkpoint_summary(&org.name, &loaded);
    }
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    options: &CrawlOptions,
) -> anyhow::Result<()> {
    if options.fresh {
        tracing::info!("Starting fresh crawl (discarding checkpoints)");
    } else if options.resume {
        tracing::info!("Starting crawl (resuming from checkpoints)");
    }

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let reports = crawl(config, options, interrupt).await;

    if !reports.is_empty() {
        for report in &reports {
            print_report(report);
        }
        write_overall_summary(Path::new(&config.output.data_dir), config_hash, &reports)
            .context("Failed to write overall statistics")?;
    }

    let paused = reports.iter().filter(|r| r.state == CrawlState::Paused).count();
    if paused > 0 {
        tracing::info!("{} organization(s) paused; rerun with --resume to continue", paused);
    }

    let failed = reports.iter().filter(|r| r.state == CrawlState::Failed).count();
    if failed > 0 {
        anyhow::bail!("{} of {} organization(s) failed", failed, reports.len());
    }

    Ok(())
}
