//! Sitemapper main entry point
//!
//! This is the command-line interface for the Sitemapper site crawler.

use anyhow::Context;
use clap::Parser;
use sitemapper::config::{load_config_with_hash, validate, Config};
use sitemapper::output::{print_summary, write_output, ExportFormat};
use sitemapper::{CrawlProgress, Crawler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Sitemapper: a breadth-first site mapper
///
/// Sitemapper crawls a single website from a seed URL, collects page titles
/// and meta tags, and writes a sitemap or an SEO report.
#[derive(Parser, Debug)]
#[command(name = "sitemapper")]
#[command(version = "1.0.0")]
#[command(about = "A breadth-first site mapper", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum link depth from the seed
    #[arg(long)]
    max_depth: Option<u32>,

    /// Maximum number of pages to visit
    #[arg(long)]
    max_pages: Option<usize>,

    /// Delay between requests in milliseconds
    #[arg(long)]
    delay: Option<u64>,

    /// Ignore robots.txt
    #[arg(long)]
    no_robots: bool,

    /// Export format
    #[arg(short, long, value_enum)]
    format: Option<ExportFormat>,

    /// Output file; stdout when absent
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

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

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration after command-line overrides")?;

    if cli.dry_run {
        handle_dry_run(&cli.url, &config);
        return Ok(());
    }

    handle_crawl(&cli.url, config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemapper=info,warn"),
            1 => EnvFilter::new("sitemapper=debug,info"),
            2 => EnvFilter::new("sitemapper=trace,debug"),
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

/// Command-line flags win over file values
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(depth) = cli.max_depth {
        config.crawler.max_depth = depth;
    }
    if let Some(pages) = cli.max_pages {
        config.crawler.max_pages = pages;
    }
    if let Some(delay) = cli.delay {
        config.crawler.delay = delay;
    }
    if cli.no_robots {
        config.crawler.respect_robots_txt = false;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(output) = &cli.output {
        config.output.path = Some(output.display().to_string());
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(url: &str, config: &Config) {
    println!("=== Sitemapper Dry Run ===\n");

    println!("Seed: {}\n", url);

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Delay: {}ms", config.crawler.delay);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);
    println!("  Extract meta tags: {}", config.crawler.extract_meta_tags);
    println!("  Analyze content: {}", config.crawler.analyze_content);
    println!("  Include images: {}", config.crawler.include_images);
    println!(
        "  Include external links: {}",
        config.crawler.include_external_links
    );
    println!(
        "  Include social media: {}",
        config.crawler.include_social_media
    );
    println!(
        "  Include schema markup: {}",
        config.crawler.include_schema_markup
    );
    println!("  Timeout: {}s", config.fetch.timeout_secs);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Format: {}", config.output.format);
    println!(
        "  Path: {}",
        config.output.path.as_deref().unwrap_or("(stdout)")
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(url: &str, config: Config) -> anyhow::Result<()> {
    let format = config.output.format;
    let path = config.output.path.clone();

    let crawler = Arc::new(Crawler::new(config).context("Failed to initialize crawler")?);
    let options = crawler.options();
    tracing::debug!(
        "Requests to {} spaced {}ms apart, robots.txt {}",
        url,
        options.delay,
        if options.respect_robots_txt { "respected" } else { "ignored" }
    );

    // Ctrl-C stops the crawl; the partial result is still written
    let stopper = Arc::clone(&crawler);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            stopper.stop();
        }
    });

    let (tx, mut rx) = mpsc::unbounded_channel::<CrawlProgress>();
    let reporter = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            if progress.is_complete {
                tracing::info!("Crawl finished after {} pages", progress.pages_crawled);
            } else {
                tracing::info!(
                    "[{}/{}] depth {} {}",
                    progress.pages_crawled,
                    progress.total_pages,
                    progress.current_depth,
                    progress.current_url
                );
            }
        }
    });

    let data = match crawler.crawl(url, Some(tx)).await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };
    if reporter.await.is_err() {
        tracing::debug!("Progress reporter ended abnormally");
    }

    let rendered = format
        .render(&data)
        .with_context(|| format!("Failed to render {} output", format))?;
    write_output(&rendered, path.as_deref().map(Path::new))
        .context("Failed to write output")?;

    print_summary(&data);

    Ok(())
}
