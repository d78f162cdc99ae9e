//! Byline main entry point
//!
//! This is the command-line interface for the Byline author archive scraper.

use anyhow::{bail, Context};
use byline::config::{
    config_fingerprint, parse_config, validate, Config, OutputFormat, TagMatch,
};
use byline::crawler::{run_scrape, ScrapeResult};
use byline::output::{
    export_articles, filter_by_tags, print_run_history, print_statistics, RunPayload, ScrapeStats,
};
use byline::storage::{open_store, ResultStore, RunStatus, OUTPUT_KEY};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Number of runs listed by `--stats`
const HISTORY_LIMIT: usize = 20;

/// Byline: scrape every article an author has published
///
/// Byline walks an author's index on a Medium-style platform, extracts each
/// article (and optionally its responses), filters them by tag, and exports
/// the result with run statistics.
#[derive(Parser, Debug)]
#[command(name = "byline")]
#[command(version)]
#[command(about = "Scrape an author's article archive", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Author page to scrape (overrides the config file)
    #[arg(long, value_name = "URL")]
    author_url: Option<String>,

    /// Keep only articles with this tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,

    /// Whether an article needs any or all of the requested tags
    #[arg(long, value_enum)]
    tag_match: Option<TagMatch>,

    /// Export format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Upper bound on the number of articles
    #[arg(long, value_name = "N")]
    max_articles: Option<usize>,

    /// Also scrape each article's responses
    #[arg(long)]
    comments: bool,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    output: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration and print it without scraping
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the runs recorded in the dataset store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let config_hash = config_fingerprint(&config).context("Failed to fingerprint configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &config_hash)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_scrape(config, &config_hash, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("byline=info,warn"),
            1 => EnvFilter::new("byline=debug,info"),
            2 => EnvFilter::new("byline=trace,debug"),
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

/// Loads the config file (if any), layers CLI flags on top and validates
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match (&cli.config, &cli.author_url) {
        (Some(path), _) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read configuration from {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("Failed to parse configuration from {}", path.display()))?
        }
        (None, Some(author_url)) => Config::for_author(author_url.clone()),
        (None, None) => bail!("either --config or --author-url is required"),
    };

    if let Some(author_url) = &cli.author_url {
        config.input.author_url = author_url.clone();
    }
    if !cli.tags.is_empty() {
        config.input.tags = cli.tags.clone();
    }
    if let Some(tag_match) = cli.tag_match {
        config.input.tag_match = tag_match;
    }
    if let Some(format) = cli.format {
        config.input.output_format = format;
    }
    if let Some(max_articles) = cli.max_articles {
        config.input.max_articles = Some(max_articles);
    }
    if cli.comments {
        config.input.include_comments = true;
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    println!("=== Byline Dry Run ===\n");

    println!("Input:");
    println!("  Author: {}", config.input.author_url);
    if config.input.tags.is_empty() {
        println!("  Tags: (all)");
    } else {
        println!(
            "  Tags: {} (match {:?})",
            config.input.tags.join(", "),
            config.input.tag_match
        );
    }
    println!(
        "  Max articles: {}",
        config
            .input
            .max_articles
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );
    println!("  Comments: {}", config.input.include_comments);

    println!("\nScraper Configuration:");
    println!(
        "  Max concurrent articles: {}",
        config.scraper.max_concurrent_articles
    );
    println!(
        "  Minimum request interval: {}ms",
        config.scraper.min_request_interval
    );
    println!(
        "  Attempts: {} (backoff {}ms..{}ms)",
        config.scraper.max_attempts, config.scraper.backoff_base, config.scraper.backoff_max
    );
    println!("  Request timeout: {}s", config.scraper.request_timeout);
    println!("  Max index pages: {}", config.scraper.max_index_pages);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Format: {}", config.input.output_format);
    println!("  Directory: {}", config.output.directory);
    println!("  Dataset: {}", config.output.dataset_path);

    println!("\n✓ Configuration is valid (hash: {})", config_hash);

    Ok(())
}

/// Handles the --stats mode: lists recorded runs
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Dataset: {}\n", config.output.dataset_path);

    let store = open_store(Path::new(&config.output.dataset_path))
        .context("Failed to open dataset store")?;
    let runs = store.latest_runs(HISTORY_LIMIT)?;

    print_run_history(&runs);

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: Config, config_hash: &str, quiet: bool) -> anyhow::Result<()> {
    let mut store = open_store(Path::new(&config.output.dataset_path))
        .context("Failed to open dataset store")?;
    let run_id = store.create_run(&config.input.author_url, config_hash)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight articles");
            ctrl_c.cancel();
        }
    });

    let started = Instant::now();
    let outcome = match run_scrape(&config, cancel).await {
        Ok(result) => publish(&config, &mut store, run_id, result, started.elapsed()),
        Err(e) => Err(anyhow::Error::new(e).context("Scrape failed")),
    };

    match outcome {
        Ok((stats, path)) => {
            store.finish_run(run_id, RunStatus::for_result(stats.partial))?;
            stats.log_completed();
            if !quiet {
                print_statistics(&stats);
                println!("\n✓ Articles exported to: {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            store.finish_run(run_id, RunStatus::Failed)?;
            Err(e)
        }
    }
}

/// Filters, exports and records the result of a finished scrape
fn publish(
    config: &Config,
    store: &mut impl ResultStore,
    run_id: i64,
    mut result: ScrapeResult,
    elapsed: Duration,
) -> anyhow::Result<(ScrapeStats, PathBuf)> {
    let articles = filter_by_tags(
        std::mem::take(&mut result.articles),
        &config.input.tags,
        config.input.tag_match,
    );
    let stats = ScrapeStats::compute(&articles, &result, elapsed);

    let path = export_articles(
        &articles,
        config.input.output_format,
        Path::new(&config.output.directory),
    )
    .context("Failed to export articles")?;

    let payload = serde_json::to_value(RunPayload {
        articles,
        stats: stats.clone(),
    })?;
    store.push_item(run_id, &payload)?;
    store.set_value(OUTPUT_KEY, &payload)?;

    Ok((stats, path))
}
