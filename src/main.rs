//! Product-Scout main entry point
//!
//! This is the command-line interface for the Product-Scout crawler.

use anyhow::{bail, Context};
use clap::Parser;
use product_scout::config::{load_config_with_hash, validate_overrides, Config, SourceEntry};
use product_scout::crawler::{build_http_client, crawl_source};
use product_scout::output::print_statistics;
use product_scout::storage::{save_source_results, JsonFileStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Product-Scout: a rule-driven product page crawler
///
/// Product-Scout crawls each configured source breadth-first, stays under the
/// source's root path, and saves every page its detection rules mark as a
/// product page.
#[derive(Parser, Debug)]
#[command(name = "product-scout")]
#[command(version)]
#[command(about = "A rule-driven product page crawler", long_about = None)]
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

    /// Only crawl the named source (repeatable)
    #[arg(long = "source", value_name = "NAME")]
    sources: Vec<String>,

    /// Override the per-source page quota
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Override the maximum link depth
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Override the number of concurrent fetches
    #[arg(long, value_name = "N")]
    max_workers: Option<usize>,

    /// Override the results file
    #[arg(long, value_name = "PATH")]
    output: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Reject malformed detection rules instead of ignoring them
    #[arg(long)]
    strict_rules: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli)?;
    let sources = select_sources(&config, &cli.sources)?;

    if cli.dry_run {
        handle_dry_run(&config, &sources);
    } else {
        handle_crawl(&config, &sources).await?;
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
            0 => EnvFilter::new("product_scout=info,warn"),
            1 => EnvFilter::new("product_scout=debug,info"),
            2 => EnvFilter::new("product_scout=trace,debug"),
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

/// Applies command-line overrides and re-validates the result
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(max_workers) = cli.max_workers {
        config.crawler.max_workers = max_workers;
    }
    if let Some(output) = &cli.output {
        config.output.results_path = output.clone();
    }
    if cli.strict_rules {
        config.crawler.strict_rules = true;
    }

    validate_overrides(config).context("Invalid command-line override")?;
    Ok(())
}

/// Picks the sources to crawl, in configuration order
fn select_sources(config: &Config, names: &[String]) -> anyhow::Result<Vec<SourceEntry>> {
    if names.is_empty() {
        return Ok(config.sources.clone());
    }

    for name in names {
        if !config.sources.iter().any(|s| &s.name == name) {
            bail!("Unknown source '{}'", name);
        }
    }

    Ok(config
        .sources
        .iter()
        .filter(|s| names.contains(&s.name))
        .cloned()
        .collect())
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, sources: &[SourceEntry]) {
    println!("=== Product-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max workers: {}", config.crawler.max_workers);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Strict rules: {}", config.crawler.strict_rules);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Results: {}", config.output.results_path);

    println!("\nSources ({}):", sources.len());
    for source in sources {
        println!("  - {} ({})", source.name, source.root_url);
        if let Some(rules_file) = &source.rules_file {
            println!("    rules: {}", rules_file);
        }
        if let Some(rule) = source.detection_rule() {
            for problem in rule.problems() {
                println!("    ! {}", problem);
            }
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, sources: &[SourceEntry]) -> anyhow::Result<()> {
    let client = build_http_client(&config.user_agent, config.crawler.request_timeout())
        .context("Failed to build HTTP client")?;
    let store = JsonFileStore::new(&config.output.results_path);

    for (index, source) in sources.iter().enumerate() {
        tracing::info!("Crawling source '{}' from {}", source.name, source.root_url);

        let (report, interrupted) = crawl_source(config, source, client.clone(), shutdown_signal())
            .await
            .with_context(|| format!("Crawl of source '{}' failed", source.name))?;

        save_source_results(&store, &source.name, &report.results).with_context(|| {
            format!("Failed to save results to {}", config.output.results_path)
        })?;

        print_statistics(&source.name, &report.stats);
        println!();

        if interrupted {
            let skipped = sources.len() - index - 1;
            if skipped > 0 {
                tracing::warn!("Interrupted; skipping {} remaining sources", skipped);
            }
            break;
        }
    }

    tracing::info!("Results written to {}", config.output.results_path);
    Ok(())
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
