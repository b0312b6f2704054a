//! Image-Pager main entry point
//!
//! This is the command-line interface for the Image-Pager engine.

use anyhow::Context;
use clap::Parser;
use image::GenericImageView;
use image_pager::config::{load_config, Config};
use image_pager::{FetchedImage, RenderSink, SearchSession};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Image-Pager: page through remote images and keep the ones you pick
///
/// Image-Pager searches for image URLs, fetches them page by page with
/// bounded parallelism and retries, and saves the selected images when the
/// session closes.
#[derive(Parser, Debug)]
#[command(name = "image-pager")]
#[command(version)]
#[command(about = "Page through remote images and save the ones you pick", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Search term
    #[arg(long)]
    query: String,

    /// Number of pages to show before closing
    #[arg(short, long, default_value_t = 1)]
    pages: usize,

    /// Gallery indices to save, comma separated
    #[arg(long, value_delimiter = ',', conflicts_with = "select_all")]
    select: Vec<usize>,

    /// Save every image shown
    #[arg(long)]
    select_all: bool,

    /// Validate config and show what would be fetched without fetching
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

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;

    if cli.dry_run {
        handle_dry_run(&config, &cli.query);
        return Ok(());
    }

    handle_session(&config, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("image_pager=info,warn"),
            1 => EnvFilter::new("image_pager=debug,info"),
            2 => EnvFilter::new("image_pager=trace,debug"),
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

/// Prints each rendered image at its grid cell
struct ConsoleRenderer {
    images_per_row: usize,
}

impl RenderSink for ConsoleRenderer {
    fn render(&mut self, first_index: usize, images: &[FetchedImage]) {
        for (offset, image) in images.iter().enumerate() {
            let index = first_index + offset;
            let (width, height) = image.thumbnail.dimensions();
            println!(
                "[{:>3}] row {} col {}  {}  {}x{}  {}",
                index,
                index / self.images_per_row,
                index % self.images_per_row,
                image.id,
                width,
                height,
                image.url
            );
        }
    }
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config, query: &str) {
    println!("=== Image-Pager Dry Run ===\n");

    println!("Fetch:");
    println!("  Timeout: {}ms", config.fetch.timeout_ms);
    println!("  Max retry depth: {}", config.fetch.max_retry_depth);
    println!("  Connection limit: {}", config.connection_limit());
    for (name, value) in &config.fetch.headers {
        println!("  Header {}: {}", name, value);
    }

    println!("\nLayout:");
    println!(
        "  {} rows of {} images",
        config.layout.rows, config.layout.images_per_row
    );

    println!("\nSave:");
    println!("  Directory: {}", config.save.directory);
    println!("  Name pattern: {}", config.save.name_pattern);

    println!("\nSearch:");
    println!("  Query: {}", query);
    match &config.search.endpoint {
        Some(endpoint) => println!("  Endpoint: {}", endpoint),
        None => println!("  Endpoint: none"),
    }
    println!("  Initial URLs ({}):", config.search.init_urls.len());
    for url in &config.search.init_urls {
        println!("    * {}", url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles a full session: search, page, select, save
async fn handle_session(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    let mut session = SearchSession::open_http(config, &cli.query)
        .await
        .context("Failed to start search")?;

    let mut renderer = ConsoleRenderer {
        images_per_row: config.layout.images_per_row,
    };

    for page in 0..cli.pages {
        if !session.has_more() {
            tracing::info!("No more images after {} pages", page);
            break;
        }
        let added = session.show_more(&mut renderer).await?;
        tracing::debug!("Page {} added {} images", page + 1, added);
    }

    let selection: Vec<usize> = if cli.select_all {
        (0..session.gallery().len()).collect()
    } else {
        cli.select.clone()
    };
    for index in selection {
        if let Err(e) = session.select(index) {
            tracing::warn!("Ignoring selection: {}", e);
        }
    }

    let report = session.close();
    println!(
        "\nShowed {} images for '{}', saved {}:",
        report.names.len(),
        report.search_term,
        report.saved.len()
    );
    for path in &report.saved {
        println!("  {}", path.display());
    }
    for (id, e) in &report.failed {
        println!("  ✗ {}: {}", id, e);
    }

    Ok(())
}
