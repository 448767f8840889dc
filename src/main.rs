//! CLI entry point for the newsfeed tool.

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use newsfeed_core::archive::{ArchiveEnumerator, BulkFetchConfig, BulkFetcher};
use newsfeed_core::fetch::{HttpClient, HttpClientConfig};
use newsfeed_core::query::{
    ArticleSearch, DEFAULT_WINDOW_MINUTES, QueryClient, QueryClientConfig, QueryFilter,
    TimelineSearch,
};
use newsfeed_core::RecordTable;
use tracing::{debug, info};

mod app_config;
mod cli;

use app_config::FileConfig;
use cli::{ArchiveArgs, Args, Command, FilterArgs, SearchArgs, TimelineArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Records go to stdout, so logs must not.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = app_config::load_default_file_config()?;
    if let Some(path) = loaded.path.as_deref().filter(|_| loaded.config.is_some()) {
        debug!(path = %path.display(), "loaded config file");
    }
    let config = loaded.config.unwrap_or_default();

    let table = match &args.command {
        Command::Search(search) => run_search(search, &config).await?,
        Command::Timeline(timeline) => run_timeline(timeline, &config).await?,
        Command::Archive(archive) => run_archive(archive, &config, args.quiet).await?,
    };

    write_records(&table, args.output.as_deref())?;
    info!(rows = table.len(), "done");
    Ok(())
}

fn http_config(config: &FileConfig, proxy: Option<String>) -> HttpClientConfig {
    let defaults = HttpClientConfig::default();
    HttpClientConfig {
        connect_timeout_secs: config
            .connect_timeout_secs
            .unwrap_or(defaults.connect_timeout_secs),
        read_timeout_secs: config
            .read_timeout_secs
            .unwrap_or(defaults.read_timeout_secs),
        proxy,
    }
}

fn query_client(config: &FileConfig) -> Result<QueryClient> {
    let http = HttpClient::from_config(&http_config(config, None))
        .context("Failed to build HTTP client")?;
    let defaults = QueryClientConfig::default();
    Ok(QueryClient::with_config(
        Arc::new(http),
        QueryClientConfig {
            endpoint: config.query_endpoint.clone().unwrap_or(defaults.endpoint),
            max_repair_attempts: config
                .max_repair_attempts
                .unwrap_or(defaults.max_repair_attempts),
            timeout: None,
        },
    ))
}

fn build_filter(args: &FilterArgs) -> Result<QueryFilter> {
    if let Some(template) = &args.query {
        return QueryFilter::from_template(template.clone(), args.start, args.end)
            .context("Invalid --query");
    }

    let mut builder = QueryFilter::builder()
        .start(args.start)
        .end(args.end)
        .max_records(args.max_records);
    for keyword in &args.keywords {
        builder = builder.keyword(keyword.clone());
    }
    for domain in &args.domains {
        builder = builder.domain(domain.clone());
    }
    for country in &args.countries {
        builder = builder.country(country.clone());
    }
    for language in &args.languages {
        builder = builder.language(language.clone());
    }
    for theme in &args.themes {
        builder = builder.theme(theme.clone());
    }
    builder.build().context("Invalid search filter")
}

async fn run_search(args: &SearchArgs, config: &FileConfig) -> Result<RecordTable> {
    let filter = build_filter(&args.filter)?;
    let client = query_client(config)?;
    let max_attempts = args
        .filter
        .max_repair_attempts
        .unwrap_or_else(|| client.max_repair_attempts());
    let window_minutes = args
        .window_minutes
        .or(config.window_minutes)
        .unwrap_or(DEFAULT_WINDOW_MINUTES);
    let include_trailing_partial =
        args.include_trailing_partial || config.include_trailing_partial.unwrap_or(false);

    info!(
        start = %filter.start(),
        end = %filter.end(),
        window_minutes,
        "starting article search"
    );

    ArticleSearch::new(client)
        .include_trailing_partial(include_trailing_partial)
        .search(&filter, max_attempts, window_minutes)
        .await
        .context("Article search failed")
}

async fn run_timeline(args: &TimelineArgs, config: &FileConfig) -> Result<RecordTable> {
    let filter = build_filter(&args.filter)?;
    let client = query_client(config)?;
    let max_attempts = args
        .filter
        .max_repair_attempts
        .unwrap_or_else(|| client.max_repair_attempts());

    info!(mode = %args.mode, "starting timeline search");

    TimelineSearch::new(client)
        .search(&filter, max_attempts, args.mode)
        .await
        .context("Timeline search failed")
}

async fn run_archive(args: &ArchiveArgs, config: &FileConfig, quiet: bool) -> Result<RecordTable> {
    let family = args.archive_family();
    let mut enumerator = ArchiveEnumerator::new(family);
    if let Some(base_url) = &config.archive_base_url {
        enumerator = enumerator.with_base_url(base_url.clone());
    }
    let descriptors = enumerator
        .enumerate(args.start, args.end)
        .context("Invalid archive range")?;

    let defaults = BulkFetchConfig::default();
    let bulk_config = BulkFetchConfig {
        concurrency: args
            .concurrency
            .map(usize::from)
            .or(config.concurrency)
            .unwrap_or(defaults.concurrency),
        throttle: config
            .throttle_ms
            .map_or(defaults.throttle, Duration::from_millis),
        request_timeout: None,
        proxy: args.proxy.clone().or_else(|| config.proxy.clone()),
    };
    let http = HttpClient::from_config(&http_config(config, bulk_config.proxy.clone()))
        .context("Failed to build HTTP client")?;
    let bulk = BulkFetcher::new(Arc::new(http), bulk_config)?;

    info!(
        family = %family,
        archives = descriptors.len(),
        concurrency = bulk.config().concurrency,
        "starting archive download"
    );

    let show_progress = !quiet && !args.no_progress && io::stderr().is_terminal();
    let bar = if show_progress {
        let bar = ProgressBar::new(descriptors.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} archives ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let result = bulk
        .fetch_all_with_progress(family, descriptors, |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        })
        .await;
    bar.finish_and_clear();

    result.context("Archive download failed")
}

fn write_records(table: &RecordTable, output: Option<&Path>) -> Result<()> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file '{}'", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(sink);
    for record in table.to_json_records() {
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
