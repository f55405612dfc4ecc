// src/main.rs

use clap::Parser;
use confluence2md::{
    build_default_registry, CachedPageFetcher, CommandLineInput, ConfluenceHttpClient,
    ConversionConfig, ConversionError, MacroEngine, OfflinePageFetcher, PageFetcher, PageId,
    ProcessingResult, SpaceKey,
};
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fmt::Write as _;
use std::fs;
use std::sync::Arc;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("confluence2md.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Builds the page fetcher: a cached HTTP client when credentials are
/// configured, otherwise an offline stub that degrades every include.
fn build_fetcher(cli: &CommandLineInput) -> Result<Arc<dyn PageFetcher>, ConversionError> {
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| std::env::var("CONFLUENCE_BASE_URL").ok());
    let api_token = cli
        .api_token
        .clone()
        .or_else(|| std::env::var("CONFLUENCE_API_TOKEN").ok());

    match (&base_url, &api_token) {
        (Some(base_url), Some(api_token)) => {
            let client = ConfluenceHttpClient::new(base_url, api_token)?;
            Ok(Arc::new(CachedPageFetcher::new(Arc::new(client))))
        }
        (Some(_), None) | (None, Some(_)) => Err(ConversionError::MissingConfiguration(
            "both --base-url and --api-token are required for live fetching".to_string(),
        )),
        (None, None) => {
            log::info!("Running offline; include macros will degrade to fallbacks");
            Ok(Arc::new(OfflinePageFetcher))
        }
    }
}

/// Renders a human-readable conversion report for non-pipe runs.
fn render_report(result: &ProcessingResult) -> String {
    let stats = &result.stats;
    let mut report = String::new();
    writeln!(
        report,
        "Converted {} macro(s): {} ok, {} degraded, {} preserved unknown",
        stats.total, stats.succeeded, stats.failed, stats.skipped
    )
    .unwrap();

    for (macro_type, type_stats) in &stats.per_type {
        writeln!(
            report,
            "  {:<12} count={} ok={} failed={} latency min/avg/max = {:?}/{:?}/{:?}",
            macro_type,
            type_stats.count,
            type_stats.succeeded,
            type_stats.failed,
            type_stats.min_latency,
            type_stats.avg_latency,
            type_stats.max_latency
        )
        .unwrap();
    }

    if !result.fallbacks_used.is_empty() {
        writeln!(report, "Fallbacks used:").unwrap();
        for record in &result.fallbacks_used {
            writeln!(
                report,
                "  {} at {}..{}: {} via {}",
                record.macro_type,
                record.position.start,
                record.position.end,
                record.original_error_kind,
                record.strategy_used
            )
            .unwrap();
        }
    }
    report
}

async fn run(cli: CommandLineInput) -> Result<(), ConversionError> {
    let config = match &cli.config {
        Some(path) => ConversionConfig::load_file(path)?,
        None => ConversionConfig::default(),
    }
    .apply_cli(&cli);

    let fetcher = build_fetcher(&cli)?;
    let registry = build_default_registry(&config, &fetcher);
    let engine = MacroEngine::new(Arc::new(registry), Arc::clone(&fetcher), config.clone());

    // Resolve the input body and the page identity driving the context.
    let (html, page_id) = match (&cli.input_file, &cli.page_id) {
        (Some(path), _) => {
            let body = fs::read_to_string(path)?;
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("local-document");
            (body, PageId::parse(stem).unwrap_or_else(|_| {
                PageId::parse("local-document").expect("static id is valid")
            }))
        }
        (None, Some(raw_id)) => {
            let page_id = PageId::parse(raw_id)?;
            let body = fetcher.fetch_page_body(&page_id).await?;
            (body, page_id)
        }
        (None, None) => {
            return Err(ConversionError::MissingConfiguration(
                "provide an input file or --page-id".to_string(),
            ))
        }
    };

    let space_key = match &cli.space {
        Some(raw) => Some(SpaceKey::parse(raw)?),
        None => None,
    };
    let ctx = config.make_context(page_id, space_key);

    let result = engine.convert(&html, &ctx).await;

    match &cli.output_file {
        Some(path) => {
            fs::write(path, &result.processed_content)?;
            log::info!("Wrote converted document to {}", path.display());
        }
        None => println!("{}", result.processed_content),
    }

    if !cli.pipe {
        eprint!("{}", render_report(&result));
    }

    if !result.success {
        return Err(ConversionError::Internal {
            message: "document conversion did not complete; original content preserved"
                .to_string(),
            source: None,
        });
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = CommandLineInput::parse();

    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("Failed to set up logging: {e}");
    }

    if let Err(e) = run(cli).await {
        log::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
