// src/main.rs

use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion_graph::{CommandLineInput, CrawlConfig, CrawlEngine, NotionHttpClient};
use std::fs;
use std::sync::Arc;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("notion_graph.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();
    let config = CrawlConfig::from_cli(&cli);

    setup_logging(config.verbose)?;

    let client = Arc::new(NotionHttpClient::new()?);
    let engine = CrawlEngine::new(client, config)?;

    let graph = engine.build(&cli.root_block_id).await;

    for error in &graph.errors {
        log::warn!("crawl error: {}", error);
    }
    if graph.errors.is_empty() {
        println!(
            "📄 Discovered {} nodes and {} links.",
            graph.nodes.len(),
            graph.links.len()
        );
    } else {
        eprintln!(
            "⚠️  Discovered {} nodes and {} links with {} errors (see log for details).",
            graph.nodes.len(),
            graph.links.len(),
            graph.errors.len()
        );
    }

    let json = serde_json::to_string_pretty(&graph)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json)?;
            println!("✓ Graph written to {}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
