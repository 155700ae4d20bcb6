//! File-backed runner for the augmentation pipeline.
//!
//! Reads a JSON run configuration, treats `inputCollectionId` as the input
//! file path, and appends augmented records to a JSON Lines output file.

use clap::Parser;
use llm_augmenter::dataset::{JsonFileSink, JsonFileSource};
use llm_augmenter::{Augmenter, RunConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "augment")]
#[command(about = "Augment dataset records with per-item LLM completions")]
struct Args {
    /// Path to the JSON run configuration
    #[arg(short, long)]
    config: String,

    /// Output file (one JSON object per line)
    #[arg(short, long, default_value = "augmented.jsonl")]
    output: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("llm_augmenter=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("llm_augmenter=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let config = match RunConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration '{}': {}", args.config, e);
            std::process::exit(1);
        }
    };

    let source = JsonFileSource::new(&config.input_collection_id);
    let mut sink = JsonFileSink::create(&args.output)?;

    let augmenter = match Augmenter::new(config) {
        Ok(augmenter) => augmenter,
        Err(e) => {
            eprintln!("run failed: {}", e);
            std::process::exit(1);
        }
    };

    match augmenter.run(&source, &mut sink).await {
        Ok(summary) => {
            println!(
                "processed {} items, skipped {} (output: {})",
                summary.processed, summary.skipped, args.output
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("run failed: {}", e);
            eprintln!("run failed: {}", e);
            std::process::exit(1);
        }
    }
}
