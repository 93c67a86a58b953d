//! Run with: cargo run -p kansoku-runtime --example detect -- [--config PATH] [--list]
//!
//! Detects running media players and prints what they are playing as JSON.

use std::path::PathBuf;

use clap::Parser;
use kansoku_runtime::{DetectOptions, Engine};

#[derive(Parser)]
#[command(about = "Detect running media players")]
struct Args {
    /// Player definitions file. The bundled definitions are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra definitions overlaid on the base set.
    #[arg(long = "override")]
    overrides: Vec<PathBuf>,

    /// Engine options (TOML).
    #[arg(long)]
    options: Option<PathBuf>,

    /// Print the configured player names instead of detecting.
    #[arg(long)]
    list: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kansoku=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut engine = match args.config {
        Some(path) => Engine::with_config(path),
        None => Engine::new(),
    };
    for path in args.overrides {
        engine = engine.with_overrides(path);
    }
    if let Some(path) = args.options {
        engine = engine.with_options(DetectOptions::load(&path)?);
    }

    if args.list {
        println!("{}", serde_json::to_string_pretty(&engine.player_list()?)?);
        return Ok(());
    }

    let results = engine.media_results()?;
    if results.is_empty() {
        eprintln!("No media players detected.");
    }
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
