//! CLI entry point for cedar

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cedar")]
#[command(version)]
#[command(about = "Build a static site from markdown, templates and a route table", long_about = None)]
struct Cli {
    /// Path to the site configuration (.toml, .yaml, .yml or .json)
    #[arg(short, long, default_value = "cedar.toml")]
    config: PathBuf,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "cedar=debug,info"
    } else {
        "cedar=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cedar = cedar::Cedar::load(&cli.config)?;
    tracing::info!("Building site from {:?}", cli.config);

    let report = cedar.build()?;
    println!("{}", report);

    Ok(())
}
