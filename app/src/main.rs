//! Lunary - Main application entry point

use clap::Parser;
use lunary_core::init;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod engine;
mod platform;
mod presentation;

use app::LunaryApp;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Run in demo mode with a sample corpus
    #[arg(long)]
    demo: bool,

    /// Configuration directory
    #[arg(long)]
    config_dir: Option<String>,

    /// Data directory
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        "debug".to_string()
    } else {
        std::env::var("LUNARY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    };
    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Lunary v{}", lunary_core::VERSION);

    // Set environment variables if provided
    if let Some(config_dir) = args.config_dir {
        std::env::set_var("LUNARY_CONFIG_DIR", config_dir);
    }
    if let Some(data_dir) = args.data_dir {
        std::env::set_var("LUNARY_DATA_DIR", data_dir);
    }

    // Initialize core library
    if let Err(e) = init() {
        error!("Failed to initialize core library: {}", e);
        return Err(e.into());
    }

    let app = LunaryApp::new(args.demo).await?;
    app.run().await?;

    Ok(())
}
