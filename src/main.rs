//! Controller binary: waits for the relay extension and serves it until
//! Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shot_uploader::{Config, JsonFileStore, Result, serve};

/// Capture the visible tab and upload it into a chat web app.
#[derive(Debug, Parser)]
#[command(name = "shot-uploader", version, about)]
struct Cli {
    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port the relay extension connects to.
    #[arg(long)]
    port: Option<u16>,

    /// Preference file.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "shot_uploader=debug"
    } else {
        "shot_uploader=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }
    if let Some(store) = &cli.store {
        config = config.with_store_path(store);
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = run(&cli).await {
        error!(error = %e, "Controller stopped");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let store_path = config.resolve_store_path()?;
    info!(path = %store_path.display(), "Using preference file");

    let store = Arc::new(JsonFileStore::new(store_path));
    tokio::select! {
        result = serve(Arc::new(config), store) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
