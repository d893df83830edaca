//! frontdoor: config-driven HTTP gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────────▶ frontend ──▶ router ──▶ first matching route
//!                        (listener)   (ordered)    │ match: headers, path
//!                                                  │ modify: headers, path
//!                                                  ▼
//!                                            middleware (proxy headers, log)
//!                                                  │
//!                                                  ▼
//!     Client Response                         backend
//!     ◀───────────────────────────────────── reverse_proxy | file_server | prometheus
//! ```

use std::path::PathBuf;

use clap::Parser;

use frontdoor::config::load_config;
use frontdoor::lifecycle::{wait_for_shutdown, Gateway, StartupError};
use frontdoor::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "frontdoor")]
#[command(about = "Config-driven HTTP gateway", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "frontdoor.toml")]
    config: PathBuf,

    /// Log level for this crate, unless RUST_LOG is set.
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, value_enum, default_value_t = logging::LogFormat::Text)]
    log_format: logging::LogFormat,

    /// Load the configuration, assemble every route and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "frontdoor starting");

    let config = load_config(&cli.config)?;
    tracing::info!(
        path = %cli.config.display(),
        frontends = config.frontends.len(),
        backends = config.backends.len(),
        "Configuration loaded"
    );

    let handle = metrics::install()?;
    let gateway = Gateway::build(&config, Some(&handle)).await?;

    if cli.check {
        tracing::info!("Configuration is valid");
        return Ok(());
    }

    gateway.run_until(wait_for_shutdown()).await?;
    Ok(())
}
