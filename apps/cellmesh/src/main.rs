//! # cellmesh
//!
//! Command-line front end for the cellmesh kernel.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │          apps/cellmesh (THE BINARY)          │
//! │                                              │
//! │  ┌─────────────┐        ┌────────────────┐   │
//! │  │    CLI      │        │  Config/Logs   │   │
//! │  │   (clap)    │        │ (toml/tracing) │   │
//! │  └──────┬──────┘        └───────┬────────┘   │
//! │         └───────────┬───────────┘            │
//! │                     ▼                        │
//! │             ┌───────────────┐                │
//! │             │ cellmesh-core │                │
//! │             │  (THE KERNEL) │                │
//! │             └───────────────┘                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! cellmesh info box.json
//! cellmesh validate box.json
//! cellmesh format box.json -o box.pretty.json --pretty
//! cellmesh --json query box.json cell-neighbors 0
//! ```

use cellmesh::cli::{self, Cli};
use cellmesh::config::{Config, LOG_FORMAT_ENV, LogConfig, LogFormat};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = Cli::parse();

    // A broken config file still gets logged through a default subscriber.
    let (config, config_error) = match Config::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let config =
        config.with_log_format_override(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

    init_tracing(&config.log);

    if let Some(e) = config_error {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = cli::execute(cli, &config) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable. `RUST_LOG` takes precedence over the
/// configured filter.
fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log.filter.as_str().into());

    match log.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
