//! # Causeway
//!
//! The command-line binary for the Causeway interchange layer.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │              apps/causeway (THE BINARY)            │
//! │                                                    │
//! │  ┌─────────────┐          ┌─────────────────────┐  │
//! │  │   CLI       │          │  Layered config     │  │
//! │  │  (clap)     │          │  (toml, env, flags) │  │
//! │  └──────┬──────┘          └──────────┬──────────┘  │
//! │         └───────────────┬────────────┘             │
//! │                         ▼                          │
//! │                 ┌───────────────┐                  │
//! │                 │ causeway-core │                  │
//! │                 │  (THE LOGIC)  │                  │
//! │                 └───────────────┘                  │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! causeway data import -i data.csv -o data.json
//! causeway graph convert -i pag.txt --from text --to matrix
//! causeway knowledge check -k prior.txt --data data.csv
//! causeway --json-mode config
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = causeway::cli::Cli::parse();

    // CAUSEWAY_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("CAUSEWAY_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "causeway=debug,causeway_core=debug"
    } else {
        "causeway=info,causeway_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr; stdout carries command output.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = causeway::cli::execute(cli) {
        tracing::error!("Error: {}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
