//! # Riposte - Conversational Response Server
//!
//! The main binary for the Riposte response selection engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for corpus maintenance and one-shot answers
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/riposte (THE BINARY)         │
//! │                                              │
//! │   ┌─────────────┐        ┌─────────────┐     │
//! │   │    CLI      │        │  HTTP API   │     │
//! │   │   (clap)    │        │   (axum)    │     │
//! │   └──────┬──────┘        └──────┬──────┘     │
//! │          └───────────┬──────────┘            │
//! │                      ▼                       │
//! │              ┌───────────────┐               │
//! │              │ riposte-core  │               │
//! │              │  (THE LOGIC)  │               │
//! │              └───────────────┘               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! riposte server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! riposte train -f dialogs.txt
//! riposte respond "hello there"
//! riposte status
//! ```

use clap::Parser;
use riposte::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // RIPOSTE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("RIPOSTE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "riposte=info,riposte_core=warn,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Riposte startup banner.
fn print_banner() {
    println!(
        r#"
  ┬─┐┬┌─┐┌─┐┌─┐┌┬┐┌─┐
  ├┬┘│├─┘│ │└─┐ │ ├┤
  ┴└─┴┴  └─┘└─┘ ┴ └─┘

  Conversational Response Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
