//! # Riposte CLI Module
//!
//! This module implements the CLI interface for Riposte.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show corpus status
//! - `respond` - Answer one input
//! - `chat` - Answer lines from stdin, one conversation
//! - `record` - Record a statement, optionally as a reply
//! - `train` - Record conversations from a text file
//! - `forget` - Remove a statement and every link to it
//! - `export` - Export corpus to a snapshot file
//! - `import` - Import corpus from a snapshot file
//! - `init` - Initialize new database

mod commands;

use clap::{Parser, Subcommand};
use riposte_core::RiposteError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Riposte - Conversational Response Server
///
/// Answers an input with a reply recorded for the closest known statement.
#[derive(Parser, Debug)]
#[command(name = "riposte")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the corpus database
    #[arg(short = 'D', long, global = true, default_value = "riposte.db")]
    pub database: PathBuf,

    /// Storage backend: "file" (snapshot file) or "redb" (ACID database)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Responder configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show corpus status
    Status,

    /// Answer one input statement
    Respond {
        /// Input text
        text: String,

        /// Do not record the input, whatever the configuration says
        #[arg(long)]
        no_learn: bool,

        /// Seed for reproducible random choices
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Hold a conversation over stdin, one input per line
    Chat {
        /// Do not record inputs, whatever the configuration says
        #[arg(long)]
        no_learn: bool,

        /// Seed for reproducible random choices
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Record a statement
    Record {
        /// Statement text
        text: String,

        /// Record it as a reply to this statement
        #[arg(short = 'r', long)]
        in_response_to: Option<String>,
    },

    /// Record conversations from a text file
    ///
    /// One statement per line; each line replies to the line above it.
    /// A blank line starts a new conversation; lines starting with '#' are
    /// skipped.
    Train {
        /// Path to the conversation file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Remove a statement and every link to it
    Forget {
        /// Statement text
        text: String,
    },

    /// Export corpus as a snapshot
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import corpus from a snapshot
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), RiposteError> {
    let backend = Backend::parse(&cli.backend)?;
    let json_mode = cli.json_mode;
    let db = cli.database.as_path();
    let config = cli.config.as_deref();

    if cli.verbose {
        tracing::info!(database = %db.display(), backend = %backend, "Using corpus");
    }

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(db, backend, config, &host, port).await,
        Some(Commands::Status) => cmd_status(db, backend, json_mode),
        Some(Commands::Respond {
            text,
            no_learn,
            seed,
        }) => cmd_respond(db, backend, config, json_mode, &text, no_learn, seed),
        Some(Commands::Chat { no_learn, seed }) => {
            cmd_chat(db, backend, config, json_mode, no_learn, seed)
        }
        Some(Commands::Record {
            text,
            in_response_to,
        }) => cmd_record(db, backend, json_mode, &text, in_response_to.as_deref()),
        Some(Commands::Train { file }) => cmd_train(db, backend, json_mode, &file),
        Some(Commands::Forget { text }) => cmd_forget(db, backend, json_mode, &text),
        Some(Commands::Export { output }) => cmd_export(db, backend, &output),
        Some(Commands::Import { input }) => cmd_import(db, backend, &input),
        Some(Commands::Init { force }) => cmd_init(db, backend, force),
        None => {
            // No subcommand - show status by default
            cmd_status(db, backend, json_mode)
        }
    }
}
