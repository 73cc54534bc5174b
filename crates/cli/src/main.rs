//! Lectern CLI — the main entry point.
//!
//! Commands:
//! - `ask`     — One-shot course-scoped question answering
//! - `gateway` — Start the HTTP chat server
//! - `catalog` — List the configured courses and their namespaces

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "lectern",
    about = "Lectern — course-scoped question answering over class materials",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "lectern.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question against a course's materials
    Ask {
        /// Course label (e.g. "INFO 2950")
        #[arg(short = 'C', long)]
        course: String,

        /// The question to answer
        question: String,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the configured courses and their namespaces
    Catalog,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Ask { course, question } => commands::ask::run(&cli.config, &course, &question).await?,
        Commands::Gateway { port } => commands::gateway::run(&cli.config, port).await?,
        Commands::Catalog => commands::catalog::run(&cli.config).await?,
    }

    Ok(())
}
