//! Flowmap CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "flowmap")]
#[command(about = "Architecture graph diffing, endpoint extraction and complexity analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Threshold configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write the JSON result here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two graph snapshots
    Diff {
        /// Snapshot of the earlier state (omit for "nothing existed")
        #[arg(long)]
        before: Option<PathBuf>,

        /// Snapshot of the later state (omit for "everything was removed")
        #[arg(long)]
        after: Option<PathBuf>,
    },
    /// Extract the subgraph around one endpoint
    Extract {
        /// Graph snapshot
        graph: PathBuf,

        /// Request path, e.g. /api/v1/users/123
        endpoint: String,
    },
    /// Report connectivity, dependencies and cycles
    Analyze {
        /// Graph snapshot
        graph: PathBuf,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries results, so logs go to stderr
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "flowmap={log_level},flowmap_core={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Flowmap v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref())?;
    let output = cli.output.as_deref();

    match cli.command {
        Commands::Diff { before, after } => {
            commands::diff(&config, before.as_deref(), after.as_deref(), output)
        }
        Commands::Extract { graph, endpoint } => commands::extract(&graph, &endpoint, output),
        Commands::Analyze { graph } => commands::analyze(&config, &graph, output),
        Commands::Version => {
            println!("Flowmap v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
