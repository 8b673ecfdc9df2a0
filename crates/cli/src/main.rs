//! AppleGym CLI - session migrations, backend checks and report export.
//!
//! # Usage
//!
//! ```bash
//! # Create the session store table
//! ag-cli migrate
//!
//! # Check that the AppleGym backend answers
//! ag-cli ping
//!
//! # Export the sales report for the last 30 days
//! ag-cli report export --format excel
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use applegym_storefront::reports::ExportFormat;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "ag-cli")]
#[command(author, version, about = "AppleGym CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session store table
    Migrate,
    /// Check connectivity to the AppleGym backend
    Ping,
    /// Sales reports
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
}

#[derive(Subcommand)]
enum ReportAction {
    /// Download a sales report as Excel or PDF
    Export {
        /// File format
        #[arg(short, long, value_enum, default_value_t = Format::Excel)]
        format: Format,

        /// Start date (YYYY-MM-DD); defaults to 30 days ago
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        to: Option<String>,

        /// Output path; defaults to `Reporte_AppleGym_<from>_<to>.<ext>`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Excel,
    Pdf,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Excel => Self::Excel,
            Format::Pdf => Self::Pdf,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Ping => commands::ping::run().await?,
        Commands::Report { action } => match action {
            ReportAction::Export {
                format,
                from,
                to,
                output,
            } => {
                commands::report::export(
                    format.into(),
                    from.as_deref(),
                    to.as_deref(),
                    output.as_deref(),
                )
                .await?;
            }
        },
    }
    Ok(())
}
