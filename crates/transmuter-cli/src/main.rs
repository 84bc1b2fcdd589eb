//! Transmuter CLI
//!
//! Validates declarative definitions and runs them over JSON records.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Transmuter - declarative record mapping and aggregation
#[derive(Parser)]
#[command(name = "transmute")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a definition compiles against its target schema
    Validate {
        /// Definition file
        definition: PathBuf,
    },

    /// Transform records with a definition
    Run {
        /// Definition file
        definition: PathBuf,

        /// Input records (JSON array or JSON lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for JSON lines (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON object overriding the definition's context
        #[arg(short, long)]
        context: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for records
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Validate { definition } => {
            commands::validate::run(&definition)?;
        }
        Commands::Run {
            definition,
            input,
            output,
            context,
        } => {
            commands::run::run(&definition, &input, output.as_deref(), context.as_deref())?;
        }
    }

    Ok(())
}
