//! Command-line interface for seedpool
//!
//! Global flags select the working directory, verbosity and an explicit
//! config file; each subcommand lives in [`commands`].

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;
mod output;

pub use output::Output;

use commands::{analyze, calibrate, config, run, version};

#[derive(Parser)]
#[command(
    name = "seedpool",
    version = env!("CARGO_PKG_VERSION"),
    about = "Adaptive parallel dispatcher for per-seed route optimization runs",
    long_about = "seedpool runs one child computation per seed, steering concurrency \
                  towards a memory budget and pacing dispatches from observed run times."
)]
pub struct Cli {
    /// Run as if started in <DIR> instead of current working directory
    #[arg(short = 'C', long = "directory", global = true)]
    pub directory: Option<PathBuf>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dispatch every seed of a route under the memory budget
    Run(run::RunArgs),
    /// Regenerate the concurrency timings table
    Calibrate(calibrate::CalibrateArgs),
    /// Inspect a directory of per-seed outputs
    Analyze(analyze::AnalyzeArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// Show version information
    Version,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)
                .with_context(|| format!("Failed to change directory to {}", dir.display()))?;
        }

        setup_logging(self.verbose, self.quiet);

        let output = Output::new(self.verbose > 0, self.quiet);
        let custom_config = self.config.as_deref();

        match self.command {
            Some(Commands::Run(args)) => run::execute(args, custom_config, &output).await,
            Some(Commands::Calibrate(args)) => {
                calibrate::execute(args, custom_config, &output).await
            }
            Some(Commands::Analyze(args)) => analyze::execute(args, &output).await,
            Some(Commands::Config(args)) => config::execute(args, custom_config, &output).await,
            Some(Commands::Version) => version::execute(&output).await,
            None => {
                Cli::command().print_help()?;
                Ok(())
            }
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` takes precedence over `-v`
fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        });

    // A second install (tests driving `Cli` repeatedly) is not an error
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
