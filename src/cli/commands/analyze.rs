use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::analysis::{checkvars, range, rate, twins, varfrequency};
use crate::cli::Output;
use crate::work::Seed;

#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(subcommand)]
    pub command: AnalyzeCommand,
}

#[derive(Subcommand)]
pub enum AnalyzeCommand {
    /// Rank every window of consecutive seeds by mean frame count
    Range {
        /// Directory of per-seed outputs
        directory: PathBuf,
        /// Number of consecutive seeds per window
        size: usize,
    },
    /// Compare one seed's per-group steps and times against all seeds
    Rate {
        directory: PathBuf,
        seed: Seed,
    },
    /// List neighbouring seeds whose step listings differ
    Twins { directory: PathBuf },
    /// Find route variables reused across choices
    Checkvars { filename: PathBuf },
    /// Count how often each route variable is set across outputs
    Varfrequency {
        filename: PathBuf,
        directory: PathBuf,
    },
}

pub async fn execute(args: AnalyzeArgs, output: &Output) -> Result<()> {
    match args.command {
        AnalyzeCommand::Range { directory, size } => {
            for window in range::run(&directory, size)? {
                output.line(&window.to_string());
            }
        }
        AnalyzeCommand::Rate { directory, seed } => {
            for line in rate::run(&directory, seed)?.lines() {
                output.line(&line);
            }
        }
        AnalyzeCommand::Twins { directory } => {
            for line in twins::run(&directory)?.lines() {
                output.line(&line);
            }
        }
        AnalyzeCommand::Checkvars { filename } => {
            let report = checkvars::run(&filename)?;
            if report.is_clean() {
                output.success("No reused variables");
            }
            for line in report.lines() {
                output.line(&line);
            }
        }
        AnalyzeCommand::Varfrequency {
            filename,
            directory,
        } => {
            for (var, count) in varfrequency::run(&filename, &directory)? {
                output.line(&format!("{var} {count}"));
            }
        }
    }

    Ok(())
}
