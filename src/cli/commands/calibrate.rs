use anyhow::Result;
use clap::Args;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::cli::Output;
use crate::config::SeedpoolConfig;
use crate::scaling::{BenchmarkRunner, calibration};

#[derive(Args)]
pub struct CalibrateArgs {
    /// File to write the timings table to (defaults to `dispatch.timings`)
    #[arg(long, value_name = "FILENAME")]
    pub timings: Option<PathBuf>,

    /// Highest concurrency level to measure (0 = all cores)
    #[arg(long)]
    pub max_threads: Option<usize>,

    /// Executable to benchmark
    #[arg(long, value_name = "PATH")]
    pub program: Option<PathBuf>,
}

/// Always measures, even when an adequate table already exists
pub async fn execute(
    args: CalibrateArgs,
    custom_config: Option<&Path>,
    output: &Output,
) -> Result<()> {
    let overrides = json!({
        "dispatch": {
            "timings": args.timings,
            "max_threads": args.max_threads,
        },
        "executable": {
            "program": args.program,
        },
    });
    let config = SeedpoolConfig::load(custom_config, Some(overrides))?;

    let Some(path) = config.dispatch.timings.clone() else {
        anyhow::bail!("No timings file given; pass --timings or set dispatch.timings");
    };

    let runner = BenchmarkRunner::from_config(&config);
    runner.preflight()?;

    let max_threads = config.dispatch.resolved_max_threads();
    output.info(&format!(
        "Benchmarking '{}' seed {} at 1..={max_threads} simultaneous runs",
        config.calibration.route, config.calibration.seed
    ));

    let result = calibration::calibrate(&runner, max_threads).await?;
    calibration::save_table(&path, &result.multipliers())?;

    output.header("Timings");
    output.table_row(&["threads".to_string(), "mean".to_string(), "multiplier".to_string()]);
    for level in &result.levels {
        output.table_row(&[
            level.concurrency.to_string(),
            format!("{:.3}s", level.mean_secs),
            format!("{:.3}x", level.multiplier),
        ]);
    }
    output.blank_line();
    output.success(&format!("Wrote {}", path.display()));

    Ok(())
}
