//! Offline calibration of the scaling profile
//!
//! For each level `i = 1..=max_threads` the benchmark is launched `i` times
//! concurrently and the mean elapsed time is normalised by the single-run time.
//! The resulting table is persisted as a JSON array where index 0 is
//! concurrency 1.

use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::task::JoinSet;

use super::ScalingProfile;
use crate::config::SeedpoolConfig;

const BENCHMARK_FORMAT: &str = "BENCHMARK %e";
const BENCHMARK_PREFIX: &str = "BENCHMARK";

/// One measured concurrency level
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationLevel {
    pub concurrency: usize,
    pub mean_secs: f64,
    pub multiplier: f64,
}

/// Result of a calibration run
#[derive(Debug, Clone, Default)]
pub struct Calibration {
    pub levels: Vec<CalibrationLevel>,
}

impl Calibration {
    /// Normalise raw per-level samples; `batches[0]` must hold the single-run level
    pub fn from_batches(batches: &[Vec<f64>]) -> Result<Self> {
        let base = batches
            .first()
            .and_then(|samples| samples.first())
            .copied()
            .context("Calibration produced no single-run sample")?;

        if !(base > 0.0) {
            anyhow::bail!("Single-run benchmark time must be positive, got {base}");
        }

        let mut levels = Vec::with_capacity(batches.len());
        for (index, samples) in batches.iter().enumerate() {
            if samples.is_empty() {
                anyhow::bail!("No benchmark samples at concurrency {}", index + 1);
            }
            let mean_secs = samples.iter().sum::<f64>() / samples.len() as f64;
            levels.push(CalibrationLevel {
                concurrency: index + 1,
                mean_secs,
                multiplier: mean_secs / base,
            });
        }

        Ok(Self { levels })
    }

    pub fn multipliers(&self) -> Vec<f64> {
        self.levels.iter().map(|level| level.multiplier).collect()
    }

    pub fn profile(&self) -> Result<ScalingProfile> {
        ScalingProfile::calibrated(self.multipliers())
    }
}

/// Something that can run `count` simultaneous benchmarks and report their elapsed seconds
pub trait BenchmarkBatch {
    fn run_batch(&self, count: usize) -> impl Future<Output = Result<Vec<f64>>> + Send;
}

/// Runs the real benchmark under the time wrapper
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    time_wrapper: PathBuf,
    program: PathBuf,
    route: String,
    seed: u32,
    max_steps: u32,
}

impl BenchmarkRunner {
    pub fn from_config(config: &SeedpoolConfig) -> Self {
        Self {
            time_wrapper: config.executable.time_wrapper.clone(),
            program: config.executable.program.clone(),
            route: config.calibration.route.clone(),
            seed: config.calibration.seed,
            max_steps: config.calibration.max_steps,
        }
    }

    /// Resolve the wrapper and the benchmarked program
    pub fn preflight(&self) -> Result<()> {
        which::which(&self.time_wrapper)
            .with_context(|| format!("Time wrapper not found: {}", self.time_wrapper.display()))?;
        which::which(&self.program)
            .with_context(|| format!("Program not found: {}", self.program.display()))?;
        Ok(())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.time_wrapper);
        cmd.arg("-f")
            .arg(BENCHMARK_FORMAT)
            .arg(&self.program)
            .arg("-r")
            .arg(&self.route)
            .arg("-s")
            .arg(self.seed.to_string())
            .arg("-m")
            .arg(self.max_steps.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl BenchmarkBatch for BenchmarkRunner {
    async fn run_batch(&self, count: usize) -> Result<Vec<f64>> {
        let mut set = JoinSet::new();

        for _ in 0..count {
            let child = self
                .command()
                .spawn()
                .with_context(|| format!("Failed to launch benchmark {}", self.program.display()))?;
            set.spawn(child.wait_with_output());
        }

        let mut samples = Vec::with_capacity(count);
        while let Some(joined) = set.join_next().await {
            let output = joined.context("Benchmark task panicked")??;
            let stderr = String::from_utf8_lossy(&output.stderr);
            samples.extend(parse_benchmark_seconds(&stderr));
        }

        Ok(samples)
    }
}

/// Elapsed seconds from every `BENCHMARK <secs>` line
pub fn parse_benchmark_seconds(stderr: &str) -> Vec<f64> {
    stderr
        .lines()
        .filter(|line| line.starts_with(BENCHMARK_PREFIX))
        .filter_map(|line| line.trim().split(' ').nth(1))
        .filter_map(|value| value.parse::<f64>().ok())
        .collect()
}

/// Measure levels `1..=max_threads`
pub async fn calibrate<B: BenchmarkBatch>(runner: &B, max_threads: usize) -> Result<Calibration> {
    let mut batches = Vec::with_capacity(max_threads);

    for concurrency in 1..=max_threads.max(1) {
        tracing::info!("Testing {concurrency} simultaneous run(s)...");
        let samples = runner.run_batch(concurrency).await?;
        if samples.is_empty() {
            anyhow::bail!("Benchmark produced no timing at concurrency {concurrency}");
        }
        batches.push(samples);
    }

    let calibration = Calibration::from_batches(&batches)?;
    for level in &calibration.levels {
        tracing::info!(
            "Concurrency {}: {:.3}s, {:.3}x",
            level.concurrency,
            level.mean_secs,
            level.multiplier
        );
    }

    Ok(calibration)
}

/// Read a persisted table, `None` when the file does not exist
pub fn load_table(path: &Path) -> Result<Option<Vec<f64>>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read timings file: {}", path.display()))?;
    let table: Vec<f64> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse timings file: {}", path.display()))?;

    Ok(Some(table))
}

/// Persist a table, overwriting any previous file
pub fn save_table(path: &Path, table: &[f64]) -> Result<()> {
    let content = serde_json::to_string(table).context("Failed to serialize timings")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write timings file: {}", path.display()))?;
    Ok(())
}

/// Use the stored table when it covers `max_threads`, otherwise calibrate and overwrite it
pub async fn load_or_calibrate<B: BenchmarkBatch>(
    path: &Path,
    max_threads: usize,
    runner: &B,
) -> Result<ScalingProfile> {
    // An unreadable table is regenerated rather than trusted
    let stored = load_table(path).unwrap_or_else(|e| {
        tracing::warn!("Ignoring timings file: {e:#}");
        None
    });

    if let Some(table) = stored.filter(|table| table.len() >= max_threads && !table.is_empty()) {
        tracing::debug!("Loaded {} calibrated levels from {}", table.len(), path.display());
        return ScalingProfile::calibrated(table);
    }

    tracing::info!("Generating timings for up to {max_threads} simultaneous runs");
    let calibration = calibrate(runner, max_threads).await?;
    save_table(path, &calibration.multipliers())?;
    calibration.profile()
}
