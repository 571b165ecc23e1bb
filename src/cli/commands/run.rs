use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Output;
use crate::config::SeedpoolConfig;
use crate::dispatch::{
    ConcurrencyController, DispatchScheduler, RunSummary, Summary, SystemClock, format_time,
};
use crate::process::{Invocation, ProcessLauncher};
use crate::render::{LogRenderer, Renderer, TerminalRenderer};
use crate::scaling::{BenchmarkRunner, ScalingProfile, calibration};
use crate::work::{WorkQueue, load_seeds};

#[derive(Args)]
pub struct RunArgs {
    /// Name of the route to optimize
    #[arg(value_name = "ROUTE")]
    pub route: String,

    /// Directory for per-seed outputs, discarded if not provided
    #[arg(long, value_name = "DIRECTORY")]
    pub output_dir: Option<PathBuf>,

    /// Seeds to process, 0 to 255 if not provided
    #[arg(long, value_name = "FILENAME")]
    pub seed_list: Option<PathBuf>,

    /// Maximum number of steps per segment
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Maximum number of segments at which to allow extra steps
    #[arg(long)]
    pub max_segments: Option<u32>,

    /// Use a persistent on-disk cache
    #[arg(long)]
    pub persistent_cache: bool,

    /// Custom location for the persistent cache
    #[arg(long, value_name = "DIRECTORY")]
    pub cache_location: Option<PathBuf>,

    /// Target memory use in gigabytes (not a hard limit)
    #[arg(long, value_name = "GB")]
    pub max_memory: Option<f64>,

    /// Maximum number of simultaneous runs (0 = all cores)
    #[arg(long)]
    pub max_threads: Option<usize>,

    /// Concurrency timings file, generated if missing or too short
    #[arg(long, value_name = "FILENAME")]
    pub timings: Option<PathBuf>,

    /// Executable to run for each seed
    #[arg(long, value_name = "PATH")]
    pub program: Option<PathBuf>,

    /// Control loop interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub tick_ms: Option<u64>,

    /// Progress display
    #[arg(long, value_enum, default_value_t = DisplayMode::Auto)]
    pub display: DisplayMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DisplayMode {
    /// Terminal when stdout is a TTY, log lines otherwise
    Auto,
    Terminal,
    Log,
}

impl DisplayMode {
    fn resolve(self) -> Self {
        match self {
            DisplayMode::Auto if atty::is(atty::Stream::Stdout) => DisplayMode::Terminal,
            DisplayMode::Auto => DisplayMode::Log,
            other => other,
        }
    }

    fn renderer(self) -> Box<dyn Renderer> {
        match self {
            DisplayMode::Terminal => Box::new(TerminalRenderer::stdout()),
            _ => Box::new(LogRenderer::stdout()),
        }
    }
}

impl RunArgs {
    /// Flags shaped like the config file; unset flags become nulls and are dropped
    fn overrides(&self) -> serde_json::Value {
        json!({
            "job": {
                "route": self.route,
                "output_dir": self.output_dir,
                "seed_list": self.seed_list,
                "max_steps": self.max_steps,
                "max_segments": self.max_segments,
                "persistent_cache": self.persistent_cache.then_some(true),
                "cache_location": self.cache_location,
            },
            "dispatch": {
                "max_memory_gb": self.max_memory,
                "max_threads": self.max_threads,
                "tick_interval_ms": self.tick_ms,
                "timings": self.timings,
            },
            "executable": {
                "program": self.program,
            },
        })
    }
}

async fn scaling_profile(
    config: &SeedpoolConfig,
    max_threads: usize,
    output: &Output,
) -> Result<ScalingProfile> {
    let Some(path) = &config.dispatch.timings else {
        output.verbose("No timings file, using the fallback scaling curve");
        return Ok(ScalingProfile::fallback());
    };

    let runner = BenchmarkRunner::from_config(config);
    let profile = calibration::load_or_calibrate(path, max_threads, &runner).await?;
    output.verbose(&format!("Using calibrated timings from {}", path.display()));
    Ok(profile)
}

pub async fn execute(args: RunArgs, custom_config: Option<&Path>, output: &Output) -> Result<()> {
    let display = args.display.resolve();
    let config = SeedpoolConfig::load(custom_config, Some(args.overrides()))?;

    // Everything that can fail does so before the first dispatch
    let invocation = Invocation::from_config(&config)?;
    let seeds = load_seeds(config.job.seed_list.as_deref())?;
    invocation.prepare_output_dir()?;
    invocation.preflight()?;

    let max_threads = config.dispatch.resolved_max_threads();
    let profile = scaling_profile(&config, max_threads, output).await?;

    tracing::info!(
        "Dispatching {} seeds of '{}' (budget {:.2}GB, max {} threads)",
        seeds.len(),
        config.route()?,
        config.dispatch.max_memory_gb,
        max_threads
    );

    let mut scheduler = DispatchScheduler::new(
        ProcessLauncher::new(invocation),
        SystemClock,
        WorkQueue::new(seeds),
        profile,
        ConcurrencyController::new(config.dispatch.max_memory_gb, max_threads),
        Duration::from_millis(config.dispatch.tick_interval_ms),
    );

    let summary = tokio::task::spawn_blocking(move || {
        let mut renderer = display.renderer();
        scheduler.run(renderer.as_mut())
    })
    .await
    .context("Dispatcher thread panicked")??;

    // The log display has already streamed every entry
    if display == DisplayMode::Terminal {
        for entry in &summary.log {
            output.line(entry);
        }
    }

    print_summary(&summary, output);
    Ok(())
}

fn describe(summary: Option<Summary>, fmt: impl Fn(f64) -> String) -> String {
    match summary {
        Some(s) => format!("{} / {} / {}", fmt(s.min), fmt(s.mean), fmt(s.max)),
        None => "-".to_string(),
    }
}

fn print_summary(summary: &RunSummary, output: &Output) {
    output.header("Run Summary");
    output.key_value("Seeds:", &summary.dispatched.to_string(), true);
    output.key_value("Measured:", &summary.measured.to_string(), false);
    if summary.unmeasured > 0 {
        output.warning(&format!(
            "{} run(s) produced no resource report",
            summary.unmeasured
        ));
    }
    output.key_value("Time:", &describe(summary.durations, format_time), false);
    output.key_value(
        "Memory:",
        &describe(summary.memory, |gb| format!("{gb:.3}GB")),
        false,
    );
    output.key_value("Wall time:", &format_time(summary.wall_time.as_secs_f64()), false);
    output.success("All seeds complete");
}
