//! Configuration management for seedpool
//!
//! This module holds the typed configuration and its validation. Loading and
//! layering (embedded defaults, config files, environment, CLI flags) lives in
//! [`core`].

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod core;
pub mod overrides;
pub mod smart_load;

/// Main configuration structure for seedpool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeedpoolConfig {
    /// What each child computation runs
    #[serde(default)]
    pub job: JobConfig,

    /// Admission control and loop cadence
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// External executables
    #[serde(default)]
    pub executable: ExecutableConfig,

    /// Benchmark used to build the scaling profile
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

/// Per-seed job parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Route name passed to the child
    #[serde(default)]
    pub route: Option<String>,

    /// Directory receiving one `NNN.txt` per seed; output is discarded when unset
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Whitespace separated seed list, seeds 0..=255 when unset
    #[serde(default)]
    pub seed_list: Option<PathBuf>,

    /// Maximum number of steps per segment
    pub max_steps: u32,

    /// Maximum number of segments at which extra steps are allowed
    #[serde(default)]
    pub max_segments: Option<u32>,

    /// Use the child's persistent on-disk cache
    #[serde(default)]
    pub persistent_cache: bool,

    /// Custom location for the persistent cache
    #[serde(default)]
    pub cache_location: Option<PathBuf>,
}

/// Dispatch controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Target maximum memory in gigabytes (not a hard limit)
    pub max_memory_gb: f64,

    /// Maximum simultaneous children (0 = number of CPU cores)
    pub max_threads: usize,

    /// Sleep between control loop ticks
    pub tick_interval_ms: u64,

    /// Calibration table, created when missing or too short
    #[serde(default)]
    pub timings: Option<PathBuf>,
}

/// External program locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutableConfig {
    /// The optimizer executable
    pub program: PathBuf,

    /// GNU time compatible resource measurement wrapper
    pub time_wrapper: PathBuf,
}

/// Single-seed benchmark used by calibration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub route: String,
    pub seed: u32,
    pub max_steps: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            route: None,
            output_dir: None,
            seed_list: None,
            max_steps: 256,
            max_segments: None,
            persistent_cache: false,
            cache_location: None,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_memory_gb: 1.0,
            max_threads: 1,
            tick_interval_ms: 250,
            timings: None,
        }
    }
}

impl Default for ExecutableConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("build/rosa"),
            time_wrapper: PathBuf::from("/usr/bin/time"),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            route: "paladin".to_string(),
            seed: 0,
            max_steps: 64,
        }
    }
}

impl DispatchConfig {
    /// Configured concurrency ceiling with `0` resolved to the core count
    pub fn resolved_max_threads(&self) -> usize {
        if self.max_threads > 0 {
            self.max_threads
        } else {
            std::cmp::max(1, num_cpus::get())
        }
    }
}

impl SeedpoolConfig {
    /// Validate configuration shared by every command
    pub fn validate(&self) -> Result<()> {
        if !self.dispatch.max_memory_gb.is_finite() || self.dispatch.max_memory_gb < 0.0 {
            anyhow::bail!(
                "dispatch.max_memory_gb must be a non-negative number, got {}",
                self.dispatch.max_memory_gb
            );
        }

        if self.dispatch.tick_interval_ms == 0 {
            anyhow::bail!("dispatch.tick_interval_ms cannot be 0");
        }

        if self.job.max_steps == 0 {
            anyhow::bail!("job.max_steps cannot be 0");
        }

        if self.executable.program.as_os_str().is_empty() {
            anyhow::bail!("executable.program cannot be empty");
        }

        if self.executable.time_wrapper.as_os_str().is_empty() {
            anyhow::bail!("executable.time_wrapper cannot be empty");
        }

        Ok(())
    }

    /// Route name required by `run`
    pub fn route(&self) -> Result<&str> {
        match self.job.route.as_deref().map(str::trim) {
            Some(route) if !route.is_empty() => Ok(route),
            _ => anyhow::bail!("A route name is required (pass ROUTE or set job.route)"),
        }
    }
}

#[cfg(test)]
mod tests;
