//! Child invocation contract
//!
//! ```text
//! <time_wrapper> -o <report> -f <format> <program> -r <route> -s <seed> -m <max_steps>
//!     [-p -n <max_segments>] [-c persistent] [-l <cache_location>]
//! ```
//!
//! The child's stdout is the per-seed output file consumed by the analysis
//! tools, named `<seed:03>.txt` inside the output directory.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::report::REPORT_FORMAT;
use crate::config::SeedpoolConfig;
use crate::work::Seed;

/// Extension of per-seed output files
pub const OUTPUT_EXTENSION: &str = "txt";

/// `NNN.txt` for a seed
pub fn output_file_name(seed: Seed) -> String {
    format!("{seed:03}.{OUTPUT_EXTENSION}")
}

/// Everything needed to start the child for any seed
#[derive(Debug, Clone)]
pub struct Invocation {
    time_wrapper: PathBuf,
    program: PathBuf,
    route: String,
    max_steps: u32,
    max_segments: Option<u32>,
    persistent_cache: bool,
    cache_location: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn from_config(config: &SeedpoolConfig) -> Result<Self> {
        Ok(Self {
            time_wrapper: config.executable.time_wrapper.clone(),
            program: config.executable.program.clone(),
            route: config.route()?.to_string(),
            max_steps: config.job.max_steps,
            max_segments: config.job.max_segments,
            persistent_cache: config.job.persistent_cache,
            cache_location: config.job.cache_location.clone(),
            output_dir: config.job.output_dir.clone(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn time_wrapper(&self) -> &Path {
        &self.time_wrapper
    }

    /// Destination of the child's stdout, `None` when output is discarded
    pub fn output_path(&self, seed: Seed) -> Option<PathBuf> {
        self.output_dir
            .as_ref()
            .map(|dir| dir.join(output_file_name(seed)))
    }

    /// Program arguments for a seed, without the wrapper
    pub fn program_args(&self, seed: Seed) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-r".into(),
            self.route.clone().into(),
            "-s".into(),
            seed.to_string().into(),
            "-m".into(),
            self.max_steps.to_string().into(),
        ];

        if let Some(max_segments) = self.max_segments {
            args.extend(["-p".into(), "-n".into(), max_segments.to_string().into()]);
        }

        if self.persistent_cache {
            args.extend(["-c".into(), "persistent".into()]);
        }

        if let Some(location) = &self.cache_location {
            args.extend(["-l".into(), location.clone().into_os_string()]);
        }

        args
    }

    /// Wrapped command writing its resource report to `report_path`
    pub fn command(&self, seed: Seed, report_path: &Path) -> Command {
        let mut cmd = Command::new(&self.time_wrapper);
        cmd.arg("-o")
            .arg(report_path)
            .arg("-f")
            .arg(REPORT_FORMAT)
            .arg(&self.program)
            .args(self.program_args(seed));
        cmd
    }

    /// Resolve both executables before anything is dispatched
    pub fn preflight(&self) -> Result<()> {
        which::which(&self.time_wrapper).with_context(|| {
            format!("Time wrapper not found: {}", self.time_wrapper.display())
        })?;
        which::which(&self.program)
            .with_context(|| format!("Program not found: {}", self.program.display()))?;
        Ok(())
    }

    /// Create the output directory if one is configured
    pub fn prepare_output_dir(&self) -> Result<()> {
        if let Some(dir) = &self.output_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        }
        Ok(())
    }
}
