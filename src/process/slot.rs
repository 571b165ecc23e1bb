use anyhow::{Context, Result};
use std::fs::File;
use std::process::{Child, Stdio};
use tempfile::{NamedTempFile, TempPath};

use super::report::{ResourceSample, parse_report};
use super::{Invocation, Job, Launcher};
use crate::work::Seed;

/// One running child computation and its private resource report
#[derive(Debug)]
pub struct ProcessSlot {
    seed: Seed,
    child: Child,
    /// Removed right after the single read
    report_path: Option<TempPath>,
    finalized: bool,
    sample: Option<ResourceSample>,
    raw_report: Option<String>,
}

impl ProcessSlot {
    /// Start the wrapped child for `seed`
    pub fn launch(seed: Seed, invocation: &Invocation) -> Result<Self> {
        let report_path = NamedTempFile::new()
            .context("Failed to create resource report file")?
            .into_temp_path();

        let stdout = match invocation.output_path(seed) {
            Some(path) => Stdio::from(
                File::create(&path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?,
            ),
            None => Stdio::null(),
        };

        let mut cmd = invocation.command(seed, &report_path);
        cmd.stdin(Stdio::null()).stdout(stdout).stderr(Stdio::null());
        tracing::debug!("Launching seed {seed}: {cmd:?}");

        let child = cmd.spawn().with_context(|| {
            format!(
                "Failed to launch {} for seed {seed}",
                invocation.time_wrapper().display()
            )
        })?;

        Ok(Self {
            seed,
            child,
            report_path: Some(report_path),
            finalized: false,
            sample: None,
            raw_report: None,
        })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    fn finalize(&mut self) {
        if let Some(path) = self.report_path.take() {
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    let data = text.trim();
                    match parse_report(data) {
                        Some(sample) => {
                            self.sample = Some(sample);
                            self.raw_report = Some(data.to_string());
                        }
                        None => tracing::warn!("Seed {}: unrecognised resource report", self.seed),
                    }
                }
                Err(e) => tracing::warn!("Seed {}: resource report unreadable: {e}", self.seed),
            }

            if let Err(e) = path.close() {
                tracing::warn!("Seed {}: failed to remove resource report: {e}", self.seed);
            }
        }

        self.finalized = true;
    }
}

impl Job for ProcessSlot {
    fn seed(&self) -> Seed {
        self.seed
    }

    fn poll_complete(&mut self) -> bool {
        if self.finalized {
            return true;
        }

        match self.child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    tracing::debug!("Seed {} exited with {status}", self.seed);
                }
                self.finalize();
                true
            }
            Ok(None) => false,
            Err(e) => {
                // Treated as finished: nothing more can be learned about this child
                tracing::warn!("Seed {}: try_wait failed: {e}", self.seed);
                self.finalize();
                true
            }
        }
    }

    fn sample(&self) -> Option<ResourceSample> {
        self.sample
    }

    fn raw_report(&self) -> Option<&str> {
        self.raw_report.as_deref()
    }
}

/// Launches [`ProcessSlot`]s from a shared invocation
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    invocation: Invocation,
}

impl ProcessLauncher {
    pub fn new(invocation: Invocation) -> Self {
        Self { invocation }
    }
}

impl Launcher for ProcessLauncher {
    type Job = ProcessSlot;

    fn launch(&mut self, seed: Seed) -> Result<ProcessSlot> {
        ProcessSlot::launch(seed, &self.invocation)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::SeedpoolConfig;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    /// Stand-in for the time wrapper: `-o FILE -f FMT PROGRAM ARGS...`
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn config_with(wrapper: PathBuf, output_dir: Option<PathBuf>) -> SeedpoolConfig {
        let mut config = SeedpoolConfig::default();
        config.job.route = Some("paladin".to_string());
        config.job.output_dir = output_dir;
        config.executable.time_wrapper = wrapper;
        config.executable.program = PathBuf::from("rosa");
        config
    }

    fn wait_for(slot: &mut ProcessSlot) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !slot.poll_complete() {
            assert!(Instant::now() < deadline, "child did not finish");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_slot_parses_report_once_and_removes_it() {
        let temp_dir = TempDir::new().unwrap();
        let out_dir = temp_dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();
        let wrapper = write_script(
            temp_dir.path(),
            "fake-time",
            r#"report="$2"
shift 4
echo "PATH	A000001 $*"
echo "1.00user 0.01system 2.50elapsed 99%CPU (0text+0data 262144max)k 0inputs+0outputs (0major+1minor)pagefaults 0swaps" > "$report""#,
        );

        let config = config_with(wrapper, Some(out_dir.clone()));
        let invocation = Invocation::from_config(&config).unwrap();
        let mut slot = ProcessSlot::launch(7, &invocation).unwrap();
        let report_path = slot.report_path.as_ref().unwrap().to_path_buf();

        wait_for(&mut slot);

        let sample = slot.sample().unwrap();
        assert_eq!(sample.duration_secs, 2.5);
        assert_eq!(sample.peak_memory_gb, 0.25);
        assert!(slot.raw_report().unwrap().contains("2.50elapsed"));
        assert!(!report_path.exists());

        // Later polls are no-ops
        assert!(slot.poll_complete());
        assert_eq!(slot.sample(), Some(sample));

        let output = std::fs::read_to_string(out_dir.join("007.txt")).unwrap();
        assert_eq!(output, "PATH\tA000001 rosa -r paladin -s 7 -m 256\n");
    }

    #[test]
    fn test_slot_without_report_still_completes() {
        let temp_dir = TempDir::new().unwrap();
        let wrapper = write_script(temp_dir.path(), "broken-time", "exit 3");

        let invocation = Invocation::from_config(&config_with(wrapper, None)).unwrap();
        let mut slot = ProcessSlot::launch(1, &invocation).unwrap();
        wait_for(&mut slot);

        assert_eq!(slot.seed(), 1);
        assert_eq!(slot.sample(), None);
        assert_eq!(slot.raw_report(), None);
    }

    #[test]
    fn test_launch_failure_is_an_error() {
        let invocation = Invocation::from_config(&config_with(
            PathBuf::from("/definitely/not/here/time"),
            None,
        ))
        .unwrap();
        let mut launcher = ProcessLauncher::new(invocation);
        assert!(launcher.launch(0).is_err());
    }
}
