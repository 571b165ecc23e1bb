//! Offline utilities over a directory of per-seed output files
//!
//! Each seed's run writes `NNN.txt` (see [`output_file_name`]). These tools
//! only read those files; they never touch the dispatcher.

use rayon::prelude::*;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::process::invocation::output_file_name;
use crate::work::{DEFAULT_SEED_COUNT, Seed};

pub mod checkvars;
pub mod range;
pub mod rate;
pub mod twins;
pub mod varfrequency;

/// Seeds an output directory is expected to cover
pub const SEED_COUNT: Seed = DEFAULT_SEED_COUNT;

pub fn seed_file(dir: &Path, seed: Seed) -> PathBuf {
    dir.join(output_file_name(seed))
}

/// Contents of one seed's output file
#[derive(Debug, Clone)]
pub struct SeedOutput {
    pub seed: Seed,
    pub path: PathBuf,
    /// `None` when the file is missing or unreadable
    pub content: Option<String>,
}

/// Read every seed's output file in parallel, in seed order
pub fn read_seed_outputs(dir: &Path) -> Vec<SeedOutput> {
    (0..SEED_COUNT)
        .into_par_iter()
        .map(|seed| {
            let path = seed_file(dir, seed);
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => Some(content),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("{} does not exist", path.display());
                    None
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {e}", path.display());
                    None
                }
            };
            SeedOutput {
                seed,
                path,
                content,
            }
        })
        .collect()
}

/// Fail early when the directory itself is missing
pub fn require_dir(dir: &Path) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Output directory not found: {}", dir.display());
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Directory holding `NNN.txt` for each `(seed, content)` pair
    pub(crate) fn seed_dir(files: &[(Seed, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (seed, content) in files {
            fs::write(seed_file(temp_dir.path(), *seed), content).unwrap();
        }
        temp_dir
    }

    #[test]
    fn test_read_seed_outputs_in_seed_order() {
        let dir = seed_dir(&[(0, "zero"), (17, "seventeen")]);
        let outputs = read_seed_outputs(dir.path());

        assert_eq!(outputs.len(), SEED_COUNT as usize);
        assert!(outputs.iter().enumerate().all(|(i, o)| o.seed as usize == i));
        assert_eq!(outputs[0].content.as_deref(), Some("zero"));
        assert_eq!(outputs[17].content.as_deref(), Some("seventeen"));
        assert!(outputs[1].content.is_none());
        assert!(outputs[17].path.ends_with("017.txt"));
    }

    #[test]
    fn test_require_dir() {
        let dir = seed_dir(&[]);
        assert!(require_dir(dir.path()).is_ok());
        assert!(require_dir(&dir.path().join("nope")).is_err());
    }
}
