use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use super::{SEED_COUNT, read_seed_outputs, require_dir};
use crate::work::Seed;

/// Scale applied to mean frame counts for display
pub const FRAME_SCALE: f64 = 655_171.0 / 39_375_000_000.0;

/// Frame count from a `FRAMES\t<n>` line; the last such line wins
pub fn read_frames(content: &str) -> Option<u64> {
    content
        .lines()
        .filter(|line| line.starts_with("FRAMES"))
        .filter_map(|line| line.trim().split('\t').nth(1)?.trim().parse().ok())
        .last()
}

/// Consecutive seeds `start..start + size`, wrapping after the last seed
#[derive(Debug, Clone, PartialEq)]
pub struct RangeWindow {
    pub start: Seed,
    pub end: Seed,
    pub mean_frames: f64,
}

impl RangeWindow {
    pub fn scaled(&self) -> f64 {
        self.mean_frames * FRAME_SCALE
    }
}

impl std::fmt::Display for RangeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:3} - {:3}: {:12.3}", self.start, self.end, self.scaled())
    }
}

/// Every window of `size` seeds, best (lowest mean) first
///
/// Seeds without a frame count are left out of a window's mean; windows with
/// no counted seed are dropped.
pub fn best_ranges(frames: &BTreeMap<Seed, u64>, size: usize) -> Vec<RangeWindow> {
    let mut windows = Vec::new();

    for start in 0..SEED_COUNT {
        let counted: Vec<f64> = (0..size as Seed)
            .filter_map(|offset| frames.get(&((start + offset) % SEED_COUNT)))
            .map(|&n| n as f64)
            .collect();

        if counted.is_empty() {
            continue;
        }

        windows.push(RangeWindow {
            start,
            end: (start + size as Seed - 1) % SEED_COUNT,
            mean_frames: counted.iter().sum::<f64>() / counted.len() as f64,
        });
    }

    windows.sort_by(|a, b| a.mean_frames.total_cmp(&b.mean_frames));
    windows
}

pub fn run(dir: &Path, size: usize) -> Result<Vec<RangeWindow>> {
    require_dir(dir)?;
    if size == 0 || size > SEED_COUNT as usize {
        anyhow::bail!("Range size must be between 1 and {SEED_COUNT}, got {size}");
    }

    let frames: BTreeMap<Seed, u64> = read_seed_outputs(dir)
        .into_iter()
        .filter_map(|output| Some((output.seed, read_frames(output.content.as_deref()?)?)))
        .collect();

    if frames.is_empty() {
        anyhow::bail!("No FRAMES lines found in {}", dir.display());
    }

    Ok(best_ranges(&frames, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::seed_dir;

    #[test]
    fn test_read_frames() {
        assert_eq!(read_frames("PATH\tA\nFRAMES\t1200\n"), Some(1200));
        assert_eq!(read_frames("FRAMES\t10\nFRAMES\t20"), Some(20));
        assert_eq!(read_frames("nothing here"), None);
    }

    #[test]
    fn test_windows_wrap_and_sort() {
        let frames: BTreeMap<Seed, u64> = (0..SEED_COUNT).map(|s| (s, 1000 + s as u64)).collect();
        let windows = best_ranges(&frames, 4);

        assert_eq!(windows.len(), 256);
        assert_eq!(windows[0].start, 0);
        assert_eq!(windows[0].end, 3);
        assert_eq!(windows[0].mean_frames, 1001.5);

        // 254, 255, 0, 1 wraps around
        let wrapped = windows.iter().find(|w| w.start == 254).unwrap();
        assert_eq!(wrapped.end, 1);
        assert_eq!(wrapped.mean_frames, (1254.0 + 1255.0 + 1000.0 + 1001.0) / 4.0);

        assert!(windows.windows(2).all(|w| w[0].mean_frames <= w[1].mean_frames));
    }

    #[test]
    fn test_display_format() {
        let window = RangeWindow {
            start: 5,
            end: 12,
            mean_frames: 39_375_000_000.0 / 655_171.0,
        };
        assert_eq!(window.to_string(), "  5 -  12:        1.000");
    }

    #[test]
    fn test_run_skips_missing_seeds() {
        let dir = seed_dir(&[(0, "FRAMES\t100\n"), (1, "FRAMES\t300\n"), (2, "PATH\tx\n")]);
        let windows = run(dir.path(), 2).unwrap();

        // Windows touching 0 or 1 only
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start, 255);
        assert_eq!(windows[0].mean_frames, 100.0);
        assert_eq!(windows[1].start, 0);
        assert_eq!(windows[1].mean_frames, 200.0);
    }

    #[test]
    fn test_run_rejects_bad_size() {
        let dir = seed_dir(&[(0, "FRAMES\t100\n")]);
        assert!(run(dir.path(), 0).is_err());
        assert!(run(dir.path(), 257).is_err());
    }
}
