//! Progress display
//!
//! Rendering is a pure function from a [`ProgressSnapshot`] to a frame of
//! lines. Backends only decide where the frame goes.

use anyhow::Result;
use console::{StyledObject, style};

use crate::dispatch::{ProgressSnapshot, Summary, format_eta, format_time};

pub mod log;
pub mod terminal;

pub use log::LogRenderer;
pub use terminal::TerminalRenderer;

/// Grid cells per row
pub const GRID_COLUMNS: usize = 32;

/// Consumes one snapshot per tick
pub trait Renderer {
    fn render(&mut self, snapshot: &ProgressSnapshot) -> Result<()>;

    /// Called once after the final frame
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// How a seed is drawn in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStatus {
    /// Not part of this run
    Unselected,
    Pending,
    Running,
    Complete,
}

impl SeedStatus {
    pub fn paint<D>(self, value: D) -> StyledObject<D> {
        match self {
            SeedStatus::Unselected => style(value).blue().dim(),
            SeedStatus::Pending => style(value).white(),
            SeedStatus::Running => style(value).yellow(),
            SeedStatus::Complete => style(value).green(),
        }
    }
}

fn summary_line(label: &str, summary: Option<Summary>, fmt: impl Fn(f64) -> String) -> String {
    let value = match summary {
        Some(s) => format!("{} / {} / {}", fmt(s.min), fmt(s.mean), fmt(s.max)),
        None => "-".to_string(),
    };
    format!("{} {}", style(format!("{label:<20}")).bold(), value)
}

fn field(label: &str, value: impl std::fmt::Display) -> String {
    format!("{} {}", style(format!("{label:<20}")).bold(), value)
}

/// Seed grid, info panel and log tail
pub fn frame_lines(snapshot: &ProgressSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    for (row, cells) in snapshot.grid.chunks(GRID_COLUMNS).enumerate() {
        let line = cells
            .iter()
            .enumerate()
            .map(|(col, status)| {
                let seed = row * GRID_COLUMNS + col;
                status.paint(format!("{seed:03}")).to_string()
            })
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(line);
    }

    lines.push(String::new());
    lines.push(field(
        "Current Threads:",
        format!(
            "{} / {} (ideal {}, max {})",
            snapshot.in_flight,
            snapshot.limits.effective,
            snapshot.limits.ideal,
            snapshot.max_threads
        ),
    ));
    lines.push(field(
        "Since Last Dispatch:",
        match snapshot.since_last_dispatch {
            Some(since) => format!(
                "{} / {}",
                format_time(since.as_secs_f64()),
                format_time(snapshot.cadence_secs)
            ),
            None => "-".to_string(),
        },
    ));
    lines.push(summary_line("Memory Usage:", snapshot.memory, |gb| {
        format!("{gb:.3}GB")
    }));
    lines.push(summary_line("Time:", snapshot.durations, format_time));
    lines.push(summary_line("Scaled Time:", snapshot.scaled_durations, format_time));
    lines.push(field(
        "Remaining:",
        snapshot
            .remaining_secs
            .map(format_time)
            .unwrap_or_else(|| "-".to_string()),
    ));
    lines.push(field(
        "ETA:",
        snapshot
            .eta
            .as_ref()
            .map(format_eta)
            .unwrap_or_else(|| "-".to_string()),
    ));
    lines.push(field(
        "Progress:",
        format!(
            "{} / {} complete, {} running, {} pending ({})",
            snapshot.completed, snapshot.total, snapshot.in_flight, snapshot.pending, snapshot.state
        ),
    ));

    if !snapshot.log_tail.is_empty() {
        lines.push(String::new());
        lines.extend(snapshot.log_tail.iter().cloned());
    }

    lines
}

/// One-line status for non-interactive output
pub fn status_line(snapshot: &ProgressSnapshot) -> String {
    let remaining = snapshot
        .remaining_secs
        .map(format_time)
        .unwrap_or_else(|| "-".to_string());
    let eta = snapshot
        .eta
        .as_ref()
        .map(format_eta)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{}/{} complete, {} running (effective {}, ideal {}), remaining {remaining}, ETA {eta}",
        snapshot.completed,
        snapshot.total,
        snapshot.in_flight,
        snapshot.limits.effective,
        snapshot.limits.ideal,
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dispatch::{ConcurrencyLimits, DispatchState};
    use std::time::Duration;

    pub(crate) fn snapshot() -> ProgressSnapshot {
        let mut grid = vec![SeedStatus::Unselected; 256];
        grid[0] = SeedStatus::Complete;
        grid[1] = SeedStatus::Running;
        grid[2] = SeedStatus::Pending;

        ProgressSnapshot {
            state: DispatchState::Running,
            grid,
            total: 3,
            pending: 1,
            in_flight: 1,
            completed: 1,
            limits: ConcurrencyLimits {
                ideal: 5,
                effective: 2,
            },
            max_threads: 2,
            budget_gb: 1.0,
            since_last_dispatch: Some(Duration::from_secs(65)),
            cadence_secs: 120.0,
            expected_secs: 600.0,
            durations: Some(Summary {
                min: 590.0,
                mean: 600.0,
                max: 610.0,
            }),
            scaled_durations: None,
            memory: Some(Summary {
                min: 0.25,
                mean: 0.25,
                max: 0.25,
            }),
            remaining_secs: Some(3725.0),
            eta: None,
            log_tail: vec!["[2026-01-01 00:00:00] Seed 0 Complete: 600.00elapsed".to_string()],
            new_log: vec!["[2026-01-01 00:00:00] Seed 0 Complete: 600.00elapsed".to_string()],
        }
    }

    fn plain(lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .map(|line| console::strip_ansi_codes(line).trim_end().to_string())
            .collect()
    }

    #[test]
    fn test_frame_grid_rows() {
        let lines = plain(&frame_lines(&snapshot()));
        assert!(lines[0].starts_with("000 001 002 003"));
        assert!(lines[0].ends_with("031"));
        assert!(lines[7].starts_with("224"));
        assert!(lines[7].ends_with("255"));
        assert_eq!(lines[8], "");
    }

    #[test]
    fn test_frame_info_panel() {
        let lines = plain(&frame_lines(&snapshot()));
        let text = lines.join("\n");

        assert!(text.contains("Current Threads:     1 / 2 (ideal 5, max 2)"));
        assert!(text.contains("Since Last Dispatch: 0:01:05 / 0:02:00"));
        assert!(text.contains("Memory Usage:        0.250GB / 0.250GB / 0.250GB"));
        assert!(text.contains("Time:                0:09:50 / 0:10:00 / 0:10:10"));
        assert!(text.contains("Scaled Time:         -"));
        assert!(text.contains("Remaining:           1:02:05"));
        assert!(text.contains("ETA:                 -"));
        assert!(text.contains("1 / 3 complete, 1 running, 1 pending (running)"));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("[2026-01-01 00:00:00] Seed 0 Complete: 600.00elapsed")
        );
    }

    #[test]
    fn test_status_line() {
        let line = status_line(&snapshot());
        assert_eq!(
            line,
            "1/3 complete, 1 running (effective 2, ideal 5), remaining 1:02:05, ETA -"
        );
    }
}
