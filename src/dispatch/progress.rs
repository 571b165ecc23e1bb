//! Progress and ETA derived from the scheduler's state
//!
//! Nothing here feeds back into dispatch decisions; a [`ProgressSnapshot`] is
//! built fresh every tick and handed to a renderer.

use chrono::{DateTime, Local};
use std::time::Duration;

use super::controller::ConcurrencyLimits;
use super::history::{self, SampleHistory, Summary};
use super::scheduler::DispatchState;
use crate::render::SeedStatus;
use crate::scaling::ScalingProfile;
use crate::work::{Seed, WorkQueue};

/// Seeds drawn in the grid; larger seeds only show up in the counts
pub const GRID_SEEDS: usize = 256;

/// Completion entries carried by each snapshot
pub const LOG_TAIL_LINES: usize = 8;

/// `H:MM:SS`, rounded to the nearest second
pub fn format_time(secs: f64) -> String {
    if !secs.is_finite() {
        return "unknown".to_string();
    }

    let sign = if secs < -0.5 { "-" } else { "" };
    let total = secs.abs().round() as u64;
    format!(
        "{sign}{}:{:02}:{:02}",
        total / 3600,
        (total / 60) % 60,
        total % 60
    )
}

pub fn format_eta(eta: &DateTime<Local>) -> String {
    eta.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Immutable view of one tick
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub state: DispatchState,
    /// Status of seed `i` at index `i`
    pub grid: Vec<SeedStatus>,
    pub total: usize,
    pub pending: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub limits: ConcurrencyLimits,
    pub max_threads: usize,
    pub budget_gb: f64,
    /// `None` before the first dispatch
    pub since_last_dispatch: Option<Duration>,
    /// `expected / ideal`
    pub cadence_secs: f64,
    pub expected_secs: f64,
    pub durations: Option<Summary>,
    pub scaled_durations: Option<Summary>,
    pub memory: Option<Summary>,
    pub remaining_secs: Option<f64>,
    pub eta: Option<DateTime<Local>>,
    pub log_tail: Vec<String>,
    /// Every completion entry added since the previous frame
    pub new_log: Vec<String>,
}

/// Scheduler state a snapshot is built from
pub struct ProgressInput<'a> {
    pub state: DispatchState,
    pub queue: &'a WorkQueue,
    pub history: &'a SampleHistory,
    pub limits: ConcurrencyLimits,
    pub max_threads: usize,
    pub budget_gb: f64,
    pub expected_secs: f64,
    pub scaled: &'a [f64],
    pub since_last_dispatch: Option<Duration>,
    pub log: &'a [String],
    /// Entries of `log` already handed to a renderer
    pub log_reported: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter<'a> {
    profile: &'a ScalingProfile,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(profile: &'a ScalingProfile) -> Self {
        Self { profile }
    }

    /// Projected wall time until the last seed finishes
    ///
    /// Pending work spread over the effective concurrency, plus one mean
    /// duration for the tail, minus the time already spent waiting for the
    /// next dispatch. Clamped at zero.
    pub fn remaining_secs(
        &self,
        pending: usize,
        scaled: &[f64],
        effective: usize,
        since_last_dispatch: f64,
    ) -> Option<f64> {
        let mean = history::mean(scaled)?;
        let effective = effective.max(1);
        let reached = scaled.len().min(effective);

        let spread = pending as f64 * mean
            * self
                .profile
                .relative_multiplier(effective as f64, reached as f64)
            / effective as f64;

        Some((spread + mean - since_last_dispatch).max(0.0))
    }

    pub fn snapshot(&self, input: ProgressInput<'_>) -> ProgressSnapshot {
        let since_last = input
            .since_last_dispatch
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let remaining_secs = self.remaining_secs(
            input.queue.pending_len(),
            input.scaled,
            input.limits.effective,
            since_last,
        );

        let eta = remaining_secs.and_then(|secs| {
            let remaining = chrono::Duration::from_std(Duration::from_secs_f64(secs)).ok()?;
            Local::now().checked_add_signed(remaining)
        });

        let tail_start = input.log.len().saturating_sub(LOG_TAIL_LINES);

        ProgressSnapshot {
            state: input.state,
            grid: seed_grid(input.queue),
            total: input.queue.total(),
            pending: input.queue.pending_len(),
            in_flight: input.queue.in_flight_len(),
            completed: input.queue.completed_len(),
            limits: input.limits,
            max_threads: input.max_threads,
            budget_gb: input.budget_gb,
            since_last_dispatch: input.since_last_dispatch,
            cadence_secs: input.expected_secs / input.limits.ideal.max(1) as f64,
            expected_secs: input.expected_secs,
            durations: Summary::of(input.history.durations()),
            scaled_durations: Summary::of(input.scaled),
            memory: Summary::of(input.history.peaks()),
            remaining_secs,
            eta,
            log_tail: input.log[tail_start..].to_vec(),
            new_log: input.log[input.log_reported.min(input.log.len())..].to_vec(),
        }
    }
}

/// One cell per seed in `0..GRID_SEEDS`
fn seed_grid(queue: &WorkQueue) -> Vec<SeedStatus> {
    let mut grid = vec![SeedStatus::Unselected; GRID_SEEDS];
    for &seed in queue.selected() {
        if let Some(cell) = grid.get_mut(seed as usize) {
            *cell = status_of(queue, seed);
        }
    }
    grid
}

fn status_of(queue: &WorkQueue, seed: Seed) -> SeedStatus {
    if queue.is_completed(seed) {
        SeedStatus::Complete
    } else if queue.is_running(seed) {
        SeedStatus::Running
    } else {
        SeedStatus::Pending
    }
}
