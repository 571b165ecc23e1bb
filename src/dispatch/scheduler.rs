//! The control loop
//!
//! Each tick polls every in-flight job, folds completions into the sample
//! history, recomputes the concurrency limits and the expected duration, then
//! launches as many pending seeds as the limits and the dispatch cadence
//! allow. Between ticks the loop sleeps on its [`Clock`]; it never waits on a
//! child.

use anyhow::Result;
use std::fmt;
use std::time::{Duration, Instant};

use super::clock::Clock;
use super::controller::{ConcurrencyController, ConcurrencyLimits};
use super::estimator::{DurationEstimator, UNKNOWN_DURATION_SECS};
use super::history::{SampleHistory, Summary};
use super::progress::{ProgressInput, ProgressReporter, ProgressSnapshot};
use crate::process::{Job, Launcher};
use crate::render::Renderer;
use crate::scaling::ScalingProfile;
use crate::work::{Seed, WorkQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Nothing dispatched yet
    Idle,
    Running,
    /// Queue empty, jobs still in flight
    Draining,
    Done,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Idle => "idle",
            DispatchState::Running => "running",
            DispatchState::Draining => "draining",
            DispatchState::Done => "done",
        };
        f.write_str(name)
    }
}

/// A launched job with the in-flight counts seen while it ran
struct InFlight<J> {
    job: J,
    observed: Vec<usize>,
}

impl<J> InFlight<J> {
    fn new(job: J) -> Self {
        Self {
            job,
            observed: Vec::new(),
        }
    }

    /// Mean observed concurrency, 1 when never observed
    fn mean_concurrency(&self) -> f64 {
        if self.observed.is_empty() {
            return 1.0;
        }
        self.observed.iter().sum::<usize>() as f64 / self.observed.len() as f64
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub dispatched: usize,
    pub measured: usize,
    pub unmeasured: usize,
    pub durations: Option<Summary>,
    pub memory: Option<Summary>,
    pub wall_time: Duration,
    pub log: Vec<String>,
}

pub struct DispatchScheduler<L: Launcher, C: Clock> {
    launcher: L,
    clock: C,
    queue: WorkQueue,
    profile: ScalingProfile,
    controller: ConcurrencyController,
    tick_interval: Duration,
    in_flight: Vec<InFlight<L::Job>>,
    history: SampleHistory,
    log: Vec<String>,
    log_reported: usize,
    limits: ConcurrencyLimits,
    expected_secs: f64,
    scaled: Vec<f64>,
    started: Option<Instant>,
    last_dispatch: Option<Instant>,
    dispatched: usize,
    state: DispatchState,
}

impl<L: Launcher, C: Clock> DispatchScheduler<L, C> {
    pub fn new(
        launcher: L,
        clock: C,
        queue: WorkQueue,
        profile: ScalingProfile,
        controller: ConcurrencyController,
        tick_interval: Duration,
    ) -> Self {
        Self {
            launcher,
            clock,
            queue,
            profile,
            controller,
            tick_interval,
            in_flight: Vec::new(),
            history: SampleHistory::new(),
            log: Vec::new(),
            log_reported: 0,
            limits: ConcurrencyLimits::default(),
            expected_secs: UNKNOWN_DURATION_SECS,
            scaled: Vec::new(),
            started: None,
            last_dispatch: None,
            dispatched: 0,
            state: DispatchState::Idle,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    pub fn limits(&self) -> ConcurrencyLimits {
        self.limits
    }

    pub fn expected_secs(&self) -> f64 {
        self.expected_secs
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Completion log entries in completion order
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// One pass of poll, re-estimate, dispatch
    ///
    /// A launch failure aborts the run; jobs already in flight are left
    /// running.
    pub fn tick(&mut self) -> Result<DispatchState> {
        let now = self.clock.now();
        self.started.get_or_insert(now);

        self.collect_completions();
        self.refresh_estimates();
        self.dispatch_ready(now)?;
        self.update_state();

        Ok(self.state)
    }

    /// Tick until every seed has completed, rendering after each tick
    pub fn run(&mut self, renderer: &mut dyn Renderer) -> Result<RunSummary> {
        loop {
            let state = self.tick()?;
            renderer.render(&self.snapshot())?;
            self.log_reported = self.log.len();

            if state == DispatchState::Done {
                break;
            }
            self.clock.sleep(self.tick_interval);
        }

        renderer.finish()?;
        Ok(self.summary())
    }

    /// Current progress; `new_log` holds entries not yet rendered by [`run`](Self::run)
    pub fn snapshot(&self) -> ProgressSnapshot {
        let since_last_dispatch = self
            .last_dispatch
            .map(|at| self.clock.now().saturating_duration_since(at));

        ProgressReporter::new(&self.profile).snapshot(ProgressInput {
            state: self.state,
            queue: &self.queue,
            history: &self.history,
            limits: self.limits,
            max_threads: self.controller.max_threads(),
            budget_gb: self.controller.budget_gb(),
            expected_secs: self.expected_secs,
            scaled: &self.scaled,
            since_last_dispatch,
            log: &self.log,
            log_reported: self.log_reported,
        })
    }

    pub fn summary(&self) -> RunSummary {
        let wall_time = self
            .started
            .map(|at| self.clock.now().saturating_duration_since(at))
            .unwrap_or_default();

        RunSummary {
            dispatched: self.dispatched,
            measured: self.history.measured(),
            unmeasured: self.history.unmeasured(),
            durations: Summary::of(self.history.durations()),
            memory: Summary::of(self.history.peaks()),
            wall_time,
            log: self.log.clone(),
        }
    }

    fn collect_completions(&mut self) {
        let observed = self.in_flight.len();
        let mut still_running = Vec::with_capacity(observed);

        for mut slot in std::mem::take(&mut self.in_flight) {
            if slot.job.poll_complete() {
                self.complete(slot);
            } else {
                slot.observed.push(observed);
                still_running.push(slot);
            }
        }

        self.in_flight = still_running;
    }

    fn complete(&mut self, slot: InFlight<L::Job>) {
        let seed = slot.job.seed();
        let concurrency = slot.mean_concurrency();
        let sample = slot.job.sample();

        self.queue.complete(seed);
        self.history.record(sample, concurrency);

        let entry = match slot.job.raw_report() {
            Some(report) => format!("[{}] Seed {seed} Complete: {report}", timestamp()),
            None => format!("[{}] Seed {seed} Complete: no resource report", timestamp()),
        };
        tracing::info!("{entry}");
        self.log.push(entry);
    }

    fn refresh_estimates(&mut self) {
        self.limits = self.controller.limits(self.history.peaks());

        let estimator = DurationEstimator::new(&self.profile);
        self.scaled = estimator.scaled_durations(self.history.timed(), self.limits.effective);
        self.expected_secs =
            estimator.expected_duration(self.history.timed(), self.limits.effective);
    }

    fn dispatch_ready(&mut self, now: Instant) -> Result<()> {
        let cadence = self.expected_secs / self.limits.ideal as f64;

        while self.in_flight.len() < self.limits.effective && self.queue.pending_len() > 0 {
            let since_last = self
                .last_dispatch
                .map(|at| now.saturating_duration_since(at).as_secs_f64())
                .unwrap_or(f64::INFINITY);

            if !self.in_flight.is_empty() && since_last < cadence {
                tracing::trace!(
                    "Holding dispatch: {since_last:.1}s since last, cadence {cadence:.1}s"
                );
                break;
            }

            let Some(seed) = self.queue.dequeue() else {
                break;
            };
            self.launch(seed)?;
            self.last_dispatch = Some(self.clock.now());
        }

        Ok(())
    }

    fn launch(&mut self, seed: Seed) -> Result<()> {
        let job = self.launcher.launch(seed)?;
        self.dispatched += 1;
        tracing::debug!(
            "Dispatched seed {seed} ({} in flight, effective {}, ideal {})",
            self.in_flight.len() + 1,
            self.limits.effective,
            self.limits.ideal
        );
        self.in_flight.push(InFlight::new(job));
        Ok(())
    }

    fn update_state(&mut self) {
        self.state = if self.queue.is_drained() {
            DispatchState::Done
        } else if self.dispatched == 0 {
            DispatchState::Idle
        } else if self.queue.pending_len() == 0 {
            DispatchState::Draining
        } else {
            DispatchState::Running
        };
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
