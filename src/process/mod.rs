//! Child computations
//!
//! The dispatcher only talks to [`Launcher`] and [`Job`]; [`ProcessSlot`] is
//! the implementation backed by a real child process wrapped in a resource
//! measurement utility.

use anyhow::Result;

use crate::work::Seed;

pub mod invocation;
pub mod report;
pub mod slot;

pub use invocation::Invocation;
pub use report::{ResourceSample, parse_report};
pub use slot::{ProcessLauncher, ProcessSlot};

/// One launched unit of work
pub trait Job {
    fn seed(&self) -> Seed;

    /// Non-blocking completion check
    ///
    /// Returns `true` once the work has finished. The first `true` result
    /// collects the resource report; later calls do nothing and keep
    /// returning `true`.
    fn poll_complete(&mut self) -> bool;

    /// Measured duration and peak memory, absent when no valid report exists
    fn sample(&self) -> Option<ResourceSample>;

    /// Report text the sample was parsed from
    fn raw_report(&self) -> Option<&str>;
}

/// Starts jobs for seeds
pub trait Launcher {
    type Job: Job;

    /// Launch failures are fatal for the whole run
    fn launch(&mut self, seed: Seed) -> Result<Self::Job>;
}
