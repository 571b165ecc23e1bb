//! Adaptive dispatch
//!
//! [`DispatchScheduler`] drives a [`Launcher`](crate::process::Launcher) under
//! a memory budget. [`ConcurrencyController`] turns observed peaks into a
//! concurrency cap, [`DurationEstimator`] turns observed durations into a
//! dispatch cadence, and [`ProgressReporter`] summarises both for display.

pub mod clock;
pub mod controller;
pub mod estimator;
pub mod history;
pub mod progress;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{ConcurrencyController, ConcurrencyLimits};
pub use estimator::{DurationEstimator, UNKNOWN_DURATION_SECS};
pub use history::{SampleHistory, Summary, TimedSample};
pub use progress::{ProgressReporter, ProgressSnapshot, format_eta, format_time};
pub use scheduler::{DispatchScheduler, DispatchState, RunSummary};
