//! # seedpool - adaptive dispatcher for per-seed optimization runs
//!
//! Runs one child computation per seed, keeping as many in flight as a memory
//! budget allows and pacing new launches from the run times observed so far.
//!
//! ## Quick Start
//!
//! ```bash
//! # Dispatch every seed of a route, keeping outputs
//! seedpool run paladin --output-dir out --max-memory 8
//!
//! # Measure how run time scales with concurrency
//! seedpool calibrate --timings timings.json
//!
//! # Find the best window of 16 consecutive seeds
//! seedpool analyze range out 16
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod process;
pub mod render;
pub mod scaling;
pub mod work;

pub use cli::{Cli, Output};
pub use config::SeedpoolConfig;

/// Result type alias for seedpool operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
