//! Command implementations for the seedpool CLI
//!
//! Each command is organized into its own module.

pub mod analyze;
pub mod calibrate;
pub mod config;
pub mod run;
pub mod version;
