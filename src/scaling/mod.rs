//! Concurrency scaling profile
//!
//! Maps a concurrency level to the expected slowdown of a single run compared
//! with running it alone. The profile is either measured ([`calibration`]) or
//! approximated by a closed-form curve.
//!
//! Levels may be fractional: a run's observed concurrency is the mean of the
//! in-flight counts sampled during its lifetime.

use anyhow::Result;

pub mod calibration;

pub use calibration::{BenchmarkBatch, BenchmarkRunner, Calibration, CalibrationLevel};

/// Divisor of the fallback curve `1 + (n - 1)^1.5 / C`, fitted empirically
pub const FALLBACK_SCALING_DIVISOR: f64 = 116.1895;

/// Relative slowdown multipliers indexed by concurrency level
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScalingProfile {
    /// Index 0 is concurrency 1; `None` uses the fallback curve
    table: Option<Vec<f64>>,
}

impl ScalingProfile {
    /// Profile without measurements
    pub fn fallback() -> Self {
        Self { table: None }
    }

    /// Profile from a measured table
    ///
    /// The table is normalised so level 1 is exactly `1.0` and multipliers
    /// never decrease with concurrency; measurement noise otherwise makes a
    /// higher level look cheaper than a lower one.
    pub fn calibrated(table: Vec<f64>) -> Result<Self> {
        if table.is_empty() {
            anyhow::bail!("Calibration table is empty");
        }

        if let Some(bad) = table.iter().find(|m| !m.is_finite() || **m <= 0.0) {
            anyhow::bail!("Calibration table contains an invalid multiplier: {bad}");
        }

        let mut normalised = Vec::with_capacity(table.len());
        let mut floor = 1.0_f64;
        for (index, multiplier) in table.into_iter().enumerate() {
            let value = if index == 0 { 1.0 } else { multiplier.max(floor) };
            floor = value;
            normalised.push(value);
        }

        Ok(Self {
            table: Some(normalised),
        })
    }

    /// Measured multipliers, if this profile was calibrated
    pub fn levels(&self) -> Option<&[f64]> {
        self.table.as_deref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.table.is_some()
    }

    /// Slowdown at `concurrency` relative to a single job
    pub fn multiplier(&self, concurrency: f64) -> f64 {
        let concurrency = if concurrency.is_finite() { concurrency.max(1.0) } else { 1.0 };

        match &self.table {
            Some(table) => interpolate(table, concurrency),
            None => 1.0 + (concurrency - 1.0).powf(1.5) / FALLBACK_SCALING_DIVISOR,
        }
    }

    /// Rescale factor for a duration observed at `current` to its equivalent at `target`
    pub fn relative_multiplier(&self, target: f64, current: f64) -> f64 {
        self.multiplier(target) / self.multiplier(current)
    }
}

/// Linear interpolation between measured levels, extrapolating past the end
/// with the slope of the last two points
fn interpolate(table: &[f64], concurrency: f64) -> f64 {
    let len = table.len();
    let index = ((concurrency.floor() as usize).saturating_sub(1)).min(len - 1);
    let base = table[index];

    let slope = if index + 1 < len {
        table[index + 1] - base
    } else if len >= 2 {
        table[len - 1] - table[len - 2]
    } else {
        0.0
    };

    base + (concurrency - 1.0 - index as f64) * slope
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_fallback_multiplier() {
        let profile = ScalingProfile::fallback();
        assert_close(profile.multiplier(1.0), 1.0);
        // 1 + 4^1.5 / 116.1895
        assert_close(profile.multiplier(5.0), 1.0 + 8.0 / FALLBACK_SCALING_DIVISOR);
        assert!((profile.multiplier(5.0) - 1.0689).abs() < 1e-4);
    }

    #[test]
    fn test_calibrated_lookup_and_interpolation() {
        let profile = ScalingProfile::calibrated(vec![1.0, 1.2, 1.5]).unwrap();
        assert_close(profile.multiplier(1.0), 1.0);
        assert_close(profile.multiplier(2.0), 1.2);
        assert_close(profile.multiplier(3.0), 1.5);
        assert_close(profile.multiplier(1.5), 1.1);
        assert_close(profile.multiplier(2.5), 1.35);
    }

    #[test]
    fn test_calibrated_extrapolation() {
        let profile = ScalingProfile::calibrated(vec![1.0, 1.2, 1.5]).unwrap();
        assert_close(profile.multiplier(4.0), 1.8);
        assert_close(profile.multiplier(6.0), 2.4);

        let single = ScalingProfile::calibrated(vec![1.0]).unwrap();
        assert_close(single.multiplier(8.0), 1.0);
    }

    #[test]
    fn test_calibrated_table_is_normalised() {
        let profile = ScalingProfile::calibrated(vec![0.98, 1.3, 1.25, 1.6]).unwrap();
        assert_eq!(profile.levels().unwrap(), &[1.0, 1.3, 1.3, 1.6]);
    }

    #[test]
    fn test_invalid_tables_are_rejected() {
        assert!(ScalingProfile::calibrated(vec![]).is_err());
        assert!(ScalingProfile::calibrated(vec![1.0, f64::NAN]).is_err());
        assert!(ScalingProfile::calibrated(vec![1.0, -2.0]).is_err());
    }

    #[test]
    fn test_monotonic_in_both_modes() {
        let profiles = [
            ScalingProfile::fallback(),
            ScalingProfile::calibrated(vec![1.0, 1.4, 1.3, 2.0, 1.9]).unwrap(),
            ScalingProfile::calibrated(vec![1.0]).unwrap(),
        ];

        for profile in &profiles {
            let mut previous = profile.multiplier(1.0);
            for step in 1..=400 {
                let level = 1.0 + step as f64 * 0.05;
                let current = profile.multiplier(level);
                assert!(current >= previous - 1e-12, "{profile:?} decreased at {level}");
                assert!(current >= 1.0);
                previous = current;
            }
        }
    }

    #[test]
    fn test_relative_multiplier() {
        let profile = ScalingProfile::calibrated(vec![1.0, 1.5, 2.0]).unwrap();
        assert_close(profile.relative_multiplier(3.0, 1.0), 2.0);
        assert_close(profile.relative_multiplier(1.0, 3.0), 0.5);
        assert_close(profile.relative_multiplier(2.0, 2.0), 1.0);
    }

    #[test]
    fn test_levels_below_one_clamp() {
        let profile = ScalingProfile::fallback();
        assert_close(profile.multiplier(0.0), 1.0);
        assert_close(profile.multiplier(f64::NAN), 1.0);
    }
}
