use super::history::TimedSample;
use crate::scaling::ScalingProfile;

/// Expected duration before anything has completed: one day
pub const UNKNOWN_DURATION_SECS: f64 = 86_400.0;

/// Sample count from which the median is used
pub const MEDIAN_SAMPLE_COUNT: usize = 16;

/// Index into `n` ascending durations
///
/// Starts at the maximum for a single sample and relaxes towards the median
/// as `n` approaches [`MEDIAN_SAMPLE_COUNT`].
pub fn percentile_index(n: usize) -> usize {
    if n >= MEDIAN_SAMPLE_COUNT {
        n / 2
    } else {
        (n.saturating_sub(1)).min(n * (31 - n) / 30)
    }
}

/// Robust per-item duration, rescaled to the current concurrency
#[derive(Debug, Clone, Copy)]
pub struct DurationEstimator<'a> {
    profile: &'a ScalingProfile,
}

impl<'a> DurationEstimator<'a> {
    pub fn new(profile: &'a ScalingProfile) -> Self {
        Self { profile }
    }

    /// Every duration as it would have taken at `effective` concurrency
    pub fn scaled_durations(&self, samples: &[TimedSample], effective: usize) -> Vec<f64> {
        samples
            .iter()
            .map(|sample| {
                sample.duration_secs
                    * self
                        .profile
                        .relative_multiplier(effective as f64, sample.concurrency)
            })
            .collect()
    }

    pub fn expected_duration(&self, samples: &[TimedSample], effective: usize) -> f64 {
        if samples.is_empty() {
            return UNKNOWN_DURATION_SECS;
        }

        let mut scaled = self.scaled_durations(samples, effective);
        scaled.sort_by(f64::total_cmp);
        scaled[percentile_index(scaled.len())]
    }
}
