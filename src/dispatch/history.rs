//! Completed-run samples and the aggregates read from them

use crate::process::ResourceSample;

/// Duration of one run together with the mean concurrency it ran under
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedSample {
    pub duration_secs: f64,
    pub concurrency: f64,
}

/// Append-only record of completed runs
#[derive(Debug, Clone, Default)]
pub struct SampleHistory {
    durations: Vec<f64>,
    peaks: Vec<f64>,
    timed: Vec<TimedSample>,
    unmeasured: usize,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one completion in; runs without a report only count as unmeasured
    pub fn record(&mut self, sample: Option<ResourceSample>, concurrency: f64) {
        match sample {
            Some(sample) => {
                self.durations.push(sample.duration_secs);
                self.peaks.push(sample.peak_memory_gb);
                self.timed.push(TimedSample {
                    duration_secs: sample.duration_secs,
                    concurrency,
                });
            }
            None => self.unmeasured += 1,
        }
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn peaks(&self) -> &[f64] {
        &self.peaks
    }

    pub fn timed(&self) -> &[TimedSample] {
        &self.timed
    }

    /// Completions carrying a resource sample
    pub fn measured(&self) -> usize {
        self.timed.len()
    }

    /// Completions whose report was missing or malformed
    pub fn unmeasured(&self) -> usize {
        self.unmeasured
    }
}

/// Minimum, mean and maximum of a sample set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self { min, mean, max })
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Median, averaging the middle pair for even counts
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation; a single value has no spread and yields `0.0`
pub fn stdev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    if values.len() < 2 {
        return Some(0.0);
    }

    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(duration_secs: f64, peak_memory_gb: f64) -> Option<ResourceSample> {
        Some(ResourceSample {
            duration_secs,
            peak_memory_gb,
        })
    }

    #[test]
    fn test_record_keeps_completion_order() {
        let mut history = SampleHistory::new();
        history.record(sample(30.0, 0.2), 1.0);
        history.record(None, 2.0);
        history.record(sample(10.0, 0.4), 2.5);

        assert_eq!(history.durations(), &[30.0, 10.0]);
        assert_eq!(history.peaks(), &[0.2, 0.4]);
        assert_eq!(history.timed()[1].concurrency, 2.5);
        assert_eq!(history.measured(), 2);
        assert_eq!(history.unmeasured(), 1);
    }

    #[test]
    fn test_summary() {
        assert_eq!(Summary::of(&[]), None);
        assert_eq!(
            Summary::of(&[3.0, 1.0, 5.0]),
            Some(Summary {
                min: 1.0,
                mean: 3.0,
                max: 5.0
            })
        );
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[9.0, 1.0, 4.0]), Some(4.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_stdev_single_sample_is_zero() {
        assert_eq!(stdev(&[]), None);
        assert_eq!(stdev(&[42.0]), Some(0.0));

        let spread = stdev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((spread - 2.138_089_935).abs() < 1e-6);
    }
}
