use super::history;

/// Sample count at which the early peak correction disappears
pub const EARLY_SAMPLE_WINDOW: usize = 32;

/// Correction applied to the largest observed peak while samples are few
///
/// Decays linearly from 1.15 at one sample to 1.0 at [`EARLY_SAMPLE_WINDOW`].
pub fn peak_inflation(samples: usize) -> f64 {
    if samples >= EARLY_SAMPLE_WINDOW {
        1.0
    } else {
        (716.0 - 3.0 * samples as f64) / 620.0
    }
}

/// Concurrency levels derived for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
    /// What the memory budget alone allows
    pub ideal: usize,
    /// `min(max_threads, ideal)`, the in-flight cap
    pub effective: usize,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            ideal: 1,
            effective: 1,
        }
    }
}

/// Memory-budget admission control
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyController {
    budget_gb: f64,
    max_threads: usize,
}

impl ConcurrencyController {
    pub fn new(budget_gb: f64, max_threads: usize) -> Self {
        Self {
            budget_gb,
            max_threads: max_threads.max(1),
        }
    }

    pub fn budget_gb(&self) -> f64 {
        self.budget_gb
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Jobs the budget can hold, sized for twice the (corrected) worst peak
    pub fn ideal_concurrency(&self, peaks: &[f64]) -> usize {
        let Some(peak) = history::max(peaks) else {
            return 1;
        };

        if !(peak > 0.0) {
            return 1;
        }

        let peak = peak * peak_inflation(peaks.len());
        let ideal = ((2.0 * self.budget_gb - peak) / peak).floor();

        // Negative values saturate to zero in the cast
        (ideal as usize).max(1)
    }

    pub fn limits(&self, peaks: &[f64]) -> ConcurrencyLimits {
        let ideal = self.ideal_concurrency(peaks);
        ConcurrencyLimits {
            ideal,
            effective: ideal.min(self.max_threads),
        }
    }
}
