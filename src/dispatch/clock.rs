use std::cell::Cell;
use std::time::{Duration, Instant};

/// Time source and sleep used by the control loop
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock with a real blocking sleep
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated clock: sleeping advances time instantly
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_on_sleep() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_secs(5));
        clock.advance(Duration::from_millis(250));

        assert_eq!(clock.now() - start, Duration::from_millis(5250));
    }

    #[test]
    fn test_clock_through_reference() {
        fn elapsed_after_sleep<C: Clock>(clock: C) -> Duration {
            let start = clock.now();
            clock.sleep(Duration::from_secs(1));
            clock.now() - start
        }

        let clock = ManualClock::new();
        assert_eq!(elapsed_after_sleep(&clock), Duration::from_secs(1));
    }
}
