use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source. The frame loop reads it once per tick and hands
/// the resulting instant to every timing decision made in that tick.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Production clock backed by `Instant::now`
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-cranked clock for headless runs
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
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
}

/// Seconds elapsed from `since` to `now`, zero if `now` is earlier.
pub fn secs_between(since: Instant, now: Instant) -> f64 {
    now.saturating_duration_since(since).as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::new();
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));

        clock.advance(Duration::from_millis(750));
        assert_eq!(clock.now() - start, Duration::from_secs(1));
    }

    #[test]
    fn secs_between_saturates() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(500);
        assert!((secs_between(t0, t1) - 0.5).abs() < 1e-9);
        assert_eq!(secs_between(t1, t0), 0.0);
    }

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
