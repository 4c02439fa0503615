//! Wall-clock source
//!
//! The game loop reads the clock to anchor `start()` and to measure how long a
//! catch-up burst has been running.

use std::time::Instant;

/// Milliseconds on a monotonic timeline
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Monotonic clock measured from its creation
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(a >= 0.0);
        assert!(b >= a);
    }

    #[test]
    fn test_stepping_clock_advances_per_read() {
        let clock = ManualClock::stepping(20.0);
        assert_eq!(clock.now_ms(), 0.0);
        assert_eq!(clock.now_ms(), 20.0);

        clock.set(100.0);
        assert_eq!(clock.now_ms(), 100.0);
    }
}
