//! CPU Clock.
use std::{
    thread,
    time::{Duration, Instant},
};

use crate::constants::*;

/// Clock frequency, in hertz (per second)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(transparent))]
pub struct Hz(pub u64);

impl Default for Hz {
    fn default() -> Self {
        Hz(CLOCK_FREQUENCY)
    }
}

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Timer to synchronize a thread with a software clock.
///
/// Once a cycle has elapsed the clock resets back to zero, rather than
/// trying to catch up on cycles that were missed.
pub(crate) struct Clock {
    period: Duration,
    last: Instant,
}

impl Clock {
    /// Creates a new clock with the current time as internal state.
    pub(crate) fn new(period: impl Into<Duration>) -> Self {
        Self {
            period: period.into(),
            last: Instant::now(),
        }
    }

    /// Set the clock state back to zero.
    pub(crate) fn reset(&mut self) {
        self.last = Instant::now()
    }

    /// Block the current thread until the next clock cycle.
    pub(crate) fn wait(&mut self) {
        if self.period.is_zero() {
            return;
        }

        loop {
            let elapsed = self.last.elapsed();
            if elapsed < self.period {
                let remaining = self.period - elapsed;

                // Sleep does not have enough resolution for short waits,
                // so only sleep through the bulk and yield the rest.
                if remaining > SLEEP_THRESHOLD {
                    thread::sleep(remaining - SLEEP_THRESHOLD);
                } else {
                    thread::yield_now();
                }
            } else {
                self.reset();
                return;
            }
        }
    }
}

const SLEEP_THRESHOLD: Duration = Duration::from_millis(1);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clock_hz() {
        let interval: Duration = Hz(60).into();
        assert_eq!(interval.as_millis(), 16);

        let interval: Duration = Hz(500).into();
        assert_eq!(interval.as_millis(), 2);

        let interval: Duration = Hz(0).into();
        assert!(interval.is_zero());
    }

    #[test]
    fn test_clock_wait() {
        let mut clock = Clock::new(Hz(200));
        let start = Instant::now();
        clock.wait();
        clock.wait();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
