//! Wall-clock and pause abstractions.
//!
//! The orchestrator never reads the system clock or sleeps directly, so
//! tests can drive time and observe pauses without waiting.

use std::time::Duration;

use elector_types::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Blocking pause between chain submissions.
pub trait Pacer: Send + Sync {
    fn pause(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Sleeps the calling thread. Ticks run on a blocking worker, so this never
/// stalls the async runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock.now().as_secs() > 1_577_836_800);
    }

    #[test]
    fn zero_pause_returns_immediately() {
        let start = std::time::Instant::now();
        ThreadPacer.pause(Duration::ZERO);
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
