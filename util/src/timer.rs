use std::time::{Duration, Instant};

/// Something that can tell how long we've been waiting, and make us wait longer.
///
/// Polling loops take a `Clock` instead of calling `std::thread::sleep` directly,
/// so they can be driven by a fake clock in tests.
pub trait Clock {
    /// Time elapsed since the clock was created or last reset.
    fn elapsed(&self) -> Duration;

    /// Block the current thread for `dur`.
    fn sleep(&mut self, dur: Duration);
}

/// Utility for keeping track of the time it took to perform some operation.
pub struct Timer {
    start_time: Instant,
}

impl Timer {
    /// Create a new `Timer`.
    pub fn now() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Reset internal timer to now.
    pub fn reset(&mut self) {
        self.start_time = Instant::now();
    }
}

impl Clock for Timer {
    fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn sleep(&mut self, dur: Duration) {
        std::thread::sleep(dur);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn test_timer_elapsed_grows_after_sleep() {
        let mut timer = Timer::now();
        timer.sleep(Duration::from_millis(5));
        assert!(timer.elapsed() >= Duration::from_millis(5));
        timer.reset();
        assert!(timer.elapsed() < Duration::from_secs(1));
    }
}
