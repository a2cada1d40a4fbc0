//! Injectable time source, so the Stochastic estimator's simulated blocking
//! delay can be stubbed to zero in tests instead of actually sleeping the
//! test thread.

use std::time::Duration;

pub trait Clock {
    fn sleep(&self, duration: Duration);
}

/// The real clock: blocks the calling thread, matching the single-threaded
/// search loop's use of `std::thread::sleep` to simulate estimation cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that never sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClock;

impl Clock for NoopClock {
    fn sleep(&self, _duration: Duration) {}
}
