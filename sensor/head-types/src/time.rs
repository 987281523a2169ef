//! Time sources for polling loops.
//!
//! Every loop that waits (calibration, settle delays, retry intervals,
//! frame ticks) goes through a [`Pacer`], so the same code runs against
//! the wall clock in production and against a [`ManualPacer`] in tests.

use std::time::{Duration, Instant};

/// A monotonic clock that can also block the caller.
pub trait Pacer {
    /// Time elapsed since the pacer was created.
    fn elapsed(&self) -> Duration;

    /// Blocks for `duration`.
    fn pause(&mut self, duration: Duration);
}

impl<P: Pacer + ?Sized> Pacer for &mut P {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }

    fn pause(&mut self, duration: Duration) {
        (**self).pause(duration);
    }
}

/// Wall-clock pacer backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy)]
pub struct RealtimePacer {
    origin: Instant,
}

impl Default for RealtimePacer {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimePacer {
    /// Creates a pacer whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Pacer for RealtimePacer {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Virtual clock that only moves when paused or advanced.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use head_types::{ManualPacer, Pacer};
///
/// let mut pacer = ManualPacer::new();
/// pacer.pause(Duration::from_millis(10));
/// pacer.advance(Duration::from_millis(5));
/// assert_eq!(pacer.elapsed(), Duration::from_millis(15));
/// assert_eq!(pacer.pause_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualPacer {
    now: Duration,
    pauses: Vec<Duration>,
}

impl ManualPacer {
    /// Creates a pacer at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward without recording a pause.
    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }

    /// Number of times [`Pacer::pause`] was called.
    #[must_use]
    pub fn pause_count(&self) -> usize {
        self.pauses.len()
    }

    /// Every pause requested so far, in order.
    #[must_use]
    pub fn pauses(&self) -> &[Duration] {
        &self.pauses
    }

    /// Sum of all requested pauses.
    #[must_use]
    pub fn total_paused(&self) -> Duration {
        self.pauses.iter().sum()
    }
}

impl Pacer for ManualPacer {
    fn elapsed(&self) -> Duration {
        self.now
    }

    fn pause(&mut self, duration: Duration) {
        self.now += duration;
        self.pauses.push(duration);
    }
}
