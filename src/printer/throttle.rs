//! # Output Throttle
//!
//! The serial link has no flow control, so the host paces itself: every
//! command sets a deadline equal to the time the mechanism needs to execute
//! it, and the next command blocks until that deadline has passed.
//!
//! ```text
//! emit ──► set_deadline(d) ──► ... ──► wait() ──► emit ──► set_deadline(d')
//!              resume_at = now + d       sleeps until resume_at
//! ```
//!
//! Time comes from a [`Clock`], so sessions can run against wall time
//! ([`SystemClock`]) or a simulated timeline ([`VirtualClock`]) that never
//! sleeps.

use std::thread;
use std::time::{Duration, Instant};

/// Source of time and the means to wait for it.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Block until `deadline`. Returns immediately if it has passed.
    fn sleep_until(&mut self, deadline: Instant);
}

/// Wall clock backed by `thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&mut self, deadline: Instant) {
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
    }
}

/// Simulated clock. Sleeping jumps straight to the deadline.
///
/// Useful for dry runs and for estimating how long a job will take on the
/// printer.
///
/// ```
/// use std::time::Duration;
/// use termica::printer::throttle::{Clock, VirtualClock};
///
/// let mut clock = VirtualClock::new();
/// let deadline = clock.now() + Duration::from_millis(250);
/// clock.sleep_until(deadline);
/// assert_eq!(clock.elapsed(), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VirtualClock {
    start: Instant,
    now: Instant,
    slept: Duration,
}

impl VirtualClock {
    pub fn new() -> Self {
        let start = Instant::now();
        Self {
            start,
            now: start,
            slept: Duration::ZERO,
        }
    }

    /// Move time forward without sleeping, as if the caller did other work.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Total simulated time since creation
    pub fn elapsed(&self) -> Duration {
        self.now - self.start
    }

    /// Total time spent in `sleep_until`
    pub fn slept(&self) -> Duration {
        self.slept
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Instant {
        self.now
    }

    fn sleep_until(&mut self, deadline: Instant) {
        if deadline > self.now {
            self.slept += deadline - self.now;
            self.now = deadline;
        }
    }
}

/// # Deadline Tracker
///
/// Holds the single resume-at instant of a printer session.
#[derive(Debug)]
pub struct Throttle<K: Clock> {
    clock: K,
    resume_at: Instant,
    last_delay: Duration,
}

impl<K: Clock> Throttle<K> {
    /// A throttle whose deadline has already passed
    pub fn new(clock: K) -> Self {
        let resume_at = clock.now();
        Self {
            clock,
            resume_at,
            last_delay: Duration::ZERO,
        }
    }

    /// Set the deadline `seconds` from now.
    ///
    /// The deadline never moves backwards; a delay ending before the current
    /// deadline leaves it in place. Negative or non-finite delays count as
    /// zero.
    pub fn set_deadline(&mut self, seconds: f64) {
        let delay = if seconds.is_finite() && seconds > 0.0 {
            Duration::from_secs_f64(seconds)
        } else {
            Duration::ZERO
        };
        self.resume_at = self.resume_at.max(self.clock.now() + delay);
        self.last_delay = delay;
    }

    /// Block until the deadline has passed.
    pub fn wait(&mut self) {
        if self.clock.now() < self.resume_at {
            self.clock.sleep_until(self.resume_at);
        }
    }

    /// Drop any pending deadline.
    pub fn reset(&mut self) {
        self.resume_at = self.clock.now();
        self.last_delay = Duration::ZERO;
    }

    pub fn resume_at(&self) -> Instant {
        self.resume_at
    }

    /// Delay passed to the most recent `set_deadline`
    pub fn last_delay(&self) -> Duration {
        self.last_delay
    }

    /// Time left until the deadline, zero if it has passed
    pub fn remaining(&self) -> Duration {
        self.resume_at.saturating_duration_since(self.clock.now())
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut K {
        &mut self.clock
    }
}
