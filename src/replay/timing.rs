//! Arrival-time pacing
//!
//! Each worker owns a [`TimingController`] over the run's single
//! [`ReplayClock`]. Before dispatching a request it waits until the request's
//! recorded arrival offset has elapsed since replay start. A request whose
//! arrival time has already passed is dispatched immediately and counted late.
//!
//! Workers pace themselves independently; two workers waiting on nearby arrival
//! times may dispatch in either order.

use crate::util::time::{ms_to_duration, ReplayClock};
use std::time::Duration;

/// Source of "time since replay start" and a way to block for a while
pub trait Clock: Send + Sync {
    /// Time elapsed since the replay started
    fn elapsed(&self) -> Duration;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Monotonic wall clock anchored at the replay start
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: ReplayClock,
}

impl SystemClock {
    pub fn new(start: ReplayClock) -> Self {
        Self { start }
    }
}

impl Clock for SystemClock {
    #[inline]
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline]
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Time left before `target`, or `None` if `elapsed` is already past it
///
/// Dispatching exactly at the target is on time.
#[inline]
pub fn compute_wait(target: Duration, elapsed: Duration) -> Option<Duration> {
    target.checked_sub(elapsed)
}

/// Per-worker pacing against the replay clock
#[derive(Debug)]
pub struct TimingController<C: Clock = SystemClock> {
    clock: C,
    enabled: bool,
}

impl<C: Clock> TimingController<C> {
    /// `enabled = false` turns pacing off (throughput mode)
    pub fn new(clock: C, enabled: bool) -> Self {
        Self { clock, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Wait until `target_arrival_offset_ms` after replay start
    ///
    /// Returns `true` if the target had already passed (the request is late).
    /// When pacing is disabled this returns `false` immediately.
    pub fn wait_for(&self, target_arrival_offset_ms: f64) -> bool {
        if !self.enabled {
            return false;
        }

        let target = ms_to_duration(target_arrival_offset_ms);
        match compute_wait(target, self.clock.elapsed()) {
            Some(wait) => {
                if !wait.is_zero() {
                    self.clock.sleep(wait);
                }
                false
            }
            None => true,
        }
    }
}
