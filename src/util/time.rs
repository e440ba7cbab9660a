//! Timing utilities
//!
//! The replay clock is captured exactly once before workers start and is
//! read-only afterwards; every "elapsed since start" value in a run is measured
//! against it on the monotonic clock.

use std::time::{Duration, Instant};

/// Start-of-run timestamp shared read-only by all workers
#[derive(Debug, Clone, Copy)]
pub struct ReplayClock {
    start: Instant,
}

impl ReplayClock {
    /// Capture the replay start time
    #[inline]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time elapsed since the replay started
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline]
    pub fn started_at(&self) -> Instant {
        self.start
    }
}

/// Convert a duration to fractional milliseconds
#[inline]
pub fn duration_to_ms(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Convert fractional milliseconds to a duration, clamping negatives to zero
#[inline]
pub fn ms_to_duration(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_nanos((ms * 1_000_000.0).round() as u64)
    } else {
        Duration::ZERO
    }
}

/// Format a latency the way the metrics file reports it
pub fn format_latency_ms(duration: Duration) -> String {
    format!("{:.3} ms", duration_to_ms(duration))
}

/// Events per second over `duration`, or zero for an empty interval
pub fn per_second(count: u64, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        count as f64 / seconds
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_replay_clock_elapsed() {
        let clock = ReplayClock::start();
        thread::sleep(Duration::from_millis(10));
        assert!(clock.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_ms_conversions() {
        assert_eq!(duration_to_ms(Duration::from_micros(1500)), 1.5);
        assert_eq!(ms_to_duration(2.5), Duration::from_micros(2500));
        assert_eq!(ms_to_duration(-3.0), Duration::ZERO);
        assert_eq!(ms_to_duration(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_format_latency_ms() {
        assert_eq!(format_latency_ms(Duration::from_micros(1500)), "1.500 ms");
        assert_eq!(format_latency_ms(Duration::from_nanos(250)), "0.000 ms");
        assert_eq!(format_latency_ms(Duration::from_secs(2)), "2000.000 ms");
    }

    #[test]
    fn test_per_second() {
        assert_eq!(per_second(1000, Duration::from_secs(10)), 100.0);
        assert_eq!(per_second(3, Duration::from_millis(500)), 6.0);
        assert_eq!(per_second(1000, Duration::ZERO), 0.0);
    }
}
