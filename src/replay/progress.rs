//! Progress reporting
//!
//! A background thread prints the share of claimed requests once per interval.
//! It exits as soon as its [`ProgressReporter`] handle is stopped or dropped.

use super::cursor::JobCursor;
use crate::Result;
use anyhow::Context;
use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use std::io::Write;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Default interval between progress lines
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Percentage of `total` represented by `done`
pub fn percent_complete(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 * 100.0 / total as f64
    }
}

/// Handle to a running progress thread
pub struct ProgressReporter {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Start printing `Progress: NN.NN%` lines for `cursor` to stderr
    pub fn spawn(cursor: Arc<JobCursor>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let handle = std::thread::Builder::new()
            .name("replay-progress".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        eprint!(
                            "\rProgress: {:.2}%",
                            percent_complete(cursor.claimed(), cursor.len())
                        );
                        let _ = std::io::stderr().flush();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .context("Failed to spawn progress thread")?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel and wakes the thread
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_ok() {
                eprintln!();
            }
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_complete() {
        assert_eq!(percent_complete(0, 4), 0.0);
        assert_eq!(percent_complete(1, 4), 25.0);
        assert_eq!(percent_complete(4, 4), 100.0);
        assert_eq!(percent_complete(0, 0), 100.0);
    }

    #[test]
    fn test_reporter_stops_promptly() {
        let cursor = Arc::new(JobCursor::new(10));
        cursor.claim();
        let reporter = ProgressReporter::spawn(Arc::clone(&cursor), Duration::from_millis(5)).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let start = std::time::Instant::now();
        reporter.stop();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
