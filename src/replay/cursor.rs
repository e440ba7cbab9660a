//! Shared job cursor
//!
//! Workers claim schedule indices with a single `fetch_add`. Every index in
//! `0..len` is handed out exactly once and claims are strictly increasing; once
//! the counter passes `len` every further claim reports exhaustion.

use crossbeam::utils::CachePadded;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Atomic next-request counter over a schedule of `len` requests
#[derive(Debug)]
pub struct JobCursor {
    next: CachePadded<AtomicUsize>,
    len: usize,
}

impl JobCursor {
    pub fn new(len: usize) -> Self {
        Self {
            next: CachePadded::new(AtomicUsize::new(0)),
            len,
        }
    }

    /// Claim the next unclaimed index, or `None` once the schedule is exhausted
    #[inline]
    pub fn claim(&self) -> Option<usize> {
        // Each worker claims at most once past the end before exiting, so the
        // counter cannot wrap.
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        (index < self.len).then_some(index)
    }

    /// Number of indices handed out so far
    #[inline]
    pub fn claimed(&self) -> usize {
        self.next.load(Ordering::Relaxed).min(self.len)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_exhausted(&self) -> bool {
        self.next.load(Ordering::Relaxed) >= self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_sequential_claims() {
        let cursor = JobCursor::new(3);
        assert_eq!(cursor.claim(), Some(0));
        assert_eq!(cursor.claim(), Some(1));
        assert_eq!(cursor.claimed(), 2);
        assert!(!cursor.is_exhausted());
        assert_eq!(cursor.claim(), Some(2));
        assert_eq!(cursor.claim(), None);
        assert_eq!(cursor.claim(), None);
        assert_eq!(cursor.claimed(), 3);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_empty_cursor() {
        let cursor = JobCursor::new(0);
        assert!(cursor.is_empty());
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.claim(), None);
        assert_eq!(cursor.claimed(), 0);
    }

    #[test]
    fn test_concurrent_claims_are_unique_and_complete() {
        const N: usize = 100_000;
        const THREADS: usize = 16;

        let cursor = Arc::new(JobCursor::new(N));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cursor = Arc::clone(&cursor);
                std::thread::spawn(move || {
                    let mut claimed = Vec::new();
                    while let Some(index) = cursor.claim() {
                        claimed.push(index);
                    }
                    claimed
                })
            })
            .collect();

        let mut seen = vec![false; N];
        for handle in handles {
            let claimed = handle.join().unwrap();
            // Claims within one thread are strictly increasing
            assert!(claimed.windows(2).all(|w| w[0] < w[1]));
            for index in claimed {
                assert!(!seen[index], "index {} claimed twice", index);
                seen[index] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(cursor.claimed(), N);
    }
}
