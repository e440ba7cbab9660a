//! Immutable request schedule
//!
//! The schedule is built once from the parser output and never mutated. Order is
//! the original trace order, which is also the dispatch (claim) order; requests
//! are not re-sorted by arrival time.

use super::{OpKind, Request};
use crate::error::ReplayError;
use crate::Result;

/// Ordered, fixed-length sequence of trace requests
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    requests: Box<[Request]>,
}

impl Schedule {
    /// Build a schedule from requests in trace order
    pub fn new(requests: Vec<Request>) -> Self {
        Self {
            requests: requests.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Request at `index`, or `None` past the end
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Request> {
        self.requests.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Request> {
        self.requests.iter()
    }

    /// Check every request against the direct IO alignment boundary
    ///
    /// Both the byte offset and the byte length must be multiples of
    /// `alignment`.
    pub fn validate(&self, alignment: usize) -> Result<()> {
        let align = alignment as u64;
        for (index, req) in self.requests.iter().enumerate() {
            if req.block_offset % align != 0 || req.byte_size % align != 0 {
                return Err(ReplayError::Misaligned {
                    index,
                    offset: req.block_offset,
                    size: req.byte_size,
                    alignment,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Enforce the request cap used to bound metrics volume
    ///
    /// The cap only applies when latency recording is enabled.
    pub fn check_capacity(&self, max_requests: usize, record_latency: bool) -> Result<()> {
        if record_latency && self.len() > max_requests {
            return Err(ReplayError::TraceTooLarge {
                count: self.len(),
                max: max_requests,
            }
            .into());
        }
        Ok(())
    }

    pub fn read_count(&self) -> usize {
        self.requests.iter().filter(|r| r.kind == OpKind::Read).count()
    }

    pub fn write_count(&self) -> usize {
        self.requests.iter().filter(|r| r.kind == OpKind::Write).count()
    }

    /// Sum of all transfer sizes in bytes
    pub fn total_bytes(&self) -> u64 {
        self.requests.iter().map(|r| r.byte_size).sum()
    }

    /// Largest single transfer in bytes
    pub fn max_request_bytes(&self) -> u64 {
        self.requests.iter().map(|r| r.byte_size).max().unwrap_or(0)
    }

    /// Highest byte offset any request touches (exclusive)
    pub fn device_span(&self) -> u64 {
        self.requests.iter().map(Request::end_offset).max().unwrap_or(0)
    }

    /// Latest arrival offset in milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.requests
            .iter()
            .map(|r| r.arrival_offset_ms)
            .fold(0.0, f64::max)
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a Request;
    type IntoIter = std::slice::Iter<'a, Request>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(ms: f64, offset: u64, size: u64, kind: OpKind) -> Request {
        Request {
            arrival_offset_ms: ms,
            block_offset: offset,
            byte_size: size,
            kind,
            op_flag: if kind == OpKind::Write { 0 } else { 1 },
        }
    }

    #[test]
    fn test_order_is_preserved_not_sorted() {
        let schedule = Schedule::new(vec![
            request(30.0, 0, 512, OpKind::Read),
            request(10.0, 512, 512, OpKind::Write),
            request(20.0, 1024, 512, OpKind::Read),
        ]);
        let arrivals: Vec<f64> = schedule.iter().map(|r| r.arrival_offset_ms).collect();
        assert_eq!(arrivals, vec![30.0, 10.0, 20.0]);
        assert!(schedule.get(3).is_none());
    }

    #[test]
    fn test_summary_accessors() {
        let schedule = Schedule::new(vec![
            request(0.0, 51200, 4096, OpKind::Write),
            request(10.0, 102400, 2048, OpKind::Read),
            request(50.0, 153600, 1024, OpKind::Write),
        ]);
        assert_eq!(schedule.read_count(), 1);
        assert_eq!(schedule.write_count(), 2);
        assert_eq!(schedule.total_bytes(), 7168);
        assert_eq!(schedule.max_request_bytes(), 4096);
        assert_eq!(schedule.device_span(), 154624);
        assert_eq!(schedule.duration_ms(), 50.0);
    }

    #[test]
    fn test_validate_alignment() {
        let schedule = Schedule::new(vec![
            request(0.0, 4096, 4096, OpKind::Read),
            request(1.0, 4608, 512, OpKind::Read),
        ]);
        assert!(schedule.validate(512).is_ok());

        let err = schedule.validate(4096).unwrap_err();
        match err.downcast_ref::<ReplayError>() {
            Some(ReplayError::Misaligned { index, offset, .. }) => {
                assert_eq!(*index, 1);
                assert_eq!(*offset, 4608);
            }
            other => panic!("expected misaligned error, got {:?}", other),
        }
    }

    #[test]
    fn test_check_capacity() {
        let schedule = Schedule::new(vec![
            request(0.0, 0, 512, OpKind::Read),
            request(1.0, 0, 512, OpKind::Read),
            request(2.0, 0, 512, OpKind::Read),
        ]);
        assert!(schedule.check_capacity(3, true).is_ok());
        assert!(schedule.check_capacity(2, false).is_ok());

        let err = schedule.check_capacity(2, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReplayError>(),
            Some(ReplayError::TraceTooLarge { count: 3, max: 2 })
        ));
    }

    #[test]
    fn test_empty_schedule() {
        let schedule = Schedule::default();
        assert!(schedule.is_empty());
        assert_eq!(schedule.device_span(), 0);
        assert_eq!(schedule.max_request_bytes(), 0);
        assert_eq!(schedule.duration_ms(), 0.0);
    }
}
