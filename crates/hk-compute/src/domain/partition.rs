//! Partitioning of an index space into units of work
//!
//! Descriptors are contiguous, ordered and non-overlapping. Their union is
//! exactly `[0, len)` and their sizes differ by at most one.

use crate::error::{KernelError, KernelResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Half-open range `[start, end)` assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionDescriptor {
    /// Position of this descriptor in the partition order.
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl PartitionDescriptor {
    pub fn new(index: usize, start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { index, start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Split `[0, len)` into exactly `workers` contiguous descriptors.
///
/// Each gets `len / workers` units and the first `len % workers` one more.
/// When `workers > len` the trailing descriptors are empty.
pub fn partition(len: u64, workers: usize) -> KernelResult<Vec<PartitionDescriptor>> {
    if workers == 0 {
        return Err(KernelError::WorkerUnavailable);
    }

    let w = workers as u64;
    let quota = len / w;
    let extra = len % w;

    let mut start = 0;
    let parts = (0..workers)
        .map(|index| {
            let size = quota + u64::from((index as u64) < extra);
            let part = PartitionDescriptor::new(index, start, start + size);
            start += size;
            part
        })
        .collect();

    Ok(parts)
}

/// One descriptor per outer index.
pub fn rows(len: u64) -> Vec<PartitionDescriptor> {
    (0..len)
        .map(|i| PartitionDescriptor::new(i as usize, i, i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_workers_is_unavailable() {
        assert_eq!(
            partition(10, 0).unwrap_err(),
            KernelError::WorkerUnavailable
        );
    }

    #[test]
    fn test_single_worker_covers_everything() {
        let parts = partition(500, 1).unwrap();
        assert_eq!(parts, vec![PartitionDescriptor::new(0, 0, 500)]);
    }

    #[test]
    fn test_remainder_goes_to_leading_partitions() {
        let parts = partition(10, 4).unwrap();
        let lens: Vec<u64> = parts.iter().map(|p| p.len()).collect();
        assert_eq!(lens, vec![3, 3, 2, 2]);
        assert_eq!(parts[0].range(), 0..3);
        assert_eq!(parts[3].range(), 8..10);
    }

    #[test]
    fn test_more_workers_than_units() {
        let parts = partition(2, 5).unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts.iter().filter(|p| p.is_empty()).count(), 3);
        assert_eq!(parts[1].range(), 1..2);
        assert_eq!(parts[4].start, 2);
    }

    #[test]
    fn test_rows_are_unit_width() {
        let parts = rows(3);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.len() == 1));
        assert_eq!(parts[2], PartitionDescriptor::new(2, 2, 3));
    }
}
