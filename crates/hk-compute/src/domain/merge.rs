//! Reduction merge of finished partition results
//!
//! Corrections are already baked into every `WorkerResult`; merging is a
//! plain numeric sum and never applies the correction policy.

use super::partition::PartitionDescriptor;
use crate::error::KernelError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Final accumulator state of one partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkerResult {
    pub partition: PartitionDescriptor,
    pub value: f64,
    /// Policy checks performed inside the partition.
    pub checks: u64,
    /// Checks that fired.
    pub corrections: u64,
}

/// How partition results reach the final scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Collect after join, then pairwise-sum in partition order.
    #[default]
    PostJoin,
    /// Each worker adds its value into a shared lock-free accumulator.
    Atomic,
    /// Each worker adds its value under a mutex.
    Locked,
}

impl MergeStrategy {
    pub const ALL: [MergeStrategy; 3] = [
        MergeStrategy::PostJoin,
        MergeStrategy::Atomic,
        MergeStrategy::Locked,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MergeStrategy::PostJoin => "post-join",
            MergeStrategy::Atomic => "atomic",
            MergeStrategy::Locked => "locked",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MergeStrategy {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MergeStrategy::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| KernelError::InvalidConfig(format!("unknown merge strategy: {s}")))
    }
}

/// Pairwise (tree) summation.
pub fn pairwise_sum(values: &[f64]) -> f64 {
    match values.len() {
        0 => 0.0,
        1 => values[0],
        n => {
            let (left, right) = values.split_at(n / 2);
            pairwise_sum(left) + pairwise_sum(right)
        }
    }
}

/// `f64` stored as raw bits, updated with a compare-exchange loop.
#[derive(Debug, Default)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub fn fetch_add(&self, delta: f64) -> f64 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self.bits.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

/// Shared destination workers publish into at partition completion.
#[derive(Debug)]
pub enum MergeSink {
    PostJoin,
    Atomic(AtomicF64),
    Locked(Mutex<f64>),
}

impl MergeSink {
    pub fn new(strategy: MergeStrategy) -> Self {
        match strategy {
            MergeStrategy::PostJoin => MergeSink::PostJoin,
            MergeStrategy::Atomic => MergeSink::Atomic(AtomicF64::new(0.0)),
            MergeStrategy::Locked => MergeSink::Locked(Mutex::new(0.0)),
        }
    }

    /// Called exactly once per finished partition, from the worker.
    pub fn publish(&self, result: &WorkerResult) {
        match self {
            MergeSink::PostJoin => {}
            MergeSink::Atomic(total) => {
                total.fetch_add(result.value);
            }
            MergeSink::Locked(total) => *total.lock() += result.value,
        }
    }

    /// Final scalar once every partition has published.
    pub fn total(&self, results: &[WorkerResult]) -> f64 {
        match self {
            MergeSink::PostJoin => {
                let values: Vec<f64> = results.iter().map(|r| r.value).collect();
                pairwise_sum(&values)
            }
            MergeSink::Atomic(total) => total.load(),
            MergeSink::Locked(total) => *total.lock(),
        }
    }
}

/// Merge already-collected results with the given strategy.
pub fn merge(results: &[WorkerResult], strategy: MergeStrategy) -> f64 {
    let sink = MergeSink::new(strategy);
    for result in results {
        sink.publish(result);
    }
    sink.total(results)
}
