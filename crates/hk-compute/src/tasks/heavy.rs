//! Heavy-computation kernel task

use crate::domain::{
    partition, rows, Accumulator, AccumulatorScope, CheckGranularity, CorrectionPolicy, Domain,
    MergeSink, MergeStrategy, PartitionDescriptor, Variant, WorkerResult,
};
use crate::error::{KernelError, KernelResult};
use crate::{Backend, ComputeEngine};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// One kernel evaluation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeavyComputationTask {
    pub size: i64,
    pub variant: Variant,
    pub merge: MergeStrategy,
}

/// Outcome of a kernel evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub size: u64,
    pub variant: Variant,
    pub backend: Backend,
    pub workers: usize,
    /// Units of work merged into `value`.
    pub partitions: usize,
    pub value: f64,
    pub checks: u64,
    pub corrections: u64,
}

impl HeavyComputationTask {
    pub fn new(size: i64, variant: Variant) -> Self {
        Self {
            size,
            variant,
            merge: MergeStrategy::default(),
        }
    }

    pub fn with_merge(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }

    /// Execute the kernel on the given compute engine.
    pub fn execute(self, engine: &Arc<dyn ComputeEngine>) -> KernelResult<Evaluation> {
        let domain = Domain::new(self.size)?;
        let workers = engine.device_info().workers;
        let sink = MergeSink::new(self.merge);

        let results = match (self.variant.scope(), self.variant.granularity()) {
            (AccumulatorScope::WholeRun, Some(granularity)) => {
                // A single running total cannot be split.
                let whole = PartitionDescriptor::new(0, 0, domain.size());
                let result = accumulate_rows(&domain, &whole, granularity);
                sink.publish(&result);
                vec![result]
            }
            (AccumulatorScope::PerPartition, Some(granularity)) => {
                let parts = partition(domain.size(), workers)?;
                engine.map_partitions(&parts, &|part| {
                    let result = accumulate_rows(&domain, part, granularity);
                    sink.publish(&result);
                    result
                })
            }
            (AccumulatorScope::PerRow, Some(granularity)) => {
                engine.map_partitions(&rows(domain.size()), &|row| {
                    let result = accumulate_rows(&domain, row, granularity);
                    sink.publish(&result);
                    result
                })
            }
            (AccumulatorScope::PerUnit, _) => {
                let parts = partition(domain.unit_count()?, workers)?;
                let policy = CorrectionPolicy::default();
                engine.map_partitions(&parts, &|part| {
                    let result = sum_units(&domain, part, &policy);
                    sink.publish(&result);
                    result
                })
            }
            (scope, None) => {
                return Err(KernelError::InvalidConfig(format!(
                    "variant {} has no check granularity for scope {:?}",
                    self.variant, scope
                )));
            }
        };

        let evaluation = Evaluation {
            size: domain.size(),
            variant: self.variant,
            backend: engine.backend(),
            workers,
            partitions: results.len(),
            value: sink.total(&results),
            checks: results.iter().map(|r| r.checks).sum(),
            corrections: results.iter().map(|r| r.corrections).sum(),
        };

        debug!(
            variant = %evaluation.variant,
            size = evaluation.size,
            partitions = evaluation.partitions,
            corrections = evaluation.corrections,
            "kernel evaluated"
        );

        Ok(evaluation)
    }
}

/// Fold the outer rows of `part` into one exclusive accumulator.
fn accumulate_rows(
    domain: &Domain,
    part: &PartitionDescriptor,
    granularity: CheckGranularity,
) -> WorkerResult {
    let mut acc = Accumulator::new(granularity);
    for i in part.range() {
        for j in 0..domain.size() {
            acc.absorb_pair(domain.base(i, j));
        }
    }
    acc.finish(*part)
}

/// Sum independently corrected unit values over a flattened range.
fn sum_units(
    domain: &Domain,
    part: &PartitionDescriptor,
    policy: &CorrectionPolicy,
) -> WorkerResult {
    let mut total = 0.0;
    let mut corrections = 0;
    for flat in part.range() {
        let (i, j, k) = domain.unit_at(flat);
        let value = domain.unit_value(i, j, k);
        if policy.fires(value) {
            total += value - policy.adjustment;
            corrections += 1;
        } else {
            total += value;
        }
    }

    WorkerResult {
        partition: *part,
        value: total,
        checks: part.len(),
        corrections,
    }
}
