//! Kernel semantics: evaluator, correction policy, partitioning and merge.
//!
//! Nothing in here knows about threads. Engines in `backends` decide how
//! partitions are scheduled; this layer decides what each partition computes.

pub mod correction;
pub mod kernel;
pub mod merge;
pub mod partition;
pub mod variant;

pub use correction::{Accumulator, AccumulatorScope, CheckGranularity, CorrectionPolicy};
pub use kernel::{Domain, InnerForm, INNER_EXTENT, INNER_INDEX_SUM};
pub use merge::{merge, pairwise_sum, AtomicF64, MergeSink, MergeStrategy, WorkerResult};
pub use partition::{partition, rows, PartitionDescriptor};
pub use variant::Variant;
