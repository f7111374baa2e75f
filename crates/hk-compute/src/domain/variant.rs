//! Catalogue of semantic variants
//!
//! Each variant is its own function of `size` (and, for partitioned scopes,
//! of the worker count). They differ in where the correction check fires and
//! who owns the accumulator, so none of them is a drop-in replacement for
//! another. `ClosedForm` is the canonical definition.

use super::correction::{AccumulatorScope, CheckGranularity};
use super::kernel::InnerForm;
use crate::error::KernelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// One accumulator, check after every `k`.
    Baseline,
    /// One accumulator, inner loop summed first, check once per pair.
    HoistedLoop,
    /// One accumulator, inner loop replaced by `4950`, check once per pair.
    #[default]
    ClosedForm,
    /// One accumulator, check once per pair on the uncorrected sum,
    /// adjustments added at the end.
    DeferredCorrection,
    /// Private accumulator per worker partition, check once per pair.
    Partitioned,
    /// Fresh accumulator per outer row, check once per pair.
    RowLocal,
    /// Every `(i, j, k)` unit corrected in isolation, then summed.
    Flattened,
}

impl Variant {
    pub const ALL: [Variant; 7] = [
        Variant::Baseline,
        Variant::HoistedLoop,
        Variant::ClosedForm,
        Variant::DeferredCorrection,
        Variant::Partitioned,
        Variant::RowLocal,
        Variant::Flattened,
    ];

    pub const CANONICAL: Variant = Variant::ClosedForm;

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Baseline => "baseline",
            Variant::HoistedLoop => "hoisted-loop",
            Variant::ClosedForm => "closed-form",
            Variant::DeferredCorrection => "deferred-correction",
            Variant::Partitioned => "partitioned",
            Variant::RowLocal => "row-local",
            Variant::Flattened => "flattened",
        }
    }

    pub fn scope(&self) -> AccumulatorScope {
        match self {
            Variant::Baseline
            | Variant::HoistedLoop
            | Variant::ClosedForm
            | Variant::DeferredCorrection => AccumulatorScope::WholeRun,
            Variant::Partitioned => AccumulatorScope::PerPartition,
            Variant::RowLocal => AccumulatorScope::PerRow,
            Variant::Flattened => AccumulatorScope::PerUnit,
        }
    }

    /// Check granularity of the running accumulator, `None` for the
    /// per-unit map which has no running total.
    pub fn granularity(&self) -> Option<CheckGranularity> {
        match self {
            Variant::Baseline => Some(CheckGranularity::PerSubiteration),
            Variant::HoistedLoop | Variant::RowLocal => {
                Some(CheckGranularity::PerPair(InnerForm::Looped))
            }
            Variant::ClosedForm | Variant::Partitioned => {
                Some(CheckGranularity::PerPair(InnerForm::ClosedForm))
            }
            Variant::DeferredCorrection => Some(CheckGranularity::DeferredPerPair),
            Variant::Flattened => None,
        }
    }

    /// Whether the variant can spread work over more than one worker.
    pub fn is_parallel(&self) -> bool {
        self.scope() != AccumulatorScope::WholeRun
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| KernelError::InvalidConfig(format!("unknown variant: {s}")))
    }
}
