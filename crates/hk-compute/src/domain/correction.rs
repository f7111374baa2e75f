//! Correction policy and the scopes it observes
//!
//! The policy itself is a pure function of one value. What changes the
//! computed result is *where* it is applied: every application perturbs the
//! accumulator and therefore every later check against it. The granularity
//! is modelled explicitly here instead of being an inlined conditional.

use super::kernel::{InnerForm, INNER_EXTENT};
use super::merge::WorkerResult;
use super::partition::PartitionDescriptor;
use serde::{Deserialize, Serialize};

/// `floor(value) mod modulus == 0` → subtract `adjustment`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionPolicy {
    pub modulus: f64,
    pub adjustment: f64,
}

impl Default for CorrectionPolicy {
    fn default() -> Self {
        Self {
            modulus: 100_000.0,
            adjustment: 5.0,
        }
    }
}

impl CorrectionPolicy {
    /// Whether the policy fires for `value`.
    ///
    /// `floor` and `%` are both exact for every finite `f64`, so the check
    /// never rounds, whatever the magnitude of the accumulator.
    #[inline]
    pub fn fires(&self, value: f64) -> bool {
        value.floor() % self.modulus == 0.0
    }

    /// `value` after one check.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        if self.fires(value) {
            value - self.adjustment
        } else {
            value
        }
    }
}

/// When the policy observes a running accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckGranularity {
    /// After each of the 100 `k` additions of a pair.
    PerSubiteration,
    /// Once after the full inner sum of a pair has been added.
    PerPair(InnerForm),
    /// Once per pair against the uncorrected running sum; adjustments are
    /// held in a separate register until the scope finishes.
    DeferredPerPair,
}

impl CheckGranularity {
    /// Policy checks per absorbed pair.
    pub fn checks_per_pair(&self) -> u64 {
        match self {
            CheckGranularity::PerSubiteration => INNER_EXTENT,
            CheckGranularity::PerPair(_) | CheckGranularity::DeferredPerPair => 1,
        }
    }
}

/// Owner of an accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccumulatorScope {
    /// One accumulator for the whole run.
    WholeRun,
    /// One accumulator per worker partition of outer rows.
    PerPartition,
    /// A fresh accumulator per outer index `i`.
    PerRow,
    /// No running total: the policy sees each `(i, j, k)` value alone.
    PerUnit,
}

/// Scope-local running sum. Owned exclusively by one worker.
#[derive(Debug, Clone)]
pub struct Accumulator {
    value: f64,
    deferred: f64,
    granularity: CheckGranularity,
    policy: CorrectionPolicy,
    checks: u64,
    corrections: u64,
}

impl Accumulator {
    pub fn new(granularity: CheckGranularity) -> Self {
        Self::with_policy(granularity, CorrectionPolicy::default())
    }

    pub fn with_policy(granularity: CheckGranularity, policy: CorrectionPolicy) -> Self {
        Self {
            value: 0.0,
            deferred: 0.0,
            granularity,
            policy,
            checks: 0,
            corrections: 0,
        }
    }

    /// Add the contribution of one pair with the given base value.
    pub fn absorb_pair(&mut self, base: f64) {
        match self.granularity {
            CheckGranularity::PerSubiteration => {
                for k in 0..INNER_EXTENT {
                    self.value += base * k as f64;
                    self.check_in_place();
                }
            }
            CheckGranularity::PerPair(form) => {
                self.value += form.inner_sum(base);
                self.check_in_place();
            }
            CheckGranularity::DeferredPerPair => {
                for k in 0..INNER_EXTENT {
                    self.value += base * k as f64;
                }
                self.checks += 1;
                if self.policy.fires(self.value) {
                    self.deferred -= self.policy.adjustment;
                    self.corrections += 1;
                }
            }
        }
    }

    #[inline]
    fn check_in_place(&mut self) {
        self.checks += 1;
        if self.policy.fires(self.value) {
            self.value -= self.policy.adjustment;
            self.corrections += 1;
        }
    }

    /// Current value, including any deferred adjustments.
    pub fn value(&self) -> f64 {
        self.value + self.deferred
    }

    pub fn checks(&self) -> u64 {
        self.checks
    }

    pub fn corrections(&self) -> u64 {
        self.corrections
    }

    /// Close the scope and publish its result.
    pub fn finish(self, partition: PartitionDescriptor) -> WorkerResult {
        WorkerResult {
            partition,
            value: self.value(),
            checks: self.checks,
            corrections: self.corrections,
        }
    }
}
