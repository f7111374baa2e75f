//! Kernel evaluator
//!
//! The contribution of one outer pair `(i, j)` is
//! `base(i, j) * Σ_{k=0}^{99} k` with `base(i, j) = (i * j) / (size + 1)`.
//! The inner sum can be materialized term by term or replaced by the
//! constant `4950`; both agree up to floating-point rounding.

use crate::error::{KernelError, KernelResult};
use serde::{Deserialize, Serialize};

/// Extent of the fixed inner index `k ∈ [0, 100)`.
pub const INNER_EXTENT: u64 = 100;

/// `Σ_{k=0}^{99} k`.
pub const INNER_INDEX_SUM: u64 = INNER_EXTENT * (INNER_EXTENT - 1) / 2;

/// How the inner `k` loop is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InnerForm {
    /// Add `base * k` for every `k` in order.
    Looped,
    /// Multiply by `INNER_INDEX_SUM` once.
    ClosedForm,
}

impl InnerForm {
    /// Uncorrected contribution of one pair with the given base value.
    #[inline]
    pub fn inner_sum(self, base: f64) -> f64 {
        match self {
            InnerForm::Looped => inner_sum_looped(base),
            InnerForm::ClosedForm => inner_sum_closed(base),
        }
    }
}

/// Materialized inner loop.
#[inline]
pub fn inner_sum_looped(base: f64) -> f64 {
    let mut sum = 0.0;
    for k in 0..INNER_EXTENT {
        sum += base * k as f64;
    }
    sum
}

/// Closed-form inner loop.
#[inline]
pub fn inner_sum_closed(base: f64) -> f64 {
    base * INNER_INDEX_SUM as f64
}

/// Iteration domain of one kernel invocation.
///
/// Construction validates that every widened `i * j` product fits in `u64`.
/// The flattened `(i, j, k)` products are only covered once
/// [`Domain::unit_count`] has succeeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    size: u64,
    denom: f64,
}

impl Domain {
    /// Validate `size` and build the domain.
    pub fn new(size: i64) -> KernelResult<Self> {
        if size <= 0 {
            return Err(KernelError::InvalidDomain { size });
        }
        let size = size as u64;

        let plus_one = size
            .checked_add(1)
            .ok_or(KernelError::NumericOverflow { what: "size + 1" })?;
        (size - 1)
            .checked_mul(size - 1)
            .ok_or(KernelError::NumericOverflow { what: "i * j" })?;

        Ok(Self {
            size,
            denom: plus_one as f64,
        })
    }

    /// Outer extent: `i, j ∈ [0, size)`.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// `size + 1` as a real, hoisted out of the loops.
    pub fn denominator(&self) -> f64 {
        self.denom
    }

    /// `(i * j) / (size + 1)` with the product widened before conversion.
    #[inline]
    pub fn base(&self, i: u64, j: u64) -> f64 {
        debug_assert!(i < self.size && j < self.size);
        (i * j) as f64 / self.denom
    }

    /// Uncorrected contribution of `(i, j)`.
    #[inline]
    pub fn inner_sum(&self, i: u64, j: u64, form: InnerForm) -> f64 {
        form.inner_sum(self.base(i, j))
    }

    /// Size of the flattened `(i, j, k)` index space.
    ///
    /// Also checks that every `i * j * k` product of the space fits in `u64`.
    pub fn unit_count(&self) -> KernelResult<u64> {
        let last = self.size - 1;
        last.checked_mul(last)
            .and_then(|p| p.checked_mul(INNER_EXTENT - 1))
            .ok_or(KernelError::NumericOverflow { what: "i * j * k" })?;

        self.size
            .checked_mul(self.size)
            .and_then(|p| p.checked_mul(INNER_EXTENT))
            .ok_or(KernelError::NumericOverflow {
                what: "size * size * 100",
            })
    }

    /// Decompose a flattened unit index into `(i, j, k)`.
    ///
    /// `flat` must lie below a successful [`Domain::unit_count`].
    #[inline]
    pub(crate) fn unit_at(&self, flat: u64) -> (u64, u64, u64) {
        let row = self.size * INNER_EXTENT;
        let i = flat / row;
        let j = (flat % row) / INNER_EXTENT;
        let k = flat % INNER_EXTENT;
        (i, j, k)
    }

    /// Independent value of one `(i, j, k)` unit, without any running total.
    ///
    /// Unchecked: callers go through [`Domain::unit_count`] first.
    #[inline]
    pub(crate) fn unit_value(&self, i: u64, j: u64, k: u64) -> f64 {
        debug_assert!(i < self.size && j < self.size && k < INNER_EXTENT);
        (i * j * k) as f64 / self.denom
    }
}
