//! Kernel run configuration
//!
//! Defaults describe the reference workload. Environment variables
//! (`HK_SIZE`, `HK_WORKERS`, `HK_VARIANT`, `HK_MERGE`) override them.
//!
//! # Example
//!
//! ```ignore
//! use hk_compute::{KernelConfig, Variant};
//!
//! let config = KernelConfig::default()
//!     .with_variant(Variant::Partitioned)
//!     .with_workers(4);
//! config.validate()?;
//! ```

use crate::domain::{MergeStrategy, Variant};
use crate::error::{KernelError, KernelResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Reference domain size.
pub const DEFAULT_SIZE: i64 = 500;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Outer extent of the domain
    pub size: i64,
    /// Worker count; `None` uses every available hardware thread
    pub workers: Option<usize>,
    /// Semantic variant to evaluate
    pub variant: Variant,
    /// How partition results are combined
    pub merge: MergeStrategy,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            workers: None,
            variant: Variant::CANONICAL,
            merge: MergeStrategy::PostJoin,
        }
    }
}

impl KernelConfig {
    /// Defaults overridden by `HK_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("HK_SIZE") {
            match raw.parse() {
                Ok(size) => config.size = size,
                Err(_) => warn!("HK_SIZE must be an integer, ignoring {:?}", raw),
            }
        }
        if let Some(raw) = lookup("HK_WORKERS") {
            match raw.parse() {
                Ok(workers) => config.workers = Some(workers),
                Err(_) => warn!("HK_WORKERS must be a worker count, ignoring {:?}", raw),
            }
        }
        if let Some(raw) = lookup("HK_VARIANT") {
            match raw.parse() {
                Ok(variant) => config.variant = variant,
                Err(e) => warn!("HK_VARIANT: {}", e),
            }
        }
        if let Some(raw) = lookup("HK_MERGE") {
            match raw.parse() {
                Ok(merge) => config.merge = merge,
                Err(e) => warn!("HK_MERGE: {}", e),
            }
        }

        config
    }

    /// A worker count of zero is not rejected here: engine creation recovers
    /// from it by falling back to the serial scope.
    pub fn validate(&self) -> KernelResult<()> {
        if self.size <= 0 {
            return Err(KernelError::InvalidDomain { size: self.size });
        }
        Ok(())
    }

    /// Explicit worker count, or every available hardware thread.
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(crate::available_workers)
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_merge(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }
}
