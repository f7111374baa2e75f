//! Error types for the heavy-computation kernel

use thiserror::Error;

/// Errors surfaced by kernel evaluation.
///
/// Partition imbalance and merge ordering are not errors: they are enforced
/// by construction inside the partitioning and merge modules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("Invalid domain: size must be positive, got {size}")]
    InvalidDomain { size: i64 },

    #[error("No workers available for a parallel scope")]
    WorkerUnavailable,

    #[error("Numeric overflow: {what}")]
    NumericOverflow { what: &'static str },

    #[error("Worker pool initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate.
pub type KernelResult<T> = Result<T, KernelError>;

impl KernelError {
    /// Whether the caller can recover by switching to the serial scope.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, KernelError::WorkerUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_worker_unavailable_is_recoverable() {
        assert!(KernelError::WorkerUnavailable.is_recoverable());
        assert!(!KernelError::InvalidDomain { size: 0 }.is_recoverable());
        assert!(!KernelError::NumericOverflow { what: "i * j" }.is_recoverable());
    }

    #[test]
    fn test_display_includes_size() {
        let err = KernelError::InvalidDomain { size: -3 };
        assert_eq!(
            err.to_string(),
            "Invalid domain: size must be positive, got -3"
        );
    }
}
