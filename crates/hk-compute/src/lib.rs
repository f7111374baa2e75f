//! # HK-Compute: Heavy-Computation Reduction Kernel
//!
//! A triple-nested reduction over `i, j ∈ [0, size)`, `k ∈ [0, 100)` with a
//! state-dependent correction (`floor(acc) mod 100000 == 0` → `acc -= 5`).
//!
//! The crate separates three axes that optimized rewrites of the kernel tend
//! to blur:
//!
//! | Axis | Module | Effect on the result |
//! |------|--------|----------------------|
//! | Inner loop form (looped / closed form) | [`domain::kernel`] | rounding only |
//! | Correction granularity and accumulator scope | [`domain::correction`] | changes the value |
//! | Scheduling and merge | [`backends`], [`domain::merge`] | rounding only |
//!
//! Every combination that changes the value is a separate [`Variant`].
//! [`Variant::ClosedForm`] is the canonical definition used by [`evaluate`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hk_compute::{evaluate, evaluate_with, Variant};
//!
//! let canonical = evaluate(500)?;
//! let partitioned = evaluate_with(500, Variant::Partitioned, 8)?;
//! ```
//!
//! The crate performs no I/O and no timing; that belongs to the harness.

pub mod backends;
pub mod config;
pub mod domain;
pub mod error;
pub mod tasks;

pub use config::KernelConfig;
pub use domain::{MergeStrategy, PartitionDescriptor, Variant, WorkerResult};
pub use error::{KernelError, KernelResult};
pub use tasks::{Evaluation, HeavyComputationTask};

use backends::serial::SerialEngine;
use serde::Serialize;
use std::sync::Arc;

/// Compute backend capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Calling thread only
    Serial,
    /// CPU with a dedicated Rayon pool
    Cpu,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Serial => write!(f, "Serial"),
            Backend::Cpu => write!(f, "CPU (Rayon)"),
        }
    }
}

/// Device information
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend: Backend,
    pub workers: usize,
}

/// Compute engine trait - implemented by all backends
pub trait ComputeEngine: Send + Sync {
    /// Get backend type
    fn backend(&self) -> Backend;

    /// Get device info
    fn device_info(&self) -> &DeviceInfo;

    /// Run `work` once per descriptor and return the results in descriptor
    /// order, whatever order the workers finish in.
    fn map_partitions(
        &self,
        partitions: &[PartitionDescriptor],
        work: &(dyn Fn(&PartitionDescriptor) -> WorkerResult + Sync),
    ) -> Vec<WorkerResult>;
}

/// Hardware threads reported by the environment.
pub fn available_workers() -> usize {
    num_cpus::get()
}

/// Auto-detect and create the best available compute engine
pub fn auto_detect() -> KernelResult<Arc<dyn ComputeEngine>> {
    create_backend(Backend::Cpu, available_workers())
}

/// Create a specific backend.
///
/// Asking for the CPU backend with a single worker yields the serial engine.
/// Recoverable failures (zero workers) are logged and fall back to serial;
/// anything else is returned to the caller.
pub fn create_backend(backend: Backend, workers: usize) -> KernelResult<Arc<dyn ComputeEngine>> {
    let engine = match backend {
        Backend::Serial => serial_engine(),
        Backend::Cpu if workers == 1 => serial_engine(),
        Backend::Cpu => match cpu_engine(workers) {
            Ok(engine) => engine,
            Err(e) if e.is_recoverable() => {
                tracing::warn!("{}; falling back to serial scope", e);
                serial_engine()
            }
            Err(e) => return Err(e),
        },
    };
    tracing::info!("Using {}", engine.device_info().name);
    Ok(engine)
}

fn serial_engine() -> Arc<dyn ComputeEngine> {
    Arc::new(SerialEngine::new())
}

#[cfg(feature = "cpu")]
fn cpu_engine(workers: usize) -> KernelResult<Arc<dyn ComputeEngine>> {
    backends::cpu::CpuEngine::new(workers).map(|e| Arc::new(e) as Arc<dyn ComputeEngine>)
}

#[cfg(not(feature = "cpu"))]
fn cpu_engine(workers: usize) -> KernelResult<Arc<dyn ComputeEngine>> {
    tracing::warn!(
        "CPU backend not compiled in; running {} requested workers serially",
        workers
    );
    Ok(serial_engine())
}

/// Canonical kernel: closed-form inner sum, one check per pair, one worker.
pub fn evaluate(size: i64) -> KernelResult<f64> {
    HeavyComputationTask::new(size, Variant::CANONICAL)
        .execute(&serial_engine())
        .map(|eval| eval.value)
}

/// Evaluate `variant` with up to `workers` workers.
///
/// Whole-run variants cannot be split and always run serially.
pub fn evaluate_with(size: i64, variant: Variant, workers: usize) -> KernelResult<Evaluation> {
    let engine = create_backend(backend_for(variant), workers)?;
    HeavyComputationTask::new(size, variant).execute(&engine)
}

/// Evaluate according to a validated configuration.
pub fn evaluate_config(config: &KernelConfig) -> KernelResult<Evaluation> {
    config.validate()?;
    let engine = match (backend_for(config.variant), config.workers) {
        (Backend::Cpu, None) => auto_detect()?,
        (backend, _) => create_backend(backend, config.resolved_workers())?,
    };
    HeavyComputationTask::new(config.size, config.variant)
        .with_merge(config.merge)
        .execute(&engine)
}

fn backend_for(variant: Variant) -> Backend {
    if variant.is_parallel() {
        Backend::Cpu
    } else {
        Backend::Serial
    }
}
