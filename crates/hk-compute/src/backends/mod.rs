//! Execution backends
//!
//! A backend only decides how partition descriptors are scheduled. What a
//! partition computes is fixed by the caller's closure, so every backend
//! yields the same `WorkerResult`s for the same descriptors.

pub mod serial;

#[cfg(feature = "cpu")]
pub mod cpu;
