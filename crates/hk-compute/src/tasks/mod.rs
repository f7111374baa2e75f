//! Tasks that drive the domain layer on a compute engine

pub mod heavy;

pub use heavy::{Evaluation, HeavyComputationTask};
