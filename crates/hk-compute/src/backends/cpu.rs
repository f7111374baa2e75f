//! CPU compute backend using Rayon
//!
//! Each engine owns a dedicated thread pool sized to the requested worker
//! count, so partitioned scopes run on exactly that many threads regardless
//! of the global Rayon pool.

use crate::domain::{PartitionDescriptor, WorkerResult};
use crate::error::{KernelError, KernelResult};
use crate::{Backend, ComputeEngine, DeviceInfo};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// CPU-based compute engine using Rayon
pub struct CpuEngine {
    pool: ThreadPool,
    device_info: DeviceInfo,
}

impl CpuEngine {
    pub fn new(workers: usize) -> KernelResult<Self> {
        if workers == 0 {
            return Err(KernelError::WorkerUnavailable);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("hk-worker-{index}"))
            .build()
            .map_err(|e| KernelError::InitializationFailed(e.to_string()))?;

        Ok(Self {
            pool,
            device_info: DeviceInfo {
                name: format!("CPU ({} workers)", workers),
                backend: Backend::Cpu,
                workers,
            },
        })
    }
}

impl ComputeEngine for CpuEngine {
    fn backend(&self) -> Backend {
        Backend::Cpu
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    fn map_partitions(
        &self,
        partitions: &[PartitionDescriptor],
        work: &(dyn Fn(&PartitionDescriptor) -> WorkerResult + Sync),
    ) -> Vec<WorkerResult> {
        // Indexed collect keeps partition order whatever the finish order.
        self.pool
            .install(|| partitions.par_iter().map(|p| work(p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::partition;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn test_zero_workers_is_unavailable() {
        assert!(matches!(
            CpuEngine::new(0),
            Err(KernelError::WorkerUnavailable)
        ));
    }

    #[test]
    fn test_results_follow_partition_order() {
        let engine = CpuEngine::new(4).unwrap();
        let parts = partition(103, 4).unwrap();

        let results = engine.map_partitions(&parts, &|p| WorkerResult {
            partition: *p,
            value: p.start as f64,
            checks: 0,
            corrections: 0,
        });

        assert_eq!(results.len(), 4);
        for (result, part) in results.iter().zip(&parts) {
            assert_eq!(result.partition, *part);
        }
    }

    #[test]
    fn test_work_runs_on_pool_threads() {
        let engine = CpuEngine::new(2).unwrap();
        let parts = partition(16, 16).unwrap();
        let names = Mutex::new(HashSet::new());

        engine.map_partitions(&parts, &|p| {
            let name = std::thread::current().name().map(str::to_owned);
            names.lock().unwrap().insert(name);
            WorkerResult {
                partition: *p,
                value: 0.0,
                checks: 0,
                corrections: 0,
            }
        });

        let names = names.into_inner().unwrap();
        assert!(!names.is_empty() && names.len() <= 2);
        assert!(names
            .iter()
            .all(|n| n.as_deref().is_some_and(|n| n.starts_with("hk-worker-"))));
    }
}
