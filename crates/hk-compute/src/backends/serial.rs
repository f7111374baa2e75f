//! Serial backend
//!
//! Runs every partition on the calling thread, in order. This is the
//! fallback whenever a parallel scope has fewer than two workers.

use crate::domain::{PartitionDescriptor, WorkerResult};
use crate::{Backend, ComputeEngine, DeviceInfo};

pub struct SerialEngine {
    device_info: DeviceInfo,
}

impl SerialEngine {
    pub fn new() -> Self {
        Self {
            device_info: DeviceInfo {
                name: "Serial (calling thread)".to_string(),
                backend: Backend::Serial,
                workers: 1,
            },
        }
    }
}

impl Default for SerialEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeEngine for SerialEngine {
    fn backend(&self) -> Backend {
        Backend::Serial
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    fn map_partitions(
        &self,
        partitions: &[PartitionDescriptor],
        work: &(dyn Fn(&PartitionDescriptor) -> WorkerResult + Sync),
    ) -> Vec<WorkerResult> {
        partitions.iter().map(work).collect()
    }
}
