// Copyright (C) 2025 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Service configuration for the scheduling core.

use std::time::Duration;

use crate::manage::allocator::AllocatorAlgorithm;
use crate::manage::scheduler::SchedulerAlgorithm;

/// Tunables of the orchestration loop and its algorithms.
///
/// The hosting process fills this from whatever configuration source it
/// uses; [`Default`] matches the shipped service defaults.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Interval between scheduling cycles.
    pub scheduling_interval: Duration,
    /// Extra back-off applied while the node is in drain mode.
    pub drain_backoff: Duration,
    /// Size of the internal executor pool used for dispatch.
    pub exec_pool_size: usize,
    /// Hard ceiling on concurrently running transfer-worker processes.
    pub max_worker_processes: i32,
    /// Process name used when counting running workers.
    pub worker_process_name: String,
    /// Slot-allocation algorithm for links.
    pub allocator_algorithm: AllocatorAlgorithm,
    /// Transfer-selection algorithm per link.
    pub scheduler_algorithm: SchedulerAlgorithm,
    /// Cumulative per-link deficit at which a link counts as starved and is
    /// pre-allocated ahead of the flow solver.
    pub starvation_threshold: i32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scheduling_interval: Duration::from_secs(2),
            drain_backoff: Duration::from_secs(15),
            exec_pool_size: 10,
            max_worker_processes: 400,
            worker_process_name: "transfer_worker".to_string(),
            allocator_algorithm: AllocatorAlgorithm::default(),
            scheduler_algorithm: SchedulerAlgorithm::default(),
            starvation_threshold: 5,
        }
    }
}
