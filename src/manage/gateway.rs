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

//! Collaborator boundary of the scheduling core.
//!
//! Everything the core needs from the outside world — the persistence
//! store, cluster coordination and credential resolution — comes through
//! the [`Gateway`] trait, injected into the allocator, the scheduler and
//! the orchestration loop. The actual transfer launch sits behind
//! [`TransferLauncher`]. No component reaches a global handle.

use std::collections::HashMap;

use mockall::automock;

use crate::error::ServiceError;
use crate::transfer::{Pair, QueueId, TransferFile};

/// Ceiling applied when a storage endpoint carries no explicit inbound or
/// outbound configuration.
pub const DEFAULT_MAX_ACTIVE: i32 = 60;

/// Reason attached to transfers failed because no share configuration
/// allows their VO to run on the link. Stable, user-visible string.
pub const NO_SHARE_REASON: &str = "No share configured for this VO";

/// Per-endpoint concurrency configuration. Values of zero or below mean
/// "use the default ceiling".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageConfig {
    /// Maximum transfers running into the endpoint.
    pub inbound_max_active: i32,
    /// Maximum transfers running out of the endpoint.
    pub outbound_max_active: i32,
}

impl StorageConfig {
    /// Effective inbound ceiling.
    pub fn inbound_ceiling(&self) -> i32 {
        if self.inbound_max_active > 0 {
            self.inbound_max_active
        } else {
            DEFAULT_MAX_ACTIVE
        }
    }

    /// Effective outbound ceiling.
    pub fn outbound_ceiling(&self) -> i32 {
        if self.outbound_max_active > 0 {
            self.outbound_max_active
        } else {
            DEFAULT_MAX_ACTIVE
        }
    }
}

/// One (VO, weight) share entry configured for a link.
///
/// The `"public"` entry is the catch-all weight, split evenly among the VOs
/// without an explicit entry. A weight of exactly zero makes the VO's
/// transfers never selected on the link.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareConfig {
    /// VO the entry applies to, or `"public"`.
    pub vo: String,
    /// Non-negative share weight.
    pub weight: f64,
}

impl ShareConfig {
    /// Builds one share entry.
    pub fn new(vo: impl Into<String>, weight: f64) -> Self {
        Self {
            vo: vo.into(),
            weight,
        }
    }
}

/// Operations the scheduling core consumes from its persistence and
/// cluster-coordination boundary.
///
/// Queue and transfer snapshots are taken fresh each cycle; the store must
/// reflect active counts accurately enough that allocation does not
/// systematically over- or under-shoot.
#[automock]
pub trait Gateway: Send + Sync {
    /// Inbound/outbound ceilings for one endpoint; a missing configuration
    /// row yields a zeroed [`StorageConfig`] so the defaults apply.
    fn get_storage_config(&self, se: &str) -> Result<StorageConfig, ServiceError>;

    /// Share entries configured for one link; empty means equal fair share.
    fn get_share_config(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<Vec<ShareConfig>, ServiceError>;

    /// All non-empty (source, destination, VO) queues with pending work.
    fn get_queues_with_pending(&self) -> Result<Vec<QueueId>, ServiceError>;

    /// Configured capacity per link for the given queues.
    fn get_link_capacities(&self, queues: &[QueueId]) -> Result<HashMap<Pair, i32>, ServiceError>;

    /// Ready transfers for the given queues, grouped by VO and capped by
    /// the per-link slot budget. Links absent from `slots_per_link` are
    /// capped by the store's default batch size.
    fn get_ready_transfers(
        &self,
        queues: &[QueueId],
        slots_per_link: &HashMap<Pair, i32>,
    ) -> Result<HashMap<String, Vec<TransferFile>>, ServiceError>;

    /// Currently running transfer count per activity for one queue triple.
    fn get_active_count_in_activity(
        &self,
        source: &str,
        destination: &str,
        vo: &str,
    ) -> Result<HashMap<String, i32>, ServiceError>;

    /// Submitted (pending) transfer count per activity for one queue triple.
    fn get_submitted_count_in_activity(
        &self,
        source: &str,
        destination: &str,
        vo: &str,
    ) -> Result<HashMap<String, i32>, ServiceError>;

    /// Count of running transfer-worker processes matching `name`,
    /// cluster-wide.
    fn count_running_workers(&self, name: &str) -> Result<i32, ServiceError>;

    /// Fire-and-forget terminal FAILED report for one transfer. Used
    /// exclusively for unschedulable queues; never retried.
    fn report_failed(&self, transfer: &TransferFile, reason: &str) -> Result<(), ServiceError>;

    /// Whether this node currently holds the scheduling lease.
    fn is_lead_node(&self) -> bool;

    /// Whether this node is draining and must not dispatch new transfers.
    fn is_drain_mode(&self) -> bool;

    /// Resolves a usable proxy credential path for launching a transfer.
    fn resolve_proxy(&self, user_dn: &str, cred_id: &str) -> Result<String, ServiceError>;
}

/// Launches the external worker process for one accepted transfer. The
/// transfer-execution protocol itself is outside the core.
#[automock]
pub trait TransferLauncher: Send + Sync {
    /// Returns `true` when a worker was actually spawned for the transfer.
    fn launch(&self, transfer: &TransferFile, proxy: &str) -> bool;
}
