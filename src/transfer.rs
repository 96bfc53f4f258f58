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

//! Core records exchanged between the queue poller, the allocator and the
//! scheduler. All of them are produced fresh each scheduling cycle and
//! never mutated afterwards.

use std::fmt;

/// Ordered (source endpoint, destination endpoint) pair identifying one
/// transfer link. Identity key for link capacity and share configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    /// Source storage endpoint.
    pub source: String,
    /// Destination storage endpoint.
    pub destination: String,
}

impl Pair {
    /// Builds a link identity from its two endpoints.
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} => {}", self.source, self.destination)
    }
}

/// One schedulable unit of demand: a (source, destination, VO) queue with
/// the number of its transfers observed running when the cycle polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueId {
    /// Source storage endpoint.
    pub source_se: String,
    /// Destination storage endpoint.
    pub dest_se: String,
    /// Owning virtual organization.
    pub vo_name: String,
    /// Transfers of this exact triple currently running.
    pub active_count: u32,
}

impl QueueId {
    /// Builds a queue identity.
    pub fn new(
        source_se: impl Into<String>,
        dest_se: impl Into<String>,
        vo_name: impl Into<String>,
        active_count: u32,
    ) -> Self {
        Self {
            source_se: source_se.into(),
            dest_se: dest_se.into(),
            vo_name: vo_name.into(),
            active_count,
        }
    }

    /// The link this queue belongs to.
    pub fn pair(&self) -> Pair {
        Pair::new(self.source_se.clone(), self.dest_se.clone())
    }
}

/// Protocol parameters requested for a transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolParams {
    /// Number of parallel streams, 0 for the worker default.
    pub nostreams: i32,
    /// Transfer timeout in seconds, 0 for the worker default.
    pub timeout: i32,
    /// TCP buffer size in bytes, 0 for the worker default.
    pub buffer_size: i32,
}

/// One concrete transfer candidate, ready to be handed to a worker.
///
/// Owned by the orchestration loop for the duration of one cycle and then
/// moved into exactly one executor; never shared for concurrent mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFile {
    /// Numeric file id; 0 marks an invalid record that is never dispatched.
    pub file_id: u64,
    /// Owning job id.
    pub job_id: String,
    /// Owning virtual organization.
    pub vo_name: String,
    /// Activity class inside the VO.
    pub activity: String,
    /// Source storage endpoint.
    pub source_se: String,
    /// Destination storage endpoint.
    pub dest_se: String,
    /// Source SURL.
    pub source_surl: String,
    /// Destination SURL.
    pub dest_surl: String,
    /// Submitter distinguished name.
    pub user_dn: String,
    /// Delegated credential id.
    pub cred_id: String,
    /// User-declared filesize in bytes.
    pub user_filesize: u64,
    /// Requested protocol parameters.
    pub protocol: ProtocolParams,
}

impl TransferFile {
    /// The link this transfer runs on.
    pub fn pair(&self) -> Pair {
        Pair::new(self.source_se.clone(), self.dest_se.clone())
    }
}
