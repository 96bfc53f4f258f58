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

//! Transfer-scheduling core of a multi-tenant data-movement service.
//!
//! Many independent client organizations (VOs) submit file transfers between
//! pairs of storage endpoints. A finite pool of transfer-worker slots, plus
//! per-endpoint inbound/outbound concurrency ceilings, has to be divided
//! fairly among the competing (source, destination, VO, activity) queues on
//! every scheduling cycle. This crate provides the three pieces that do that
//! division: the allocator (slots per link), the scheduler (which VO and
//! activity get the slots) and the orchestration loop that polls pending
//! work, runs both and dispatches the selected transfers through a bounded
//! executor pool.
//!
//! Persistence, credential delegation and the transfer protocol itself stay
//! behind the [`Gateway`] and [`TransferLauncher`] traits.

#![allow(clippy::new_without_default)]
#![warn(
    missing_docs,
    clippy::redundant_static_lifetimes,
    clippy::enum_variant_names,
    clippy::clone_on_copy,
    clippy::unused_async
)]

mod config;
mod error;
mod manage;
mod transfer;
mod utils;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use manage::allocator::{Allocator, AllocatorAlgorithm, AllocatorState};
pub use manage::gateway::{
    Gateway, ShareConfig, StorageConfig, TransferLauncher, DEFAULT_MAX_ACTIVE, NO_SHARE_REASON,
};
pub use manage::scheduler::{
    RandomSource, ScheduleOutcome, Scheduler, SchedulerAlgorithm, WeightedRandom,
};
pub use manage::transfers::TransfersService;
pub use transfer::{Pair, ProtocolParams, QueueId, TransferFile};
