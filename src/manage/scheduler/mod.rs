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

//! Transfer scheduling.
//!
//! Turns the allocator's slots-per-link map into concrete transfers to
//! run. The randomized algorithm lets one weighted-randomly chosen VO use
//! each link; the deficit algorithm splits every link's slots across VOs
//! and activities by proportional-fair apportionment and serves the most
//! underserved queues first.

mod apportionment;
mod deficit;
mod vo_shares;

use std::collections::HashMap;

pub use vo_shares::{RandomSource, WeightedRandom};

use vo_shares::apply_vo_shares;

use crate::error::ServiceError;
use crate::manage::gateway::Gateway;
use crate::transfer::{Pair, QueueId, TransferFile};

/// Scheduling algorithm choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerAlgorithm {
    /// One weighted-random VO wins each link.
    #[default]
    Randomized,
    /// Two-level proportional-fair apportionment with deficit ordering.
    Deficit,
}

impl SchedulerAlgorithm {
    /// Parses a configured algorithm name. Unknown names fall back to the
    /// randomized algorithm rather than erroring.
    pub fn from_name(name: &str) -> Self {
        match name {
            "DEFICIT" => SchedulerAlgorithm::Deficit,
            "RANDOMIZED" => SchedulerAlgorithm::Randomized,
            _ => SchedulerAlgorithm::Randomized,
        }
    }
}

/// What one scheduling pass decided.
pub struct ScheduleOutcome {
    /// Transfers to dispatch this cycle, grouped by VO.
    pub scheduled: HashMap<String, Vec<TransferFile>>,
    /// Queues that cannot be scheduled until their share configuration
    /// changes. The caller must fail their transfers.
    pub unschedulable: Vec<QueueId>,
}

/// Decides which queued transfers use the allocated slots.
pub struct Scheduler {
    algorithm: SchedulerAlgorithm,
}

impl Scheduler {
    /// Creates a scheduler running the given algorithm.
    pub fn new(algorithm: SchedulerAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Runs one scheduling pass over this cycle's queues.
    pub fn schedule<G: Gateway + ?Sized, R: RandomSource + ?Sized>(
        &self,
        gateway: &G,
        random: &mut R,
        slots_per_link: &HashMap<Pair, i32>,
        queues: &[QueueId],
        max_global_slots: i32,
    ) -> Result<ScheduleOutcome, ServiceError> {
        match self.algorithm {
            SchedulerAlgorithm::Randomized => {
                do_randomized_schedule(gateway, random, slots_per_link, queues)
            }
            SchedulerAlgorithm::Deficit => {
                deficit::do_deficit_schedule(gateway, slots_per_link, queues, max_global_slots)
            }
        }
    }
}

fn do_randomized_schedule<G: Gateway + ?Sized, R: RandomSource + ?Sized>(
    gateway: &G,
    random: &mut R,
    slots_per_link: &HashMap<Pair, i32>,
    queues: &[QueueId],
) -> Result<ScheduleOutcome, ServiceError> {
    let (winners, unschedulable) = apply_vo_shares(gateway, random, queues)?;
    let scheduled = if winners.is_empty() {
        HashMap::new()
    } else {
        gateway.get_ready_transfers(&winners, slots_per_link)?
    };
    Ok(ScheduleOutcome {
        scheduled,
        unschedulable,
    })
}
