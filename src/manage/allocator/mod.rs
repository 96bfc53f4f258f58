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

//! Slot allocation across links.
//!
//! Given the set of non-empty queues, the allocator decides how many
//! concurrent transfer slots each (source, destination) link may use this
//! cycle. The greedy algorithm grants every link its configured capacity;
//! the maximum-flow algorithm additionally respects each endpoint's
//! aggregate inbound/outbound ceiling by solving a flow network, and
//! carries a per-link deficit across cycles so starved links are served
//! ahead of the flow solver.

mod maximum_flow;

use std::collections::{HashMap, HashSet};

use log::debug;
use maximum_flow::MaximumFlowSolver;

use crate::error::ServiceError;
use crate::manage::gateway::Gateway;
use crate::transfer::{Pair, QueueId};

/// Slot-allocation algorithm for links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocatorAlgorithm {
    /// Every link gets its configured capacity; endpoint ceilings are not
    /// clipped. Simple and fast.
    #[default]
    Greedy,
    /// Maximum-flow over the endpoint capacity graph, with starved-link
    /// pre-allocation.
    MaximumFlow,
}

impl AllocatorAlgorithm {
    /// Parses a configured algorithm name. Unknown names fall back to the
    /// greedy algorithm rather than erroring.
    pub fn from_name(name: &str) -> Self {
        match name {
            "MAXIMUM_FLOW" => AllocatorAlgorithm::MaximumFlow,
            "GREEDY" => AllocatorAlgorithm::Greedy,
            _ => AllocatorAlgorithm::Greedy,
        }
    }
}

/// Cross-cycle allocator state: unmet demand per link.
///
/// This is the only mutable state the core carries between cycles. It is
/// owned by the orchestration loop (through [`Allocator`]) and updated once
/// per cycle by the maximum-flow algorithm; cycles are strictly sequential,
/// so no locking is involved.
#[derive(Debug, Clone, Default)]
pub struct AllocatorState {
    deficits: HashMap<Pair, i32>,
}

impl AllocatorState {
    /// Cumulative unmet demand recorded for one link, zero if unseen.
    pub fn deficit(&self, link: &Pair) -> i32 {
        self.deficits.get(link).copied().unwrap_or(0)
    }

    fn record(&mut self, link: Pair, deficit: i32) {
        self.deficits.insert(link, deficit);
    }
}

/// Decides how many concurrent slots each active link may use.
pub struct Allocator {
    algorithm: AllocatorAlgorithm,
    starvation_threshold: i32,
    state: AllocatorState,
}

impl Allocator {
    /// Creates an allocator with an empty deficit history.
    pub fn new(algorithm: AllocatorAlgorithm, starvation_threshold: i32) -> Self {
        Self {
            algorithm,
            starvation_threshold,
            state: AllocatorState::default(),
        }
    }

    /// The deficit state carried across cycles.
    pub fn state(&self) -> &AllocatorState {
        &self.state
    }

    /// Computes the slots-per-link map for this cycle's queues.
    ///
    /// A link with zero available capacity on either endpoint yields a zero
    /// allocation, not an error.
    pub fn allocate<G: Gateway + ?Sized>(
        &mut self,
        gateway: &G,
        queues: &[QueueId],
    ) -> Result<HashMap<Pair, i32>, ServiceError> {
        match self.algorithm {
            AllocatorAlgorithm::Greedy => self.greedy(gateway, queues),
            AllocatorAlgorithm::MaximumFlow => self.maximum_flow(gateway, queues),
        }
    }

    fn greedy<G: Gateway + ?Sized>(
        &self,
        gateway: &G,
        queues: &[QueueId],
    ) -> Result<HashMap<Pair, i32>, ServiceError> {
        let capacities = gateway.get_link_capacities(queues)?;
        let mut allocation = HashMap::new();
        for queue in queues {
            let link = queue.pair();
            let capacity = capacities.get(&link).copied().unwrap_or(0);
            allocation.insert(link, capacity);
        }
        Ok(allocation)
    }

    fn maximum_flow<G: Gateway + ?Sized>(
        &mut self,
        gateway: &G,
        queues: &[QueueId],
    ) -> Result<HashMap<Pair, i32>, ServiceError> {
        let capacities = gateway.get_link_capacities(queues)?;
        let (mut source_left, mut dest_left) = endpoint_budgets(gateway, queues)?;

        // Distinct links in first-seen order
        let mut links = Vec::new();
        let mut seen = HashSet::new();
        for queue in queues {
            let link = queue.pair();
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }

        let mut allocation: HashMap<Pair, i32> = HashMap::new();

        // Starved links are served before the flow solver so they cannot be
        // crowded out again; their grant is subtracted from the endpoint
        // budgets and the link is excluded from the graph.
        let mut starved: Vec<Pair> = links
            .iter()
            .filter(|link| self.state.deficit(link) >= self.starvation_threshold)
            .cloned()
            .collect();
        starved.sort_by(|a, b| {
            let cap_a = capacities.get(a).copied().unwrap_or(0);
            let cap_b = capacities.get(b).copied().unwrap_or(0);
            cap_b.cmp(&cap_a).then_with(|| a.cmp(b))
        });
        for link in &starved {
            let capacity = capacities.get(link).copied().unwrap_or(0);
            let src = source_left.get(&link.source).copied().unwrap_or(0);
            let dst = dest_left.get(&link.destination).copied().unwrap_or(0);
            let granted = capacity.min(src).min(dst).max(0);
            if granted > 0 {
                if let Some(left) = source_left.get_mut(&link.source) {
                    *left -= granted;
                }
                if let Some(left) = dest_left.get_mut(&link.destination) {
                    *left -= granted;
                }
            }
            debug!("starved link {} pre-allocated {} slots", link, granted);
            allocation.insert(link.clone(), granted);
        }
        let starved_set: HashSet<&Pair> = starved.iter().collect();

        // The flow solver works on array indices, so map endpoints first
        let mut se_to_idx: HashMap<&str, usize> = HashMap::new();
        let mut idx_to_se: Vec<&str> = Vec::new();
        for link in links.iter().filter(|l| !starved_set.contains(l)) {
            for se in [link.source.as_str(), link.destination.as_str()] {
                if !se_to_idx.contains_key(se) {
                    se_to_idx.insert(se, idx_to_se.len());
                    idx_to_se.push(se);
                }
            }
        }

        // Virtual source and sink take the next two indices. Budget edges
        // go in once per endpoint and only in the direction the endpoint is
        // actually used.
        let node_count = idx_to_se.len();
        let mut solver = MaximumFlowSolver::new(node_count + 2, node_count, node_count + 1);
        let mut budgeted_sources: HashSet<usize> = HashSet::new();
        let mut budgeted_dests: HashSet<usize> = HashSet::new();
        for link in links.iter().filter(|l| !starved_set.contains(l)) {
            let src = se_to_idx[link.source.as_str()];
            let dst = se_to_idx[link.destination.as_str()];
            if budgeted_sources.insert(src) {
                let outbound = source_left.get(&link.source).copied().unwrap_or(0);
                solver.add_edge(node_count, src, outbound);
            }
            if budgeted_dests.insert(dst) {
                let inbound = dest_left.get(&link.destination).copied().unwrap_or(0);
                solver.add_edge(dst, node_count + 1, inbound);
            }
            let capacity = capacities.get(link).copied().unwrap_or(0);
            solver.add_edge(src, dst, capacity);
        }

        let flows = solver.compute_maximum_flow();
        for link in links.iter().filter(|l| !starved_set.contains(l)) {
            let flow = flows
                .get(&(
                    se_to_idx[link.source.as_str()],
                    se_to_idx[link.destination.as_str()],
                ))
                .copied()
                .unwrap_or(0);
            allocation.insert(link.clone(), flow);
        }

        // Unmet demand feeds next cycle's starvation detection
        for link in links {
            let capacity = capacities.get(&link).copied().unwrap_or(0);
            let allocated = allocation.get(&link).copied().unwrap_or(0);
            self.state.record(link, capacity - allocated);
        }

        Ok(allocation)
    }
}

/// Remaining outbound and inbound slots per endpoint: the configured
/// ceiling (fetched once per endpoint, both directions in one go) minus the
/// observed running transfers.
pub(crate) fn endpoint_budgets<G: Gateway + ?Sized>(
    gateway: &G,
    queues: &[QueueId],
) -> Result<(HashMap<String, i32>, HashMap<String, i32>), ServiceError> {
    let mut source_left: HashMap<String, i32> = HashMap::new();
    let mut dest_left: HashMap<String, i32> = HashMap::new();
    for queue in queues {
        if !dest_left.contains_key(&queue.dest_se) {
            let config = gateway.get_storage_config(&queue.dest_se)?;
            dest_left.insert(queue.dest_se.clone(), config.inbound_ceiling());
            source_left.insert(queue.dest_se.clone(), config.outbound_ceiling());
        }
        if !source_left.contains_key(&queue.source_se) {
            let config = gateway.get_storage_config(&queue.source_se)?;
            dest_left.insert(queue.source_se.clone(), config.inbound_ceiling());
            source_left.insert(queue.source_se.clone(), config.outbound_ceiling());
        }
        // Once both directions are filled, subtract the running transfers
        if let Some(left) = dest_left.get_mut(&queue.dest_se) {
            *left -= queue.active_count as i32;
        }
        if let Some(left) = source_left.get_mut(&queue.source_se) {
            *left -= queue.active_count as i32;
        }
    }
    Ok((source_left, dest_left))
}
