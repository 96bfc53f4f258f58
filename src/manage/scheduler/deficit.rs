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

//! Deficit-based fair-share scheduling.
//!
//! Runs a two-level Huntington-Hill apportionment on every link: first
//! across VOs by their effective weights, then across each VO's activities
//! with equal weights. The gap between a (VO, activity) pair's apportioned
//! slots and its currently-active transfers is its deficit; the pairs with
//! the largest deficits across all links are served first until the global
//! slot budget runs out.

use std::collections::HashMap;

use log::debug;

use super::apportionment::apportion;
use super::vo_shares::effective_weights;
use super::ScheduleOutcome;
use crate::error::ServiceError;
use crate::manage::gateway::Gateway;
use crate::transfer::{Pair, QueueId, TransferFile};

struct DeficitEntry {
    pair: Pair,
    vo: String,
    activity: String,
    deficit: i32,
    pending: i32,
}

/// Schedules up to `max_global_slots` transfers in descending-deficit
/// order.
///
/// Zero-weight VO queues are returned as unschedulable, the same way the
/// randomized path treats them.
pub(crate) fn do_deficit_schedule<G: Gateway + ?Sized>(
    gateway: &G,
    slots_per_link: &HashMap<Pair, i32>,
    queues: &[QueueId],
    max_global_slots: i32,
) -> Result<ScheduleOutcome, ServiceError> {
    let mut order: Vec<Pair> = Vec::new();
    let mut by_pair: HashMap<Pair, Vec<&QueueId>> = HashMap::new();
    for queue in queues {
        let pair = queue.pair();
        if !by_pair.contains_key(&pair) {
            order.push(pair.clone());
            by_pair.insert(pair.clone(), Vec::new());
        }
        if let Some(waiting) = by_pair.get_mut(&pair) {
            waiting.push(queue);
        }
    }

    let mut unschedulable = Vec::new();
    let mut entries: Vec<DeficitEntry> = Vec::new();
    for pair in &order {
        let link_slots = slots_per_link.get(pair).copied().unwrap_or(0);
        let waiting = by_pair.get(pair).map(Vec::as_slice).unwrap_or(&[]);

        let names: Vec<&str> = waiting.iter().map(|q| q.vo_name.as_str()).collect();
        let shares = gateway.get_share_config(&pair.source, &pair.destination)?;
        let weights = effective_weights(&names, &shares);

        let mut vo_weights: HashMap<String, f64> = HashMap::new();
        for queue in waiting {
            let weight = weights.get(&queue.vo_name).copied().unwrap_or(0.0);
            if weight > 0.0 {
                vo_weights.insert(queue.vo_name.clone(), weight);
            } else {
                debug!("vo {} has no positive share on {}", queue.vo_name, pair);
                unschedulable.push((*queue).clone());
            }
        }
        if link_slots <= 0 || vo_weights.is_empty() {
            continue;
        }

        // Per-activity demand counts, fetched once per (link, VO)
        let mut active_counts: HashMap<String, HashMap<String, i32>> = HashMap::new();
        let mut pending_counts: HashMap<String, HashMap<String, i32>> = HashMap::new();
        let mut vo_demand: HashMap<String, i32> = HashMap::new();
        for vo in vo_weights.keys() {
            let active =
                gateway.get_active_count_in_activity(&pair.source, &pair.destination, vo)?;
            let pending =
                gateway.get_submitted_count_in_activity(&pair.source, &pair.destination, vo)?;
            let demand: i32 = active.values().sum::<i32>() + pending.values().sum::<i32>();
            vo_demand.insert(vo.clone(), demand);
            active_counts.insert(vo.clone(), active);
            pending_counts.insert(vo.clone(), pending);
        }

        let vo_seats = apportion(&vo_weights, link_slots, &vo_demand);
        for (vo, seats) in vo_seats {
            let active = active_counts.remove(&vo).unwrap_or_default();
            let pending = pending_counts.remove(&vo).unwrap_or_default();

            let mut activity_weights: HashMap<String, f64> = HashMap::new();
            let mut activity_demand: HashMap<String, i32> = HashMap::new();
            for (activity, count) in active.iter().chain(pending.iter()) {
                activity_weights.insert(activity.clone(), 1.0);
                *activity_demand.entry(activity.clone()).or_insert(0) += count;
            }

            let activity_seats = apportion(&activity_weights, seats, &activity_demand);
            for activity in activity_demand.keys() {
                let should_have = activity_seats.get(activity).copied().unwrap_or(0);
                let running = active.get(activity).copied().unwrap_or(0);
                entries.push(DeficitEntry {
                    pair: pair.clone(),
                    vo: vo.clone(),
                    activity: activity.clone(),
                    deficit: should_have - running,
                    pending: pending.get(activity).copied().unwrap_or(0),
                });
            }
        }
    }

    entries.sort_by(|a, b| {
        b.deficit
            .cmp(&a.deficit)
            .then_with(|| a.pair.cmp(&b.pair))
            .then_with(|| a.vo.cmp(&b.vo))
            .then_with(|| a.activity.cmp(&b.activity))
    });

    // Global fill: largest deficits first, bounded by pending work and the
    // global slot budget
    let mut remaining = max_global_slots;
    let mut allowances: HashMap<(Pair, String, String), i32> = HashMap::new();
    let mut link_totals: HashMap<Pair, i32> = HashMap::new();
    for entry in &entries {
        if remaining <= 0 {
            break;
        }
        if entry.deficit <= 0 || entry.pending <= 0 {
            continue;
        }
        let granted = entry.deficit.min(entry.pending).min(remaining);
        remaining -= granted;
        *link_totals.entry(entry.pair.clone()).or_insert(0) += granted;
        allowances.insert(
            (entry.pair.clone(), entry.vo.clone(), entry.activity.clone()),
            granted,
        );
    }

    let mut fetch_queues: Vec<QueueId> = Vec::new();
    for queue in queues {
        let any_allowance = allowances
            .iter()
            .any(|((pair, vo, _), _)| *pair == queue.pair() && *vo == queue.vo_name);
        if any_allowance {
            fetch_queues.push(queue.clone());
        }
    }

    let fetched = if fetch_queues.is_empty() {
        HashMap::new()
    } else {
        gateway.get_ready_transfers(&fetch_queues, &link_totals)?
    };
    let mut scheduled: HashMap<String, Vec<TransferFile>> = HashMap::new();
    for (vo, files) in fetched {
        for file in files {
            let key = (file.pair(), vo.clone(), file.activity.clone());
            if let Some(left) = allowances.get_mut(&key) {
                if *left > 0 {
                    *left -= 1;
                    scheduled.entry(vo.clone()).or_default().push(file);
                }
            }
        }
    }

    Ok(ScheduleOutcome {
        scheduled,
        unschedulable,
    })
}
