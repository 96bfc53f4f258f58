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

//! Huntington-Hill seat apportionment.
//!
//! Distributes an integer number of indivisible slots proportionally to
//! weights. Keys whose weight reaches the qualification threshold receive
//! one automatic seat; the rest of the seats are handed out one at a time
//! to the key with the highest priority, where a key holding `n` seats has
//! priority `weight^2 / (n * (n + 1))`. A key never receives more seats
//! than its demand.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

struct Entry {
    priority: f64,
    key: String,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on priority; equal priorities break ties toward the
        // lexicographically smaller key so the result is deterministic.
        self.priority
            .partial_cmp(&other.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.key.cmp(&self.key))
    }
}

struct Standing {
    weight: f64,
    seats: i32,
    demand_left: i32,
}

/// Apportions `total` seats among the keys of `demand` proportionally to
/// `weights`.
///
/// Only keys with positive demand and positive weight are eligible. The
/// returned map carries a seat count for every eligible key (possibly
/// zero), and the counts sum to `min(total, sum of eligible demand)`.
///
/// # Arguments
///
/// * `weights` - Relative weight per key; keys absent here count as zero.
/// * `total` - Number of seats to distribute. `<= 0` yields all zeros.
/// * `demand` - Upper bound on the seats each key can absorb.
pub(crate) fn apportion(
    weights: &HashMap<String, f64>,
    total: i32,
    demand: &HashMap<String, i32>,
) -> HashMap<String, i32> {
    let mut seats: HashMap<String, i32> = HashMap::new();
    if total <= 0 {
        return seats;
    }

    let mut eligible: Vec<&String> = demand
        .iter()
        .filter(|(key, &want)| want > 0 && weights.get(*key).copied().unwrap_or(0.0) > 0.0)
        .map(|(key, _)| key)
        .collect();
    if eligible.is_empty() {
        return seats;
    }
    eligible.sort();

    let weight_sum: f64 = eligible.iter().map(|key| weights[*key]).sum();
    let threshold = weight_sum / total as f64;

    let mut remaining = total;
    let mut heap: BinaryHeap<Entry> = BinaryHeap::new();
    let mut standings: HashMap<String, Standing> = HashMap::new();
    for key in eligible {
        let weight = weights[key];
        let mut won = 0;
        let mut demand_left = demand[key];
        if weight >= threshold && remaining > 0 {
            won = 1;
            demand_left -= 1;
            remaining -= 1;
        }
        if demand_left > 0 {
            heap.push(Entry {
                priority: weight * weight / 2.0,
                key: key.clone(),
            });
        }
        standings.insert(
            key.clone(),
            Standing {
                weight,
                seats: won,
                demand_left,
            },
        );
    }

    while remaining > 0 {
        let Some(entry) = heap.pop() else {
            break;
        };
        let Some(standing) = standings.get_mut(&entry.key) else {
            continue;
        };
        standing.seats += 1;
        standing.demand_left -= 1;
        remaining -= 1;
        if standing.demand_left > 0 {
            let n = standing.seats as f64;
            heap.push(Entry {
                priority: standing.weight * standing.weight / (n * (n + 1.0)),
                key: entry.key,
            });
        }
    }

    for (key, standing) in standings {
        seats.insert(key, standing.seats);
    }
    seats
}
