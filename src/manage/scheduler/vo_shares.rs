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

//! Weighted-random VO selection per link.
//!
//! When several VOs have pending work on the same link, exactly one of
//! them wins the link for this cycle through a single weighted-random
//! draw. VOs without a positive effective weight cannot win and are
//! collected as unschedulable instead of being silently dropped.

use std::collections::HashMap;

use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::ServiceError;
use crate::manage::gateway::{Gateway, ShareConfig};
use crate::transfer::{Pair, QueueId};

/// Source of randomness for the scheduling path.
///
/// Abstracted behind a trait so tests can substitute a seeded generator
/// and assert on exact draws.
pub trait RandomSource: Send {
    /// Draws an index into `weights` with probability proportional to the
    /// weight at that index. Returns `None` when no weight is positive.
    fn pick_weighted(&mut self, weights: &[f64]) -> Option<usize>;

    /// Shuffles the queue list in place.
    fn shuffle_queues(&mut self, queues: &mut [QueueId]);
}

/// The production random source, backed by a PRNG seeded from the OS.
pub struct WeightedRandom {
    rng: StdRng,
}

impl WeightedRandom {
    /// Creates a source seeded from system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a source with a fixed seed, for reproducible draws.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for WeightedRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for WeightedRandom {
    fn pick_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let distribution = WeightedIndex::new(weights).ok()?;
        Some(distribution.sample(&mut self.rng))
    }

    fn shuffle_queues(&mut self, queues: &mut [QueueId]) {
        queues.shuffle(&mut self.rng);
    }
}

/// Effective weight per waiting VO.
///
/// A VO with an explicit share entry uses that weight. VOs without one
/// split the `"public"` share equally; when no share rows exist at all the
/// public share defaults to 1.0, so every VO still gets a positive weight.
pub(crate) fn effective_weights(
    vo_names: &[&str],
    shares: &[ShareConfig],
) -> HashMap<String, f64> {
    let configured: HashMap<&str, f64> = shares
        .iter()
        .map(|share| (share.vo.as_str(), share.weight))
        .collect();
    let lacking = vo_names
        .iter()
        .filter(|name| !configured.contains_key(**name))
        .count();
    let split = if lacking == 0 {
        0.0
    } else {
        match configured.get("public") {
            Some(public) => public / lacking as f64,
            None if shares.is_empty() => 1.0 / lacking as f64,
            None => 0.0,
        }
    };

    let mut weights = HashMap::new();
    for name in vo_names {
        let weight = configured.get(*name).copied().unwrap_or(split);
        weights.insert((*name).to_string(), weight);
    }
    weights
}

/// Picks at most one VO queue for a link by weighted-random draw.
///
/// Queues whose VO has no positive effective weight are appended to
/// `unschedulable`. Returns `None` when no VO on the link has positive
/// weight.
pub(crate) fn select_queue_for_pair<R: RandomSource + ?Sized>(
    random: &mut R,
    pair: &Pair,
    vos_waiting: &[QueueId],
    shares: &[ShareConfig],
    unschedulable: &mut Vec<QueueId>,
) -> Option<QueueId> {
    let names: Vec<&str> = vos_waiting
        .iter()
        .map(|queue| queue.vo_name.as_str())
        .collect();
    let weights = effective_weights(&names, shares);

    let mut candidates = Vec::new();
    let mut candidate_weights = Vec::new();
    for queue in vos_waiting {
        let weight = weights.get(&queue.vo_name).copied().unwrap_or(0.0);
        if weight > 0.0 {
            candidates.push(queue);
            candidate_weights.push(weight);
        } else {
            debug!("vo {} has no positive share on {}", queue.vo_name, pair);
            unschedulable.push(queue.clone());
        }
    }
    if candidates.is_empty() {
        return None;
    }
    let index = random.pick_weighted(&candidate_weights)?;
    Some(candidates[index].clone())
}

/// Collapses multi-VO links to one winning VO queue each.
///
/// Returns the winning queues and every queue found unschedulable. Share
/// configuration is fetched once per distinct link.
pub(crate) fn apply_vo_shares<G: Gateway + ?Sized, R: RandomSource + ?Sized>(
    gateway: &G,
    random: &mut R,
    queues: &[QueueId],
) -> Result<(Vec<QueueId>, Vec<QueueId>), ServiceError> {
    let mut order: Vec<Pair> = Vec::new();
    let mut by_pair: HashMap<Pair, Vec<QueueId>> = HashMap::new();
    for queue in queues {
        let pair = queue.pair();
        if !by_pair.contains_key(&pair) {
            order.push(pair.clone());
            by_pair.insert(pair.clone(), Vec::new());
        }
        if let Some(waiting) = by_pair.get_mut(&pair) {
            waiting.push(queue.clone());
        }
    }

    let mut scheduled = Vec::new();
    let mut unschedulable = Vec::new();
    for pair in order {
        let shares = gateway.get_share_config(&pair.source, &pair.destination)?;
        let waiting = by_pair.get(&pair).map(Vec::as_slice).unwrap_or(&[]);
        if let Some(winner) =
            select_queue_for_pair(random, &pair, waiting, &shares, &mut unschedulable)
        {
            scheduled.push(winner);
        }
    }
    Ok((scheduled, unschedulable))
}
