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

//! The orchestration loop.
//!
//! One timer-driven state machine per process: gate on drain mode and the
//! scheduling lease, check global worker capacity, poll the pending
//! queues, allocate slots per link, schedule transfers, fail the
//! unschedulable ones and dispatch the rest through the bounded executor
//! pool. A cycle that hits a collaborator failure is abandoned whole; the
//! next tick retries from scratch. No new cycle starts until the previous
//! cycle's dispatched tasks have all finished.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::manage::allocator::{endpoint_budgets, Allocator};
use crate::manage::executor::ExecutorPool;
use crate::manage::gateway::{Gateway, TransferLauncher, NO_SHARE_REASON};
use crate::manage::scheduler::{RandomSource, Scheduler, WeightedRandom};
use crate::transfer::{QueueId, TransferFile};
use crate::utils::get_current_timestamp;

/// Long-running scheduling service over one [`Gateway`].
pub struct TransfersService<G: Gateway> {
    gateway: Arc<G>,
    launcher: Arc<dyn TransferLauncher>,
    config: ServiceConfig,
    allocator: Allocator,
    scheduler: Scheduler,
    random: Box<dyn RandomSource>,
    token: CancellationToken,
}

impl<G: Gateway> TransfersService<G> {
    /// Builds the service from its collaborators and configuration.
    pub fn new(
        gateway: Arc<G>,
        launcher: Arc<dyn TransferLauncher>,
        config: ServiceConfig,
    ) -> Self {
        let allocator = Allocator::new(config.allocator_algorithm, config.starvation_threshold);
        let scheduler = Scheduler::new(config.scheduler_algorithm);
        Self {
            gateway,
            launcher,
            config,
            allocator,
            scheduler,
            random: Box::new(WeightedRandom::new()),
            token: CancellationToken::new(),
        }
    }

    /// Replaces the random source, mainly for reproducible tests.
    pub fn with_random_source(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Token that stops the loop when cancelled. Clone it and hand it to
    /// the process shutdown path.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs scheduling cycles until the cancellation token fires.
    pub async fn run(mut self) {
        info!("transfers service started");
        loop {
            let interval = if self.gateway.is_drain_mode() {
                self.config.drain_backoff
            } else {
                self.config.scheduling_interval
            };
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = sleep(interval) => {}
            }
            if self.gateway.is_drain_mode() {
                debug!("node is draining, cycle skipped");
                continue;
            }
            if !self.gateway.is_lead_node() {
                debug!("not holding the scheduling lease, cycle skipped");
                continue;
            }
            match self.execute_cycle().await {
                Ok(launched) => {
                    if launched > 0 {
                        info!("cycle launched {} transfers", launched);
                    }
                }
                Err(ServiceError::Interrupted) => break,
                Err(e) => error!("scheduling cycle abandoned: {}", e),
            }
        }
        info!("transfers service stopped");
    }

    /// One full allocation + scheduling + dispatch pass.
    pub async fn execute_cycle(&mut self) -> Result<i32, ServiceError> {
        let start = get_current_timestamp();

        let running = self
            .gateway
            .count_running_workers(&self.config.worker_process_name)?;
        let available = self.config.max_worker_processes - running;
        if available <= 0 {
            warn!(
                "no global worker slots free, {} workers already running",
                running
            );
            return Ok(0);
        }

        let mut queues = self.gateway.get_queues_with_pending()?;
        if queues.is_empty() {
            return Ok(0);
        }
        // Break deterministic bias across repeated ties
        self.random.shuffle_queues(&mut queues);

        let allocation = self.allocator.allocate(self.gateway.as_ref(), &queues)?;
        let outcome = self.scheduler.schedule(
            self.gateway.as_ref(),
            self.random.as_mut(),
            &allocation,
            &queues,
            available,
        )?;

        self.fail_unschedulable(&outcome.unschedulable)?;
        let launched = self.dispatch(outcome.scheduled, &queues, available).await?;

        debug!(
            "cycle finished in {} ms, {} queues polled",
            get_current_timestamp().saturating_sub(start),
            queues.len()
        );
        Ok(launched)
    }

    /// Drains the unschedulable list: every ready transfer of those queues
    /// goes to a terminal FAILED state with a stable reason.
    fn fail_unschedulable(&self, queues: &[QueueId]) -> Result<(), ServiceError> {
        if queues.is_empty() {
            return Ok(());
        }
        // No slot budget here; the store's default batch size bounds the
        // fetch
        let files = self.gateway.get_ready_transfers(queues, &HashMap::new())?;
        let mut failed = 0;
        for transfers in files.into_values() {
            for transfer in transfers {
                match self.gateway.report_failed(&transfer, NO_SHARE_REASON) {
                    Ok(()) => failed += 1,
                    Err(e) => error!(
                        "could not report transfer {} as failed: {}",
                        transfer.file_id, e
                    ),
                }
            }
        }
        if failed > 0 {
            warn!("{} transfers failed: {}", failed, NO_SHARE_REASON);
        }
        Ok(())
    }

    /// Hands the selected transfers to the executor pool, round-robin
    /// across VOs, respecting the global budget and per-endpoint slots.
    async fn dispatch(
        &mut self,
        scheduled: HashMap<String, Vec<TransferFile>>,
        queues: &[QueueId],
        mut available: i32,
    ) -> Result<i32, ServiceError> {
        if scheduled.is_empty() {
            return Ok(0);
        }
        let (mut source_left, mut dest_left) = endpoint_budgets(self.gateway.as_ref(), queues)?;

        let mut vos: Vec<String> = scheduled.keys().cloned().collect();
        vos.sort();
        let mut scheduled = scheduled;
        let mut lists: Vec<VecDeque<TransferFile>> = vos
            .iter()
            .map(|vo| scheduled.remove(vo).unwrap_or_default().into())
            .collect();

        let mut pool = ExecutorPool::new(self.config.exec_pool_size);
        let mut proxies: HashMap<(String, String), String> = HashMap::new();
        let mut exhausted: HashSet<String> = HashSet::new();
        let mut by_activity: HashMap<String, i32> = HashMap::new();
        let mut failure: Option<ServiceError> = None;

        // One file per VO per round, so a large VO cannot monopolize the
        // tail of the budget
        'rounds: loop {
            let mut progressed = false;
            for list in &mut lists {
                if available <= 0 {
                    info!("global slot budget exhausted, dispatch stopped");
                    break 'rounds;
                }
                if self.token.is_cancelled() {
                    failure = Some(ServiceError::Interrupted);
                    break 'rounds;
                }
                let Some(file) = list.pop_front() else {
                    continue;
                };
                progressed = true;

                let src_slots = source_left.get(&file.source_se).copied().unwrap_or(0);
                if src_slots <= 0 {
                    if exhausted.insert(file.source_se.clone()) {
                        warn!("no outbound slots left on {}", file.source_se);
                    }
                    continue;
                }
                let dst_slots = dest_left.get(&file.dest_se).copied().unwrap_or(0);
                if dst_slots <= 0 {
                    if exhausted.insert(file.dest_se.clone()) {
                        warn!("no inbound slots left on {}", file.dest_se);
                    }
                    continue;
                }

                let key = (file.cred_id.clone(), file.user_dn.clone());
                let proxy = match proxies.get(&key) {
                    Some(proxy) => proxy.clone(),
                    None => match self.gateway.resolve_proxy(&file.user_dn, &file.cred_id) {
                        Ok(proxy) => {
                            proxies.insert(key, proxy.clone());
                            proxy
                        }
                        Err(e) => {
                            failure = Some(e);
                            break 'rounds;
                        }
                    },
                };

                if let Some(left) = source_left.get_mut(&file.source_se) {
                    *left -= 1;
                }
                if let Some(left) = dest_left.get_mut(&file.dest_se) {
                    *left -= 1;
                }
                available -= 1;
                *by_activity.entry(file.activity.clone()).or_insert(0) += 1;
                pool.submit(self.launcher.clone(), file, proxy);
            }
            if !progressed {
                break;
            }
        }

        if failure.is_some() {
            pool.abort();
        }
        let submitted = pool.queued();
        let launched = pool.join().await;
        if let Some(e) = failure {
            return Err(e);
        }

        info!(
            "dispatch finished: {} transfers submitted, {} launched",
            submitted, launched
        );
        let mut activities: Vec<(&String, &i32)> = by_activity.iter().collect();
        activities.sort();
        for (activity, count) in activities {
            debug!("activity {}: {} scheduled", activity, count);
        }
        Ok(launched)
    }
}
