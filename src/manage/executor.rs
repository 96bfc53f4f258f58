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

//! Bounded executor pool used by the dispatch step.
//!
//! Each accepted transfer becomes one task; at most `size` launches run at
//! the same time. The orchestration loop joins the pool before starting
//! the next cycle, so in-flight executors can never pile up across cycles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::manage::gateway::TransferLauncher;
use crate::transfer::TransferFile;
use crate::utils::runtime_spawn;

pub(crate) struct ExecutorPool {
    permits: Arc<Semaphore>,
    aborted: Arc<AtomicBool>,
    handles: Vec<JoinHandle<i32>>,
}

impl ExecutorPool {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size.max(1))),
            aborted: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
        }
    }

    /// Queues one transfer launch. The task waits for a pool permit, then
    /// runs the launcher on the blocking thread pool and reports 1 if a
    /// worker was spawned.
    pub(crate) fn submit<L>(&mut self, launcher: Arc<L>, transfer: TransferFile, proxy: String)
    where
        L: TransferLauncher + ?Sized + 'static,
    {
        let permits = self.permits.clone();
        let aborted = self.aborted.clone();
        self.handles.push(runtime_spawn(async move {
            let _permit = match permits.acquire().await {
                Ok(permit) => permit,
                // Closed semaphore means the pool was aborted
                Err(_) => return 0,
            };
            if aborted.load(Ordering::Acquire) {
                return 0;
            }
            tokio::task::spawn_blocking(move || {
                if launcher.launch(&transfer, &proxy) {
                    1
                } else {
                    0
                }
            })
            .await
            .unwrap_or(0)
        }));
    }

    /// Stops the pool: tasks still waiting for a permit return without
    /// launching. Launches already running are allowed to finish.
    pub(crate) fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
        self.permits.close();
    }

    /// Waits for every queued task and returns how many actually launched.
    pub(crate) async fn join(&mut self) -> i32 {
        let mut launched = 0;
        for handle in self.handles.drain(..) {
            match handle.await {
                Ok(count) => launched += count,
                Err(e) => error!("dispatch task failed to join: {}", e),
            }
        }
        launched
    }

    pub(crate) fn queued(&self) -> usize {
        self.handles.len()
    }
}
