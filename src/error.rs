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

//! Error types of the scheduling core.
//!
//! The core never terminates the process on error: a failed collaborator
//! call abandons the current cycle and the next timer tick retries from
//! scratch. The variants below exist so the orchestration loop can tell an
//! expected operational failure from a requested shutdown.

use core::fmt;

/// Errors surfaced by the scheduling core.
#[derive(Debug)]
pub enum ServiceError {
    /// A persistence or collaborator call failed. Expected operational
    /// condition; the cycle is abandoned and retried on the next tick.
    Gateway(String),
    /// Credential resolution failed for a (user DN, credential id) pair.
    Credential(String),
    /// Interruption was requested; the service loop unwinds cleanly.
    Interrupted,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServiceError::Gateway(msg) => write!(f, "gateway call failed: {}", msg),
            ServiceError::Credential(msg) => write!(f, "credential resolution failed: {}", msg),
            ServiceError::Interrupted => write!(f, "interruption requested"),
        }
    }
}

impl std::error::Error for ServiceError {}
