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

use super::*;
use crate::manage::gateway::{MockGateway, StorageConfig};

fn capacities(entries: &[(&str, &str, i32)]) -> HashMap<Pair, i32> {
    entries
        .iter()
        .map(|(src, dst, cap)| (Pair::new(*src, *dst), *cap))
        .collect()
}

// @tc.name: ut_allocator_algorithm_from_name
// @tc.desc: Test algorithm name parsing with fallback
// @tc.precon: NA
// @tc.step: 1. Parse the known names and an unknown one
// @tc.expect: Known names map to their algorithm, unknown falls back to
//             greedy
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_allocator_algorithm_from_name() {
    assert_eq!(
        AllocatorAlgorithm::from_name("MAXIMUM_FLOW"),
        AllocatorAlgorithm::MaximumFlow
    );
    assert_eq!(
        AllocatorAlgorithm::from_name("GREEDY"),
        AllocatorAlgorithm::Greedy
    );
    assert_eq!(
        AllocatorAlgorithm::from_name("whatever"),
        AllocatorAlgorithm::Greedy
    );
}

// @tc.name: ut_allocator_greedy
// @tc.desc: Test greedy allocation grants each link its configured capacity
// @tc.precon: NA
// @tc.step: 1. Mock capacities for two links, one of them unconfigured
//           2. Allocate twice with the same queues
// @tc.expect: Each link gets its capacity, unconfigured gets zero, and the
//             second run returns the same map
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_allocator_greedy() {
    crate::tests::test_init();
    let mut gateway = MockGateway::new();
    gateway
        .expect_get_link_capacities()
        .returning(|_| Ok(capacities(&[("a", "b", 3), ("a", "c", 5)])));

    let queues = vec![
        QueueId::new("a", "b", "atlas", 0),
        QueueId::new("a", "c", "cms", 0),
        QueueId::new("a", "d", "cms", 0),
    ];
    let mut allocator = Allocator::new(AllocatorAlgorithm::Greedy, 5);
    let first = allocator.allocate(&gateway, &queues).unwrap();
    assert_eq!(first.get(&Pair::new("a", "b")), Some(&3));
    assert_eq!(first.get(&Pair::new("a", "c")), Some(&5));
    assert_eq!(first.get(&Pair::new("a", "d")), Some(&0));

    let second = allocator.allocate(&gateway, &queues).unwrap();
    assert_eq!(first, second);
}

// @tc.name: ut_allocator_maximum_flow_endpoint_ceiling
// @tc.desc: Test flow allocation never exceeds a shared endpoint budget
// @tc.precon: NA
// @tc.step: 1. Give source "s" an outbound ceiling of 5 and two links of
//              capacity 4 each
//           2. Allocate with the maximum-flow algorithm
// @tc.expect: No link exceeds its capacity and the total out of "s" is 5
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_allocator_maximum_flow_endpoint_ceiling() {
    crate::tests::test_init();
    let mut gateway = MockGateway::new();
    gateway
        .expect_get_link_capacities()
        .returning(|_| Ok(capacities(&[("s", "d1", 4), ("s", "d2", 4)])));
    gateway.expect_get_storage_config().returning(|se| {
        Ok(if se == "s" {
            StorageConfig {
                inbound_max_active: 0,
                outbound_max_active: 5,
            }
        } else {
            StorageConfig::default()
        })
    });

    let queues = vec![
        QueueId::new("s", "d1", "atlas", 0),
        QueueId::new("s", "d2", "atlas", 0),
    ];
    let mut allocator = Allocator::new(AllocatorAlgorithm::MaximumFlow, 5);
    let allocation = allocator.allocate(&gateway, &queues).unwrap();

    let to_d1 = allocation.get(&Pair::new("s", "d1")).copied().unwrap();
    let to_d2 = allocation.get(&Pair::new("s", "d2")).copied().unwrap();
    assert!(to_d1 <= 4);
    assert!(to_d2 <= 4);
    assert_eq!(to_d1 + to_d2, 5);
}

// @tc.name: ut_allocator_starved_link_preallocation
// @tc.desc: Test a link starved across cycles is served ahead of the solver
// @tc.precon: NA
// @tc.step: 1. Run a cycle where running transfers eat the whole outbound
//              budget, leaving the link unallocated
//           2. Run a second cycle with the budget free again
// @tc.expect: The first cycle records a deficit above the threshold, the
//             second pre-allocates the link up to the freed budget
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_allocator_starved_link_preallocation() {
    crate::tests::test_init();
    let mut gateway = MockGateway::new();
    gateway
        .expect_get_link_capacities()
        .returning(|_| Ok(capacities(&[("s", "d", 4)])));
    gateway.expect_get_storage_config().returning(|se| {
        Ok(if se == "s" {
            StorageConfig {
                inbound_max_active: 0,
                outbound_max_active: 3,
            }
        } else {
            StorageConfig::default()
        })
    });

    let mut allocator = Allocator::new(AllocatorAlgorithm::MaximumFlow, 2);
    let link = Pair::new("s", "d");

    // Outbound budget 3 - 3 running = 0, nothing can be allocated
    let busy = vec![QueueId::new("s", "d", "atlas", 3)];
    let allocation = allocator.allocate(&gateway, &busy).unwrap();
    assert_eq!(allocation.get(&link), Some(&0));
    assert_eq!(allocator.state().deficit(&link), 4);

    // Budget freed; the starved link is granted min(3, inbound, 4) = 3
    let idle = vec![QueueId::new("s", "d", "atlas", 0)];
    let allocation = allocator.allocate(&gateway, &idle).unwrap();
    assert_eq!(allocation.get(&link), Some(&3));
    assert_eq!(allocator.state().deficit(&link), 1);
}

// @tc.name: ut_endpoint_budgets
// @tc.desc: Test endpoint budgets subtract running transfers once per queue
// @tc.precon: NA
// @tc.step: 1. Build two queues sharing the source endpoint
//           2. Compute the endpoint budgets
// @tc.expect: The shared source pays for both queues' running transfers,
//             each destination only for its own
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_endpoint_budgets() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_get_storage_config()
        .returning(|_| Ok(StorageConfig::default()));

    let queues = vec![
        QueueId::new("s", "d1", "atlas", 2),
        QueueId::new("s", "d2", "cms", 3),
    ];
    let (source_left, dest_left) = endpoint_budgets(&gateway, &queues).unwrap();
    assert_eq!(source_left.get("s"), Some(&55));
    assert_eq!(dest_left.get("d1"), Some(&58));
    assert_eq!(dest_left.get("d2"), Some(&57));
}
