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
use crate::manage::gateway::{MockGateway, ShareConfig};
use crate::transfer::ProtocolParams;

fn test_file(file_id: u64, vo: &str, activity: &str) -> TransferFile {
    TransferFile {
        file_id,
        job_id: format!("job-{}", file_id),
        vo_name: vo.to_string(),
        activity: activity.to_string(),
        source_se: "src".to_string(),
        dest_se: "dst".to_string(),
        source_surl: format!("gsiftp://src/{}", file_id),
        dest_surl: format!("gsiftp://dst/{}", file_id),
        user_dn: "/DC=ch/CN=user".to_string(),
        cred_id: "cred".to_string(),
        user_filesize: 0,
        protocol: ProtocolParams::default(),
    }
}

// @tc.name: ut_scheduler_algorithm_from_name
// @tc.desc: Test algorithm name parsing with fallback
// @tc.precon: NA
// @tc.step: 1. Parse the known names and an unknown one
// @tc.expect: Known names map to their algorithm, unknown falls back to
//             randomized
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_scheduler_algorithm_from_name() {
    assert_eq!(
        SchedulerAlgorithm::from_name("DEFICIT"),
        SchedulerAlgorithm::Deficit
    );
    assert_eq!(
        SchedulerAlgorithm::from_name("RANDOMIZED"),
        SchedulerAlgorithm::Randomized
    );
    assert_eq!(
        SchedulerAlgorithm::from_name("whatever"),
        SchedulerAlgorithm::Randomized
    );
}

// @tc.name: ut_scheduler_randomized
// @tc.desc: Test the randomized pass returns one VO's transfers per link
// @tc.precon: NA
// @tc.step: 1. Mock one link waited on by a positive-weight and a
//              zero-weight VO
//           2. Run a randomized scheduling pass
// @tc.expect: Only the positive-weight VO's transfers come back and the
//             zero-weight queue is unschedulable
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_scheduler_randomized() {
    crate::tests::test_init();
    let mut gateway = MockGateway::new();
    gateway.expect_get_share_config().returning(|_, _| {
        Ok(vec![
            ShareConfig::new("atlas", 1.0),
            ShareConfig::new("cms", 0.0),
        ])
    });
    gateway.expect_get_ready_transfers().returning(|queues, _| {
        assert_eq!(queues.len(), 1);
        assert_eq!(queues[0].vo_name, "atlas");
        let mut files = HashMap::new();
        files.insert(
            "atlas".to_string(),
            vec![test_file(1, "atlas", "default"), test_file(2, "atlas", "default")],
        );
        Ok(files)
    });

    let queues = vec![
        QueueId::new("src", "dst", "atlas", 0),
        QueueId::new("src", "dst", "cms", 0),
    ];
    let mut slots = HashMap::new();
    slots.insert(Pair::new("src", "dst"), 2);

    let scheduler = Scheduler::new(SchedulerAlgorithm::Randomized);
    let mut random = WeightedRandom::seeded(1);
    let outcome = scheduler
        .schedule(&gateway, &mut random, &slots, &queues, 10)
        .unwrap();

    assert_eq!(outcome.scheduled.get("atlas").map(Vec::len), Some(2));
    assert_eq!(outcome.unschedulable.len(), 1);
    assert_eq!(outcome.unschedulable[0].vo_name, "cms");
}

// @tc.name: ut_scheduler_randomized_no_winners
// @tc.desc: Test a pass with no schedulable VO fetches nothing
// @tc.precon: NA
// @tc.step: 1. Mock a link whose only VO has weight zero
//           2. Run a randomized scheduling pass
// @tc.expect: Nothing is scheduled, the queue is unschedulable, and the
//             store is never asked for transfers
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_scheduler_randomized_no_winners() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_get_share_config()
        .returning(|_, _| Ok(vec![ShareConfig::new("atlas", 0.0)]));

    let queues = vec![QueueId::new("src", "dst", "atlas", 0)];
    let slots = HashMap::new();

    let scheduler = Scheduler::new(SchedulerAlgorithm::Randomized);
    let mut random = WeightedRandom::seeded(1);
    let outcome = scheduler
        .schedule(&gateway, &mut random, &slots, &queues, 10)
        .unwrap();

    assert!(outcome.scheduled.is_empty());
    assert_eq!(outcome.unschedulable, queues);
}
