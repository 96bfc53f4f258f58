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

// @tc.name: ut_pair_display
// @tc.desc: Test link rendering as "source => destination"
// @tc.precon: NA
// @tc.step: 1. Build a Pair
//           2. Format it
// @tc.expect: The rendered string joins both endpoints with "=>"
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_pair_display() {
    let pair = Pair::new("gsiftp://src.cern.ch", "gsiftp://dst.cern.ch");
    assert_eq!(
        pair.to_string(),
        "gsiftp://src.cern.ch => gsiftp://dst.cern.ch"
    );
}

// @tc.name: ut_pair_ordering
// @tc.desc: Test lexicographic ordering of links
// @tc.precon: NA
// @tc.step: 1. Build pairs differing in source and destination
//           2. Compare them
// @tc.expect: Source orders first, destination breaks ties
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_pair_ordering() {
    let a = Pair::new("a", "z");
    let b = Pair::new("b", "a");
    let c = Pair::new("a", "b");
    assert!(a < b);
    assert!(c < a);
    assert_eq!(a, Pair::new("a", "z"));
}

// @tc.name: ut_queue_id_pair
// @tc.desc: Test extracting the link from a queue id
// @tc.precon: NA
// @tc.step: 1. Build a QueueId
//           2. Take its pair
// @tc.expect: The pair carries the queue's endpoints, not the VO
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_queue_id_pair() {
    let queue = QueueId::new("src", "dst", "atlas", 3);
    assert_eq!(queue.pair(), Pair::new("src", "dst"));
    assert_eq!(queue.vo_name, "atlas");
    assert_eq!(queue.active_count, 3);
}

// @tc.name: ut_transfer_file_pair
// @tc.desc: Test extracting the link from a transfer file
// @tc.precon: NA
// @tc.step: 1. Build a TransferFile
//           2. Take its pair
// @tc.expect: The pair matches the file's storage endpoints
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_transfer_file_pair() {
    let file = TransferFile {
        file_id: 42,
        job_id: "job-1".to_string(),
        vo_name: "cms".to_string(),
        activity: "default".to_string(),
        source_se: "src".to_string(),
        dest_se: "dst".to_string(),
        source_surl: "gsiftp://src/file".to_string(),
        dest_surl: "gsiftp://dst/file".to_string(),
        user_dn: "/DC=ch/CN=user".to_string(),
        cred_id: "cred-1".to_string(),
        user_filesize: 1024,
        protocol: ProtocolParams::default(),
    };
    assert_eq!(file.pair(), Pair::new("src", "dst"));
}
