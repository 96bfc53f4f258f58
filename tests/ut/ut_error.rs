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

// @tc.name: ut_service_error_display
// @tc.desc: Test display formatting of every error variant
// @tc.precon: NA
// @tc.step: 1. Build each ServiceError variant
//           2. Format it with to_string
// @tc.expect: Each variant renders its message with the carried detail
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_service_error_display() {
    assert_eq!(
        ServiceError::Gateway("connection reset".to_string()).to_string(),
        "gateway call failed: connection reset"
    );
    assert_eq!(
        ServiceError::Credential("proxy expired".to_string()).to_string(),
        "credential resolution failed: proxy expired"
    );
    assert_eq!(
        ServiceError::Interrupted.to_string(),
        "interruption requested"
    );
}

// @tc.name: ut_service_error_trait_object
// @tc.desc: Test ServiceError usable as a boxed error
// @tc.precon: NA
// @tc.step: 1. Box an Interrupted error as dyn Error
//           2. Query its source
// @tc.expect: The box holds the error and source is None
// @tc.type: FUNC
// @tc.require: NA
#[test]
fn ut_service_error_trait_object() {
    let err: Box<dyn std::error::Error> = Box::new(ServiceError::Interrupted);
    assert!(err.source().is_none());
    assert!(!err.to_string().is_empty());
}
