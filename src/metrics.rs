// Copyright 2025 The anoncred Authors
//
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

//! Prometheus metrics for the service adapter. Registered against the
//! default registry; the embedding process scrapes them from its own
//! metrics endpoint.

use std::sync::LazyLock;

use prometheus::{register_int_counter_vec, IntCounterVec};

const LABEL_OPERATION: &str = "operation";
const LABEL_ERROR_KIND: &str = "error_kind";

pub(crate) static CREDENTIAL_REQUEST_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "anoncred_credential_request_failures",
        "Credential requests that failed, by operation and error kind",
        &[LABEL_OPERATION, LABEL_ERROR_KIND],
    )
    .unwrap()
});
