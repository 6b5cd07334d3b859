// Copyright 2025 eraflo
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

//! Logger setup for binaries built on the host runtime.

use env_logger::{Builder, Env};

/// Installs the `env_logger` backend with an `info` default filter.
///
/// `RUST_LOG` overrides the default. Calling this more than once is harmless.
pub fn init() {
    init_with_default("info");
}

/// Installs the `env_logger` backend with `default_filter` unless `RUST_LOG` is set.
///
/// Returns `false` if a logger was already installed.
pub fn init_with_default(default_filter: &str) -> bool {
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .try_init()
        .is_ok()
}
