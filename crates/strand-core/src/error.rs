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

//! Defines the error taxonomy shared by the tick-driven subsystems.

use thiserror::Error;

/// An error reported by one of the cooperative subsystems.
///
/// None of these are fatal to the host: the worst outcome is that the
/// affected feature goes inactive until its next activation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrandError {
    /// The local package inventory could not be queried.
    #[error("package inventory query failed: {0}")]
    Inventory(String),
    /// The inventory answered, but the tracked package is not installed.
    #[error("tracked package '{0}' is not present in the package inventory")]
    PackageNotFound(String),
    /// A network fetch did not complete successfully.
    #[error("request to '{url}' failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// What the transport reported.
        reason: String,
    },
    /// A version string or metadata document could not be understood.
    #[error("could not parse '{0}'")]
    Parse(String),
    /// The native event source went away.
    #[error("native event source is unavailable")]
    NativeSourceUnavailable,
}
