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

//! # Strand Core
//!
//! Foundational crate shared by the event dispatcher and the update workflow:
//! the per-tick callback registry, non-blocking request handles polled from
//! inside a tick, and the error taxonomy both subsystems report with.

#![warn(missing_docs)]

pub mod error;
pub mod request;
pub mod tick;

pub use error::StrandError;
pub use request::{PendingRequest, RequestAbandoned, RequestCompleter};
pub use tick::{TickCallback, TickKey, TickRegistry};
