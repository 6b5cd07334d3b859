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

//! # Strand Events
//!
//! Drains the native runtime's event queue once per tick and routes each event
//! to the listeners registered for its kind. The listener table is a
//! fixed-size array indexed by [`EventKind::ordinal`], and a single drain never
//! pulls more than its configured budget.

#![warn(missing_docs)]

pub mod dispatcher;
pub mod kind;
pub mod source;

pub use dispatcher::{
    DispatcherConfig, DrainReport, DrainStop, EventDispatcher, Listener, ListenerId,
};
pub use kind::{EventData, EventKind, VrEvent};
pub use source::{ChannelEventSource, EventFeed, EventSource, ExitRequester, SourceUnavailable};
