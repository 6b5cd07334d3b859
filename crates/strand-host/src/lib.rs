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

//! # Strand Host
//!
//! Ties the tick-driven subsystems to a host application: the native
//! runtime lifecycle, persisted settings, the mirror-view config watcher and
//! logger setup. The host loop calls [`HostRuntime::tick`] once per
//! iteration and everything else happens inside that call.

#![warn(missing_docs)]

pub mod logging;
pub mod mirror;
pub mod runtime;
pub mod settings;

pub use mirror::{
    parse_mirror_config, read_mirror_config, MirrorViewMode, MirrorViewWatcher,
    UnknownMirrorMode, MIRROR_CONFIG_FILE,
};
pub use runtime::{
    ExitSignal, HostRuntime, NativeBinding, NativeInitError, EVENT_DRAIN_TICK,
    MIRROR_WATCH_TICK, UPDATE_CHECK_TICK,
};
pub use settings::{HostSettings, SettingsError, SettingsFile};

pub use strand_core;
pub use strand_events;
pub use strand_updater;
