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

//! # Strand Updater
//!
//! A tick-driven check for newer releases of an installed package. The
//! [`UpdateWorkflow`] queries the local inventory, fetches the published
//! manifest and, when a newer version exists, the changelog, then hands
//! everything to an [`UpdatePresenter`]. Every step is a non-blocking request
//! polled once per tick.

#![warn(missing_docs)]

pub mod collaborators;
pub mod machine;
pub mod manifest;
pub mod notes;
pub mod version;

pub use collaborators::{
    FetchResult, HttpFetcher, InstalledPackage, InventoryResult, PackageInventory,
    PackageReplacer, SkipVersionStore, UpdateCollaborators, UpdatePresenter,
};
pub use machine::{ActionError, RunOutcome, UpdateState, UpdateWorkflow, UpdaterConfig};
pub use manifest::scan_version;
pub use notes::NotesPreamble;
pub use version::{is_newer, PackageVersion, VersionParseError, DEFAULT_PRERELEASE_MARKER};
