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

//! The collaborators the update workflow talks to.
//!
//! Every method returns immediately. Anything slow hands back a
//! [`PendingRequest`] that the workflow polls on later ticks.

use std::error::Error;
use std::rc::Rc;
use strand_core::PendingRequest;

/// The result of a package-inventory query: the installed packages, or why
/// the query failed.
pub type InventoryResult = Result<Vec<InstalledPackage>, String>;

/// The result of an HTTP fetch: the body text, or why the transport failed.
pub type FetchResult = Result<String, String>;

/// One entry of the local package inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    /// The package identifier, e.g. `com.valve.openvr`.
    pub name: String,
    /// The installed version string.
    pub version: String,
}

impl InstalledPackage {
    /// Creates an inventory entry.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Lists the locally installed packages.
pub trait PackageInventory {
    /// Starts an inventory query.
    fn list(&self) -> PendingRequest<InventoryResult>;
}

/// Fetches documents over HTTP.
pub trait HttpFetcher {
    /// Starts a GET request for `url`.
    fn get(&self, url: &str) -> PendingRequest<FetchResult>;
}

/// Shows the update prompt to the user.
pub trait UpdatePresenter {
    /// Presents an available update together with its release notes.
    ///
    /// Called after the run has finished. The user's choice must reach the
    /// workflow after this returns, not from inside it.
    fn display(&self, current: &str, candidate: &str, notes: &str);
    /// Dismisses the prompt.
    fn close(&self);
}

/// Persists the version the user chose not to be prompted about again.
pub trait SkipVersionStore {
    /// The dismissed version, if any.
    fn skip_version(&self) -> Option<String>;
    /// Records `version` as dismissed.
    fn set_skip_version(&self, version: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Replaces the installed package with a newer version.
///
/// The replacement itself (download, install, reload) is the implementor's
/// business; the workflow only triggers it.
pub trait PackageReplacer {
    /// Starts replacing `package` with `version`.
    fn replace(&self, package: &str, version: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// The full set of collaborators an [`UpdateWorkflow`](crate::UpdateWorkflow) drives.
#[derive(Clone)]
pub struct UpdateCollaborators {
    /// The package inventory.
    pub inventory: Rc<dyn PackageInventory>,
    /// The HTTP client.
    pub fetcher: Rc<dyn HttpFetcher>,
    /// The prompt UI.
    pub presenter: Rc<dyn UpdatePresenter>,
    /// Dismissed-version storage.
    pub skip_store: Rc<dyn SkipVersionStore>,
    /// The package replacement action.
    pub replacer: Rc<dyn PackageReplacer>,
}
