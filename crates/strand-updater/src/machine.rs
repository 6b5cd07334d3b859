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

//! The version-check workflow.
//!
//! One run chains an inventory query, a manifest fetch and a release-notes
//! fetch, advancing at most one step per tick:
//!
//! ```text
//! Listing -> FetchingVersion -> Idle                      (no update, suppressed)
//!                            -> FetchingNotes -> Succeeded -> Idle
//! any in-flight state        -> Failed                     (inventory/transport error)
//! ```
//!
//! Each in-flight state owns exactly the request it is waiting on, so a
//! stale handle can never be polled from the wrong state. Nothing here
//! blocks and nothing is retried within a run; a stalled request keeps the
//! workflow parked until it is re-activated or reset.

use crate::collaborators::{FetchResult, InventoryResult, UpdateCollaborators};
use crate::manifest::scan_version;
use crate::notes::NotesPreamble;
use crate::version::{PackageVersion, DEFAULT_PRERELEASE_MARKER};
use std::error::Error;
use std::fmt;
use std::ops::ControlFlow;
use strand_core::{PendingRequest, RequestAbandoned, StrandError};
use thiserror::Error;

/// Configuration for an [`UpdateWorkflow`].
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// The inventory name of the package being tracked.
    pub package_name: String,
    /// Where the published package manifest lives.
    pub manifest_url: String,
    /// Where the published changelog lives.
    pub changelog_url: String,
    /// Separates the release part of a version from its pre-release part.
    pub prerelease_marker: String,
    /// Whether a pre-release candidate may prompt the user.
    pub prompt_for_prerelease: bool,
    /// How the changelog preamble is removed before display.
    pub notes_preamble: NotesPreamble,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            package_name: "com.valve.openvr".to_string(),
            manifest_url: "https://raw.githubusercontent.com/ValveSoftware/steamvr_unity_plugin/UnityXRPlugin/package.json".to_string(),
            changelog_url: "https://raw.githubusercontent.com/ValveSoftware/steamvr_unity_plugin/UnityXRPlugin/CHANGELOG.md".to_string(),
            prerelease_marker: DEFAULT_PRERELEASE_MARKER.to_string(),
            prompt_for_prerelease: true,
            notes_preamble: NotesPreamble::default(),
        }
    }
}

/// The observable state of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateState {
    /// No run in progress.
    Idle,
    /// Waiting on the package inventory.
    Listing,
    /// Waiting on the published manifest.
    FetchingVersion,
    /// Waiting on the changelog.
    FetchingNotes,
    /// The last run ended on an inventory or transport error.
    Failed,
    /// The update was presented. Passed through on the way back to `Idle`.
    Succeeded,
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A newer version was found and handed to the presenter.
    Presented,
    /// The published version is not newer than the installed one.
    UpToDate,
    /// The published version is the one the user dismissed.
    Suppressed,
    /// The published version is a newer pre-release and pre-releases do not prompt.
    PrereleaseIgnored,
    /// The manifest or one of the versions could not be understood.
    NoCandidate,
    /// The inventory query or a fetch failed.
    Failed(StrandError),
}

/// Errors from the user-initiated actions on a presented update.
#[derive(Debug, Error)]
pub enum ActionError {
    /// No update has been presented in the current run.
    #[error("no update candidate has been presented")]
    NoCandidate,
    /// The package replacer refused the request.
    #[error("package replacement failed: {0}")]
    Replace(#[source] Box<dyn Error + Send + Sync>),
    /// The dismissed version could not be saved.
    #[error("could not persist the dismissed version: {0}")]
    Persist(#[source] Box<dyn Error + Send + Sync>),
}

enum Phase {
    Idle,
    Listing(PendingRequest<InventoryResult>),
    FetchingVersion(PendingRequest<FetchResult>),
    FetchingNotes(PendingRequest<FetchResult>),
    Failed,
}

impl Phase {
    fn state(&self) -> UpdateState {
        match self {
            Phase::Idle => UpdateState::Idle,
            Phase::Listing(_) => UpdateState::Listing,
            Phase::FetchingVersion(_) => UpdateState::FetchingVersion,
            Phase::FetchingNotes(_) => UpdateState::FetchingNotes,
            Phase::Failed => UpdateState::Failed,
        }
    }
}

/// Checks whether a newer version of the tracked package is published and,
/// if so, presents it.
pub struct UpdateWorkflow {
    config: UpdaterConfig,
    collaborators: UpdateCollaborators,
    phase: Phase,
    visited: Vec<UpdateState>,
    outcome: Option<RunOutcome>,
    current_version: Option<String>,
    candidate_version: Option<String>,
    release_notes: Option<String>,
}

impl UpdateWorkflow {
    /// Creates an idle workflow.
    pub fn new(config: UpdaterConfig, collaborators: UpdateCollaborators) -> Self {
        Self {
            config,
            collaborators,
            phase: Phase::Idle,
            visited: Vec::new(),
            outcome: None,
            current_version: None,
            candidate_version: None,
            release_notes: None,
        }
    }

    /// Starts a new run from `Listing`.
    ///
    /// Calling this while a run is in flight drops the outstanding request
    /// and starts over.
    pub fn activate(&mut self) {
        if self.is_running() {
            log::debug!(
                "Update check restarted while in {}; dropping the pending request.",
                self.state()
            );
        }
        self.clear_run();
        let request = self.collaborators.inventory.list();
        self.enter(Phase::Listing(request));
        log::info!("Checking for updates to '{}'.", self.config.package_name);
    }

    /// Abandons the current run and forgets everything it learned.
    pub fn reset(&mut self) {
        self.clear_run();
        self.phase = Phase::Idle;
    }

    /// Drops the in-flight request, if any, and returns to `Idle`.
    ///
    /// Unlike [`UpdateWorkflow::reset`], a finished run keeps its outcome and
    /// versions so a presented update can still be acted on.
    pub fn cancel(&mut self) {
        if self.is_running() {
            log::debug!("Update check cancelled in {}.", self.state());
            self.phase = Phase::Idle;
        }
    }

    fn clear_run(&mut self) {
        self.visited.clear();
        self.outcome = None;
        self.current_version = None;
        self.candidate_version = None;
        self.release_notes = None;
    }

    /// Advances the run by at most one transition.
    ///
    /// Returns `Continue` while a request is in flight and `Break` once the
    /// run is over, so the call can be registered directly as a tick callback.
    /// In a terminal state this does nothing.
    pub fn step(&mut self) -> ControlFlow<()> {
        match &mut self.phase {
            Phase::Listing(request) => match request.take_result() {
                Some(result) => self.on_listed(result),
                None => ControlFlow::Continue(()),
            },
            Phase::FetchingVersion(request) => match request.take_result() {
                Some(result) => self.on_manifest(result),
                None => ControlFlow::Continue(()),
            },
            Phase::FetchingNotes(request) => match request.take_result() {
                Some(result) => self.on_notes(result),
                None => ControlFlow::Continue(()),
            },
            Phase::Idle | Phase::Failed => ControlFlow::Break(()),
        }
    }

    fn on_listed(&mut self, result: Result<InventoryResult, RequestAbandoned>) -> ControlFlow<()> {
        let packages = match result {
            Ok(Ok(packages)) => packages,
            Ok(Err(reason)) => return self.fail(StrandError::Inventory(reason)),
            Err(abandoned) => return self.fail(StrandError::Inventory(abandoned.to_string())),
        };

        let Some(package) = packages
            .into_iter()
            .find(|p| p.name == self.config.package_name)
        else {
            return self.fail(StrandError::PackageNotFound(
                self.config.package_name.clone(),
            ));
        };

        log::debug!(
            "Installed '{}' is version {}.",
            package.name,
            package.version
        );
        self.current_version = Some(package.version);
        let request = self.collaborators.fetcher.get(&self.config.manifest_url);
        self.enter(Phase::FetchingVersion(request));
        ControlFlow::Continue(())
    }

    fn on_manifest(&mut self, result: Result<FetchResult, RequestAbandoned>) -> ControlFlow<()> {
        let url = self.config.manifest_url.clone();
        let document = match transport_result(&url, result) {
            Ok(document) => document,
            Err(e) => return self.fail(e),
        };

        let Some(candidate) = scan_version(&document) else {
            log::warn!("No version field found in the manifest at '{url}'.");
            return self.finish(RunOutcome::NoCandidate);
        };

        if self.collaborators.skip_store.skip_version().as_deref() == Some(candidate) {
            log::info!("Version {candidate} was dismissed; not prompting.");
            return self.finish(RunOutcome::Suppressed);
        }

        let current = self.current_version.as_deref().unwrap_or_default();
        let marker = &self.config.prerelease_marker;
        let parsed = PackageVersion::parse_with_marker(current, marker).and_then(|current| {
            PackageVersion::parse_with_marker(candidate, marker).map(|c| (current, c))
        });
        let (current, published) = match parsed {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("Cannot compare versions: {e}");
                return self.finish(RunOutcome::NoCandidate);
            }
        };

        if published <= current {
            log::info!("'{}' is up to date ({current}).", self.config.package_name);
            return self.finish(RunOutcome::UpToDate);
        }
        if published.is_prerelease() && !self.config.prompt_for_prerelease {
            log::info!("Pre-release {published} is available; pre-release prompts are off.");
            return self.finish(RunOutcome::PrereleaseIgnored);
        }

        self.candidate_version = Some(candidate.to_string());
        let request = self.collaborators.fetcher.get(&self.config.changelog_url);
        self.enter(Phase::FetchingNotes(request));
        ControlFlow::Continue(())
    }

    fn on_notes(&mut self, result: Result<FetchResult, RequestAbandoned>) -> ControlFlow<()> {
        let url = self.config.changelog_url.clone();
        let changelog = match transport_result(&url, result) {
            Ok(changelog) => changelog,
            Err(e) => return self.fail(e),
        };

        let notes = self.config.notes_preamble.strip(&changelog).to_string();
        let current = self.current_version.as_deref().unwrap_or_default();
        let candidate = self.candidate_version.as_deref().unwrap_or_default();
        log::info!(
            "Update available for '{}': {current} -> {candidate}.",
            self.config.package_name
        );
        let (current, candidate) = (current.to_string(), candidate.to_string());
        self.release_notes = Some(notes);

        self.visited.push(UpdateState::Succeeded);
        log::debug!("Update check: -> {}", UpdateState::Succeeded);
        let flow = self.finish(RunOutcome::Presented);

        let notes = self.release_notes.as_deref().unwrap_or_default();
        self.collaborators
            .presenter
            .display(&current, &candidate, notes);
        flow
    }

    fn enter(&mut self, phase: Phase) {
        let state = phase.state();
        log::debug!("Update check: {} -> {state}", self.state());
        self.phase = phase;
        self.visited.push(state);
    }

    fn finish(&mut self, outcome: RunOutcome) -> ControlFlow<()> {
        self.enter(Phase::Idle);
        self.outcome = Some(outcome);
        ControlFlow::Break(())
    }

    fn fail(&mut self, error: StrandError) -> ControlFlow<()> {
        log::error!("Update check failed: {error}");
        self.enter(Phase::Failed);
        self.outcome = Some(RunOutcome::Failed(error));
        ControlFlow::Break(())
    }

    /// The current state.
    pub fn state(&self) -> UpdateState {
        self.phase.state()
    }

    /// Returns `true` while a request is in flight.
    pub fn is_running(&self) -> bool {
        matches!(
            self.phase,
            Phase::Listing(_) | Phase::FetchingVersion(_) | Phase::FetchingNotes(_)
        )
    }

    /// The states entered during the current run, in order.
    pub fn visited(&self) -> &[UpdateState] {
        &self.visited
    }

    /// How the current run ended, once it has.
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// The installed version, once the inventory has answered.
    pub fn current_version(&self) -> Option<&str> {
        self.current_version.as_deref()
    }

    /// The newer published version, once one has been found.
    pub fn candidate_version(&self) -> Option<&str> {
        self.candidate_version.as_deref()
    }

    /// The notes handed to the presenter.
    pub fn release_notes(&self) -> Option<&str> {
        self.release_notes.as_deref()
    }

    /// The configuration this workflow runs with.
    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    fn presented_candidate(&self) -> Result<&str, ActionError> {
        match (&self.outcome, &self.candidate_version) {
            (Some(RunOutcome::Presented), Some(candidate)) => Ok(candidate),
            _ => Err(ActionError::NoCandidate),
        }
    }

    /// The user accepted the presented update: replace the package and close
    /// the prompt.
    pub fn accept_update(&self) -> Result<(), ActionError> {
        let candidate = self.presented_candidate()?;
        log::info!(
            "Replacing '{}' with version {candidate}.",
            self.config.package_name
        );
        self.collaborators
            .replacer
            .replace(&self.config.package_name, candidate)
            .map_err(ActionError::Replace)?;
        self.collaborators.presenter.close();
        Ok(())
    }

    /// The user dismissed the presented version: never prompt for it again.
    pub fn skip_this_version(&self) -> Result<(), ActionError> {
        let candidate = self.presented_candidate()?;
        self.collaborators
            .skip_store
            .set_skip_version(candidate)
            .map_err(ActionError::Persist)?;
        log::info!("Will not prompt for version {candidate} again.");
        self.collaborators.presenter.close();
        Ok(())
    }
}

impl fmt::Debug for UpdateWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateWorkflow")
            .field("state", &self.state())
            .field("outcome", &self.outcome)
            .field("current_version", &self.current_version)
            .field("candidate_version", &self.candidate_version)
            .finish_non_exhaustive()
    }
}

fn transport_result(
    url: &str,
    result: Result<FetchResult, RequestAbandoned>,
) -> Result<String, StrandError> {
    let transport = |reason: String| StrandError::Transport {
        url: url.to_string(),
        reason,
    };
    match result {
        Ok(Ok(body)) => Ok(body),
        Ok(Err(reason)) => Err(transport(reason)),
        Err(abandoned) => Err(transport(abandoned.to_string())),
    }
}
