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

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::error::Error;
use std::ops::ControlFlow;
use std::rc::Rc;
use strand_core::{PendingRequest, RequestCompleter, StrandError};
use strand_updater::{
    ActionError, FetchResult, HttpFetcher, InstalledPackage, InventoryResult, NotesPreamble,
    PackageInventory, PackageReplacer, RunOutcome, SkipVersionStore, UpdateCollaborators,
    UpdatePresenter, UpdateState, UpdateWorkflow, UpdaterConfig,
};

const PACKAGE: &str = "com.valve.openvr";
const MANIFEST_URL: &str = "https://example.invalid/package.json";
const CHANGELOG_URL: &str = "https://example.invalid/CHANGELOG.md";
const CHANGELOG: &str = "# Changelog\nAll notable changes are listed here.\n\n## [1.3.0-preview.1]\n- Mirror view fixes.\n";

// --- FAKE COLLABORATORS ---

/// Answers immediately when a result is scripted, otherwise holds the request open.
#[derive(Default)]
struct FakeInventory {
    result: RefCell<Option<InventoryResult>>,
    held: RefCell<Vec<RequestCompleter<InventoryResult>>>,
    lists: Cell<usize>,
}

impl PackageInventory for FakeInventory {
    fn list(&self) -> PendingRequest<InventoryResult> {
        self.lists.set(self.lists.get() + 1);
        match self.result.borrow().clone() {
            Some(result) => PendingRequest::ready(result),
            None => {
                let (completer, request) = PendingRequest::channel();
                self.held.borrow_mut().push(completer);
                request
            }
        }
    }
}

#[derive(Default)]
struct FakeFetcher {
    responses: RefCell<HashMap<String, FetchResult>>,
    held: RefCell<Vec<RequestCompleter<FetchResult>>>,
    requested: RefCell<Vec<String>>,
}

impl FakeFetcher {
    fn respond(&self, url: &str, result: FetchResult) {
        self.responses.borrow_mut().insert(url.to_string(), result);
    }
}

impl HttpFetcher for FakeFetcher {
    fn get(&self, url: &str) -> PendingRequest<FetchResult> {
        self.requested.borrow_mut().push(url.to_string());
        match self.responses.borrow().get(url).cloned() {
            Some(result) => PendingRequest::ready(result),
            None => {
                let (completer, request) = PendingRequest::channel();
                self.held.borrow_mut().push(completer);
                request
            }
        }
    }
}

#[derive(Default)]
struct FakePresenter {
    displayed: RefCell<Vec<(String, String, String)>>,
    closes: Cell<usize>,
}

impl UpdatePresenter for FakePresenter {
    fn display(&self, current: &str, candidate: &str, notes: &str) {
        self.displayed
            .borrow_mut()
            .push((current.to_string(), candidate.to_string(), notes.to_string()));
    }

    fn close(&self) {
        self.closes.set(self.closes.get() + 1);
    }
}

#[derive(Default)]
struct FakeSkipStore {
    version: RefCell<Option<String>>,
    read_only: Cell<bool>,
}

impl SkipVersionStore for FakeSkipStore {
    fn skip_version(&self) -> Option<String> {
        self.version.borrow().clone()
    }

    fn set_skip_version(&self, version: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.read_only.get() {
            return Err("settings are read-only".into());
        }
        *self.version.borrow_mut() = Some(version.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct FakeReplacer {
    replaced: RefCell<Vec<(String, String)>>,
}

impl PackageReplacer for FakeReplacer {
    fn replace(&self, package: &str, version: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.replaced
            .borrow_mut()
            .push((package.to_string(), version.to_string()));
        Ok(())
    }
}

struct Fixture {
    inventory: Rc<FakeInventory>,
    fetcher: Rc<FakeFetcher>,
    presenter: Rc<FakePresenter>,
    skip_store: Rc<FakeSkipStore>,
    replacer: Rc<FakeReplacer>,
}

impl Fixture {
    /// Installed `installed`, publishing `published`, changelog available.
    fn new(installed: &str, published: &str) -> Self {
        let fixture = Self {
            inventory: Rc::default(),
            fetcher: Rc::default(),
            presenter: Rc::default(),
            skip_store: Rc::default(),
            replacer: Rc::default(),
        };
        *fixture.inventory.result.borrow_mut() = Some(Ok(vec![
            InstalledPackage::new("com.unity.xr.management", "3.2.0"),
            InstalledPackage::new(PACKAGE, installed),
        ]));
        fixture.fetcher.respond(
            MANIFEST_URL,
            Ok(format!(
                "{{\n  \"name\": \"{PACKAGE}\",\n  \"version\": \"{published}\"\n}}"
            )),
        );
        fixture.fetcher.respond(CHANGELOG_URL, Ok(CHANGELOG.to_string()));
        fixture
    }

    fn config() -> UpdaterConfig {
        UpdaterConfig {
            manifest_url: MANIFEST_URL.to_string(),
            changelog_url: CHANGELOG_URL.to_string(),
            ..Default::default()
        }
    }

    fn workflow(&self) -> UpdateWorkflow {
        self.workflow_with(Self::config())
    }

    fn workflow_with(&self, config: UpdaterConfig) -> UpdateWorkflow {
        UpdateWorkflow::new(
            config,
            UpdateCollaborators {
                inventory: self.inventory.clone(),
                fetcher: self.fetcher.clone(),
                presenter: self.presenter.clone(),
                skip_store: self.skip_store.clone(),
                replacer: self.replacer.clone(),
            },
        )
    }
}

/// Steps until the run breaks, bounded so a regression cannot hang the test.
fn run_to_end(workflow: &mut UpdateWorkflow) -> usize {
    for ticks in 1..=16 {
        if workflow.step().is_break() {
            return ticks;
        }
    }
    panic!("workflow did not finish: {workflow:?}");
}

// --- SCENARIOS ---

#[test]
fn newer_preview_is_presented_with_trimmed_notes() {
    let fixture = Fixture::new("1.2.0", "1.3.0-preview.1");
    let mut workflow = fixture.workflow();

    workflow.activate();
    assert_eq!(workflow.state(), UpdateState::Listing);

    assert_eq!(workflow.step(), ControlFlow::Continue(()));
    assert_eq!(workflow.state(), UpdateState::FetchingVersion);
    assert_eq!(workflow.step(), ControlFlow::Continue(()));
    assert_eq!(workflow.state(), UpdateState::FetchingNotes);
    assert_eq!(workflow.step(), ControlFlow::Break(()));
    assert_eq!(workflow.state(), UpdateState::Idle);

    assert_eq!(
        workflow.visited(),
        &[
            UpdateState::Listing,
            UpdateState::FetchingVersion,
            UpdateState::FetchingNotes,
            UpdateState::Succeeded,
            UpdateState::Idle,
        ]
    );
    assert_eq!(workflow.outcome(), Some(&RunOutcome::Presented));

    let displayed = fixture.presenter.displayed.borrow();
    assert_eq!(displayed.len(), 1);
    let (current, candidate, notes) = &displayed[0];
    assert_eq!(current, "1.2.0");
    assert_eq!(candidate, "1.3.0-preview.1");
    assert_eq!(notes, "## [1.3.0-preview.1]\n- Mirror view fixes.\n");
}

#[test]
fn older_preview_ends_idle_without_fetching_notes() {
    let fixture = Fixture::new("1.3.0-preview.2", "1.3.0-preview.1");
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);

    assert_eq!(
        workflow.visited(),
        &[
            UpdateState::Listing,
            UpdateState::FetchingVersion,
            UpdateState::Idle
        ]
    );
    assert_eq!(workflow.outcome(), Some(&RunOutcome::UpToDate));
    assert_eq!(*fixture.fetcher.requested.borrow(), vec![MANIFEST_URL]);
    assert!(fixture.presenter.displayed.borrow().is_empty());
}

#[test]
fn same_version_is_up_to_date() {
    let fixture = Fixture::new("1.3.0", "1.3.0");
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);

    assert_eq!(workflow.outcome(), Some(&RunOutcome::UpToDate));
}

#[test]
fn dismissed_version_is_suppressed() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    *fixture.skip_store.version.borrow_mut() = Some("1.3.0".to_string());
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);

    assert_eq!(workflow.state(), UpdateState::Idle);
    assert_eq!(workflow.outcome(), Some(&RunOutcome::Suppressed));
    assert_eq!(*fixture.fetcher.requested.borrow(), vec![MANIFEST_URL]);
}

#[test]
fn preview_prompts_can_be_turned_off() {
    let fixture = Fixture::new("1.2.0", "1.3.0-preview.1");
    let mut workflow = fixture.workflow_with(UpdaterConfig {
        prompt_for_prerelease: false,
        ..Fixture::config()
    });

    workflow.activate();
    run_to_end(&mut workflow);

    assert_eq!(workflow.outcome(), Some(&RunOutcome::PrereleaseIgnored));
    assert!(fixture.presenter.displayed.borrow().is_empty());
}

#[test]
fn malformed_manifest_means_no_candidate() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    fixture
        .fetcher
        .respond(MANIFEST_URL, Ok("<html>rate limited</html>".to_string()));
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);

    assert_eq!(workflow.state(), UpdateState::Idle);
    assert_eq!(workflow.outcome(), Some(&RunOutcome::NoCandidate));
}

#[test]
fn unparseable_versions_mean_no_candidate() {
    let fixture = Fixture::new("1.2.0", "1.3.0-beta");
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);

    assert_eq!(workflow.outcome(), Some(&RunOutcome::NoCandidate));
    assert!(fixture.presenter.displayed.borrow().is_empty());
}

#[test]
fn inventory_failure_fails_the_run() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    *fixture.inventory.result.borrow_mut() = Some(Err("package manager offline".to_string()));
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);

    assert_eq!(
        workflow.visited(),
        &[UpdateState::Listing, UpdateState::Failed]
    );
    assert_eq!(
        workflow.outcome(),
        Some(&RunOutcome::Failed(StrandError::Inventory(
            "package manager offline".to_string()
        )))
    );
    assert!(fixture.fetcher.requested.borrow().is_empty());
}

#[test]
fn missing_package_fails_the_run() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    *fixture.inventory.result.borrow_mut() = Some(Ok(vec![InstalledPackage::new(
        "com.unity.xr.management",
        "3.2.0",
    )]));
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);

    assert_eq!(workflow.state(), UpdateState::Failed);
    assert_eq!(
        workflow.outcome(),
        Some(&RunOutcome::Failed(StrandError::PackageNotFound(
            PACKAGE.to_string()
        )))
    );
}

#[test]
fn manifest_transport_error_fails_the_run() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    fixture
        .fetcher
        .respond(MANIFEST_URL, Err("404 Not Found".to_string()));
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);

    assert_eq!(
        workflow.visited(),
        &[
            UpdateState::Listing,
            UpdateState::FetchingVersion,
            UpdateState::Failed
        ]
    );
    assert_eq!(
        workflow.outcome(),
        Some(&RunOutcome::Failed(StrandError::Transport {
            url: MANIFEST_URL.to_string(),
            reason: "404 Not Found".to_string(),
        }))
    );
}

#[test]
fn notes_transport_error_fails_without_presenting() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    fixture
        .fetcher
        .respond(CHANGELOG_URL, Err("connection reset".to_string()));
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);

    assert_eq!(
        workflow.visited(),
        &[
            UpdateState::Listing,
            UpdateState::FetchingVersion,
            UpdateState::FetchingNotes,
            UpdateState::Failed
        ]
    );
    assert!(fixture.presenter.displayed.borrow().is_empty());
}

#[test]
fn abandoned_fetch_is_a_transport_error() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    fixture.fetcher.responses.borrow_mut().remove(MANIFEST_URL);
    let mut workflow = fixture.workflow();

    workflow.activate();
    workflow.step();
    assert_eq!(workflow.state(), UpdateState::FetchingVersion);

    fixture.fetcher.held.borrow_mut().clear();
    run_to_end(&mut workflow);

    assert!(matches!(
        workflow.outcome(),
        Some(RunOutcome::Failed(StrandError::Transport { .. }))
    ));
}

// --- TICK BEHAVIOUR ---

#[test]
fn step_waits_on_an_in_flight_request() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    *fixture.inventory.result.borrow_mut() = None;
    let mut workflow = fixture.workflow();

    workflow.activate();
    for _ in 0..5 {
        assert_eq!(workflow.step(), ControlFlow::Continue(()));
    }
    assert_eq!(workflow.state(), UpdateState::Listing);
    assert_eq!(workflow.visited(), &[UpdateState::Listing]);
    assert!(fixture.fetcher.requested.borrow().is_empty());

    let completer = fixture.inventory.held.borrow_mut().remove(0);
    completer.complete(Ok(vec![InstalledPackage::new(PACKAGE, "1.2.0")]));

    assert_eq!(workflow.step(), ControlFlow::Continue(()));
    assert_eq!(workflow.state(), UpdateState::FetchingVersion);
    assert_eq!(workflow.current_version(), Some("1.2.0"));
}

#[test]
fn step_in_a_terminal_state_is_a_no_op() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    let mut workflow = fixture.workflow();

    assert_eq!(workflow.step(), ControlFlow::Break(()));
    assert!(workflow.visited().is_empty());

    workflow.activate();
    run_to_end(&mut workflow);
    let visited = workflow.visited().to_vec();
    let requests = fixture.fetcher.requested.borrow().len();

    for _ in 0..3 {
        assert_eq!(workflow.step(), ControlFlow::Break(()));
    }
    assert_eq!(workflow.visited(), visited.as_slice());
    assert_eq!(fixture.fetcher.requested.borrow().len(), requests);
    assert_eq!(fixture.presenter.displayed.borrow().len(), 1);
}

#[test]
fn failed_run_stays_failed_until_reactivated() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    *fixture.inventory.result.borrow_mut() = Some(Err("offline".to_string()));
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);
    workflow.step();
    assert_eq!(workflow.state(), UpdateState::Failed);
    assert_eq!(fixture.inventory.lists.get(), 1);

    *fixture.inventory.result.borrow_mut() =
        Some(Ok(vec![InstalledPackage::new(PACKAGE, "1.2.0")]));
    workflow.activate();
    run_to_end(&mut workflow);
    assert_eq!(workflow.outcome(), Some(&RunOutcome::Presented));
}

#[test]
fn activate_restarts_an_in_flight_run() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    fixture.fetcher.responses.borrow_mut().remove(MANIFEST_URL);
    let mut workflow = fixture.workflow();

    workflow.activate();
    workflow.step();
    assert_eq!(workflow.state(), UpdateState::FetchingVersion);
    assert!(workflow.is_running());

    workflow.activate();

    assert_eq!(workflow.state(), UpdateState::Listing);
    assert_eq!(workflow.visited(), &[UpdateState::Listing]);
    assert_eq!(workflow.current_version(), None);
    assert_eq!(fixture.inventory.lists.get(), 2);
}

#[test]
fn reset_forgets_the_run() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);
    assert!(workflow.candidate_version().is_some());

    workflow.reset();

    assert_eq!(workflow.state(), UpdateState::Idle);
    assert!(workflow.visited().is_empty());
    assert_eq!(workflow.outcome(), None);
    assert_eq!(workflow.candidate_version(), None);
    assert_eq!(workflow.release_notes(), None);
}

#[test]
fn cancel_drops_the_in_flight_request() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    fixture.fetcher.responses.borrow_mut().remove(MANIFEST_URL);
    let mut workflow = fixture.workflow();

    workflow.activate();
    workflow.step();
    assert_eq!(workflow.state(), UpdateState::FetchingVersion);

    workflow.cancel();

    assert!(!workflow.is_running());
    assert_eq!(workflow.state(), UpdateState::Idle);
    assert!(workflow.step().is_break());
}

#[test]
fn cancel_keeps_a_finished_run() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);
    workflow.cancel();

    assert_eq!(workflow.outcome(), Some(&RunOutcome::Presented));
    assert_eq!(workflow.candidate_version(), Some("1.3.0"));
    assert!(workflow.release_notes().is_some());
}

#[test]
fn full_changelog_can_be_kept() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    let mut workflow = fixture.workflow_with(UpdaterConfig {
        notes_preamble: NotesPreamble::Keep,
        ..Fixture::config()
    });

    workflow.activate();
    run_to_end(&mut workflow);

    assert_eq!(workflow.release_notes(), Some(CHANGELOG));
}

// --- USER ACTIONS ---

#[test]
fn accepting_replaces_the_package_and_closes_the_prompt() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);
    workflow.accept_update().expect("an update was presented");

    assert_eq!(
        *fixture.replacer.replaced.borrow(),
        vec![(PACKAGE.to_string(), "1.3.0".to_string())]
    );
    assert_eq!(fixture.presenter.closes.get(), 1);
}

#[test]
fn actions_require_a_presented_update() {
    let fixture = Fixture::new("1.3.0", "1.3.0");
    let mut workflow = fixture.workflow();

    assert!(matches!(
        workflow.accept_update(),
        Err(ActionError::NoCandidate)
    ));

    workflow.activate();
    run_to_end(&mut workflow);

    assert!(matches!(
        workflow.skip_this_version(),
        Err(ActionError::NoCandidate)
    ));
    assert!(fixture.replacer.replaced.borrow().is_empty());
    assert_eq!(fixture.skip_store.version.borrow().as_deref(), None);
}

#[test]
fn skipped_version_is_suppressed_on_the_next_run() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);
    workflow.skip_this_version().expect("an update was presented");
    assert_eq!(fixture.skip_store.version.borrow().as_deref(), Some("1.3.0"));

    workflow.activate();
    run_to_end(&mut workflow);
    assert_eq!(workflow.outcome(), Some(&RunOutcome::Suppressed));
    assert_eq!(fixture.presenter.displayed.borrow().len(), 1);
}

#[test]
fn persistence_failure_is_reported() {
    let fixture = Fixture::new("1.2.0", "1.3.0");
    fixture.skip_store.read_only.set(true);
    let mut workflow = fixture.workflow();

    workflow.activate();
    run_to_end(&mut workflow);

    let error = workflow.skip_this_version().unwrap_err();
    assert!(matches!(error, ActionError::Persist(_)));
    assert_eq!(fixture.presenter.closes.get(), 0);
}
