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

//! The host runtime: native subsystem lifecycle plus the per-tick services
//! that run on top of it.
//!
//! Lifecycle, in order: [`HostRuntime::initialize`], [`HostRuntime::start`],
//! then [`HostRuntime::tick`] once per host loop iteration, then
//! [`HostRuntime::stop`] and [`HostRuntime::deinitialize`]. Every teardown
//! path unregisters the tick callbacks before returning, so nothing captured
//! by them can run afterwards.

use crate::mirror::{read_mirror_config, MirrorViewMode, MirrorViewWatcher, MIRROR_CONFIG_FILE};
use crate::settings::SettingsFile;
use anyhow::{ensure, Context, Result};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::rc::Rc;
use strand_core::{TickKey, TickRegistry};
use strand_events::{EventDispatcher, EventSource, ExitRequester};
use strand_updater::UpdateWorkflow;
use thiserror::Error;

/// Drains the native event queue.
pub const EVENT_DRAIN_TICK: TickKey = TickKey("event-drain");
/// Advances the update check while it runs.
pub const UPDATE_CHECK_TICK: TickKey = TickKey("update-check");
/// Applies mirror-view config changes.
pub const MIRROR_WATCH_TICK: TickKey = TickKey("mirror-watch");

/// The native runtime reported a failed initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("native runtime initialization failed: {0}")]
pub struct NativeInitError(pub String);

/// The native side of the runtime: display/input subsystems and the event queue.
pub trait NativeBinding {
    /// Creates the display and input subsystems. Returns `false` if either is missing.
    fn create_subsystems(&mut self) -> bool;
    /// Starts the subsystems.
    fn start_subsystems(&mut self);
    /// Stops the subsystems. Stopping the display shuts the runtime down.
    fn stop_subsystems(&mut self);
    /// Destroys the subsystems.
    fn destroy_subsystems(&mut self);
    /// The result of bringing the native runtime up, available once started.
    fn initialization_result(&self) -> Result<(), NativeInitError>;
    /// Whether another input system already consumes the native event queue.
    fn competing_event_consumer(&self) -> bool;
    /// The native event queue.
    fn event_source(&self) -> Rc<dyn EventSource>;
    /// Switches the desktop mirror view.
    fn set_mirror_view_mode(&mut self, mode: MirrorViewMode);
}

/// Records that the runtime asked the application to exit.
#[derive(Debug, Default)]
pub struct ExitSignal {
    requested: Cell<bool>,
}

impl ExitSignal {
    /// Whether an exit has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.get()
    }
}

impl ExitRequester for ExitSignal {
    fn request_exit(&self) {
        self.requested.set(true);
    }
}

/// Owns the native binding and the tick services built on it.
pub struct HostRuntime<B: NativeBinding> {
    binding: Rc<RefCell<B>>,
    settings: Rc<SettingsFile>,
    ticks: TickRegistry,
    dispatcher: Option<Rc<RefCell<EventDispatcher>>>,
    update_check: Option<Rc<RefCell<UpdateWorkflow>>>,
    exit: Rc<ExitSignal>,
    mirror_config_path: PathBuf,
    reload_guard_armed: bool,
}

impl<B: NativeBinding + 'static> HostRuntime<B> {
    /// Creates a runtime around `binding`. Nothing native happens until
    /// [`HostRuntime::initialize`].
    pub fn new(binding: B, settings: Rc<SettingsFile>) -> Self {
        Self {
            binding: Rc::new(RefCell::new(binding)),
            settings,
            ticks: TickRegistry::new(),
            dispatcher: None,
            update_check: None,
            exit: Rc::new(ExitSignal::default()),
            mirror_config_path: PathBuf::from(MIRROR_CONFIG_FILE),
            reload_guard_armed: false,
        }
    }

    /// Reads the mirror-view config from `path` instead of the working directory.
    pub fn with_mirror_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.mirror_config_path = path.into();
        self
    }

    /// Creates the native subsystems and the event dispatcher, registers the
    /// drain tick and runs it once.
    ///
    /// Fails if the native subsystems could not be created; the dispatcher
    /// is set up regardless.
    pub fn initialize(&mut self) -> Result<()> {
        let settings = self.settings.get();
        let created = {
            let mut binding = self.binding.borrow_mut();
            binding.set_mirror_view_mode(settings.mirror_view);
            binding.create_subsystems()
        };

        let source = self.binding.borrow().event_source();
        let binding = Rc::clone(&self.binding);
        let dispatcher = Rc::new(RefCell::new(EventDispatcher::initialize(
            settings.dispatcher_config(),
            source,
            Rc::clone(&self.exit) as Rc<dyn ExitRequester>,
            move || binding.borrow().competing_event_consumer(),
        )));

        let drain = Rc::clone(&dispatcher);
        self.ticks.register(
            EVENT_DRAIN_TICK,
            Box::new(move || {
                drain.borrow_mut().drain();
                ControlFlow::Continue(())
            }),
        );
        dispatcher.borrow_mut().drain();
        self.dispatcher = Some(dispatcher);

        ensure!(created, "native display or input subsystem could not be created");
        log::info!("Host runtime initialized.");
        Ok(())
    }

    /// Starts the native subsystems and the mirror-view watcher.
    pub fn start(&mut self) -> Result<()> {
        self.reload_guard_armed = true;
        {
            let mut binding = self.binding.borrow_mut();
            binding.start_subsystems();
        }

        let init = self.binding.borrow().initialization_result();
        if let Err(e) = init {
            log::error!("Could not initialize the native runtime: {e}");
            return Err(e).context("starting the host runtime");
        }

        if !self.ticks.is_registered(MIRROR_WATCH_TICK) {
            self.start_mirror_watcher();
        }
        log::info!("Host runtime started.");
        Ok(())
    }

    fn start_mirror_watcher(&mut self) {
        if let Some(mode) = read_mirror_config(&self.mirror_config_path) {
            log::info!("Mirror view mode set via file to: {mode}");
            self.binding.borrow_mut().set_mirror_view_mode(mode);
        }

        let mut watcher = match MirrorViewWatcher::watch(&self.mirror_config_path) {
            Ok(watcher) => watcher,
            Err(e) => {
                log::warn!("Mirror view config will not be watched: {e}");
                return;
            }
        };
        let binding = Rc::clone(&self.binding);
        self.ticks.register(
            MIRROR_WATCH_TICK,
            Box::new(move || {
                if let Some(mode) = watcher.poll() {
                    binding.borrow_mut().set_mirror_view_mode(mode);
                }
                ControlFlow::Continue(())
            }),
        );
    }

    /// Stops every tick service and the native subsystems.
    pub fn stop(&mut self) {
        self.teardown_ticks();
        self.binding.borrow_mut().stop_subsystems();
        log::info!("Host runtime stopped.");
    }

    /// Stops every tick service, drops the dispatcher and destroys the
    /// native subsystems.
    pub fn deinitialize(&mut self) {
        self.teardown_ticks();
        self.dispatcher = None;
        self.binding.borrow_mut().destroy_subsystems();
        log::info!("Host runtime deinitialized.");
    }

    /// Called by the host right before it reloads code. Unregisters every
    /// tick callback so none can fire into unloaded state.
    ///
    /// The guard is only armed by [`HostRuntime::start`]; a reload between
    /// `initialize` and `start` leaves the drain tick registered.
    pub fn before_reload(&mut self) {
        if self.reload_guard_armed {
            log::debug!("Reload pending; unregistering tick callbacks.");
            self.ticks.clear();
            self.cancel_update_check();
        }
    }

    fn teardown_ticks(&mut self) {
        self.ticks.clear();
        self.cancel_update_check();
        self.reload_guard_armed = false;
    }

    fn cancel_update_check(&mut self) {
        if let Some(workflow) = self.update_check.take() {
            workflow.borrow_mut().cancel();
        }
    }

    /// Starts an update check, unless the user turned update prompts off.
    ///
    /// Restarts a check that is already running. Returns whether a check was
    /// started.
    pub fn activate_update_check(&mut self, workflow: Rc<RefCell<UpdateWorkflow>>) -> bool {
        if !self.settings.get().prompt_to_upgrade {
            log::debug!("Update prompts are disabled; skipping the update check.");
            return false;
        }
        workflow.borrow_mut().activate();
        self.update_check = Some(Rc::clone(&workflow));
        self.ticks.register(
            UPDATE_CHECK_TICK,
            Box::new(move || workflow.borrow_mut().step()),
        );
        true
    }

    /// Runs one host loop iteration's worth of tick callbacks.
    pub fn tick(&mut self) {
        self.ticks.tick();
    }

    /// The event dispatcher, once initialized.
    ///
    /// Listeners must be added or removed outside of [`HostRuntime::tick`].
    pub fn dispatcher(&self) -> Option<Rc<RefCell<EventDispatcher>>> {
        self.dispatcher.clone()
    }

    /// Whether the tick callback `key` is currently registered.
    pub fn is_tick_registered(&self, key: TickKey) -> bool {
        self.ticks.is_registered(key)
    }

    /// Whether the runtime asked the application to exit.
    pub fn exit_requested(&self) -> bool {
        self.exit.is_requested()
    }

    /// The settings this runtime was built with.
    pub fn settings(&self) -> &Rc<SettingsFile> {
        &self.settings
    }

    /// The native binding.
    pub fn binding(&self) -> Ref<'_, B> {
        self.binding.borrow()
    }

    /// The native binding, mutably.
    pub fn binding_mut(&self) -> RefMut<'_, B> {
        self.binding.borrow_mut()
    }
}
