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

//! A host loop driving the event dispatcher and the update check against
//! simulated native and network collaborators.
//!
//! A producer thread plays the part of the native runtime: it emits a few
//! device and button events, then asks the application to quit. The update
//! check talks to a fake package manager and a fake web server that answer
//! after a short delay, so the workflow visibly waits across ticks.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;
use std::thread;
use std::time::Duration;
use strand_host::strand_core::PendingRequest;
use strand_host::strand_events::{
    ChannelEventSource, EventData, EventFeed, EventKind, EventSource, VrEvent,
};
use strand_host::strand_updater::{
    FetchResult, HttpFetcher, InstalledPackage, InventoryResult, PackageInventory,
    PackageReplacer, UpdateCollaborators, UpdatePresenter, UpdateWorkflow,
};
use strand_host::{
    logging, HostRuntime, MirrorViewMode, NativeBinding, NativeInitError, SettingsFile,
};

const TICK: Duration = Duration::from_millis(16);
const MAX_TICKS: u32 = 1_000;

// --- SIMULATED NATIVE RUNTIME ---

struct SimulatedBinding {
    source: Rc<ChannelEventSource>,
    feed: Option<EventFeed>,
}

impl SimulatedBinding {
    fn new() -> Self {
        let (source, feed) = ChannelEventSource::new();
        Self {
            source: Rc::new(source),
            feed: Some(feed),
        }
    }
}

impl NativeBinding for SimulatedBinding {
    fn create_subsystems(&mut self) -> bool {
        log::info!("[sim] display and input subsystems created");
        true
    }

    fn start_subsystems(&mut self) {
        let Some(feed) = self.feed.take() else {
            return;
        };
        let spawned = thread::Builder::new()
            .name("sim-runtime".to_string())
            .spawn(move || produce_events(feed));
        if let Err(e) = spawned {
            log::error!("[sim] could not start the event producer: {e}");
        }
    }

    fn stop_subsystems(&mut self) {
        log::info!("[sim] subsystems stopped");
    }

    fn destroy_subsystems(&mut self) {
        log::info!("[sim] subsystems destroyed");
    }

    fn initialization_result(&self) -> Result<(), NativeInitError> {
        Ok(())
    }

    fn competing_event_consumer(&self) -> bool {
        false
    }

    fn event_source(&self) -> Rc<dyn EventSource> {
        self.source.clone()
    }

    fn set_mirror_view_mode(&mut self, mode: MirrorViewMode) {
        log::info!("[sim] mirror view set to {mode}");
    }
}

fn produce_events(feed: EventFeed) {
    let script = [
        VrEvent::new(EventKind::TrackedDeviceActivated).with_device(0),
        VrEvent::new(EventKind::TrackedDeviceActivated).with_device(1),
        VrEvent::new(EventKind::ButtonPress)
            .with_device(1)
            .with_data(EventData::Controller { button: 33 }),
        VrEvent::new(EventKind::ButtonUnpress)
            .with_device(1)
            .with_data(EventData::Controller { button: 33 }),
        VrEvent::new(EventKind::DashboardActivated),
        VrEvent::new(EventKind::DashboardDeactivated),
    ];
    for event in script {
        thread::sleep(Duration::from_millis(50));
        if !feed.push(event) {
            return;
        }
    }
    // Let the update check finish before quitting.
    thread::sleep(Duration::from_millis(500));
    feed.push(VrEvent::new(EventKind::Quit));
}

// --- SIMULATED PACKAGE MANAGER AND WEB SERVER ---

struct SimulatedInventory;

impl PackageInventory for SimulatedInventory {
    fn list(&self) -> PendingRequest<InventoryResult> {
        PendingRequest::spawn(|| {
            thread::sleep(Duration::from_millis(80));
            Ok(vec![
                InstalledPackage::new("com.unity.xr.management", "3.2.0"),
                InstalledPackage::new("com.valve.openvr", "1.2.0"),
            ])
        })
    }
}

struct SimulatedWeb;

impl HttpFetcher for SimulatedWeb {
    fn get(&self, url: &str) -> PendingRequest<FetchResult> {
        let body = if url.ends_with("package.json") {
            r#"{ "name": "com.valve.openvr", "version": "1.3.0-preview.1" }"#
        } else {
            "# Changelog\nAll notable changes to this package are documented here.\n\n\
             ## [1.3.0-preview.1]\n- Mirror view can be switched at runtime.\n\n\
             ## [1.2.0]\n- First public release.\n"
        };
        PendingRequest::spawn(move || {
            thread::sleep(Duration::from_millis(120));
            Ok(body.to_string())
        })
    }
}

struct LogPresenter;

impl UpdatePresenter for LogPresenter {
    fn display(&self, current: &str, candidate: &str, notes: &str) {
        log::info!("[dialog] update available: {current} -> {candidate}\n{notes}");
    }

    fn close(&self) {
        log::info!("[dialog] closed");
    }
}

struct LogReplacer;

impl PackageReplacer for LogReplacer {
    fn replace(&self, package: &str, version: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        log::info!("[sim] would replace {package} with {version}");
        Ok(())
    }
}

fn main() -> Result<()> {
    logging::init();

    let settings_path = std::env::temp_dir().join("strand-sandbox").join("settings.ron");
    let settings = Rc::new(SettingsFile::open(&settings_path).context("loading settings")?);

    let mut runtime = HostRuntime::new(SimulatedBinding::new(), Rc::clone(&settings));
    runtime.initialize()?;
    runtime.start()?;

    if let Some(dispatcher) = runtime.dispatcher() {
        let mut dispatcher = dispatcher.borrow_mut();
        for kind in [EventKind::ButtonPress, EventKind::ButtonUnpress] {
            dispatcher.add_listener(
                kind,
                Box::new(|event: VrEvent| {
                    log::info!("[input] {} on device {}", event.kind, event.tracked_device_index)
                }),
                false,
            );
        }
        dispatcher.add_listener(
            EventKind::TrackedDeviceActivated,
            Box::new(|event: VrEvent| {
                log::info!("[input] device {} connected", event.tracked_device_index)
            }),
            false,
        );
    }

    let workflow = Rc::new(RefCell::new(UpdateWorkflow::new(
        settings.get().updater_config(),
        UpdateCollaborators {
            inventory: Rc::new(SimulatedInventory),
            fetcher: Rc::new(SimulatedWeb),
            presenter: Rc::new(LogPresenter),
            skip_store: settings.clone(),
            replacer: Rc::new(LogReplacer),
        },
    )));
    runtime.activate_update_check(Rc::clone(&workflow));

    let mut ticks = 0;
    while !runtime.exit_requested() && ticks < MAX_TICKS {
        runtime.tick();
        ticks += 1;
        thread::sleep(TICK);
    }

    if let Some(outcome) = workflow.borrow().outcome() {
        log::info!("Update check finished: {outcome:?}");
    }
    log::info!("Host loop ran {ticks} ticks.");

    runtime.stop();
    runtime.deinitialize();
    Ok(())
}
