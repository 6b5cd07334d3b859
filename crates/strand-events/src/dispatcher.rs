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

//! Routes native events to registered listeners under a per-tick budget.

use crate::kind::{EventKind, VrEvent};
use crate::source::{EventSource, ExitRequester};
use std::rc::Rc;

/// A callback invoked with its own copy of each matching event.
pub type Listener = Box<dyn FnMut(VrEvent)>;

/// Identifies a registered listener for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Configuration for the [`EventDispatcher`].
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Maximum number of events pulled from the source per [`EventDispatcher::drain`].
    pub per_tick_budget: usize,
    /// Allocate a kind's listener list on first registration instead of up front.
    pub lazy_listener_lists: bool,
    /// Log every dispatched event at debug level.
    pub log_all_events: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            per_tick_budget: 64,
            lazy_listener_lists: false,
            log_all_events: false,
        }
    }
}

/// Why a [`EventDispatcher::drain`] call stopped pulling events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStop {
    /// The source reported an empty queue.
    Empty,
    /// The per-tick budget was used up; the rest waits for the next tick.
    BudgetExhausted,
    /// The source went away mid-drain.
    SourceUnavailable,
    /// The dispatcher is disabled and did not poll at all.
    Disabled,
}

/// The outcome of one drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Events pulled (and dispatched) during this call.
    pub pulled: usize,
    /// Why the call stopped.
    pub stop: DrainStop,
}

struct ListenerEntry {
    id: ListenerId,
    callback: Listener,
}

/// The live listener table.
struct ActiveDispatcher {
    /// Indexed by [`EventKind::ordinal`]; `None` means not yet allocated.
    listeners: Vec<Option<Vec<ListenerEntry>>>,
    source: Rc<dyn EventSource>,
    config: DispatcherConfig,
    next_id: u64,
}

enum DispatcherMode {
    Active(ActiveDispatcher),
    /// Another consumer owns the native events; every operation is a no-op.
    Disabled,
}

/// Drains the native event queue into per-kind listener lists.
///
/// Constructed once per process. If a competing consumer of the same events
/// is detected during [`EventDispatcher::initialize`], the dispatcher is built
/// in its disabled form and stays that way for its lifetime.
pub struct EventDispatcher {
    mode: DispatcherMode,
}

impl EventDispatcher {
    /// Builds the dispatcher and registers the built-in listeners.
    ///
    /// `competing_consumer` is evaluated exactly once, here.
    pub fn initialize(
        config: DispatcherConfig,
        source: Rc<dyn EventSource>,
        exit: Rc<dyn ExitRequester>,
        competing_consumer: impl FnOnce() -> bool,
    ) -> Self {
        if competing_consumer() {
            log::warn!("Another event consumer owns the native event queue; dispatcher disabled.");
            return Self {
                mode: DispatcherMode::Disabled,
            };
        }

        let listeners = (0..EventKind::COUNT)
            .map(|_| (!config.lazy_listener_lists).then(Vec::new))
            .collect();

        log::info!(
            "EventDispatcher initialized ({} kinds, budget {}, lazy={}).",
            EventKind::COUNT,
            config.per_tick_budget,
            config.lazy_listener_lists
        );

        let mut dispatcher = Self {
            mode: DispatcherMode::Active(ActiveDispatcher {
                listeners,
                source: Rc::clone(&source),
                config,
                next_id: 0,
            }),
        };
        dispatcher.register_default_listeners(source, exit);
        dispatcher
    }

    /// Registers the listeners every dispatcher carries.
    fn register_default_listeners(
        &mut self,
        source: Rc<dyn EventSource>,
        exit: Rc<dyn ExitRequester>,
    ) {
        self.add_listener(EventKind::Quit, quit_listener(source, exit), false);
    }

    /// Returns `true` unless a competing consumer disabled this dispatcher.
    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, DispatcherMode::Active(_))
    }

    /// Appends `callback` to the listener list of `kind`.
    ///
    /// With `exclusive`, every listener already registered for `kind` is
    /// removed first. Returns `None` if the dispatcher is disabled.
    pub fn add_listener(
        &mut self,
        kind: EventKind,
        callback: Listener,
        exclusive: bool,
    ) -> Option<ListenerId> {
        let active = match &mut self.mode {
            DispatcherMode::Active(active) => active,
            DispatcherMode::Disabled => {
                log::error!(
                    "Cannot listen for {kind}: the event dispatcher is disabled because another consumer owns the event queue."
                );
                return None;
            }
        };

        let id = ListenerId(active.next_id);
        active.next_id += 1;

        let list = active.listeners[kind.ordinal()].get_or_insert_with(Vec::new);
        if exclusive && !list.is_empty() {
            log::debug!("Removing {} listener(s) for {kind}.", list.len());
            list.clear();
        }
        list.push(ListenerEntry { id, callback });
        Some(id)
    }

    /// Removes the listener `id` from `kind`. Returns `false` if it was not there.
    pub fn remove_listener(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let DispatcherMode::Active(active) = &mut self.mode else {
            return false;
        };
        let Some(list) = active.listeners[kind.ordinal()].as_mut() else {
            return false;
        };
        match list.iter().position(|entry| entry.id == id) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        match &self.mode {
            DispatcherMode::Active(active) => active.listeners[kind.ordinal()]
                .as_ref()
                .map_or(0, Vec::len),
            DispatcherMode::Disabled => 0,
        }
    }

    /// Whether the listener list for `kind` has been allocated.
    pub fn is_allocated(&self, kind: EventKind) -> bool {
        match &self.mode {
            DispatcherMode::Active(active) => active.listeners[kind.ordinal()].is_some(),
            DispatcherMode::Disabled => false,
        }
    }

    /// Pulls and dispatches pending events, at most `per_tick_budget` of them.
    ///
    /// Each event is delivered to every listener of its kind, in registration
    /// order, before the next event is pulled. An unavailable source ends the
    /// drain quietly.
    pub fn drain(&mut self) -> DrainReport {
        let active = match &mut self.mode {
            DispatcherMode::Active(active) => active,
            DispatcherMode::Disabled => {
                return DrainReport {
                    pulled: 0,
                    stop: DrainStop::Disabled,
                }
            }
        };

        let mut pulled = 0;
        let stop = loop {
            if pulled >= active.config.per_tick_budget {
                break DrainStop::BudgetExhausted;
            }
            let event = match active.source.poll_next() {
                Ok(Some(event)) => event,
                Ok(None) => break DrainStop::Empty,
                Err(_) => {
                    log::trace!("Event source unavailable; stopping this tick's drain.");
                    break DrainStop::SourceUnavailable;
                }
            };
            pulled += 1;
            active.dispatch(event);
        };

        DrainReport { pulled, stop }
    }
}

impl ActiveDispatcher {
    fn dispatch(&mut self, event: VrEvent) {
        if self.config.log_all_events {
            log::debug!(
                "Event {} (device {}, age {:.3}s)",
                event.kind,
                event.tracked_device_index,
                event.age_seconds
            );
        }

        if let Some(list) = self.listeners[event.kind.ordinal()].as_mut() {
            for entry in list.iter_mut() {
                (entry.callback)(event);
            }
        }
    }
}

/// The built-in quit handler. Runs its exit sequence at most once.
fn quit_listener(source: Rc<dyn EventSource>, exit: Rc<dyn ExitRequester>) -> Listener {
    let mut exiting = false;
    Box::new(move |_event| {
        if exiting {
            return;
        }
        exiting = true;

        source.acknowledge_quit();
        log::info!("Quit requested by the runtime. Exiting application.");
        exit.request_exit();
    })
}
