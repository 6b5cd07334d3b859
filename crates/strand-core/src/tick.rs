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

//! The per-tick callback registry driven by the host loop.
//!
//! The host calls [`TickRegistry::tick`] once per loop iteration. Every
//! registered callback runs exactly once per tick, in registration order, on
//! the host thread. A callback returns [`ControlFlow::Break`] to unregister
//! itself; anything else can be torn down from the outside with
//! [`TickRegistry::unregister`] or [`TickRegistry::clear`], which drop the
//! callback (and everything it captured) before returning.

use std::fmt;
use std::ops::ControlFlow;

/// A callback invoked once per tick.
pub type TickCallback = Box<dyn FnMut() -> ControlFlow<()>>;

/// Names a slot in the [`TickRegistry`]. At most one callback lives under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickKey(pub &'static str);

impl fmt::Display for TickKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

struct TickEntry {
    key: TickKey,
    callback: TickCallback,
}

/// An ordered, keyed set of tick callbacks.
pub struct TickRegistry {
    entries: Vec<TickEntry>,
    ticks: u64,
}

impl TickRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            ticks: 0,
        }
    }

    /// Registers `callback` under `key`.
    ///
    /// If a callback is already registered under the same key it is replaced
    /// in place, keeping its position in the invocation order.
    pub fn register(&mut self, key: TickKey, callback: TickCallback) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            log::debug!("TickRegistry: Replaced callback '{key}'");
            entry.callback = callback;
            return;
        }

        log::debug!("TickRegistry: Registered callback '{key}'");
        self.entries.push(TickEntry { key, callback });
    }

    /// Removes the callback registered under `key`.
    ///
    /// Returns `true` if a callback was removed.
    pub fn unregister(&mut self, key: TickKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        let removed = self.entries.len() != before;
        if removed {
            log::debug!("TickRegistry: Unregistered callback '{key}'");
        }
        removed
    }

    /// Returns `true` if a callback is registered under `key`.
    pub fn is_registered(&self, key: TickKey) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Removes every callback.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::debug!(
                "TickRegistry: Cleared {} callback(s)",
                self.entries.len()
            );
        }
        self.entries.clear();
    }

    /// Runs every registered callback once, dropping those that break.
    pub fn tick(&mut self) {
        self.ticks += 1;
        self.entries.retain_mut(|entry| match (entry.callback)() {
            ControlFlow::Continue(()) => true,
            ControlFlow::Break(()) => {
                log::debug!("TickRegistry: Callback '{}' finished", entry.key);
                false
            }
        });
    }

    /// The number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Returns the number of registered callbacks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TickRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TickRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickRegistry")
            .field("keys", &self.entries.iter().map(|e| e.key).collect::<Vec<_>>())
            .field("ticks", &self.ticks)
            .finish()
    }
}
