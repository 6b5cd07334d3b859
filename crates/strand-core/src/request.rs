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

//! Non-blocking handles for asynchronous requests polled from a tick.
//!
//! A [`PendingRequest`] is the receiving half of a single-value `flume`
//! channel. The tick that owns it asks [`PendingRequest::is_ready`] and, once
//! ready, takes the value with [`PendingRequest::take_result`]. Neither call
//! ever blocks. Whoever does the work holds the matching
//! [`RequestCompleter`]; dropping it without completing marks the request as
//! abandoned instead of leaving the owner parked forever.

use flume::TryRecvError;
use std::thread;
use thiserror::Error;

/// The completing side went away without producing a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request was abandoned before it completed")]
pub struct RequestAbandoned;

enum Slot<T> {
    Waiting,
    Done(T),
    Abandoned,
    Spent,
}

/// A request whose result arrives on a later tick.
pub struct PendingRequest<T> {
    receiver: flume::Receiver<T>,
    slot: Slot<T>,
}

/// The producing side of a [`PendingRequest`].
pub struct RequestCompleter<T> {
    sender: flume::Sender<T>,
}

impl<T> PendingRequest<T> {
    /// Creates a linked completer/request pair.
    pub fn channel() -> (RequestCompleter<T>, PendingRequest<T>) {
        let (sender, receiver) = flume::bounded(1);
        (
            RequestCompleter { sender },
            PendingRequest {
                receiver,
                slot: Slot::Waiting,
            },
        )
    }

    /// Creates a request that is already complete.
    pub fn ready(value: T) -> Self {
        let (completer, request) = Self::channel();
        completer.complete(value);
        request
    }

    /// Pulls the value out of the channel if it has arrived.
    fn pump(&mut self) {
        if let Slot::Waiting = self.slot {
            match self.receiver.try_recv() {
                Ok(value) => self.slot = Slot::Done(value),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.slot = Slot::Abandoned,
            }
        }
    }

    /// Returns `true` once a result (or abandonment) can be taken.
    pub fn is_ready(&mut self) -> bool {
        self.pump();
        matches!(self.slot, Slot::Done(_) | Slot::Abandoned)
    }

    /// Takes the result if the request has completed.
    ///
    /// Returns `None` while the request is still in flight. A result is handed
    /// out only once; afterwards the handle is spent and keeps returning `None`.
    pub fn take_result(&mut self) -> Option<Result<T, RequestAbandoned>> {
        self.pump();
        match std::mem::replace(&mut self.slot, Slot::Spent) {
            Slot::Done(value) => Some(Ok(value)),
            Slot::Abandoned => Some(Err(RequestAbandoned)),
            Slot::Waiting => {
                self.slot = Slot::Waiting;
                None
            }
            Slot::Spent => None,
        }
    }
}

impl<T: Send + 'static> PendingRequest<T> {
    /// Runs a blocking `job` on a worker thread and returns its handle.
    ///
    /// Lets a host plug a synchronous client (HTTP, package manager) into the
    /// tick loop without the tick ever waiting on it.
    pub fn spawn<F>(job: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (completer, request) = Self::channel();
        let spawned = thread::Builder::new()
            .name("strand-request".to_string())
            .spawn(move || completer.complete(job()));
        if let Err(e) = spawned {
            // The closure (and its completer) is dropped, so the request reads as abandoned.
            log::error!("Failed to spawn request worker: {e}");
        }
        request
    }
}

impl<T> std::fmt::Debug for PendingRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.slot {
            Slot::Waiting => "waiting",
            Slot::Done(_) => "done",
            Slot::Abandoned => "abandoned",
            Slot::Spent => "spent",
        };
        f.debug_struct("PendingRequest").field("state", &state).finish()
    }
}

impl<T> RequestCompleter<T> {
    /// Delivers the result. Silently discarded if the request was dropped.
    pub fn complete(self, value: T) {
        if self.sender.send(value).is_err() {
            log::trace!("Request completed after its owner released it.");
        }
    }
}
