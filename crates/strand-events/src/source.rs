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

//! Contracts for the native event queue and the host's exit action.

use crate::kind::VrEvent;
use flume::TryRecvError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// The native event source is gone (driver handle released, runtime shut down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("native event source is unavailable")]
pub struct SourceUnavailable;

impl From<SourceUnavailable> for strand_core::StrandError {
    fn from(_: SourceUnavailable) -> Self {
        strand_core::StrandError::NativeSourceUnavailable
    }
}

/// The native, non-blocking event queue.
///
/// Methods take `&self`: a native queue is a handle into the runtime, and the
/// built-in quit listener has to reach it while the dispatcher is draining.
pub trait EventSource {
    /// Pulls the next pending event.
    ///
    /// Returns `Ok(None)` when the queue is empty and `Err(SourceUnavailable)`
    /// when the runtime behind the queue is gone.
    fn poll_next(&self) -> Result<Option<VrEvent>, SourceUnavailable>;

    /// Tells the runtime the application is exiting in response to a quit request.
    fn acknowledge_quit(&self);
}

/// The host's "leave the running session" action.
pub trait ExitRequester {
    /// Asks the host to shut down the running application.
    fn request_exit(&self);
}

/// The receiving end of a channel-backed native queue.
///
/// A native thread pushes events through the paired [`EventFeed`]; the tick
/// drains them here. Dropping every feed makes the source unavailable.
#[derive(Debug)]
pub struct ChannelEventSource {
    receiver: flume::Receiver<VrEvent>,
    quit_acknowledged: Arc<AtomicBool>,
}

/// The producing end of a [`ChannelEventSource`].
#[derive(Debug, Clone)]
pub struct EventFeed {
    sender: flume::Sender<VrEvent>,
    quit_acknowledged: Arc<AtomicBool>,
}

impl ChannelEventSource {
    /// Creates a connected source/feed pair over an unbounded channel.
    pub fn new() -> (Self, EventFeed) {
        let (sender, receiver) = flume::unbounded();
        let quit_acknowledged = Arc::new(AtomicBool::new(false));
        (
            Self {
                receiver,
                quit_acknowledged: Arc::clone(&quit_acknowledged),
            },
            EventFeed {
                sender,
                quit_acknowledged,
            },
        )
    }

    /// Number of events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl EventSource for ChannelEventSource {
    fn poll_next(&self) -> Result<Option<VrEvent>, SourceUnavailable> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SourceUnavailable),
        }
    }

    fn acknowledge_quit(&self) {
        self.quit_acknowledged.store(true, Ordering::SeqCst);
    }
}

impl EventFeed {
    /// Pushes an event into the queue.
    ///
    /// Returns `false` if the source side has been dropped.
    pub fn push(&self, event: VrEvent) -> bool {
        if self.sender.send(event).is_err() {
            log::trace!("Dropping {} event: source released.", event.kind);
            return false;
        }
        true
    }

    /// Whether the application acknowledged a quit request.
    pub fn quit_acknowledged(&self) -> bool {
        self.quit_acknowledged.load(Ordering::SeqCst)
    }
}
