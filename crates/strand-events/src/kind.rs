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

//! The event-kind enumeration and the event payload handed to listeners.

use std::fmt;

macro_rules! event_kinds {
    ($( $(#[$doc:meta])* $name:ident = $code:literal ),+ $(,)?) => {
        /// The discriminant identifying which category of native event occurred.
        ///
        /// Variants are dense and start at zero, so [`EventKind::ordinal`] can
        /// index a fixed-size table directly. The runtime's own numbering is
        /// available through [`EventKind::code`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum EventKind {
            $( $(#[$doc])* $name, )+
        }

        impl EventKind {
            /// Every event kind, in ordinal order.
            pub const ALL: &'static [EventKind] = &[$( EventKind::$name, )+];

            /// The number of distinct event kinds.
            pub const COUNT: usize = Self::ALL.len();

            /// The native runtime's code for this kind.
            pub const fn code(self) -> u32 {
                match self {
                    $( EventKind::$name => $code, )+
                }
            }

            /// Maps a native runtime code back to its kind.
            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $( $code => Some(EventKind::$name), )+
                    _ => None,
                }
            }

            /// A stable, human-readable name.
            pub const fn name(self) -> &'static str {
                match self {
                    $( EventKind::$name => stringify!($name), )+
                }
            }
        }
    };
}

event_kinds! {
    /// Placeholder for a zeroed event slot.
    Invalid = 0,
    /// A tracked device was connected.
    TrackedDeviceActivated = 100,
    /// A tracked device was disconnected.
    TrackedDeviceDeactivated = 101,
    /// A tracked device's properties changed.
    TrackedDeviceUpdated = 102,
    /// The user started interacting with a tracked device.
    TrackedDeviceUserInteractionStarted = 103,
    /// The user stopped interacting with a tracked device.
    TrackedDeviceUserInteractionEnded = 104,
    /// The interpupillary distance changed.
    IpdChanged = 105,
    /// The headset entered standby.
    EnterStandbyMode = 106,
    /// The headset left standby.
    LeaveStandbyMode = 107,
    /// A device changed its role (left/right hand...).
    TrackedDeviceRoleChanged = 108,
    /// A controller button was pressed.
    ButtonPress = 200,
    /// A controller button was released.
    ButtonUnpress = 201,
    /// A controller button was touched.
    ButtonTouch = 202,
    /// A controller button stopped being touched.
    ButtonUntouch = 203,
    /// Another process captured input focus.
    InputFocusCaptured = 400,
    /// Input focus was released.
    InputFocusReleased = 401,
    /// The foreground scene application changed.
    SceneApplicationChanged = 404,
    /// The dashboard was opened.
    DashboardActivated = 500,
    /// The dashboard was closed.
    DashboardDeactivated = 501,
    /// The runtime asks the application to quit.
    Quit = 700,
    /// Another process is quitting.
    ProcessQuit = 701,
    /// A quit request was acknowledged.
    QuitAcknowledged = 703,
    /// The play-area boundary data changed.
    ChaperoneDataHasChanged = 800,
    /// The tracking universe changed.
    ChaperoneUniverseHasChanged = 801,
}

impl EventKind {
    /// The dense index of this kind, in `0..EventKind::COUNT`.
    pub const fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind-specific payload data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EventData {
    /// The event carries nothing beyond its kind.
    #[default]
    Empty,
    /// A controller button changed state.
    Controller {
        /// The button identifier.
        button: u32,
    },
    /// A process-level event.
    Process {
        /// The process the event concerns.
        pid: u32,
        /// The previously focused process, if relevant.
        old_pid: u32,
        /// Whether the runtime forced the transition.
        forced: bool,
    },
    /// The interpupillary distance, in meters.
    Ipd {
        /// New distance.
        ipd_meters: f32,
    },
}

/// One event pulled from the native queue.
///
/// Listeners receive their own copy; nothing about the event outlives the call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VrEvent {
    /// Which kind of event this is.
    pub kind: EventKind,
    /// The tracked device the event concerns.
    pub tracked_device_index: u32,
    /// How long ago the event happened, in seconds.
    pub age_seconds: f32,
    /// The kind-specific payload.
    pub data: EventData,
}

impl VrEvent {
    /// Creates an event of `kind` with no payload.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            tracked_device_index: 0,
            age_seconds: 0.0,
            data: EventData::Empty,
        }
    }

    /// Sets the tracked device index.
    pub fn with_device(mut self, tracked_device_index: u32) -> Self {
        self.tracked_device_index = tracked_device_index;
        self
    }

    /// Sets the payload.
    pub fn with_data(mut self, data: EventData) -> Self {
        self.data = data;
        self
    }
}
