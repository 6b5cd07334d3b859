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

//! Runtime switching of the desktop mirror view through a small config file.
//!
//! End users drop a file named [`MIRROR_CONFIG_FILE`] next to the executable
//! containing a line such as `MirrorViewMode=openvr`. The file is read once
//! when the runtime starts and again whenever it changes.

use crossbeam_channel::{Receiver, TryRecvError};
use notify::{Event, EventKind as FsEventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// The default name of the mirror-view config file.
pub const MIRROR_CONFIG_FILE: &str = "openvr_mirrorview.cfg";

/// The key read from the config file.
pub const MIRROR_VIEW_KEY: &str = "MirrorViewMode";

/// Which image the desktop window mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MirrorViewMode {
    /// No mirror.
    None,
    /// The left eye.
    Left,
    /// The right eye.
    #[default]
    Right,
    /// The runtime's own composited view, overlays included.
    OpenVR,
}

/// A mirror mode string that is none of `left`, `right`, `none`, `openvr`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid mirror view mode '{0}'; options are Left, Right, None and OpenVR")]
pub struct UnknownMirrorMode(pub String);

impl FromStr for MirrorViewMode {
    type Err = UnknownMirrorMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        [
            ("left", MirrorViewMode::Left),
            ("right", MirrorViewMode::Right),
            ("none", MirrorViewMode::None),
            ("openvr", MirrorViewMode::OpenVR),
        ]
        .into_iter()
        .find(|(name, _)| value.eq_ignore_ascii_case(name))
        .map(|(_, mode)| mode)
        .ok_or_else(|| UnknownMirrorMode(value.to_string()))
    }
}

impl fmt::Display for MirrorViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Extracts the mirror mode from the contents of a config file.
///
/// Lines are `key=value`; lines with any other shape are ignored. If the key
/// appears more than once the last occurrence wins. An unrecognised value is
/// logged and read as [`MirrorViewMode::None`]. Returns `None` if the key is
/// absent.
pub fn parse_mirror_config(contents: &str) -> Option<MirrorViewMode> {
    let mut mode = None;
    for line in contents.lines() {
        let mut parts = line.split('=');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        if key.trim() != MIRROR_VIEW_KEY {
            continue;
        }
        mode = Some(value.parse().unwrap_or_else(|e: UnknownMirrorMode| {
            log::error!("{e} (in {MIRROR_CONFIG_FILE})");
            MirrorViewMode::None
        }));
    }
    mode
}

/// Reads and parses the config file at `path`.
///
/// A missing or unreadable file yields `None`.
pub fn read_mirror_config(path: &Path) -> Option<MirrorViewMode> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_mirror_config(&contents),
        Err(e) => {
            log::trace!("Mirror view config {} not read: {e}", path.display());
            None
        }
    }
}

/// Watches the mirror-view config file for changes.
///
/// File system notifications arrive on a background thread and are queued;
/// [`MirrorViewWatcher::poll`] consumes them from the tick. Dropping the
/// watcher stops watching.
pub struct MirrorViewWatcher {
    path: PathBuf,
    events: Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
}

impl MirrorViewWatcher {
    /// Starts watching `path`. The file does not need to exist yet.
    pub fn watch(path: impl Into<PathBuf>) -> notify::Result<Self> {
        let path = path.into();
        let (sender, events) = crossbeam_channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
            if sender.send(event).is_err() {
                log::trace!("Mirror view watcher event dropped: receiver released.");
            }
        })?;

        // Watch the directory so that creating the file is noticed too.
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;
        log::debug!("Watching {} for mirror view changes.", path.display());

        Ok(Self {
            path,
            events,
            _watcher: watcher,
        })
    }

    /// The watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drains queued notifications and, if the file was created or written,
    /// re-reads it.
    ///
    /// Returns the mode to apply, if any.
    pub fn poll(&mut self) -> Option<MirrorViewMode> {
        let mut touched = false;
        loop {
            match self.events.try_recv() {
                Ok(Ok(event)) => touched |= self.concerns_config(&event),
                Ok(Err(e)) => log::warn!("Mirror view watcher error: {e}"),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if touched {
            self.reload()
        } else {
            None
        }
    }

    /// Reads the file now, regardless of notifications.
    pub fn reload(&self) -> Option<MirrorViewMode> {
        let mode = read_mirror_config(&self.path)?;
        log::info!("Mirror view mode changed via file to: {mode}");
        Some(mode)
    }

    fn concerns_config(&self, event: &Event) -> bool {
        matches!(event.kind, FsEventKind::Create(_) | FsEventKind::Modify(_))
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == self.path.file_name())
    }
}

impl fmt::Debug for MirrorViewWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorViewWatcher")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
