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

//! Persisted host settings.
//!
//! Settings live in a human-editable RON file. A missing file means
//! defaults; missing fields inside the file also take their defaults.

use crate::mirror::MirrorViewMode;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::error::Error;
use std::path::{Path, PathBuf};
use strand_events::DispatcherConfig;
use strand_updater::{SkipVersionStore, UpdaterConfig};
use thiserror::Error;

/// User-facing settings for the runtime and the update check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Check for a newer package version on startup.
    pub prompt_to_upgrade: bool,
    /// Let pre-release versions trigger the update prompt.
    pub prompt_for_prerelease: bool,
    /// The version the user asked not to be prompted about again.
    pub skip_prompt_for_version: Option<String>,
    /// The initial mirror view, before any mirror config file is read.
    pub mirror_view: MirrorViewMode,
    /// Maximum number of native events dispatched per tick.
    pub event_budget: usize,
    /// Allocate listener lists on first use.
    pub lazy_event_lists: bool,
    /// Log every dispatched event.
    pub log_all_events: bool,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            prompt_to_upgrade: true,
            prompt_for_prerelease: true,
            skip_prompt_for_version: None,
            mirror_view: MirrorViewMode::Right,
            event_budget: 64,
            lazy_event_lists: false,
            log_all_events: false,
        }
    }
}

impl HostSettings {
    /// The event dispatcher configuration these settings describe.
    ///
    /// A zero budget would never poll the queue, so it is raised to one.
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        if self.event_budget == 0 {
            log::warn!("event_budget is 0; dispatching at most 1 event per tick instead.");
        }
        DispatcherConfig {
            per_tick_budget: self.event_budget.max(1),
            lazy_listener_lists: self.lazy_event_lists,
            log_all_events: self.log_all_events,
        }
    }

    /// The update workflow configuration these settings describe.
    pub fn updater_config(&self) -> UpdaterConfig {
        UpdaterConfig {
            prompt_for_prerelease: self.prompt_for_prerelease,
            ..Default::default()
        }
    }
}

/// Errors raised while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file could not be read or written.
    #[error("settings file '{}': {source}", .path.display())]
    Io {
        /// The settings file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid settings RON.
    #[error("settings file '{}' is malformed: {reason}", .path.display())]
    Parse {
        /// The settings file.
        path: PathBuf,
        /// What the parser reported.
        reason: String,
    },
    /// The settings could not be encoded.
    #[error("failed to encode settings: {0}")]
    Encode(String),
}

/// Settings bound to the file they are saved in.
///
/// Every change made through [`SettingsFile::update`] is written back to
/// disk immediately.
#[derive(Debug)]
pub struct SettingsFile {
    path: PathBuf,
    settings: RefCell<HostSettings>,
}

impl SettingsFile {
    /// Loads the settings at `path`, or defaults if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let settings = if path.exists() {
            read_settings(&path)?
        } else {
            log::info!(
                "No settings at '{}'; using defaults.",
                path.display()
            );
            HostSettings::default()
        };
        Ok(Self {
            path,
            settings: RefCell::new(settings),
        })
    }

    /// Wraps in-memory settings that will be saved to `path`.
    pub fn with_settings(path: impl Into<PathBuf>, settings: HostSettings) -> Self {
        Self {
            path: path.into(),
            settings: RefCell::new(settings),
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A snapshot of the current settings.
    pub fn get(&self) -> HostSettings {
        self.settings.borrow().clone()
    }

    /// Applies `change` and saves the result.
    pub fn update(&self, change: impl FnOnce(&mut HostSettings)) -> Result<(), SettingsError> {
        change(&mut self.settings.borrow_mut());
        self.save()
    }

    /// Writes the current settings to disk.
    pub fn save(&self) -> Result<(), SettingsError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        let text = ron::ser::to_string_pretty(&*self.settings.borrow(), pretty_config)
            .map_err(|e| SettingsError::Encode(e.to_string()))?;

        let io_error = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&self.path, text).map_err(io_error)?;
        log::debug!("Saved settings to '{}'.", self.path.display());
        Ok(())
    }
}

fn read_settings(path: &Path) -> Result<HostSettings, SettingsError> {
    let bytes = std::fs::read(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ron::de::from_bytes(&bytes).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

impl SkipVersionStore for SettingsFile {
    fn skip_version(&self) -> Option<String> {
        self.settings.borrow().skip_prompt_for_version.clone()
    }

    fn set_skip_version(&self, version: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.update(|settings| settings.skip_prompt_for_version = Some(version.to_string()))?;
        Ok(())
    }
}
