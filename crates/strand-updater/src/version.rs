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

//! Package version parsing and ordering.
//!
//! A version is a dotted numeric release part, optionally followed by a
//! pre-release marker and a dotted numeric pre-release part:
//! `1.3.0`, `1.3.0-preview`, `1.3.0-preview.2`.
//!
//! Ordering rules:
//! - release parts compare numerically, component by component, with missing
//!   trailing components read as zero (`1.0 == 1.0.0`);
//! - for equal release parts, a pre-release sorts below the release;
//! - two pre-releases compare their pre-release parts, each read with a
//!   leading zero component (`-preview` is `0`, `-preview.2` is `0.2`).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The pre-release marker used by the tracked package.
pub const DEFAULT_PRERELEASE_MARKER: &str = "-preview";

/// A version string that is not a dotted list of unsigned integers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed version '{input}': {reason}")]
pub struct VersionParseError {
    /// The rejected input.
    pub input: String,
    /// What was wrong with it.
    pub reason: &'static str,
}

impl From<VersionParseError> for strand_core::StrandError {
    fn from(e: VersionParseError) -> Self {
        strand_core::StrandError::Parse(e.input)
    }
}

/// A parsed package version.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    text: String,
    release: Vec<u64>,
    prerelease: Option<Vec<u64>>,
}

impl PackageVersion {
    /// Parses `input`, splitting on `marker` to find the pre-release part.
    pub fn parse_with_marker(input: &str, marker: &str) -> Result<Self, VersionParseError> {
        let trimmed = input.trim();
        let (release, prerelease) = match trimmed.split_once(marker) {
            Some((release, rest)) => (release, Some(rest)),
            None => (trimmed, None),
        };

        let release = parse_components(release).map_err(|reason| VersionParseError {
            input: input.to_string(),
            reason,
        })?;
        let prerelease = prerelease
            .map(|rest| parse_components(&format!("0{rest}")))
            .transpose()
            .map_err(|reason| VersionParseError {
                input: input.to_string(),
                reason,
            })?;

        Ok(Self {
            text: trimmed.to_string(),
            release,
            prerelease,
        })
    }

    /// The numeric release components.
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Returns `true` if this version carries a pre-release part.
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

fn parse_components(text: &str) -> Result<Vec<u64>, &'static str> {
    if text.is_empty() {
        return Err("empty version component list");
    }
    text.split('.')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err("components must be unsigned integers");
            }
            part.parse::<u64>().map_err(|_| "component out of range")
        })
        .collect()
}

/// Compares dotted components, treating missing trailing components as zero.
fn cmp_components(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            left.cmp(&right)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_components(&self.release, &other.release).then_with(|| {
            match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => cmp_components(a, b),
            }
        })
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl FromStr for PackageVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_marker(s, DEFAULT_PRERELEASE_MARKER)
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Returns `true` if `candidate` is strictly newer than `current`.
pub fn is_newer(current: &str, candidate: &str, marker: &str) -> Result<bool, VersionParseError> {
    let current = PackageVersion::parse_with_marker(current, marker)?;
    let candidate = PackageVersion::parse_with_marker(candidate, marker)?;
    Ok(candidate > current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PackageVersion {
        s.parse().unwrap()
    }

    #[test]
    fn release_beats_its_own_preview() {
        assert!(v("1.0.0") > v("1.0.0-preview"));
        assert!(v("1.0.0") > v("1.0.0-preview.9"));
    }

    #[test]
    fn previews_compare_numerically() {
        assert!(v("1.0.0-preview.2") > v("1.0.0-preview.1"));
        assert!(v("1.0.0-preview.10") > v("1.0.0-preview.9"));
        assert!(v("1.0.0-preview.1") > v("1.0.0-preview"));
    }

    #[test]
    fn equal_versions_are_not_newer() {
        assert_eq!(is_newer("1.0.0", "1.0.0", DEFAULT_PRERELEASE_MARKER), Ok(false));
        assert_eq!(v("1.0"), v("1.0.0"));
    }

    #[test]
    fn release_components_dominate() {
        assert!(v("2.0.0") > v("1.9.9"));
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("1.3.0-preview.1") > v("1.2.0"));
        assert!(v("1.3.0-preview.1") < v("1.3.0-preview.2"));
    }

    #[test]
    fn malformed_versions_are_rejected() {
        for bad in ["", "abc", "1..0", "1.0.x", "1.0.0-preview.x", "-preview.1", "1.0.0-beta"] {
            assert!(
                bad.parse::<PackageVersion>().is_err(),
                "'{bad}' should not parse"
            );
        }
    }

    #[test]
    fn custom_marker_is_honoured() {
        let a = PackageVersion::parse_with_marker("2.1.0-rc.1", "-rc").unwrap();
        let b = PackageVersion::parse_with_marker("2.1.0", "-rc").unwrap();
        assert!(a.is_prerelease());
        assert!(b > a);
    }

    #[test]
    fn display_keeps_the_original_spelling() {
        assert_eq!(v(" 1.3.0-preview.1 ").to_string(), "1.3.0-preview.1");
        assert_eq!(v("1.3").to_string(), "1.3");
    }
}
