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

//! Extracts the published version from a package manifest document.
//!
//! This is a key scan, not a JSON parser: the document may carry arbitrary
//! surrounding structure, and anything that is not a `"version": "<value>"`
//! pair is skipped.

const VERSION_KEY: &str = "\"version\"";

/// Returns the value of the first `"version": "<value>"` pair in `document`.
///
/// Whitespace is allowed around the colon. Occurrences of `"version"` that
/// are not followed by a colon (for example as a value) are skipped. Returns
/// `None` if no pair is found or the value is empty or unterminated.
pub fn scan_version(document: &str) -> Option<&str> {
    let mut offset = 0;
    while let Some(found) = document[offset..].find(VERSION_KEY) {
        let after_key = offset + found + VERSION_KEY.len();
        offset = after_key;

        let rest = document[after_key..].trim_start();
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        let rest = rest.trim_start();
        let value = rest.strip_prefix('"')?;
        let end = value.find('"')?;
        let version = value[..end].trim();
        return (!version.is_empty()).then_some(version);
    }
    None
}
