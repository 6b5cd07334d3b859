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

//! Release-notes preamble removal.

/// How the boilerplate at the top of a changelog is removed before display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NotesPreamble {
    /// Cut everything before the first line starting with `## `.
    ///
    /// Changelogs open with a title and a paragraph about the format, followed
    /// by one `## [version]` section per release. With no such heading the
    /// notes are kept whole.
    #[default]
    FirstSection,
    /// Drop a fixed number of leading characters.
    FixedChars(usize),
    /// Show the notes unchanged.
    Keep,
}

impl NotesPreamble {
    /// Returns the part of `notes` that should be shown to the user.
    pub fn strip<'a>(&self, notes: &'a str) -> &'a str {
        match self {
            NotesPreamble::FirstSection => first_section(notes).unwrap_or(notes),
            NotesPreamble::FixedChars(count) => match notes.char_indices().nth(*count) {
                Some((index, _)) => &notes[index..],
                None => "",
            },
            NotesPreamble::Keep => notes,
        }
    }
}

fn first_section(notes: &str) -> Option<&str> {
    let mut start = 0;
    for line in notes.split_inclusive('\n') {
        if line.starts_with("## ") {
            return Some(&notes[start..]);
        }
        start += line.len();
    }
    None
}
