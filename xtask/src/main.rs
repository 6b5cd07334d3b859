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

// Build automation for the strand workspace.
// Run with: cargo xtask <command>

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::ci;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation", version)]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Type-check every crate and target.
    Check,
    /// Run the test suites.
    Test {
        /// Only test this package.
        #[arg(short, long)]
        package: Option<String>,
    },
    /// Format the workspace.
    Fmt {
        /// Report unformatted files instead of rewriting them.
        #[arg(long)]
        check: bool,
    },
    /// Lint with warnings as errors.
    Clippy,
    /// Run the sandbox host loop.
    Sandbox,
    /// Run format check, check, clippy and tests.
    Ci,
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Task::Check => ci::check(),
        Task::Test { package } => ci::test(package.as_deref()),
        Task::Fmt { check } => ci::format(check),
        Task::Clippy => ci::clippy(),
        Task::Sandbox => ci::sandbox(),
        Task::Ci => ci::ci(),
    }
}
