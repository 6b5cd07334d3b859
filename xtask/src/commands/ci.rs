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

use crate::helpers::*;
use anyhow::Result;
use std::time::Instant;

pub fn check() -> Result<()> {
    print_task_start("Check", CYAN);
    cargo(&["check", "--workspace", "--all-targets"], "Check")
}

pub fn test(package: Option<&str>) -> Result<()> {
    print_task_start("Tests", GREEN);
    match package {
        Some(package) => cargo(&["test", "-p", package], "Tests"),
        None => cargo(&["test", "--workspace"], "Tests"),
    }
}

pub fn format(check_only: bool) -> Result<()> {
    print_task_start("Format", MAGENTA);
    if check_only {
        cargo(&["fmt", "--all", "--", "--check"], "Format check")
    } else {
        cargo(&["fmt", "--all"], "Format")
    }
}

fn format_check() -> Result<()> {
    format(true)
}

fn test_all() -> Result<()> {
    test(None)
}

pub fn clippy() -> Result<()> {
    print_task_start("Clippy", YELLOW);
    cargo(
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        "Clippy",
    )
}

pub fn sandbox() -> Result<()> {
    print_task_start("Sandbox", BLUE);
    cargo(&["run", "-p", "sandbox"], "Sandbox")
}

/// Everything CI runs, in order. Keeps going after a failure so the summary
/// shows every broken phase.
pub fn ci() -> Result<()> {
    banner();
    let start_time = Instant::now();
    let phases: [(&str, fn() -> Result<()>); 4] = [
        ("format", format_check),
        ("check", check),
        ("clippy", clippy),
        ("test", test_all),
    ];

    let failed: Vec<&str> = phases
        .iter()
        .filter_map(|(name, phase)| phase().err().map(|_| *name))
        .collect();

    let seconds = start_time.elapsed().as_secs_f64();
    if failed.is_empty() {
        print_success(&format!("All {} phases passed in {seconds:.2}s", phases.len()));
        Ok(())
    } else {
        print_error(&format!("Failed phases: {}", failed.join(", ")));
        anyhow::bail!("{}/{} CI phases failed", failed.len(), phases.len());
    }
}
