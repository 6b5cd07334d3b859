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

use anyhow::Result;
use std::process::Command;
use std::time::Instant;

// ANSI color codes
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const BLUE: &str = "\x1b[34m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const MAGENTA: &str = "\x1b[35m";

pub const CHECK: &str = "✓";
pub const CROSS: &str = "✗";

pub fn banner() {
    println!("{BOLD}{CYAN}┌─────────────────────────────────────────┐");
    println!("│         STRAND · workspace tasks        │");
    println!("└─────────────────────────────────────────┘{RESET}");
}

pub fn print_task_start(task_name: &str, color: &str) {
    println!("\n{BOLD}{color}━━━ {task_name} ━━━{RESET}");
}

pub fn print_success(message: &str) {
    println!("{BOLD}{GREEN} {CHECK} {message}{RESET}");
}

pub fn print_error(message: &str) {
    eprintln!("{BOLD}{RED} {CROSS} {message}{RESET}");
}

/// Runs `cargo <args>` with inherited stdio, failing on a non-zero exit.
pub fn cargo(args: &[&str], task_name: &str) -> Result<()> {
    let start_time = Instant::now();
    println!("{BOLD}{CYAN}$ cargo {}{RESET}", args.join(" "));

    let status = Command::new(std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string()))
        .args(args)
        .status()?;
    let seconds = start_time.elapsed().as_secs_f64();

    if status.success() {
        print_success(&format!("{task_name} completed in {seconds:.2}s"));
        Ok(())
    } else {
        print_error(&format!("{task_name} failed after {seconds:.2}s"));
        anyhow::bail!("{task_name} failed with status: {status}");
    }
}
