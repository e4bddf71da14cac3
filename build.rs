// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    // Re-run build script if git HEAD changes
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=SHUTTER_VERSION");

    // Packagers may pin the version (no git checkout in tarball builds)
    let version = std::env::var("SHUTTER_VERSION").unwrap_or_else(|_| git_version());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `git describe` output without the `v` prefix
///
/// - "0.1.0" at a tag
/// - "0.1.0-5-gabcdef1" five commits after it
/// - the short hash when there is no tag, the crate version without git
fn git_version() -> String {
    let described = git(&["describe", "--tags", "--always", "--match", "v*"]);

    match described {
        Some(version) if version.starts_with('v') => version[1..].to_string(),
        Some(hash) => format!("{}-g{}", env!("CARGO_PKG_VERSION"), hash),
        None => env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
