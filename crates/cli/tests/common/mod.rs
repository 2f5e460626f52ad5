// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]
#![allow(deprecated)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch directory the binary runs in
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// `nerve` running inside the scratch directory, logging only warnings
    pub fn nerve(&self) -> Command {
        let mut cmd = Command::cargo_bin("nerve").expect("nerve binary is built");
        cmd.current_dir(self.dir.path()).env("RUST_LOG", "warn");
        cmd
    }

    /// `nerve --store events.jsonl`
    pub fn nerve_with_store(&self) -> Command {
        let mut cmd = self.nerve();
        cmd.args(["--store", "events.jsonl"]);
        cmd
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Run `nerve run` with the given stdin lines against `events.jsonl`
    pub fn publish(&self, lines: &[&str]) {
        self.nerve_with_store()
            .arg("run")
            .write_stdin(lines.join("\n"))
            .assert()
            .success();
    }
}
