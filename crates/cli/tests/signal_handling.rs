// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for signal-driven shutdown of `nerve run`
//!
//! stdin stays open for the whole run, so only the signal can end it.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(deprecated)]

mod common;

use common::TestEnv;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Start `nerve run`, publish one event, deliver `sig` with stdin still
/// open, and return the remaining stdout once the process has exited.
fn run_until_signal(sig: Signal) -> String {
    let env = TestEnv::new();
    let mut child = Command::new(assert_cmd::cargo::cargo_bin("nerve"))
        .current_dir(env.dir.path())
        .env("RUST_LOG", "warn")
        .arg("run")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let mut stdin = child.stdin.take().unwrap();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());

    // The printed id means the signal handlers are installed
    writeln!(stdin, r#"{{"type": "orders.created", "source": "shop"}}"#).unwrap();
    stdin.flush().unwrap();
    let mut id = String::new();
    stdout.read_line(&mut id).unwrap();
    assert!(!id.trim().is_empty(), "no event id printed");

    kill(Pid::from_raw(child.id() as i32), sig).unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().ok();
            panic!("nerve run still running 10s after {:?}", sig);
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    assert!(status.success(), "exit status {}", status);

    let mut rest = String::new();
    stdout.read_to_string(&mut rest).unwrap();
    drop(stdin);
    rest
}

#[test]
fn test_sigterm_stops_run_with_stdin_open() {
    let summary = run_until_signal(Signal::SIGTERM);
    assert!(summary.contains("events: 1 processed"), "{}", summary);
    assert!(summary.contains("shop"), "{}", summary);
}

#[test]
fn test_sigint_stops_run_with_stdin_open() {
    let summary = run_until_signal(Signal::SIGINT);
    assert!(summary.contains("events: 1 processed"), "{}", summary);
}
