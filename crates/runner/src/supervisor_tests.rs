// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::scheduler::{RunnerConfig, Shared};
use parking_lot::Mutex as ParkingMutex;
use shrun_core::context::SharedContext;
use std::collections::HashMap;
use std::io::Write as _;
use std::sync::atomic::AtomicBool;

fn test_shared(tmpdir: std::path::PathBuf) -> Shared {
    Shared {
        config: RunnerConfig {
            shell: "/bin/sh".to_string(),
            tmpdir,
            environment: HashMap::new(),
            retry_interval: 0.0,
            output_timeout: 5.0,
        },
        colors: shrun_core::color::ColorPool::new(),
        context: SharedContext::new(),
        live: ParkingMutex::new(HashMap::new()),
        output_lock: ParkingMutex::new(()),
        name_counts: ParkingMutex::new(HashMap::new()),
        dead: AtomicBool::new(false),
        results: ParkingMutex::new(HashMap::new()),
    }
}

#[test]
fn create_name_uses_explicit_name() {
    let dir = tempfile::tempdir().unwrap();
    let shared = test_shared(dir.path().to_path_buf());
    assert_eq!(create_name(&shared, Some("build"), "echo hi"), "build");
}

#[test]
fn create_name_falls_back_to_first_word_run() {
    let dir = tempfile::tempdir().unwrap();
    let shared = test_shared(dir.path().to_path_buf());
    assert_eq!(create_name(&shared, None, "echo hi"), "echo");
}

#[test]
fn create_name_suffixes_on_collision() {
    let dir = tempfile::tempdir().unwrap();
    let shared = test_shared(dir.path().to_path_buf());
    assert_eq!(create_name(&shared, None, "echo hi"), "echo");
    assert_eq!(create_name(&shared, None, "echo bye"), "echo_1");
    assert_eq!(create_name(&shared, None, "echo again"), "echo_2");
}

#[test]
fn tail_reader_splits_complete_lines_and_buffers_partial() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.log");
    std::fs::write(&path, b"first\nsecond\npartial").unwrap();

    let mut reader = TailReader::open(&path).unwrap();
    let lines = reader.drain_lines().unwrap();
    assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);

    // The partial trailing fragment isn't surfaced until more bytes arrive
    // or the caller asks for a final flush.
    assert!(reader.drain_lines().unwrap().is_empty());

    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(file, " line").unwrap();
    let lines = reader.drain_lines().unwrap();
    assert_eq!(lines, vec!["partial line".to_string()]);
}

#[test]
fn tail_reader_drain_final_flushes_newline_less_tail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.log");
    std::fs::write(&path, b"only a partial line").unwrap();

    let mut reader = TailReader::open(&path).unwrap();
    assert!(reader.drain_lines().unwrap().is_empty());
    let lines = reader.drain_final().unwrap();
    assert_eq!(lines, vec!["only a partial line".to_string()]);
}