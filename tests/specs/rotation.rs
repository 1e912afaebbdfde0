// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Size-threshold rotation behavior.

use crate::prelude::*;
use logroll::{RotatingWriter, RotationPolicy};
use std::fs;

#[test]
fn second_write_past_threshold_rolls_the_file() {
    // Two 60-byte writes against a 100-byte limit: the first fills the
    // active file, the second forces a rotation and starts generation two.
    let dir = LogDir::new();
    let writer = RotatingWriter::open(dir.log_path(), RotationPolicy::new(100)).unwrap();

    writer.write(&[b'a'; 60]).unwrap();
    writer.write(&[b'b'; 60]).unwrap();
    writer.close().unwrap();

    assert_eq!(dir.backups(), vec!["app.log.000001"]);
    assert_eq!(dir.contents("app.log.000001"), vec![b'a'; 60]);
    assert_eq!(fs::read(dir.log_path()).unwrap(), vec![b'b'; 60]);
}

#[test]
fn write_landing_exactly_on_threshold_does_not_rotate() {
    let dir = LogDir::new();
    let writer = RotatingWriter::open(dir.log_path(), RotationPolicy::new(100)).unwrap();

    writer.write(&[b'a'; 60]).unwrap();
    writer.write(&[b'b'; 40]).unwrap();
    writer.close().unwrap();

    assert!(dir.backups().is_empty());
    assert_eq!(fs::read(dir.log_path()).unwrap().len(), 100);
}

#[test]
fn no_backup_ever_exceeds_the_limit_for_small_writes() {
    // With writes no larger than the limit, every retired backup must be
    // within the configured size.
    let dir = LogDir::new();
    let writer = RotatingWriter::open(dir.log_path(), RotationPolicy::new(256)).unwrap();

    for i in 0..200u32 {
        let line = format!("event {i:05} happened and was recorded here\n");
        writer.write(line.as_bytes()).unwrap();
    }
    writer.close().unwrap();

    assert!(!dir.backups().is_empty());
    for name in dir.backups() {
        let len = dir.contents(&name).len();
        assert!(len <= 256, "{name} is {len} bytes");
    }
}

#[test]
fn rotation_loses_no_bytes() {
    let dir = LogDir::new();
    let writer = RotatingWriter::open(dir.log_path(), RotationPolicy::new(128)).unwrap();

    let mut expected = Vec::new();
    for i in 0..100u32 {
        let line = format!("line {i:04}\n");
        expected.extend(line.as_bytes());
        writer.write(line.as_bytes()).unwrap();
    }
    writer.close().unwrap();

    assert_eq!(dir.all_bytes(), expected);
}

#[test]
fn buffers_are_never_split_across_generations() {
    // Writes of a fixed width against a limit that is not a multiple of it:
    // every file must hold whole lines only.
    let dir = LogDir::new();
    let writer = RotatingWriter::open(dir.log_path(), RotationPolicy::new(100)).unwrap();

    for i in 0..50u32 {
        writer.write(format!("entry {i:06}\n").as_bytes()).unwrap();
    }
    writer.close().unwrap();

    let mut names = dir.backups();
    names.push("app.log".to_string());
    for name in &names {
        let bytes = if name == "app.log" {
            fs::read(dir.log_path()).unwrap()
        } else {
            dir.contents(name)
        };
        assert_eq!(bytes.len() % 13, 0, "{name} holds a torn line");
    }
}

#[test]
fn oversized_write_goes_down_whole() {
    // A single write larger than the limit lands in one file, never split.
    let dir = LogDir::new();
    let writer = RotatingWriter::open(dir.log_path(), RotationPolicy::new(100)).unwrap();

    writer.write(&[b'a'; 10]).unwrap();
    writer.write(&[b'b'; 500]).unwrap();
    writer.close().unwrap();

    // The 10 bytes rotate out first, then the big write owns generation two.
    assert_eq!(dir.backups(), vec!["app.log.000001"]);
    assert_eq!(dir.contents("app.log.000001").len(), 10);
    assert_eq!(fs::read(dir.log_path()).unwrap(), vec![b'b'; 500]);
}
