// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background compression of retired backups.

use crate::prelude::*;
use logroll::{RotatingWriter, RotationPolicy};
use std::fs;

#[test]
fn retired_backup_is_gzipped_and_raw_removed() {
    let dir = LogDir::new();
    let writer = RotatingWriter::open(
        dir.log_path(),
        RotationPolicy::new(100).with_compress(true),
    )
    .unwrap();

    writer.write(&[b'a'; 60]).unwrap();
    writer.write(&[b'b'; 60]).unwrap();
    writer.close().unwrap();
    writer.wait_background();

    assert_eq!(dir.backups(), vec!["app.log.000001.gz"]);
    assert_eq!(dir.contents("app.log.000001.gz"), vec![b'a'; 60]);
}

#[test]
fn compression_never_touches_the_active_file() {
    let dir = LogDir::new();
    let writer = RotatingWriter::open(
        dir.log_path(),
        RotationPolicy::new(100).with_compress(true),
    )
    .unwrap();

    writer.write(&[b'a'; 60]).unwrap();
    writer.write(&[b'b'; 60]).unwrap();
    // Keep writing while the background task runs.
    writer.write(&[b'c'; 30]).unwrap();
    writer.close().unwrap();
    writer.wait_background();

    let mut active = vec![b'b'; 60];
    active.extend(vec![b'c'; 30]);
    assert_eq!(fs::read(dir.log_path()).unwrap(), active);
}

#[test]
fn every_generation_is_compressed_and_nothing_is_lost() {
    let dir = LogDir::new();
    let writer = RotatingWriter::open(
        dir.log_path(),
        RotationPolicy::new(64).with_compress(true),
    )
    .unwrap();

    let mut expected = Vec::new();
    for i in 0..60u32 {
        let line = format!("compressible line {i:04}\n");
        expected.extend(line.as_bytes());
        writer.write(line.as_bytes()).unwrap();
    }
    writer.close().unwrap();
    writer.wait_background();

    let backups = dir.backups();
    assert!(!backups.is_empty());
    assert!(backups.iter().all(|n| n.ends_with(".gz")), "{backups:?}");
    assert_eq!(dir.all_bytes(), expected);
}

#[test]
fn compression_failure_is_reported_not_returned() {
    let dir = LogDir::new();
    let (sink, seen) = recording_sink();
    let writer = RotatingWriter::with_error_sink(
        dir.log_path(),
        RotationPolicy::new(100).with_compress(true),
        sink,
    )
    .unwrap();

    writer.write(&[b'a'; 60]).unwrap();
    // A directory squatting on the gz name makes the rotation target
    // unavailable; the writer reports it and keeps accepting bytes.
    fs::create_dir(dir.path().join("app.log.000001.gz")).unwrap();
    writer.write(&[b'b'; 60]).unwrap();
    writer.close().unwrap();
    writer.wait_background();

    assert_eq!(fs::read(dir.log_path()).unwrap().len(), 120);
    assert_eq!(*seen.lock().unwrap(), vec!["rotation"]);
}
