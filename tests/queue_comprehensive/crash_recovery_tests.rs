//! Crash Recovery Tests
//!
//! A crash can stop the process after any byte of an append. These tests
//! build a real log, then recover from every prefix of it:
//! - A prefix ending on a record boundary recovers exactly the state after
//!   that record
//! - A prefix ending inside a record recovers the state after the last
//!   complete record and reports the discarded tail

use crate::test_utils::*;
use std::path::Path;
use tempfile::TempDir;

/// Run a workload, returning the log size and job snapshot after each step
fn build_log(path: &Path) -> Vec<(u64, Vec<Job>)> {
    let engine = open_queue(path);
    let mut steps = vec![(0, Vec::new())];
    let mut snapshot = |engine: &QueueEngine| {
        let size = std::fs::metadata(path).unwrap().len();
        steps.push((size, engine.jobs()));
    };

    let a = engine.submit("alpha").unwrap();
    snapshot(&engine);
    engine.submit("beta").unwrap();
    snapshot(&engine);
    engine.dispatch().unwrap();
    snapshot(&engine);
    engine.submit("").unwrap();
    snapshot(&engine);
    engine.acknowledge(&a).unwrap();
    snapshot(&engine);
    engine.dispatch().unwrap();
    snapshot(&engine);

    engine.close().unwrap();
    steps
}

#[test]
fn test_recovery_from_every_prefix() {
    let temp_dir = TempDir::new().unwrap();
    let full_path = temp_dir.path().join("full.log");
    let steps = build_log(&full_path);
    let bytes = std::fs::read(&full_path).unwrap();
    assert_eq!(steps.last().unwrap().0, bytes.len() as u64);

    for cut in 0..=bytes.len() {
        let path = temp_dir.path().join(format!("cut-{}.log", cut));
        std::fs::write(&path, &bytes[..cut]).unwrap();

        // Last step whose log fits entirely in the prefix
        let (boundary, expected) = steps
            .iter()
            .rev()
            .find(|(size, _)| *size <= cut as u64)
            .unwrap();

        let engine = open_queue(&path);
        assert_eq!(
            engine.jobs(),
            after_restart(expected),
            "state mismatch at cut {}",
            cut
        );
        assert_eq!(
            engine.recovery_report().truncated_tail_bytes,
            cut as u64 - boundary,
            "tail mismatch at cut {}",
            cut
        );
        assert_consistent(&engine);
    }
}

#[test]
fn test_torn_header_is_left_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("queue.log");

    let a = {
        let engine = open_queue(&path);
        let a = engine.submit("kept").unwrap();
        engine.close().unwrap();
        a
    };
    let intact = std::fs::metadata(&path).unwrap().len();

    // Torn header: kind byte only
    {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap();
        file.write_all(&[1]).unwrap();
    }

    let engine = open_queue(&path);
    assert_eq!(engine.pending_ids(), vec![a]);
    assert_eq!(engine.recovery_report().truncated_tail_bytes, 1);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), intact + 1);
}

#[test]
fn test_no_loss_or_duplication_across_restarts() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("queue.log");
    let mut submitted = Vec::new();

    for round in 0..5 {
        let engine = open_queue(&path);
        for i in 0..3 {
            submitted.push(engine.submit(format!("r{}-{}", round, i)).unwrap());
        }
        // Acknowledge one job, leave one dispatched
        let done = engine.dispatch().unwrap();
        engine.acknowledge(&done.id).unwrap();
        engine.dispatch().unwrap();
        assert_consistent(&engine);
    }

    let engine = open_queue(&path);
    let ids: Vec<JobId> = engine.jobs().into_iter().map(|job| job.id).collect();
    assert_eq!(ids, submitted);

    let stats = engine.stats();
    assert_eq!(stats.total, 15);
    assert_eq!(stats.acknowledged, 5);
    assert_eq!(stats.dispatched, 0);
    assert_eq!(stats.pending, 10);
    assert_consistent(&engine);
}
