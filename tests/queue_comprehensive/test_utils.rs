//! Test utilities for the queue comprehensive tests

pub use stratq::{Job, JobId, JobState, QueueEngine, QueueError};
use std::path::Path;

/// Open (or reopen) the queue at `path`
pub fn open_queue(path: &Path) -> QueueEngine {
    QueueEngine::open(path).expect("Failed to open queue")
}

/// Jobs as a restart would see them: dispatched jobs back to pending
pub fn after_restart(jobs: &[Job]) -> Vec<Job> {
    jobs.iter()
        .cloned()
        .map(|mut job| {
            if job.state == JobState::Dispatched {
                job.requeue();
            }
            job
        })
        .collect()
}

/// Pending ids in creation order
pub fn pending_in_creation_order(jobs: &[Job]) -> Vec<JobId> {
    jobs.iter()
        .filter(|job| job.state == JobState::Pending)
        .map(|job| job.id.clone())
        .collect()
}

/// Assert the pending order matches creation order and invariants hold
pub fn assert_consistent(engine: &QueueEngine) {
    if let Err(e) = engine.check_invariants() {
        panic!("invariant violated: {}", e);
    }
    assert_eq!(
        engine.pending_ids(),
        pending_in_creation_order(&engine.jobs())
    );
}
