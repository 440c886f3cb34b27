//! Recovery: rebuild the job table from the log
//!
//! Recovery runs once, synchronously, before the engine serves anything:
//!
//! 1. Replay every record, applying it to the table the way the live
//!    operation did, without appending anything (the record is already
//!    durable).
//! 2. Requeue every job left `Dispatched`: it was claimed but never
//!    acknowledged before the process stopped.
//!
//! # Pending order
//!
//! Only `Enqueue` records add ids to the pending order. `Dispatch` and
//! `Acknowledge` records change job state but leave the order alone; after
//! replay the order is filtered down to jobs that are `Pending` again. A
//! requeued job therefore keeps its original submission position, and
//! acknowledged jobs never reappear.
//!
//! # Failure
//!
//! A malformed record or a reference to a job with no prior `Enqueue` aborts
//! recovery. The engine must not start on a log it cannot fully interpret.
//! A truncated trailing record is the only tolerated anomaly and is handled
//! by the log itself. The engine still starts and serves reads, but every
//! mutating call then fails with `LogUnavailable`.

use crate::table::JobTable;
use stratq_core::{JobId, JobState, QueueError, QueueResult};
use stratq_durability::{DurableLog, LogRecord, RecordKind, ReplayStats};
use tracing::{debug, info, warn};

/// Outcome of recovery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Complete records applied
    pub records_replayed: u64,
    /// Jobs present after replay
    pub jobs_recovered: usize,
    /// Jobs moved from `Dispatched` back to `Pending`
    pub requeued: Vec<JobId>,
    /// Bytes of a partial trailing record that replay discarded
    pub truncated_tail_bytes: u64,
}

/// Replay `log` into `table`, then requeue unfinished dispatches
pub fn recover<L: DurableLog>(log: &mut L, table: &mut JobTable) -> QueueResult<RecoveryReport> {
    let stats: ReplayStats = log.replay(|kind, data| {
        let record = LogRecord::decode(kind, data)?;
        apply_record(table, record)
    })?;

    if stats.has_truncated_tail() {
        warn!(
            discarded = stats.truncated_tail_bytes,
            "Log ends in a partial record; queue is read-only"
        );
    }

    let requeued = table.requeue_dispatched();
    for id in &requeued {
        debug!(job = %id, "Requeued unacknowledged job");
    }

    let report = RecoveryReport {
        records_replayed: stats.records_replayed,
        jobs_recovered: table.len(),
        requeued,
        truncated_tail_bytes: stats.truncated_tail_bytes,
    };

    info!(
        records = report.records_replayed,
        jobs = report.jobs_recovered,
        requeued = report.requeued.len(),
        pending = table.pending_len(),
        "Recovery complete"
    );

    Ok(report)
}

/// Apply one replayed record to the table
pub fn apply_record(table: &mut JobTable, record: LogRecord) -> QueueResult<()> {
    match record {
        LogRecord::Enqueue { id, payload } => {
            if !table.insert_pending(id.clone(), payload) {
                debug!(job = %id, "Ignoring duplicate enqueue record");
            }
        }
        LogRecord::Dispatch { id } => {
            let job = table
                .get_mut(id.as_str())
                .ok_or_else(|| unknown_job(RecordKind::Dispatch, &id))?;
            if job.state != JobState::Pending {
                warn!(job = %id, state = %job.state, "Dispatch record for non-pending job");
            }
            job.mark_dispatched();
        }
        LogRecord::Acknowledge { id } => {
            let job = table
                .get_mut(id.as_str())
                .ok_or_else(|| unknown_job(RecordKind::Acknowledge, &id))?;
            if job.state != JobState::Dispatched {
                warn!(job = %id, state = %job.state, "Acknowledge record for non-dispatched job");
            }
            job.mark_acknowledged();
        }
    }
    Ok(())
}

fn unknown_job(kind: RecordKind, id: &JobId) -> QueueError {
    QueueError::UnknownJobInLog {
        kind: kind.name(),
        id: id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enqueue(id: &str) -> LogRecord {
        LogRecord::Enqueue {
            id: JobId::new(id),
            payload: format!("payload-{}", id),
        }
    }

    fn dispatch(id: &str) -> LogRecord {
        LogRecord::Dispatch { id: JobId::new(id) }
    }

    fn ack(id: &str) -> LogRecord {
        LogRecord::Acknowledge { id: JobId::new(id) }
    }

    fn apply_all(records: Vec<LogRecord>) -> QueueResult<JobTable> {
        let mut table = JobTable::new();
        for record in records {
            apply_record(&mut table, record)?;
        }
        Ok(table)
    }

    #[test]
    fn test_enqueue_creates_pending_job() {
        let table = apply_all(vec![enqueue("a")]).unwrap();
        let job = table.get("a").unwrap();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.payload, "payload-a");
        assert_eq!(job.attempts, 0);
        assert_eq!(table.pending_len(), 1);
    }

    #[test]
    fn test_duplicate_enqueue_is_idempotent() {
        let table = apply_all(vec![enqueue("a"), enqueue("a")]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.pending_len(), 1);
    }

    #[test]
    fn test_dispatch_counts_attempt_without_touching_order() {
        let table = apply_all(vec![enqueue("a"), dispatch("a")]).unwrap();
        let job = table.get("a").unwrap();
        assert_eq!(job.state, JobState::Dispatched);
        assert_eq!(job.attempts, 1);
        assert_eq!(table.pending_len(), 1);
    }

    #[test]
    fn test_acknowledge_is_terminal() {
        let table = apply_all(vec![enqueue("a"), dispatch("a"), ack("a")]).unwrap();
        assert_eq!(table.get("a").unwrap().state, JobState::Acknowledged);
    }

    #[test]
    fn test_dispatch_unknown_job_fails() {
        let err = apply_all(vec![dispatch("ghost")]).unwrap_err();
        assert!(matches!(
            err,
            QueueError::UnknownJobInLog { kind: "dispatch", .. }
        ));
        assert!(err.is_startup_fatal());
    }

    #[test]
    fn test_acknowledge_unknown_job_fails() {
        let err = apply_all(vec![enqueue("a"), ack("b")]).unwrap_err();
        assert!(matches!(
            err,
            QueueError::UnknownJobInLog { kind: "acknowledge", .. }
        ));
    }

    #[test]
    fn test_redispatch_after_previous_recovery() {
        // Dispatched, restarted (requeued, no record), dispatched again
        let mut table = apply_all(vec![enqueue("a"), dispatch("a"), dispatch("a")]).unwrap();
        assert_eq!(table.get("a").unwrap().attempts, 2);

        let requeued = table.requeue_dispatched();
        assert_eq!(requeued.len(), 1);
        assert!(table.check_invariants().is_ok());
    }
}
