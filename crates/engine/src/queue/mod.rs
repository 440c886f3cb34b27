//! QueueEngine struct and open/recover/close logic
//!
//! This module provides the main QueueEngine struct that orchestrates:
//! - Log opening
//! - Recovery on startup (before any operation is served)
//! - The submit / dispatch / acknowledge API
//!
//! ## Ordering
//!
//! Every mutating operation appends its record to the log first and touches
//! the job table only after the append succeeded. The table, the pending
//! order and the log append path sit behind one `parking_lot::Mutex`, held
//! for the whole operation including the fsync, so operations are fully
//! serialized and none partially applies its effect.

pub mod config;

use crate::recovery::{self, RecoveryReport};
use crate::table::JobTable;
use config::QueueConfig;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;
use stratq_core::{Job, JobId, JobState, QueueError, QueueResult};
use stratq_durability::{encode_enqueue, DurableLog, JobLog, LogCounters, RecordKind};
use tracing::{debug, info, warn};

/// Point-in-time job counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// All known jobs
    pub total: usize,
    /// Jobs awaiting dispatch
    pub pending: usize,
    /// Jobs claimed but not acknowledged
    pub dispatched: usize,
    /// Completed jobs
    pub acknowledged: usize,
}

struct EngineState<L> {
    table: JobTable,
    log: L,
}

/// Durable FIFO job queue
///
/// Constructed once per log via [`QueueEngine::open`] (or
/// [`QueueEngine::recover`] for a caller-supplied log), which replays the log
/// before returning. There is no global instance; callers pass the engine
/// around explicitly. All methods take `&self`, so an engine can be shared
/// between threads behind an `Arc`.
///
/// # Example
///
/// ```ignore
/// use stratq_engine::QueueEngine;
///
/// let engine = QueueEngine::open("data/queue.log")?;
/// let id = engine.submit("resize image 42")?;
///
/// let job = engine.dispatch()?;
/// assert_eq!(job.id, id);
/// engine.acknowledge(&job.id)?;
/// engine.close()?;
/// ```
pub struct QueueEngine<L: DurableLog = JobLog> {
    state: Mutex<EngineState<L>>,
    config: QueueConfig,
    recovery: RecoveryReport,
}

impl QueueEngine<JobLog> {
    /// Open the log at `path` with default configuration and recover
    ///
    /// # Errors
    ///
    /// * `Io` - The log file cannot be created or opened
    /// * `MalformedRecord` / `UnknownJobInLog` - The log cannot be interpreted
    pub fn open<P: AsRef<Path>>(path: P) -> QueueResult<Self> {
        Self::open_with_config(path, QueueConfig::default())
    }

    /// Open the log at `path` with `config` and recover
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        let log = JobLog::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), size = log.size(), "Opening queue");
        Self::recover_with_config(log, config)
    }

    /// Cumulative counters of the underlying log
    pub fn log_counters(&self) -> LogCounters {
        self.state.lock().log.counters()
    }
}

impl<L: DurableLog> QueueEngine<L> {
    /// Build an engine over `log` with default configuration
    ///
    /// Replays the whole log into a fresh job table and requeues
    /// unfinished dispatches. If recovery fails the log is dropped, which
    /// releases it.
    pub fn recover(log: L) -> QueueResult<Self> {
        Self::recover_with_config(log, QueueConfig::default())
    }

    /// Build an engine over `log` with `config`
    pub fn recover_with_config(mut log: L, config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;

        let mut table = JobTable::new();
        let recovery = recovery::recover(&mut log, &mut table)?;

        Ok(Self {
            state: Mutex::new(EngineState { table, log }),
            config,
            recovery,
        })
    }

    /// Submit a payload, returning the new job's id
    ///
    /// The Enqueue record is durable before the job becomes visible.
    ///
    /// # Errors
    ///
    /// * `PayloadTooLarge` - Payload exceeds `max_payload_bytes`
    /// * `Io` / `LogUnavailable` - The append failed; nothing changed
    pub fn submit(&self, payload: impl Into<String>) -> QueueResult<JobId> {
        let payload = payload.into();
        if payload.len() > self.config.max_payload_bytes {
            return Err(QueueError::PayloadTooLarge {
                len: payload.len(),
                max: self.config.max_payload_bytes,
            });
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let mut id = JobId::generate();
        while state.table.get(id.as_str()).is_some() {
            id = JobId::generate();
        }

        let data = encode_enqueue(id.as_str(), &payload)?;
        state.log.append(RecordKind::Enqueue, &data)?;

        debug!(job = %id, bytes = payload.len(), "Submitted job");
        state.table.insert_pending(id.clone(), payload);
        Ok(id)
    }

    /// Claim the oldest pending job
    ///
    /// On success the job is `Dispatched` with its attempt counter
    /// incremented. If the Dispatch record cannot be appended the job goes
    /// back to the head of the pending order untouched.
    ///
    /// # Errors
    ///
    /// * `QueueEmpty` - No job is pending; nothing changed
    /// * `Io` / `LogUnavailable` - The append failed; nothing changed
    pub fn dispatch(&self) -> QueueResult<Job> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let id = state.table.pop_pending().ok_or(QueueError::QueueEmpty)?;

        if let Err(e) = state.log.append(RecordKind::Dispatch, id.as_bytes()) {
            warn!(job = %id, error = %e, "Dispatch not durable; job returned to head of queue");
            state.table.push_front_pending(id);
            return Err(e);
        }

        let job = state
            .table
            .get_mut(id.as_str())
            .ok_or_else(|| QueueError::JobNotFound(id.clone()))?;
        job.mark_dispatched();
        debug!(job = %id, attempts = job.attempts, "Dispatched job");
        Ok(job.clone())
    }

    /// Mark a dispatched job complete
    ///
    /// # Errors
    ///
    /// * `JobNotFound` - No job has this id
    /// * `InvalidState` - The job is pending or already acknowledged
    /// * `Io` / `LogUnavailable` - The append failed; nothing changed
    pub fn acknowledge(&self, id: impl AsRef<str>) -> QueueResult<()> {
        let id = id.as_ref();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let job = state
            .table
            .get(id)
            .ok_or_else(|| QueueError::JobNotFound(JobId::from(id)))?;
        if job.state != JobState::Dispatched {
            return Err(QueueError::InvalidState {
                id: job.id.clone(),
                state: job.state,
            });
        }

        state.log.append(RecordKind::Acknowledge, id.as_bytes())?;

        if let Some(job) = state.table.get_mut(id) {
            job.mark_acknowledged();
        }
        debug!(job = %id, "Acknowledged job");
        Ok(())
    }

    /// Look up a job by id
    pub fn job(&self, id: impl AsRef<str>) -> Option<Job> {
        self.state.lock().table.get(id.as_ref()).cloned()
    }

    /// Pending ids, next to be dispatched first
    pub fn pending_ids(&self) -> Vec<JobId> {
        self.state.lock().table.pending_ids().cloned().collect()
    }

    /// All jobs in creation order
    pub fn jobs(&self) -> Vec<Job> {
        self.state.lock().table.jobs().cloned().collect()
    }

    /// Job counts by state
    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            total: state.table.len(),
            pending: state.table.pending_len(),
            dispatched: state.table.count_in_state(JobState::Dispatched),
            acknowledged: state.table.count_in_state(JobState::Acknowledged),
        }
    }

    /// Verify the pending-order invariant
    pub fn check_invariants(&self) -> Result<(), String> {
        self.state.lock().table.check_invariants()
    }

    /// What recovery found when the engine was built
    pub fn recovery_report(&self) -> &RecoveryReport {
        &self.recovery
    }

    /// Active configuration
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Flush and close the log
    pub fn close(self) -> QueueResult<()> {
        let state = self.state.into_inner();
        info!(jobs = state.table.len(), pending = state.table.pending_len(), "Closing queue");
        state.log.close()
    }
}
