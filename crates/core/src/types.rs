//! Core types for the job queue
//!
//! This module defines the job model:
//! - JobId: Unique identifier assigned at submission time
//! - JobState: Pending → Dispatched → Acknowledged state machine
//! - Job: The unit of work tracked by the job table

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job
///
/// A JobId is an opaque string. Ids generated by the engine are UUID v7
/// strings, so they are unique and sort roughly by creation time. Ids read
/// back from the log are taken verbatim, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh, time-ordered JobId
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wrap an existing id string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw id bytes, as written to Dispatch and Acknowledge records
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Lifecycle state of a job
///
/// ```text
/// Pending ──dispatch──▶ Dispatched ──acknowledge──▶ Acknowledged
///    ▲                      │
///    └──────recovery────────┘
/// ```
///
/// The Dispatched → Pending edge is only taken by recovery: a job claimed
/// but never acknowledged before the process stopped is requeued.
/// Acknowledged is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Eligible for dispatch
    Pending,
    /// Claimed by a consumer, not yet acknowledged
    Dispatched,
    /// Permanently complete (soft-deleted)
    Acknowledged,
}

impl JobState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Acknowledged)
    }

    /// Lowercase name used in logs and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Dispatched => "dispatched",
            JobState::Acknowledged => "acknowledged",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work
///
/// `id` and `payload` never change after creation. `state` and `attempts`
/// are mutated in place by dispatch, acknowledge and recovery. Jobs are never
/// removed; acknowledgment is a terminal state, not a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier
    pub id: JobId,
    /// Opaque application data
    pub payload: String,
    /// Current lifecycle state
    pub state: JobState,
    /// Number of times the job entered `Dispatched`
    pub attempts: u32,
}

impl Job {
    /// Create a new pending job with zero attempts
    pub fn new(id: JobId, payload: impl Into<String>) -> Self {
        Self {
            id,
            payload: payload.into(),
            state: JobState::Pending,
            attempts: 0,
        }
    }

    /// Transition to `Dispatched`, counting the attempt
    pub fn mark_dispatched(&mut self) {
        self.state = JobState::Dispatched;
        self.attempts = self.attempts.saturating_add(1);
    }

    /// Transition to `Acknowledged`
    pub fn mark_acknowledged(&mut self) {
        self.state = JobState::Acknowledged;
    }

    /// Return a dispatched job to `Pending` (recovery only)
    pub fn requeue(&mut self) {
        self.state = JobState::Pending;
    }

    /// Whether the job is waiting for dispatch
    pub fn is_pending(&self) -> bool {
        self.state == JobState::Pending
    }
}
