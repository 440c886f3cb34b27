//! Error types for the job queue
//!
//! This module defines the error taxonomy used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::{JobId, JobState};
use std::io;
use thiserror::Error;

/// Result type alias for queue operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Error types for the job queue
#[derive(Debug, Error)]
pub enum QueueError {
    /// Log open/append/flush/sync failure
    ///
    /// Never retried internally. A failed append means the record is not
    /// durable and no in-memory state was changed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record payload could not be parsed
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// No job is pending
    #[error("Queue is empty")]
    QueueEmpty,

    /// No job with this id exists
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// The job is not in a state that allows the operation
    #[error("Job {id} is {state}, expected dispatched")]
    InvalidState {
        /// Job the operation targeted
        id: JobId,
        /// State the job was found in
        state: JobState,
    },

    /// Replay found a record referencing a job with no prior Enqueue
    #[error("{kind} record references unknown job {id}")]
    UnknownJobInLog {
        /// Record kind name
        kind: &'static str,
        /// Id carried by the record
        id: JobId,
    },

    /// Payload exceeds the configured limit
    #[error("Payload of {len} bytes exceeds limit of {max} bytes")]
    PayloadTooLarge {
        /// Payload size in bytes
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// The log refuses appends: an earlier append failed, or the file ends
    /// in a partial record
    #[error("Log unavailable: it no longer accepts appends")]
    LogUnavailable,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueueError {
    /// Create a MalformedRecord error
    pub fn malformed(msg: impl Into<String>) -> Self {
        QueueError::MalformedRecord(msg.into())
    }

    /// Whether this error means the log cannot be interpreted
    ///
    /// The engine refuses to start when recovery hits one of these.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            QueueError::MalformedRecord(_) | QueueError::UnknownJobInLog { .. }
        )
    }

    /// Whether the caller may simply try again later
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueueError::QueueEmpty)
    }
}
