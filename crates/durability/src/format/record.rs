//! Job log record format.
//!
//! The log is a single flat file of records, big-endian integers throughout.
//!
//! # Record Layout
//!
//! ```text
//! ┌───────────────┬──────────────────┬─────────────────────────┐
//! │ Kind (1 byte) │ Length (4 bytes) │ Data (Length bytes)     │
//! └───────────────┴──────────────────┴─────────────────────────┘
//!
//! Kind 1 (Enqueue):     [id_len: u32][id][payload]
//! Kind 2 (Dispatch):    [id]
//! Kind 3 (Acknowledge): [id]
//! ```

use crate::codec::{decode_enqueue, encode_enqueue};
use std::fmt;
use stratq_core::{JobId, QueueError, QueueResult};

/// Size of the frame header: kind (1) + length (4)
pub const RECORD_HEADER_SIZE: usize = 5;

/// Record kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordKind {
    /// A job was submitted
    Enqueue = 1,
    /// A job was handed to a consumer
    Dispatch = 2,
    /// A job was completed
    Acknowledge = 3,
}

impl RecordKind {
    /// On-disk tag byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Lowercase name used in logs and errors
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Enqueue => "enqueue",
            RecordKind::Dispatch => "dispatch",
            RecordKind::Acknowledge => "acknowledge",
        }
    }
}

impl TryFrom<u8> for RecordKind {
    type Error = QueueError;

    fn try_from(tag: u8) -> QueueResult<Self> {
        match tag {
            1 => Ok(RecordKind::Enqueue),
            2 => Ok(RecordKind::Dispatch),
            3 => Ok(RecordKind::Acknowledge),
            other => Err(QueueError::malformed(format!(
                "unknown record kind {}",
                other
            ))),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed log record
///
/// Replay decodes every record into this sum type and matches on it
/// exhaustively, so a new kind cannot be silently ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// Job submission
    Enqueue {
        /// Assigned id
        id: JobId,
        /// Application payload
        payload: String,
    },
    /// Job handed to a consumer
    Dispatch {
        /// Dispatched job
        id: JobId,
    },
    /// Job completed
    Acknowledge {
        /// Acknowledged job
        id: JobId,
    },
}

impl LogRecord {
    /// The record's kind tag
    pub fn kind(&self) -> RecordKind {
        match self {
            LogRecord::Enqueue { .. } => RecordKind::Enqueue,
            LogRecord::Dispatch { .. } => RecordKind::Dispatch,
            LogRecord::Acknowledge { .. } => RecordKind::Acknowledge,
        }
    }

    /// The job this record refers to
    pub fn job_id(&self) -> &JobId {
        match self {
            LogRecord::Enqueue { id, .. }
            | LogRecord::Dispatch { id }
            | LogRecord::Acknowledge { id } => id,
        }
    }

    /// Encode the data section (everything after the frame header)
    pub fn encode_data(&self) -> QueueResult<Vec<u8>> {
        match self {
            LogRecord::Enqueue { id, payload } => encode_enqueue(id.as_str(), payload),
            LogRecord::Dispatch { id } | LogRecord::Acknowledge { id } => {
                Ok(id.as_bytes().to_vec())
            }
        }
    }

    /// Decode a record from its kind and data section
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` if the data cannot be interpreted for the
    /// given kind.
    pub fn decode(kind: RecordKind, data: &[u8]) -> QueueResult<Self> {
        match kind {
            RecordKind::Enqueue => {
                let (id, payload) = decode_enqueue(data)?;
                Ok(LogRecord::Enqueue {
                    id: JobId::from(id),
                    payload,
                })
            }
            RecordKind::Dispatch => Ok(LogRecord::Dispatch {
                id: decode_raw_id(kind, data)?,
            }),
            RecordKind::Acknowledge => Ok(LogRecord::Acknowledge {
                id: decode_raw_id(kind, data)?,
            }),
        }
    }
}

fn decode_raw_id(kind: RecordKind, data: &[u8]) -> QueueResult<JobId> {
    if data.is_empty() {
        return Err(QueueError::malformed(format!("{} record has empty job id", kind)));
    }
    let id = std::str::from_utf8(data)
        .map_err(|e| QueueError::malformed(format!("{} job id is not UTF-8: {}", kind, e)))?;
    Ok(JobId::from(id))
}
