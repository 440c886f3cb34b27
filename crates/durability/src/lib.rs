//! Durability layer for stratq
//!
//! This crate handles everything that touches disk:
//!
//! - Codec: Enqueue record payload encoding (`[idLen][id][payload]`)
//! - Format: Record kinds and the `LogRecord` sum type
//! - WAL: Single-file append-only job log with fsync-per-append and
//!   truncation-tolerant replay

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec; // Enqueue payload codec
pub mod format; // Record kinds, framing constants, typed records
pub mod wal; // Append-only job log

pub use codec::{decode_enqueue, encode_enqueue};
pub use format::{LogRecord, RecordKind, RECORD_HEADER_SIZE};
pub use wal::{DurableLog, JobLog, LogCounters, ReplayStats};
