//! Job log module
//!
//! - `log`: Single-file append-only log (JobLog), replay statistics
//!
//! The `DurableLog` trait is the seam between the queue engine and the log.
//! `JobLog` is the production implementation; the engine is generic over the
//! trait so tests can substitute a log that fails on demand.

pub mod log;

pub use log::{JobLog, LogCounters, ReplayStats};

use crate::format::{LogRecord, RecordKind};
use stratq_core::QueueResult;

/// Crash-safe, ordered, replayable record storage.
pub trait DurableLog: Send {
    /// Append one record and force it to stable storage.
    ///
    /// Returns the byte offset the record was written at. Must not return
    /// `Ok` until the record is durable. On `Err` the record is not durable
    /// and the caller must not apply the corresponding state change.
    fn append(&mut self, kind: RecordKind, data: &[u8]) -> QueueResult<u64>;

    /// Read every complete record from the start of the log, in file order.
    ///
    /// A truncated trailing record is discarded without error, after which
    /// `append` returns `LogUnavailable`. A handler error aborts replay and
    /// is returned unchanged.
    fn replay<F>(&mut self, handler: F) -> QueueResult<ReplayStats>
    where
        F: FnMut(RecordKind, &[u8]) -> QueueResult<()>;

    /// Flush and release the log.
    fn close(self) -> QueueResult<()>
    where
        Self: Sized;

    /// Encode and append a typed record.
    fn append_record(&mut self, record: &LogRecord) -> QueueResult<u64> {
        let data = record.encode_data()?;
        self.append(record.kind(), &data)
    }
}
