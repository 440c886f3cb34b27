//! On-disk byte formats for the job log.
//!
//! Keeping serialization separate from operational logic (how the log file
//! is opened, appended and replayed) makes format evolution easier to manage.
//!
//! # Module Structure
//!
//! - `record`: Record kinds, frame header layout, typed `LogRecord`

pub mod record;

pub use record::{LogRecord, RecordKind, RECORD_HEADER_SIZE};
