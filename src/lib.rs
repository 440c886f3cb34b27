//! stratq - Durable, crash-recoverable FIFO job queue
//!
//! Producers submit opaque string payloads; consumers dispatch the oldest
//! pending job and acknowledge it when done. Every state change is appended
//! to a single log file and fsynced before it takes effect in memory, so a
//! restart rebuilds exactly the acknowledged state. Jobs that were dispatched
//! but never acknowledged are redelivered after a restart (at-least-once).
//!
//! # Quick Start
//!
//! ```no_run
//! use stratq::QueueEngine;
//!
//! # fn main() -> stratq::QueueResult<()> {
//! let engine = QueueEngine::open("data/queue.log")?;
//! let id = engine.submit("resize image 42")?;
//!
//! let job = engine.dispatch()?;
//! assert_eq!(job.id, id);
//! engine.acknowledge(&job.id)?;
//! engine.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `stratq-core`: job types and the error taxonomy
//! - `stratq-durability`: record codec and the append-only job log
//! - `stratq-engine`: job table, recovery and the queue engine

pub use stratq_core::{Job, JobId, JobState, QueueError, QueueResult};
pub use stratq_durability::{DurableLog, JobLog, LogRecord, RecordKind, ReplayStats};
pub use stratq_engine::{
    ConfigError, QueueConfig, QueueEngine, QueueStats, RecoveryReport, CONFIG_FILE_NAME,
};
