//! Queue engine for stratq
//!
//! This crate orchestrates the lower layers:
//! - QueueEngine: submit, dispatch, acknowledge under one exclusive lock
//! - JobTable: every known job plus the FIFO order of pending ids
//! - Recovery: replay the job log into a fresh table before serving
//! - QueueConfig: `stratq.toml` configuration
//!
//! The engine is the only component that knows about:
//! - The append-before-mutate ordering between the log and memory
//! - Requeueing of unfinished dispatches after a restart

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod queue;
pub mod recovery;
pub mod table;

pub use queue::config::{ConfigError, QueueConfig, CONFIG_FILE_NAME};
pub use queue::{QueueEngine, QueueStats};
pub use recovery::RecoveryReport;
pub use table::JobTable;
