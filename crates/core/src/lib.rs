//! Core types for the stratq job queue
//!
//! This crate defines the foundational types shared by every layer:
//! - JobId: Globally unique, immutable job identifier
//! - JobState: Lifecycle state (Pending, Dispatched, Acknowledged)
//! - Job: One unit of work with its payload and attempt counter
//! - QueueError: Error taxonomy for durability, recovery and caller errors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{QueueError, QueueResult};
pub use types::{Job, JobId, JobState};
