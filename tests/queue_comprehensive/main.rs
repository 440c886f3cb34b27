//! Queue Comprehensive Test Suite
//!
//! End-to-end guarantees of the public `stratq` API.
//!
//! ## Test Tier Structure
//!
//! - **Tier 1: Model Properties** (FIFO, one delivery per dispatch)
//!   Random submit/dispatch/acknowledge/restart sequences checked against
//!   a reference model.
//!
//! - **Tier 2: Crash Recovery** (durability guarantees)
//!   Logs cut at every byte offset, recovery idempotence.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test queue_comprehensive
//!
//! # Only the property tests
//! cargo test --test queue_comprehensive prop_
//! ```

// Test utilities
mod test_utils;

// Tier 1: Model Properties
mod queue_properties;

// Tier 2: Crash Recovery
mod crash_recovery_tests;
