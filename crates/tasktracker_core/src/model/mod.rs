//! Domain model for the task tracker state layer.
//!
//! # Responsibility
//! - Define canonical data structures mirrored to durable storage.
//! - Keep query (`TaskFilter`) and aggregate (`TaskStats`) shapes next to
//!   the records they read.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Wire field names follow the persisted camelCase JSON layout.

pub mod filter;
pub mod task;
pub mod user;
