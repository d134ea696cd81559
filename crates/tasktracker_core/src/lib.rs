//! Core state layer for the personal task tracker.
//! This crate owns task and session state and their durable mirrors.

pub mod app;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod seed;
pub mod storage;
pub mod store;

pub use app::TaskTracker;
pub use config::AppConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::filter::{TaskFilter, TaskStats};
pub use model::task::{
    Task, TaskDraft, TaskId, TaskPatch, TaskPriority, TaskStatus, TaskValidationError,
};
pub use model::user::{AuthState, User};
pub use seed::{DemoTasks, EmptySeed, TaskSeed};
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError, AUTH_KEY, TASKS_KEY};
pub use store::clock::{Clock, ManualClock, SystemClock};
pub use store::session_store::{AuthEvent, LoginOutcome, SessionStore};
pub use store::subscription::SubscriptionId;
pub use store::task_store::{TaskEvent, TaskStore};
pub use store::{StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
