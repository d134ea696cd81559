//! Task and session state managers.
//!
//! # Responsibility
//! - Own the in-memory state and mirror it to durable storage after every
//!   mutation.
//! - Notify subscribers of applied changes.
//!
//! # Invariants
//! - A failed storage write leaves in-memory state untouched.
//! - Malformed persisted data is recovered locally and never surfaced.

use crate::storage::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod clock;
pub mod session_store;
pub mod subscription;
pub mod task_store;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure. Not-found and login rejection are not errors.
#[derive(Debug)]
pub enum StoreError {
    Storage(StorageError),
    Serialize(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize store snapshot: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}
