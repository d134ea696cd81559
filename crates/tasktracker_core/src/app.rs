//! Composition root owning both stores.
//!
//! # Responsibility
//! - Open durable storage from `AppConfig` and load both stores over it.
//! - Hand explicit store references to consumers; no global state.

use crate::config::AppConfig;
use crate::storage::SqliteStorage;
use crate::store::session_store::SessionStore;
use crate::store::task_store::TaskStore;
use crate::store::StoreResult;
use log::info;
use std::rc::Rc;

pub type SharedStorage = Rc<SqliteStorage>;

pub struct TaskTracker {
    tasks: TaskStore<SharedStorage>,
    session: SessionStore<SharedStorage>,
}

impl TaskTracker {
    /// Opens storage and loads both stores.
    ///
    /// Logging is not started here; see `AppConfig::init_logging`.
    pub fn open(config: &AppConfig) -> StoreResult<Self> {
        let storage = match &config.db_path {
            Some(path) => SqliteStorage::open(path)?,
            None => SqliteStorage::open_in_memory()?,
        };
        Self::with_storage(Rc::new(storage), config)
    }

    pub fn with_storage(storage: SharedStorage, config: &AppConfig) -> StoreResult<Self> {
        let tasks = TaskStore::load(Rc::clone(&storage))?;
        let session = SessionStore::load(storage)?.with_login_delay(config.login_delay);
        info!(
            "event=tracker_open module=app status=ok tasks={} authenticated={}",
            tasks.tasks().len(),
            session.is_authenticated()
        );
        Ok(Self { tasks, session })
    }

    pub fn tasks(&self) -> &TaskStore<SharedStorage> {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskStore<SharedStorage> {
        &mut self.tasks
    }

    pub fn session(&self) -> &SessionStore<SharedStorage> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionStore<SharedStorage> {
        &mut self.session
    }
}
