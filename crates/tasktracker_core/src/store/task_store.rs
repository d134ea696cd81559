//! Task collection state manager.
//!
//! # Responsibility
//! - Own the ordered task collection and its durable mirror.
//! - Provide create/update/delete plus filter, category and stats reads.
//!
//! # Invariants
//! - Collection order is insertion order; reads never re-sort.
//! - Every effective mutation writes the full collection before returning.
//! - Update/delete of an unknown id is a silent no-op: no write, no event.
//! - `updated_at` strictly increases on every update of a task.

use crate::model::filter::{TaskFilter, TaskStats};
use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch, TaskStatus};
use crate::seed::{DemoTasks, TaskSeed};
use crate::storage::{KeyValueStorage, TASKS_KEY};
use crate::store::clock::{Clock, SystemClock};
use crate::store::subscription::{SubscriptionId, Subscribers};
use crate::store::StoreResult;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::rc::Rc;

/// Applied change delivered to task subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Created(Task),
    Updated(Task),
    /// Carries the task as it was before removal.
    Deleted(Task),
}

impl TaskEvent {
    pub fn task(&self) -> &Task {
        match self {
            Self::Created(task) | Self::Updated(task) | Self::Deleted(task) => task,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Created(_) => "task_create",
            Self::Updated(_) => "task_update",
            Self::Deleted(_) => "task_delete",
        }
    }
}

/// Listener signature: the event, then the collection after the change.
pub type TaskListener = dyn FnMut(&TaskEvent, &[Task]);

pub struct TaskStore<S: KeyValueStorage> {
    storage: S,
    tasks: Vec<Task>,
    loading: bool,
    clock: Rc<dyn Clock>,
    subscribers: Subscribers<TaskListener>,
}

impl<S: KeyValueStorage> TaskStore<S> {
    /// Loads persisted tasks, falling back to the demonstration tasks.
    ///
    /// # Errors
    /// - Returns storage transport errors. Malformed data is not an error.
    pub fn load(storage: S) -> StoreResult<Self> {
        Self::load_with(storage, Rc::new(SystemClock), &DemoTasks)
    }

    /// Loads with an explicit clock and fallback seed.
    pub fn load_with(storage: S, clock: Rc<dyn Clock>, seed: &dyn TaskSeed) -> StoreResult<Self> {
        let mut store = Self {
            storage,
            tasks: Vec::new(),
            loading: true,
            clock,
            subscribers: Subscribers::default(),
        };
        store.tasks = store.read_persisted(seed)?;
        store.loading = false;
        Ok(store)
    }

    fn read_persisted(&self, seed: &dyn TaskSeed) -> StoreResult<Vec<Task>> {
        let Some(raw) = self.storage.get(TASKS_KEY)? else {
            info!("event=tasks_load module=task_store status=seeded reason=absent");
            return Ok(seed.tasks());
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                info!(
                    "event=tasks_load module=task_store status=ok count={}",
                    tasks.len()
                );
                Ok(tasks)
            }
            Err(err) => {
                warn!(
                    "event=tasks_load module=task_store status=seeded reason=malformed error={}",
                    err
                );
                Ok(seed.tasks())
            }
        }
    }

    /// True only while the startup bootstrap runs.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == *id)
    }

    /// Appends a new task built from `draft` and persists the collection.
    ///
    /// # Contract
    /// - Assigns a fresh id and `created_at == updated_at == now`.
    /// - Duplicate titles and categories are allowed.
    pub fn create(&mut self, draft: TaskDraft) -> StoreResult<Task> {
        let task = Task::from_draft(TaskId::generate(), draft, self.clock.now());
        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next, TaskEvent::Created(task.clone()))?;
        Ok(task)
    }

    /// Merges `patch` into the task with `id`.
    ///
    /// Returns `None` without touching storage when `id` is unknown.
    pub fn update(&mut self, id: &TaskId, patch: TaskPatch) -> StoreResult<Option<Task>> {
        let Some(index) = self.position(id) else {
            debug!("event=task_update module=task_store status=skipped reason=not_found");
            return Ok(None);
        };

        let mut next = self.tasks.clone();
        let task = &mut next[index];
        task.apply(patch);
        task.updated_at = next_update_time(task.updated_at, self.clock.now());
        let updated = task.clone();

        self.commit(next, TaskEvent::Updated(updated.clone()))?;
        Ok(Some(updated))
    }

    pub fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> StoreResult<Option<Task>> {
        self.update(id, TaskPatch::status(status))
    }

    /// Moves the task one step along the pending/in-progress/completed cycle.
    pub fn advance_status(&mut self, id: &TaskId) -> StoreResult<Option<Task>> {
        let Some(status) = self.get(id).map(|task| task.status.next()) else {
            return Ok(None);
        };
        self.set_status(id, status)
    }

    /// Removes the task with `id`, returning it.
    ///
    /// Returns `None` without touching storage when `id` is unknown.
    pub fn delete(&mut self, id: &TaskId) -> StoreResult<Option<Task>> {
        let Some(index) = self.position(id) else {
            debug!("event=task_delete module=task_store status=skipped reason=not_found");
            return Ok(None);
        };

        let mut next = self.tasks.clone();
        let removed = next.remove(index);
        self.commit(next, TaskEvent::Deleted(removed.clone()))?;
        Ok(Some(removed))
    }

    /// Tasks matching every present criterion, in collection order.
    pub fn filter(&self, criteria: &TaskFilter) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| criteria.matches(task))
            .collect()
    }

    /// Distinct categories in order of first appearance.
    pub fn list_categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.tasks
            .iter()
            .map(|task| task.category.as_str())
            .filter(|category| seen.insert(*category))
            .collect()
    }

    pub fn compute_stats(&self) -> TaskStats {
        self.compute_stats_at(self.clock.now())
    }

    pub fn compute_stats_at(&self, now: DateTime<Utc>) -> TaskStats {
        TaskStats::collect(&self.tasks, now)
    }

    /// Registers a listener for applied task changes.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&TaskEvent, &[Task]) + 'static,
    ) -> SubscriptionId {
        self.subscribers.insert(Box::new(listener))
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == *id)
    }

    fn commit(&mut self, next: Vec<Task>, event: TaskEvent) -> StoreResult<()> {
        let payload = serde_json::to_string(&next)?;
        if let Err(err) = self.storage.set(TASKS_KEY, &payload) {
            warn!(
                "event={} module=task_store status=error error_code=persist_failed error={}",
                event.name(),
                err
            );
            return Err(err.into());
        }

        self.tasks = next;
        info!(
            "event={} module=task_store status=ok count={} listeners={}",
            event.name(),
            self.tasks.len(),
            self.subscribers.len()
        );

        for listener in self.subscribers.listeners_mut() {
            listener(&event, self.tasks.as_slice());
        }
        Ok(())
    }
}

fn next_update_time(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}
