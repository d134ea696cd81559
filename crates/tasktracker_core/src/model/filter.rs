//! Task query and aggregate read models.
//!
//! # Invariants
//! - Filter criteria compose conjunctively; an absent field never constrains.
//! - Stats are derived data and never persisted.

use crate::model::task::{Task, TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conjunctive, optional-field query over the task collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Case-insensitive substring over title or description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// True when a status, priority or non-empty category constraint is set.
    ///
    /// Search text alone does not count as an active filter.
    pub fn has_active_filters(&self) -> bool {
        self.status.is_some() || self.priority.is_some() || self.category_constraint().is_some()
    }

    /// An empty category string imposes no constraint.
    fn category_constraint(&self) -> Option<&str> {
        self.category.as_deref().filter(|category| !category.is_empty())
    }

    /// Drops status/priority/category constraints and keeps the search text.
    pub fn cleared(&self) -> Self {
        Self {
            search: self.search.clone(),
            ..Self::default()
        }
    }

    /// Returns whether `task` satisfies every present criterion.
    pub fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|status| task.status != status) {
            return false;
        }
        if self.priority.is_some_and(|priority| task.priority != priority) {
            return false;
        }
        if let Some(category) = self.category_constraint() {
            if task.category != category {
                return false;
            }
        }
        match self.search.as_deref() {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// Aggregate counters over the task collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub overdue: usize,
}

impl TaskStats {
    /// Folds `tasks` into counters, evaluating overdue against `now`.
    pub fn collect<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            match task.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Pending => stats.pending += 1,
            }
            if task.is_overdue(now) {
                stats.overdue += 1;
            }
            stats
        })
    }

    /// Completed share in whole percent, rounded half up; `0` when empty.
    pub fn completion_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let rate = (self.completed as f64 / self.total as f64) * 100.0;
        rate.round() as u32
    }
}
