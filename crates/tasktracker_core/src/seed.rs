//! Default-data providers used when no persisted task collection exists.
//!
//! # Invariants
//! - Seed output is deterministic: same ids, fields and timestamps on
//!   every call.
//! - Seeding never writes to storage; the first mutation does.

use crate::model::task::{Task, TaskId, TaskPriority, TaskStatus};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Source of the initial collection for a store without persisted state.
pub trait TaskSeed {
    fn tasks(&self) -> Vec<Task>;
}

/// The four built-in demonstration tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoTasks;

/// Starts from an empty collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySeed;

impl TaskSeed for EmptySeed {
    fn tasks(&self) -> Vec<Task> {
        Vec::new()
    }
}

impl TaskSeed for DemoTasks {
    fn tasks(&self) -> Vec<Task> {
        vec![
            Task {
                id: TaskId::new("1"),
                title: "Complete project proposal".to_string(),
                description: "Finish the Q4 project proposal and submit to management"
                    .to_string(),
                status: TaskStatus::InProgress,
                priority: TaskPriority::High,
                category: "Work".to_string(),
                due_date: Some(date(2024, 1, 20)),
                created_at: at(2024, 1, 10, 10),
                updated_at: at(2024, 1, 10, 10),
            },
            Task {
                id: TaskId::new("2"),
                title: "Buy groceries".to_string(),
                description: "Weekly grocery shopping - milk, bread, fruits, vegetables"
                    .to_string(),
                status: TaskStatus::Pending,
                priority: TaskPriority::Medium,
                category: "Personal".to_string(),
                due_date: Some(date(2024, 1, 15)),
                created_at: at(2024, 1, 10, 11),
                updated_at: at(2024, 1, 10, 11),
            },
            Task {
                id: TaskId::new("3"),
                title: "Review code changes".to_string(),
                description: "Review pull requests for the authentication module".to_string(),
                status: TaskStatus::Completed,
                priority: TaskPriority::Medium,
                category: "Work".to_string(),
                due_date: None,
                created_at: at(2024, 1, 9, 14),
                updated_at: at(2024, 1, 10, 9),
            },
            Task {
                id: TaskId::new("4"),
                title: "Plan weekend trip".to_string(),
                description: "Research and book weekend getaway to the mountains".to_string(),
                status: TaskStatus::Pending,
                priority: TaskPriority::Low,
                category: "Personal".to_string(),
                due_date: Some(date(2024, 1, 25)),
                created_at: at(2024, 1, 10, 16),
                updated_at: at(2024, 1, 10, 16),
            },
        ]
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid seed date")
}

fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid seed timestamp")
}
