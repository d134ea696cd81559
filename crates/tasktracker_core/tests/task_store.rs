use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tasktracker_core::db::DbError;
use tasktracker_core::{
    DemoTasks, EmptySeed, KeyValueStorage, ManualClock, MemoryStorage, StorageError, StoreError,
    TaskDraft, TaskEvent, TaskFilter, TaskId, TaskPatch, TaskPriority, TaskSeed, TaskStats,
    TaskStatus, TaskStore, TASKS_KEY,
};

/// Memory storage whose writes can be switched to fail.
#[derive(Default)]
struct FlakyStorage {
    inner: MemoryStorage,
    reject_writes: Cell<bool>,
}

impl FlakyStorage {
    fn write_error() -> StorageError {
        StorageError::Db(DbError::Sqlite(rusqlite::Error::InvalidQuery))
    }
}

impl KeyValueStorage for FlakyStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes.get() {
            return Err(Self::write_error());
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.reject_writes.get() {
            return Err(Self::write_error());
        }
        self.inner.remove(key)
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 18, 9, 30, 0).unwrap()
}

fn empty_store<'a>(
    storage: &'a MemoryStorage,
    clock: &Rc<ManualClock>,
) -> TaskStore<&'a MemoryStorage> {
    TaskStore::load_with(storage, clock.clone(), &EmptySeed).unwrap()
}

fn draft(title: &str, status: TaskStatus, category: &str) -> TaskDraft {
    TaskDraft::new(title)
        .status(status)
        .priority(TaskPriority::Low)
        .category(category)
}

#[test]
fn load_without_persisted_state_uses_demo_tasks_without_writing() {
    let storage = MemoryStorage::new();
    let store = TaskStore::load(&storage).unwrap();

    assert!(!store.is_loading());
    assert_eq!(store.tasks(), DemoTasks.tasks().as_slice());
    assert!(!storage.contains_key(TASKS_KEY));
}

#[test]
fn malformed_persisted_tasks_fall_back_to_seed_and_keep_stored_value() {
    let storage = MemoryStorage::new();
    storage.set(TASKS_KEY, "{not json").unwrap();

    let store = TaskStore::load(&storage).unwrap();
    assert_eq!(store.tasks().len(), 4);
    assert_eq!(
        storage.get(TASKS_KEY).unwrap().as_deref(),
        Some("{not json")
    );
}

#[test]
fn first_mutation_after_seeding_persists_the_seed_too() {
    let storage = MemoryStorage::new();
    let mut store = TaskStore::load(&storage).unwrap();
    store.create(TaskDraft::new("fifth")).unwrap();

    let persisted: Vec<serde_json::Value> =
        serde_json::from_str(&storage.get(TASKS_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(persisted.len(), 5);
    assert_eq!(persisted[0]["id"], "1");
    assert_eq!(persisted[4]["title"], "fifth");
}

#[test]
fn create_stamps_equal_timestamps_and_appends() {
    let storage = MemoryStorage::new();
    let clock = Rc::new(ManualClock::new(t0()));
    let mut store = empty_store(&storage, &clock);

    let first = store.create(draft("A", TaskStatus::Pending, "X")).unwrap();
    clock.advance(Duration::seconds(1));
    let second = store.create(draft("A", TaskStatus::Pending, "X")).unwrap();

    assert_eq!(first.created_at, first.updated_at);
    assert_eq!(first.created_at, t0());
    assert_ne!(first.id, second.id);
    let ids: Vec<_> = store.tasks().iter().map(|task| task.id.clone()).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[test]
fn empty_store_with_one_pending_task_has_expected_stats() {
    let storage = MemoryStorage::new();
    let clock = Rc::new(ManualClock::new(t0()));
    let mut store = empty_store(&storage, &clock);

    store.create(draft("A", TaskStatus::Pending, "X")).unwrap();

    assert_eq!(
        store.compute_stats(),
        TaskStats {
            total: 1,
            completed: 0,
            in_progress: 0,
            pending: 1,
            overdue: 0,
        }
    );
}

#[test]
fn update_strictly_increases_updated_at_even_when_clock_stalls() {
    let storage = MemoryStorage::new();
    let clock = Rc::new(ManualClock::new(t0()));
    let mut store = empty_store(&storage, &clock);
    let task = store.create(draft("A", TaskStatus::Pending, "X")).unwrap();

    let once = store
        .update(&task.id, TaskPatch::default())
        .unwrap()
        .expect("task exists");
    let twice = store
        .update(&task.id, TaskPatch::status(TaskStatus::Completed))
        .unwrap()
        .expect("task exists");

    assert!(once.updated_at > task.updated_at);
    assert!(twice.updated_at > once.updated_at);
    assert_eq!(twice.created_at, task.created_at);
    assert_eq!(twice.id, task.id);
    assert_eq!(twice.status, TaskStatus::Completed);
    assert_eq!(twice.title, "A");
}

#[test]
fn full_patch_from_draft_replaces_every_mutable_field() {
    let storage = MemoryStorage::new();
    let clock = Rc::new(ManualClock::new(t0()));
    let mut store = empty_store(&storage, &clock);
    let due = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    let task = store
        .create(draft("A", TaskStatus::Pending, "X").due_date(due))
        .unwrap();

    let edited = TaskDraft::new("B")
        .description("details")
        .priority(TaskPriority::High)
        .category("Y");
    let updated = store
        .update(&task.id, TaskPatch::from(edited))
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "B");
    assert_eq!(updated.description, "details");
    assert_eq!(updated.priority, TaskPriority::High);
    assert_eq!(updated.category, "Y");
    assert_eq!(updated.due_date, None);
}

#[test]
fn update_and_delete_of_unknown_id_are_silent_no_ops() {
    let storage = MemoryStorage::new();
    let mut store = TaskStore::load(&storage).unwrap();
    let before = store.tasks().to_vec();
    let missing = TaskId::new("does-not-exist");

    assert_eq!(store.update(&missing, TaskPatch::default()).unwrap(), None);
    assert_eq!(store.delete(&missing).unwrap(), None);
    assert_eq!(store.advance_status(&missing).unwrap(), None);

    assert_eq!(store.tasks(), before.as_slice());
    assert!(!storage.contains_key(TASKS_KEY));
}

#[test]
fn delete_removes_task_and_persists() {
    let storage = MemoryStorage::new();
    let mut store = TaskStore::load(&storage).unwrap();

    let removed = store.delete(&TaskId::new("2")).unwrap().expect("seed task 2");
    assert_eq!(removed.title, "Buy groceries");
    assert!(store.get(&TaskId::new("2")).is_none());

    let reloaded = TaskStore::load(&storage).unwrap();
    assert_eq!(reloaded.tasks(), store.tasks());
    assert_eq!(reloaded.tasks().len(), 3);
}

#[test]
fn empty_filter_returns_everything_in_order() {
    let storage = MemoryStorage::new();
    let store = TaskStore::load(&storage).unwrap();

    let all: Vec<_> = store.filter(&TaskFilter::default()).into_iter().cloned().collect();
    assert_eq!(all.as_slice(), store.tasks());
}

#[test]
fn empty_search_text_returns_everything_in_order() {
    let storage = MemoryStorage::new();
    let store = TaskStore::load(&storage).unwrap();

    let all: Vec<_> = store
        .filter(&TaskFilter::new().with_search(""))
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(all.as_slice(), store.tasks());
}

#[test]
fn empty_category_does_not_constrain() {
    let storage = MemoryStorage::new();
    let store = TaskStore::load(&storage).unwrap();
    let criteria = TaskFilter::new().with_category("");

    assert!(!criteria.has_active_filters());
    let all: Vec<_> = store.filter(&criteria).into_iter().cloned().collect();
    assert_eq!(all.len(), 4);
    assert_eq!(all.as_slice(), store.tasks());

    let pending_any_category = store.filter(
        &TaskFilter::new()
            .with_category("")
            .with_status(TaskStatus::Pending),
    );
    assert!(pending_any_category
        .iter()
        .all(|task| task.status == TaskStatus::Pending));
    assert!(!pending_any_category.is_empty());
}

#[test]
fn filter_is_conjunctive() {
    let storage = MemoryStorage::new();
    let clock = Rc::new(ManualClock::new(t0()));
    let mut store = empty_store(&storage, &clock);
    let both = store.create(draft("a", TaskStatus::Pending, "Work")).unwrap();
    store.create(draft("b", TaskStatus::Pending, "Home")).unwrap();
    store.create(draft("c", TaskStatus::Completed, "Work")).unwrap();
    let both_again = store.create(draft("d", TaskStatus::Pending, "Work")).unwrap();

    let criteria = TaskFilter::new()
        .with_status(TaskStatus::Pending)
        .with_category("Work");
    let ids: Vec<_> = store
        .filter(&criteria)
        .into_iter()
        .map(|task| task.id.clone())
        .collect();
    assert_eq!(ids, vec![both.id, both_again.id]);
}

#[test]
fn search_matches_title_or_description_case_insensitively() {
    let storage = MemoryStorage::new();
    let store = TaskStore::load(&storage).unwrap();

    let by_title = store.filter(&TaskFilter::new().with_search("GROCERIES"));
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].id, TaskId::new("2"));

    let by_description = store.filter(&TaskFilter::new().with_search("pull requests"));
    assert_eq!(by_description.len(), 1);
    assert_eq!(by_description[0].id, TaskId::new("3"));

    let combined = store.filter(
        &TaskFilter::new()
            .with_search("weekend")
            .with_priority(TaskPriority::High),
    );
    assert!(combined.is_empty());
}

#[test]
fn categories_are_distinct() {
    let storage = MemoryStorage::new();
    let store = TaskStore::load(&storage).unwrap();

    assert_eq!(store.list_categories(), vec!["Work", "Personal"]);
}

#[test]
fn stats_on_demo_tasks_count_statuses_and_overdue() {
    let storage = MemoryStorage::new();
    let store = TaskStore::load(&storage).unwrap();

    let stats = store.compute_stats_at(t0());
    assert_eq!(
        stats,
        TaskStats {
            total: 4,
            completed: 1,
            in_progress: 1,
            pending: 2,
            overdue: 1,
        }
    );
    assert_eq!(
        stats.total,
        stats.completed + stats.in_progress + stats.pending
    );
    assert_eq!(stats.completion_rate(), 25);
}

#[test]
fn completed_past_due_task_is_not_overdue() {
    let storage = MemoryStorage::new();
    let clock = Rc::new(ManualClock::new(t0()));
    let mut store = empty_store(&storage, &clock);
    let past = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();

    store
        .create(draft("done", TaskStatus::Completed, "X").due_date(past))
        .unwrap();
    store.create(draft("undated", TaskStatus::Pending, "X")).unwrap();
    assert_eq!(store.compute_stats().overdue, 0);

    let late = store
        .create(draft("late", TaskStatus::InProgress, "X").due_date(past))
        .unwrap();
    assert_eq!(store.compute_stats().overdue, 1);

    store.set_status(&late.id, TaskStatus::Completed).unwrap();
    assert_eq!(store.compute_stats().overdue, 0);
}

#[test]
fn advance_status_cycles_through_states() {
    let storage = MemoryStorage::new();
    let clock = Rc::new(ManualClock::new(t0()));
    let mut store = empty_store(&storage, &clock);
    let task = store.create(draft("A", TaskStatus::Pending, "X")).unwrap();

    let statuses: Vec<_> = (0..3)
        .map(|_| store.advance_status(&task.id).unwrap().unwrap().status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Pending
        ]
    );
}

#[test]
fn persisted_collection_reloads_identically() {
    let storage = MemoryStorage::new();
    let clock = Rc::new(ManualClock::new(t0()));
    let expected = {
        let mut store = empty_store(&storage, &clock);
        let due = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        store
            .create(draft("first", TaskStatus::Pending, "Work").due_date(due))
            .unwrap();
        clock.advance(Duration::milliseconds(250));
        let second = store
            .create(draft("second", TaskStatus::InProgress, "Home"))
            .unwrap();
        store
            .update(&second.id, TaskPatch::status(TaskStatus::Completed))
            .unwrap();
        store.tasks().to_vec()
    };

    let reloaded = TaskStore::load(&storage).unwrap();
    assert_eq!(reloaded.tasks(), expected.as_slice());
}

#[test]
fn empty_due_date_string_reads_as_no_due_date() {
    let storage = MemoryStorage::new();
    storage
        .set(
            TASKS_KEY,
            r#"[{
                "id": "1700000000000",
                "title": "From the web app",
                "description": "",
                "status": "pending",
                "priority": "medium",
                "category": "Inbox",
                "dueDate": "",
                "createdAt": "2024-01-10T10:00:00.000Z",
                "updatedAt": "2024-01-10T10:00:00.000Z"
            }]"#,
        )
        .unwrap();

    let store = TaskStore::load(&storage).unwrap();
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].due_date, None);
    assert_eq!(store.tasks()[0].id, TaskId::new("1700000000000"));
}

#[test]
fn subscribers_see_each_effective_mutation_in_order() {
    let storage = MemoryStorage::new();
    let clock = Rc::new(ManualClock::new(t0()));
    let mut store = empty_store(&storage, &clock);
    let log: Rc<RefCell<Vec<String>>> = Rc::default();

    let first_log = Rc::clone(&log);
    let first = store.subscribe(move |event, tasks| {
        let kind = match event {
            TaskEvent::Created(_) => "created",
            TaskEvent::Updated(_) => "updated",
            TaskEvent::Deleted(_) => "deleted",
        };
        first_log
            .borrow_mut()
            .push(format!("first:{kind}:{}", tasks.len()));
    });
    let second_log = Rc::clone(&log);
    store.subscribe(move |event, _| {
        second_log
            .borrow_mut()
            .push(format!("second:{}", event.task().title));
    });

    let task = store.create(draft("A", TaskStatus::Pending, "X")).unwrap();
    store.update(&TaskId::new("missing"), TaskPatch::default()).unwrap();
    store.update(&task.id, TaskPatch::default()).unwrap();
    assert!(store.unsubscribe(first));
    assert!(!store.unsubscribe(first));
    store.delete(&task.id).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "first:created:1".to_string(),
            "second:A".to_string(),
            "first:updated:1".to_string(),
            "second:A".to_string(),
            "second:A".to_string(),
        ]
    );
}

#[test]
fn failed_writes_leave_tasks_untouched_and_notify_no_one() {
    let storage = FlakyStorage::default();
    let clock = Rc::new(ManualClock::new(t0()));
    let mut store = TaskStore::load_with(&storage, clock.clone(), &EmptySeed).unwrap();
    let kept = store.create(draft("kept", TaskStatus::Pending, "Work")).unwrap();
    let before = store.tasks().to_vec();
    let persisted_before = storage.get(TASKS_KEY).unwrap();

    let notified = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&notified);
    store.subscribe(move |_, _| counter.set(counter.get() + 1));

    storage.reject_writes.set(true);
    clock.advance(Duration::seconds(5));

    let created = store.create(draft("lost", TaskStatus::Pending, "Work"));
    assert!(matches!(created, Err(StoreError::Storage(_))));
    assert_eq!(store.tasks(), before.as_slice());

    let patch = TaskPatch {
        title: Some("renamed".to_string()),
        ..TaskPatch::default()
    };
    let updated = store.update(&kept.id, patch);
    assert!(matches!(updated, Err(StoreError::Storage(_))));
    assert_eq!(store.tasks(), before.as_slice());

    let advanced = store.advance_status(&kept.id);
    assert!(matches!(advanced, Err(StoreError::Storage(_))));
    assert_eq!(store.tasks(), before.as_slice());

    let deleted = store.delete(&kept.id);
    assert!(matches!(deleted, Err(StoreError::Storage(_))));
    assert_eq!(store.tasks(), before.as_slice());

    assert_eq!(notified.get(), 0);
    assert_eq!(storage.get(TASKS_KEY).unwrap(), persisted_before);

    storage.reject_writes.set(false);
    store.delete(&kept.id).unwrap();
    assert!(store.tasks().is_empty());
    assert_eq!(notified.get(), 1);
}
