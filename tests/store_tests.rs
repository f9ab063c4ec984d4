use chrono::NaiveDate;
use sprouts::models::{Frequency, NewTask, Task, TaskEdit};
use sprouts::recurrence::next_due_date;
use sprouts::storage::{MemoryBlobStore, TASKS_SLOT};
use sprouts::store::TaskStore;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn water(frequency: Option<Frequency>, due: NaiveDate) -> NewTask {
    NewTask {
        title: "Water".into(),
        plant_name: Some("Monstera".into()),
        description: Some("Until it drains".into()),
        due_date: due,
        frequency,
    }
}

#[test]
fn weekly_task_completion_spawns_next_week() {
    let mut store = TaskStore::load(MemoryBlobStore::new());
    let first = store.create(water(Some(Frequency::Weekly), date(2024, 1, 1))).unwrap().id.clone();

    let done = store.complete(&first).unwrap();
    let next = done.spawned.expect("weekly task should recur");

    assert_eq!(next.due_date, date(2024, 1, 8));
    assert_eq!(next.parent_task_id.as_deref(), Some(first.as_str()));
    assert!(!next.is_completed());
    assert_ne!(next.id, first);
    assert_eq!(next.title, "Water");
    assert_eq!(next.plant_name.as_deref(), Some("Monstera"));
    assert_eq!(next.description.as_deref(), Some("Until it drains"));
    assert!(store.get(&first).unwrap().is_completed());
    assert_eq!(store.len(), 2);
}

#[test]
fn every_frequency_spawns_exactly_one_linked_occurrence() {
    for f in Frequency::ALL {
        let mut store = TaskStore::load(MemoryBlobStore::new());
        let root = store.create(water(Some(f), date(2024, 1, 31))).unwrap().id.clone();
        let second = store.complete(&root).unwrap().spawned.unwrap();

        let before = store.len();
        let origin: Task = store.get(&second.id).unwrap().clone();
        let third = store.complete(&second.id).unwrap().spawned.unwrap();

        assert_eq!(store.len(), before + 1);
        assert_eq!(third.parent_task_id.as_deref(), Some(origin.root_id()));
        assert_eq!(third.parent_task_id.as_deref(), Some(root.as_str()));
        assert!(!third.is_completed());
        assert_eq!(third.due_date, next_due_date(origin.due_date, f).unwrap());
        assert!(third.due_date > origin.due_date);
    }
}

#[test]
fn editing_spawned_member_updates_whole_lineage() {
    let mut store = TaskStore::load(MemoryBlobStore::new());
    let root = store.create(water(Some(Frequency::Weekly), date(2024, 1, 1))).unwrap().id.clone();
    let second = store.complete(&root).unwrap().spawned.unwrap().id;
    let third = store.complete(&second).unwrap().spawned.unwrap().id;
    let unrelated = store.create(water(None, date(2024, 1, 2))).unwrap().id.clone();

    let before: Vec<Task> = store.tasks().to_vec();

    let mut edit = TaskEdit::from_task(store.get(&second).unwrap());
    edit.title = "Deep water".into();
    edit.description = None;
    edit.frequency = Some(Frequency::Biweekly);
    assert_eq!(store.edit(&second, edit).unwrap(), 3);

    for id in [&root, &second, &third] {
        let now = store.get(id).unwrap();
        let was = before.iter().find(|t| &t.id == id).unwrap();
        assert_eq!(now.title, "Deep water");
        assert_eq!(now.description, None);
        assert_eq!(now.frequency(), Some(Frequency::Biweekly));
        assert_eq!(now.due_date, was.due_date);
        assert_eq!(now.completed_date, was.completed_date);
        assert_eq!(now.created_date, was.created_date);
        assert_eq!(now.parent_task_id, was.parent_task_id);
    }
    assert!(store.get(&root).unwrap().is_completed());
    assert!(store.get(&second).unwrap().is_completed());
    assert!(!store.get(&third).unwrap().is_completed());
    assert_eq!(store.get(&unrelated).unwrap().title, "Water");
}

#[test]
fn deleting_one_member_leaves_the_rest_untouched() {
    let mut store = TaskStore::load(MemoryBlobStore::new());
    let root = store.create(water(Some(Frequency::Daily), date(2024, 1, 1))).unwrap().id.clone();
    let second = store.complete(&root).unwrap().spawned.unwrap().id;
    let third = store.complete(&second).unwrap().spawned.unwrap().id;

    let before: Vec<Task> = store.tasks().to_vec();
    let removed = store.delete(&second).unwrap();
    assert_eq!(removed.id, second);

    let after: Vec<Task> = store.tasks().to_vec();
    let expected: Vec<Task> = before.into_iter().filter(|t| t.id != second).collect();
    assert_eq!(after, expected);
    assert_eq!(store.chain(&third).unwrap().len(), 2);
}

#[test]
fn deleting_the_root_keeps_series_editable_and_recurring() {
    let mut store = TaskStore::load(MemoryBlobStore::new());
    let root = store.create(water(Some(Frequency::Daily), date(2024, 1, 1))).unwrap().id.clone();
    let second = store.complete(&root).unwrap().spawned.unwrap().id;
    store.delete(&root);

    let third = store.complete(&second).unwrap().spawned.unwrap();
    assert_eq!(third.parent_task_id.as_deref(), Some(root.as_str()));

    let mut edit = TaskEdit::from_task(&third);
    edit.title = "Mist".into();
    assert_eq!(store.edit(&third.id, edit).unwrap(), 2);
}

#[test]
fn state_survives_a_reload() {
    let handle = MemoryBlobStore::new();
    let mut store = TaskStore::load(handle.clone());
    let root = store.create(water(Some(Frequency::Monthly), date(2024, 1, 31))).unwrap().id.clone();
    store.complete(&root).unwrap();
    let saved: Vec<Task> = store.tasks().to_vec();

    let reloaded = TaskStore::load(handle.clone());
    assert_eq!(reloaded.tasks(), saved.as_slice());
    assert_eq!(reloaded.tasks()[1].due_date, date(2024, 2, 29));
    assert!(handle.get(TASKS_SLOT).unwrap().contains("\"parentTaskId\""));
}

#[test]
fn loads_blob_written_by_the_mobile_app() {
    let blob = r#"[
        {"id": "1704067200000", "title": "Water", "dueDate": "2024-01-01T15:00:00.000Z",
         "isRecurring": true, "recurrencePattern": {"frequency": "2-3 days"},
         "isCompleted": true, "completedDate": "2024-01-01T16:00:00.000Z",
         "createdDate": "2023-12-31T10:00:00.000Z"},
        {"id": "1704103200000", "title": "Water", "dueDate": "2024-01-03T15:00:00.000Z",
         "isRecurring": true, "recurrencePattern": {"frequency": "2-3 days"},
         "isCompleted": false, "createdDate": "2024-01-01T16:00:00.000Z",
         "parentTaskId": "1704067200000"}
    ]"#;
    let mut store = TaskStore::load(MemoryBlobStore::new().with_slot(TASKS_SLOT, blob));
    assert_eq!(store.len(), 2);
    assert_eq!(store.chain("1704103200000").unwrap().len(), 2);

    let next = store.complete("1704103200000").unwrap().spawned.unwrap();
    assert_eq!(next.parent_task_id.as_deref(), Some("1704067200000"));
    assert_eq!(next.frequency(), Some(Frequency::EveryTwoToThreeDays));
}

#[test]
fn unknown_frequency_in_blob_falls_back_to_empty() {
    let blob = r#"[{"id": "1", "title": "Water", "dueDate": "2024-01-01",
        "isRecurring": true, "recurrencePattern": {"frequency": "hourly"},
        "isCompleted": false, "createdDate": "2024-01-01T00:00:00Z"}]"#;
    let store = TaskStore::load(MemoryBlobStore::new().with_slot(TASKS_SLOT, blob));
    assert!(store.is_empty());
}

#[test]
fn agenda_sections() {
    let today = date(2024, 1, 1);
    let mut store = TaskStore::load(MemoryBlobStore::new());
    let later = store.create(water(None, date(2024, 1, 5))).unwrap().id.clone();
    let now_a = store.create(water(None, today)).unwrap().id.clone();
    let soon = store.create(water(None, date(2024, 1, 2))).unwrap().id.clone();
    let now_b = store.create(water(None, today)).unwrap().id.clone();
    let overdue = store.create(water(None, date(2023, 12, 30))).unwrap().id.clone();
    let done = store.create(water(None, today)).unwrap().id.clone();
    store.complete(&done).unwrap();

    let agenda = store.agenda(today);
    let ids = |v: &[&Task]| v.iter().map(|t| t.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&agenda.today), [now_a.clone(), now_b]);
    assert_eq!(ids(&agenda.upcoming), [overdue.clone(), soon, later]);
    assert_eq!(ids(&agenda.completed), [done]);
    assert_eq!(agenda.active().count(), 5);
    assert_eq!(store.next_task().unwrap().id, overdue);
}
