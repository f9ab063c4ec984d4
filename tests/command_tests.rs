use chrono::NaiveDate;
use sprouts::commands::*;
use sprouts::models::Frequency;
use sprouts::plants::PlantCatalog;
use sprouts::species::SpeciesTable;
use sprouts::storage::FileBlobStore;
use sprouts::store::TaskStore;
use std::path::Path;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn with_test_db<F>(f: F)
where
    F: FnOnce(&Path),
{
    let dir = tempfile::tempdir().unwrap();
    f(dir.path());
}

fn open(dir: &Path) -> TaskStore<FileBlobStore> {
    TaskStore::load(FileBlobStore::new(dir))
}

#[test]
fn test_add_and_reload() {
    with_test_db(|dir| {
        let mut store = open(dir);
        let id = cmd_add(&mut store, "Water".into(), Some("Fern".into()), None, "2024-01-05".into(), None, today(), true)
            .unwrap();

        let tasks = open(dir).tasks().to_vec();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, id);
        assert_eq!(tasks[0].title, "Water");
        assert_eq!(tasks[0].plant_name, Some("Fern".into()));
        assert_eq!(tasks[0].due_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    });
}

#[test]
fn test_add_rejects_bad_input() {
    with_test_db(|dir| {
        let mut store = open(dir);
        assert!(cmd_add(&mut store, "  ".into(), None, None, "today".into(), None, today(), true).is_none());
        assert!(cmd_add(&mut store, "Water".into(), None, None, "soon".into(), None, today(), true).is_none());
        assert!(cmd_add(&mut store, "Water".into(), None, None, "today".into(), Some("hourly".into()), today(), true).is_none());
        assert!(store.is_empty());
    });
}

#[test]
fn test_complete_by_prefix() {
    with_test_db(|dir| {
        let mut store = open(dir);
        let id = cmd_add(&mut store, "Repot".into(), None, None, "today".into(), None, today(), true).unwrap();

        cmd_complete(&mut store, &id[..12], true);

        let tasks = open(dir).tasks().to_vec();
        assert!(tasks[0].is_completed());
        assert!(tasks[0].completed_date.is_some());
    });
}

#[test]
fn test_complete_by_displayed_id() {
    with_test_db(|dir| {
        let mut store = open(dir);
        let a = cmd_add(&mut store, "Water".into(), None, None, "today".into(), None, today(), true).unwrap();
        let b = cmd_add(&mut store, "Mist".into(), None, None, "today".into(), None, today(), true).unwrap();
        assert_ne!(short_id(&a), short_id(&b));

        cmd_complete(&mut store, short_id(&a), true);
        cmd_remove(&mut store, short_id(&b), true);

        let tasks = open(dir).tasks().to_vec();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, a);
        assert!(tasks[0].is_completed());
    });
}

#[test]
fn test_ambiguous_id_removes_nothing() {
    with_test_db(|dir| {
        let mut store = open(dir);
        let a = cmd_add(&mut store, "Water".into(), None, None, "today".into(), None, today(), true).unwrap();
        cmd_add(&mut store, "Mist".into(), None, None, "today".into(), None, today(), true).unwrap();

        cmd_remove(&mut store, &a[..4], true);
        cmd_chain(&store, &a[..4], today());

        assert_eq!(open(dir).len(), 2);
    });
}

#[test]
fn test_recurrence() {
    with_test_db(|dir| {
        let mut store = open(dir);
        let id = cmd_add(&mut store, "Mist".into(), None, None, "2024-01-01".into(), Some("4-5 days".into()), today(), true)
            .unwrap();

        cmd_complete(&mut store, &id, true);

        let tasks = open(dir).tasks().to_vec();
        assert_eq!(tasks.len(), 2);
        let completed = tasks.iter().find(|t| t.is_completed()).unwrap();
        let new_task = tasks.iter().find(|t| !t.is_completed()).unwrap();
        assert_eq!(completed.title, "Mist");
        assert_eq!(new_task.title, "Mist");
        assert_ne!(completed.id, new_task.id);
        assert_eq!(new_task.parent_task_id.as_deref(), Some(id.as_str()));
        assert_eq!(new_task.due_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    });
}

#[test]
fn test_edit_series_and_stop_recurring() {
    with_test_db(|dir| {
        let mut store = open(dir);
        let id = cmd_add(&mut store, "Water".into(), Some("Fern".into()), None, "today".into(), Some("weekly".into()), today(), true)
            .unwrap();
        cmd_complete(&mut store, &id, true);
        let spawned = store.tasks()[1].id.clone();

        cmd_edit(&mut store, &spawned, Some("Soak".into()), Some("".into()), None, Some("none".into()), true);

        let tasks = open(dir).tasks().to_vec();
        assert!(tasks.iter().all(|t| t.title == "Soak"));
        assert!(tasks.iter().all(|t| t.plant_name.is_none()));
        assert!(tasks.iter().all(|t| t.frequency().is_none()));
        assert_eq!(tasks[1].parent_task_id.as_deref(), Some(id.as_str()));
    });
}

#[test]
fn test_edit_changes_recurrence() {
    with_test_db(|dir| {
        let mut store = open(dir);
        let id = cmd_add(&mut store, "Feed".into(), None, None, "today".into(), None, today(), true).unwrap();
        cmd_edit(&mut store, &id, None, None, None, Some("monthly".into()), true);
        assert_eq!(open(dir).tasks()[0].frequency(), Some(Frequency::Monthly));
    });
}

#[test]
fn test_reschedule_and_remove() {
    with_test_db(|dir| {
        let mut store = open(dir);
        let a = cmd_add(&mut store, "Water".into(), None, None, "today".into(), None, today(), true).unwrap();
        let b = cmd_add(&mut store, "Mist".into(), None, None, "today".into(), None, today(), true).unwrap();

        cmd_reschedule(&mut store, &a, "tomorrow", today(), true);
        cmd_remove(&mut store, &b, true);
        cmd_remove(&mut store, "does-not-exist", true);

        let tasks = open(dir).tasks().to_vec();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, a);
        assert_eq!(tasks[0].due_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    });
}

#[test]
fn test_plants() {
    with_test_db(|dir| {
        let table = SpeciesTable::from_json(r#"[{"name": "Fern", "watering": "Frequent", "sunlight": ["shade"]}]"#).unwrap();
        let mut catalog = PlantCatalog::load(FileBlobStore::new(dir));

        let fern = cmd_plant_add(&mut catalog, "Fern".into(), Some("fern.jpg".into()), &table, true).unwrap();
        cmd_plant_add(&mut catalog, "Cactus".into(), None, &table, true).unwrap();
        assert!(cmd_plant_add(&mut catalog, " ".into(), None, &table, true).is_none());

        let reloaded = PlantCatalog::load(FileBlobStore::new(dir));
        assert_eq!(reloaded.plants().len(), 2);
        assert_eq!(reloaded.get(&fern).unwrap().watering.as_deref(), Some("Frequent"));
        assert!(reloaded.plants()[1].watering.is_none());

        cmd_plant_remove(&mut catalog, "cactus", true);
        assert_eq!(PlantCatalog::load(FileBlobStore::new(dir)).plants().len(), 1);
    });
}

#[test]
fn test_reset() {
    with_test_db(|dir| {
        let mut store = open(dir);
        let mut catalog = PlantCatalog::load(FileBlobStore::new(dir));
        cmd_add(&mut store, "Water".into(), None, None, "today".into(), None, today(), true);
        cmd_plant_add(&mut catalog, "Fern".into(), None, &SpeciesTable::default(), true);

        cmd_reset(&mut store, &mut catalog, true);

        assert!(open(dir).is_empty());
        assert!(PlantCatalog::load(FileBlobStore::new(dir)).plants().is_empty());
    });
}

#[test]
fn test_parse_helpers() {
    assert_eq!(parse_due_date("", today()).unwrap(), today());
    assert_eq!(parse_due_date("Tomorrow", today()).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    assert!(parse_due_date("01/02/2024", today()).is_err());
    assert_eq!(parse_recurrence("off").unwrap(), None);
    assert_eq!(parse_recurrence("biweekly").unwrap(), Some(Frequency::Biweekly));
    assert_eq!(short_id("0190c3a2-aaaa-bbbbcccc"), "bbbbcccc");
    assert_eq!(short_id("42"), "42");
}
