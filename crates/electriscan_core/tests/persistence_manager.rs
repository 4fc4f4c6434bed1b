mod common;

use common::{household, read_json, storage, write_household};
use electriscan_core::convert::validate_household_document;
use electriscan_core::repo::read_document;
use electriscan_core::{
    HouseholdRecord, PersistenceError, PersistenceManager, RoomRecord, RoomType, StorageConfig,
    StoreError,
};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn rename(manager: &PersistenceManager, name: &str) {
    let household = manager.active_household().unwrap();
    let mut household = household.lock().unwrap();
    let record = HouseholdRecord {
        name,
        postal_code: household.postal_code(),
        residents: household.residents(),
    };
    household.edit(&record);
}

#[test]
fn switch_saves_the_previous_household_first() {
    let (dir, config) = storage();
    let alpha = write_household(dir.path(), "a.json", &household("Alpha"));
    write_household(dir.path(), "b.json", &household("Bravo"));
    let manager = PersistenceManager::open(config).unwrap();
    assert_eq!(manager.active_id(), 0);
    assert_eq!(manager.household_count(), 2);

    let outcome = manager.switch_to(1).unwrap();
    assert!(!outcome.was_already_active());
    rename(&manager, "Alpha renamed");
    assert!(manager.has_unsaved_changes());
    assert_eq!(read_json(&alpha)["HOUSEHOLD_NAME"], "Alpha");

    let outcome = manager.switch_to(2).unwrap();
    assert_eq!(outcome.household().lock().unwrap().name(), "Bravo");
    assert_eq!(manager.active_id(), 2);
    assert!(!manager.has_unsaved_changes());

    let saved = read_json(&alpha);
    assert_eq!(saved["HOUSEHOLD_NAME"], "Alpha renamed");
    assert_eq!(saved["id"], 1);
    assert_eq!(saved["rooms"][0]["devices"][1]["DEVICE_NAME"], "Oven");
}

#[test]
fn switching_to_the_active_household_is_reported() {
    let (dir, config) = storage();
    write_household(dir.path(), "a.json", &household("Alpha"));
    let manager = PersistenceManager::open(config).unwrap();

    let first = manager.switch_to(1).unwrap();
    let second = manager.switch_to(1).unwrap();
    assert!(second.was_already_active());
    assert!(Arc::ptr_eq(first.household(), second.household()));
}

#[test]
fn unknown_ids_are_rejected() {
    let (dir, config) = storage();
    write_household(dir.path(), "a.json", &household("Alpha"));
    write_household(dir.path(), "b.json", &household("Bravo"));
    let manager = PersistenceManager::open(config).unwrap();

    for id in [0, 3] {
        assert!(matches!(
            manager.switch_to(id),
            Err(PersistenceError::HouseholdIdOutOfRange { available: 2, .. })
        ));
    }
    assert!(matches!(
        manager.delete(7),
        Err(PersistenceError::HouseholdIdOutOfRange { id: 7, available: 2 })
    ));
    assert_eq!(manager.active_id(), 0);
}

#[test]
fn deleting_the_active_household_tombstones_then_purges_on_reopen() {
    let (dir, config) = storage();
    let alpha = write_household(dir.path(), "a.json", &household("Alpha"));
    let bravo = write_household(dir.path(), "b.json", &household("Bravo"));
    let manager = PersistenceManager::open(config.clone()).unwrap();
    manager.switch_to(1).unwrap();

    manager.delete(1).unwrap();
    assert_eq!(manager.active_id(), 0);
    assert!(manager.active_household().is_none());
    assert_eq!(read_json(&alpha)["delete"], true);

    let entries = manager.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, 1);
    assert_eq!(entries[0].path, bravo);
    assert_eq!(read_json(&bravo)["id"], 1);
    drop(manager);

    let reopened = PersistenceManager::open(config).unwrap();
    assert!(!alpha.exists());
    assert_eq!(reopened.household_count(), 1);
    assert_eq!(reopened.entries()[0].display_name, "Bravo");
}

#[test]
fn deleting_an_inactive_household_keeps_the_active_one() {
    let (dir, config) = storage();
    write_household(dir.path(), "a.json", &household("Alpha"));
    let bravo = write_household(dir.path(), "b.json", &household("Bravo"));
    let charlie = write_household(dir.path(), "c.json", &household("Charlie"));
    let manager = PersistenceManager::open(config).unwrap();
    manager.switch_to(3).unwrap();

    manager.delete(2).unwrap();
    assert_eq!(manager.active_id(), 2);
    assert_eq!(read_json(&charlie)["id"], 2);
    assert_eq!(read_json(&bravo)["delete"], true);

    manager.switch_to(1).unwrap();
    assert!(!bravo.exists());
}

#[test]
fn create_writes_a_default_household_without_activating_it() {
    let (dir, config) = storage();
    write_household(dir.path(), "a.json", &household("Alpha"));
    let manager = PersistenceManager::open(config).unwrap();
    manager.switch_to(1).unwrap();

    let id = manager.create().unwrap();
    assert_eq!(manager.household_count(), 2);
    // Timestamped names sort before "a.json".
    assert_eq!(id, 1);
    assert_eq!(manager.active_id(), 2);

    let entry = manager
        .entries()
        .into_iter()
        .find(|entry| entry.id == id)
        .unwrap();
    assert_eq!(entry.display_name, "Default Household");
    assert!(!entry.loaded);
    let file_name = entry.path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.ends_with(".json"));
    assert_eq!(file_name.len(), "2026-01-01_00-00-00.json".len());

    let doc = read_json(&entry.path);
    assert_eq!(doc["POSTAL_CODE"], 1000);
    assert_eq!(doc["NUMBER_OF_RESIDENTS"], 1);
    assert_eq!(doc["rooms"], json!([]));
    assert_eq!(doc["solarPanels"], json!([]));
    assert_eq!(doc["id"], id);
}

#[test]
fn export_saves_and_copies_the_active_document() {
    let (dir, config) = storage();
    write_household(dir.path(), "a.json", &household("Alpha"));
    let manager = PersistenceManager::open(config).unwrap();
    let target = tempfile::tempdir().unwrap();

    assert!(matches!(
        manager.export(target.path()),
        Err(PersistenceError::NoActiveHousehold)
    ));

    manager.switch_to(1).unwrap();
    rename(&manager, "Exported");
    assert!(matches!(
        manager.export(dir.path()),
        Err(PersistenceError::ExportIntoStorage(_))
    ));

    let copy = manager.export(target.path()).unwrap();
    assert_eq!(copy, target.path().join("a.json"));
    assert_eq!(read_json(&copy)["HOUSEHOLD_NAME"], "Exported");
    assert_eq!(read_json(&dir.path().join("a.json")), read_json(&copy));
    assert!(!manager.has_unsaved_changes());
}

#[test]
fn import_registers_a_valid_document() {
    let (dir, config) = storage();
    write_household(dir.path(), "a.json", &household("Alpha"));
    write_household(dir.path(), "m.json", &household("Mike"));
    let outside = tempfile::tempdir().unwrap();
    let source = write_household(outside.path(), "f.json", &household("Foxtrot"));
    let manager = PersistenceManager::open(config).unwrap();
    manager.switch_to(2).unwrap();

    let id = manager.import(&source).unwrap();
    assert_eq!(id, 2);
    assert_eq!(manager.active_id(), 3);

    let imported = read_json(&dir.path().join("f.json"));
    assert_eq!(imported["HOUSEHOLD_NAME"], "Foxtrot");
    assert_eq!(imported["id"], 2);
    assert!(imported.get("delete").is_none());
    assert!(source.exists());
}

#[test]
fn import_refuses_conflicts_and_foreign_files() {
    let (dir, config) = storage();
    write_household(dir.path(), "a.json", &household("Alpha"));
    let outside = tempfile::tempdir().unwrap();
    let duplicate = write_household(outside.path(), "a.json", &household("Impostor"));
    let text = outside.path().join("household.txt");
    std::fs::write(&text, "{}").unwrap();
    let manager = PersistenceManager::open(config).unwrap();

    assert!(matches!(
        manager.import(&duplicate),
        Err(PersistenceError::ImportConflict(_))
    ));
    assert_eq!(read_json(&dir.path().join("a.json"))["HOUSEHOLD_NAME"], "Alpha");
    assert!(matches!(
        manager.import(&text),
        Err(PersistenceError::UnsupportedDocument(_))
    ));
    assert_eq!(manager.household_count(), 1);
}

#[test]
fn failed_import_leaves_a_tombstone_that_is_purged_later() {
    let (dir, config) = storage();
    write_household(dir.path(), "a.json", &household("Alpha"));
    let outside = tempfile::tempdir().unwrap();
    let mut broken = household("Broken");
    broken.remove("POSTAL_CODE");
    let source = write_household(outside.path(), "broken.json", &broken);
    let garbage = outside.path().join("garbage.json");
    std::fs::write(&garbage, "not json at all").unwrap();
    let manager = PersistenceManager::open(config).unwrap();

    let error = manager.import(&source).unwrap_err();
    assert!(matches!(
        error,
        PersistenceError::Store(StoreError::Schema { .. })
    ));
    let copy = dir.path().join("broken.json");
    assert_eq!(read_json(&copy)["delete"], true);
    assert_eq!(manager.household_count(), 1);

    assert!(matches!(
        manager.import(&garbage),
        Err(PersistenceError::Store(StoreError::Json { .. }))
    ));
    assert!(!dir.path().join("garbage.json").exists());

    manager.switch_to(1).unwrap();
    assert!(!copy.exists());
}

#[test]
fn tear_down_saves_once_and_is_idempotent() {
    let (dir, config) = storage();
    let alpha = write_household(dir.path(), "a.json", &household("Alpha"));
    let manager = PersistenceManager::open(config).unwrap();
    manager.switch_to(1).unwrap();
    rename(&manager, "Closing time");

    manager.tear_down().unwrap();
    assert!(manager.is_torn_down());
    assert_eq!(read_json(&alpha)["HOUSEHOLD_NAME"], "Closing time");

    std::fs::remove_file(&alpha).unwrap();
    manager.tear_down().unwrap();
    drop(manager);
    assert!(!alpha.exists());
}

#[test]
fn autosave_tick_writes_the_active_document() {
    let (dir, config) = storage();
    let alpha = write_household(dir.path(), "a.json", &household("Alpha"));
    let manager = PersistenceManager::open(config).unwrap();
    assert!(!manager.autosave_tick());

    manager.switch_to(1).unwrap();
    rename(&manager, "Ticked");
    assert!(manager.autosave_tick());
    assert!(!manager.has_unsaved_changes());
    assert_eq!(read_json(&alpha)["HOUSEHOLD_NAME"], "Ticked");

    std::fs::remove_dir_all(dir.path()).unwrap();
    rename(&manager, "Lost");
    assert!(!manager.autosave_tick());
    assert!(manager.has_unsaved_changes());
    assert!(manager.tear_down().is_err());
}

#[test]
fn autosave_timer_persists_edits_in_the_background() {
    let dir = tempfile::tempdir().unwrap();
    let alpha = write_household(dir.path(), "a.json", &household("Alpha"));
    let config = StorageConfig::new(dir.path())
        .unwrap()
        .with_autosave_interval(Duration::from_millis(20))
        .unwrap();
    let manager = PersistenceManager::open(config).unwrap();
    manager.switch_to(1).unwrap();
    rename(&manager, "Background");

    thread::sleep(Duration::from_millis(400));
    assert_eq!(read_json(&alpha)["HOUSEHOLD_NAME"], "Background");
    assert!(!manager.has_unsaved_changes());
}

#[test]
fn autosave_only_writes_complete_documents_while_editing() {
    let dir = tempfile::tempdir().unwrap();
    let alpha = write_household(dir.path(), "a.json", &household("Alpha"));
    let config = StorageConfig::new(dir.path())
        .unwrap()
        .with_autosave_interval(Duration::from_millis(1))
        .unwrap();
    let manager = PersistenceManager::open(config).unwrap();
    let household = Arc::clone(manager.switch_to(1).unwrap().household());

    let editor = {
        let household = Arc::clone(&household);
        thread::spawn(move || {
            for round in 0..200u32 {
                let mut home = household.lock().unwrap();
                let name = format!("Round {round}");
                home.edit(&HouseholdRecord {
                    name: &name,
                    postal_code: 8400 + round,
                    residents: 2,
                });
                let room_id = home
                    .add_room_from_record(&RoomRecord {
                        room_type: RoomType::Office,
                        name: "Scratch",
                        size: 9.5,
                    })
                    .unwrap();
                if round % 2 == 0 {
                    home.remove_room(room_id).unwrap();
                }
                drop(home);
                thread::yield_now();
            }
        })
    };

    let mut reads = 0;
    while !editor.is_finished() || reads == 0 {
        let doc = read_document(&alpha).unwrap();
        validate_household_document(&doc).unwrap();
        reads += 1;
    }
    editor.join().unwrap();
    manager.tear_down().unwrap();

    let saved = read_json(&alpha);
    assert_eq!(saved["HOUSEHOLD_NAME"], "Round 199");
    assert_eq!(
        saved["rooms"].as_array().unwrap().len(),
        household.lock().unwrap().room_count()
    );
    validate_household_document(saved.as_object().unwrap()).unwrap();
}
