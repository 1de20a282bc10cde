use drawnotes_core::{
    AssetDirectory, DataModelController, DrawingRecord, DrawingStore, FileStore, LoadState,
    MemoryStore, PersistenceBackend, StaticAssets, SAVE_FILE_NAME,
};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn record(bytes: &[u8]) -> DrawingRecord {
    DrawingRecord::from(bytes)
}

fn persisted(records: &[&str]) -> Vec<u8> {
    DrawingStore::with_drawings(records.iter().map(|text| record(text.as_bytes())).collect())
        .serialize()
        .unwrap()
}

fn notes_assets() -> StaticAssets {
    StaticAssets::none().with_asset("Notes", b"seed notes".to_vec())
}

#[test]
fn first_run_seeds_from_default_content() {
    let mut controller = DataModelController::new(MemoryStore::new(), notes_assets()).unwrap();
    assert!(controller.wait_until_ready(WAIT));

    assert_eq!(controller.state(), LoadState::Ready);
    assert_eq!(controller.drawings(), &[record(b"seed notes")]);
}

#[test]
fn first_run_without_bundled_assets_is_empty() {
    let mut controller =
        DataModelController::new(MemoryStore::new(), StaticAssets::none()).unwrap();
    assert!(controller.wait_until_ready(WAIT));
    assert!(controller.is_empty());
}

#[test]
fn first_run_does_not_write_storage() {
    let backend = MemoryStore::new();
    let mut controller = DataModelController::new(backend.clone(), notes_assets()).unwrap();
    assert!(controller.wait_until_ready(WAIT));
    assert!(controller.flush(WAIT));

    assert!(!backend.exists());
    assert!(backend.writes().is_empty());
}

#[test]
fn persisted_store_wins_over_defaults() {
    let backend = MemoryStore::with_contents(persisted(&["one", "two"]));
    let mut controller = DataModelController::new(backend, notes_assets()).unwrap();
    assert!(controller.wait_until_ready(WAIT));

    assert_eq!(controller.drawings(), &[record(b"one"), record(b"two")]);
}

#[test]
fn corrupt_store_falls_back_to_defaults() {
    let backend = MemoryStore::with_contents(b"{\"format_version\": 1, \"drawings\": [".to_vec());
    let mut controller = DataModelController::new(backend.clone(), notes_assets()).unwrap();
    assert!(controller.wait_until_ready(WAIT));

    assert_eq!(controller.drawings(), &[record(b"seed notes")]);
    // The corrupt bytes stay on disk until the next save.
    assert!(backend.writes().is_empty());
}

#[test]
fn future_version_falls_back_to_defaults() {
    let bytes = serde_json::to_vec(&serde_json::json!({
        "format_version": 99,
        "drawings": [[1, 2, 3]]
    }))
    .unwrap();
    let mut controller =
        DataModelController::new(MemoryStore::with_contents(bytes), notes_assets()).unwrap();
    assert!(controller.wait_until_ready(WAIT));

    assert_eq!(controller.drawings(), &[record(b"seed notes")]);
}

#[test]
fn reads_during_loading_see_empty_store_until_applied() {
    let backend = MemoryStore::with_contents(persisted(&["stored"]));
    let mut controller = DataModelController::new(backend, notes_assets()).unwrap();

    assert_eq!(controller.state(), LoadState::Loading);
    assert!(controller.is_empty());

    assert!(controller.flush(WAIT));
    // The load has finished on the queue but is not applied yet.
    assert!(controller.is_empty());
    assert_eq!(controller.apply_pending_updates(), 1);
    assert_eq!(controller.drawings(), &[record(b"stored")]);
    assert_eq!(controller.apply_pending_updates(), 0);
}

#[test]
fn save_then_reload_completes_in_queue_order() {
    let backend = MemoryStore::with_contents(persisted(&["old"]));
    let mut controller = DataModelController::new(backend.clone(), notes_assets()).unwrap();
    assert!(controller.wait_until_ready(WAIT));

    controller.update_drawing(record(b"A"), 0).unwrap();
    controller.reload();
    assert!(controller.wait_until_ready(WAIT));

    assert_eq!(controller.drawings(), &[record(b"A")]);
    assert_eq!(backend.writes(), vec![persisted(&["A"])]);
}

#[test]
fn save_issued_while_loading_runs_after_the_load() {
    let backend = MemoryStore::with_contents(persisted(&["stored"]));
    let mut controller = DataModelController::new(backend.clone(), notes_assets()).unwrap();

    // Queued behind the initial load, so the load still reads `stored`.
    controller.new_drawing();
    assert!(controller.wait_until_ready(WAIT));
    assert_eq!(controller.drawings(), &[record(b"stored")]);

    assert!(controller.flush(WAIT));
    assert_eq!(backend.writes(), vec![persisted(&[""])]);
}

#[test]
fn file_store_persists_across_controllers() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut controller =
            DataModelController::new(FileStore::in_dir(dir.path()), StaticAssets::none()).unwrap();
        assert!(controller.wait_until_ready(WAIT));
        controller.new_drawing();
        controller.update_drawing(record(b"kept"), 0).unwrap();
    }

    assert!(dir.path().join(SAVE_FILE_NAME).is_file());

    let mut reopened =
        DataModelController::new(FileStore::in_dir(dir.path()), notes_assets()).unwrap();
    assert!(reopened.wait_until_ready(WAIT));
    assert_eq!(reopened.drawings(), &[record(b"kept")]);
}

#[test]
fn asset_directory_seeds_first_run() {
    let storage = tempfile::tempdir().unwrap();
    let assets = tempfile::tempdir().unwrap();
    std::fs::write(assets.path().join("Notes.drawing"), b"bundled").unwrap();

    let mut controller = DataModelController::new(
        FileStore::in_dir(storage.path()),
        AssetDirectory::new(assets.path()),
    )
    .unwrap();
    assert!(controller.wait_until_ready(WAIT));

    assert_eq!(controller.drawings(), &[record(b"bundled")]);
}

#[test]
fn unreadable_save_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(SAVE_FILE_NAME)).unwrap();

    let mut controller =
        DataModelController::new(FileStore::in_dir(dir.path()), notes_assets()).unwrap();
    assert!(controller.wait_until_ready(WAIT));
    assert_eq!(controller.drawings(), &[record(b"seed notes")]);
}
