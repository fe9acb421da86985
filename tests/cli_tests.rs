//! Runs the `mtt` binary against snapshot files on disk

use metaterm::{InMemoryStore, Record, SnapshotManager, Taxonomy};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write_site(path: &Path) {
    let store = InMemoryStore::new()
        .with_taxonomy(Taxonomy::new("colors", ["post"]))
        .with_record(Record::new(10, "post").with_meta("color", "red").with_meta("color", "blue"))
        .with_record(Record::new(11, "post"));
    SnapshotManager::new(path).save_store(&store).unwrap();
}

fn mtt(store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mtt"))
        .arg("--store")
        .arg(store)
        .args(args)
        .env_remove("MTT_STORE")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn load(path: &Path) -> InMemoryStore {
    SnapshotManager::new(path).load_store().unwrap().unwrap()
}

#[test]
fn test_migrate_text_output() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("content.json");
    write_site(&path);

    let output = mtt(&path, &["migrate", "--color", "never", "color", "colors"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("---\nPer page: -1 \nPage: 1 \nTotal pages: 1\n---\n"));
    assert!(stdout.contains("[10] Migrated: red, blue\n"));
    assert!(stdout.contains("[11] No meta, skipped\n"));

    let store = load(&path);
    assert!(!store.record(10).unwrap().has_meta("color"));
    assert_eq!(store.record(10).unwrap().terms("colors"), ["red", "blue"]);
}

#[test]
fn test_missing_taxonomy_exits_non_zero() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("content.json");
    write_site(&path);
    let before = std::fs::read(&path).unwrap();

    let output = mtt(&path, &["migrate", "x", "missing_tax"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("The taxonomy 'missing_tax' doesn't exist"));
    assert!(output.stdout.is_empty());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn test_query_flags_are_forwarded() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("content.json");
    write_site(&path);

    let output = mtt(
        &path,
        &["migrate", "--color", "never", "color", "colors", "--posts_per_page=1", "--paged=2"],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Per page: 1 \nPage: 2 \nTotal pages: 2"));
    assert!(stdout.contains("[11] No meta, skipped"));
    assert!(!stdout.contains("[10]"));
    assert!(load(&path).record(10).unwrap().has_meta("color"));
}

#[test]
fn test_malformed_query_flag_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("content.json");
    write_site(&path);

    let output = mtt(&path, &["migrate", "color", "colors", "--posts_per_page=lots"]);
    assert!(!output.status.success());
    assert!(load(&path).record(10).unwrap().has_meta("color"));
}

#[test]
fn test_dry_run_leaves_store_alone() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("content.json");
    write_site(&path);
    let before = std::fs::read(&path).unwrap();

    let output = mtt(&path, &["migrate", "--dry-run", "--color", "never", "color", "colors"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("[10] Would migrate: red, blue"));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn test_json_format() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("content.json");
    write_site(&path);

    let output = mtt(&path, &["migrate", "--format", "json", "color", "colors"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["records"][0]["id"], 10);
    assert_eq!(report["records"][0]["status"], "migrated");
    assert_eq!(report["records"][1]["status"], "skipped");
}

#[test]
fn test_missing_store_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.json");

    let output = mtt(&path, &["migrate", "color", "colors"]);
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr).unwrap().contains("not found"));
    assert!(!path.exists());
}
