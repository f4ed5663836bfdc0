// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, PartialEq, Deserialize, serde::Serialize)]
struct Doc {
    name: String,
    count: u32,
}

#[test]
fn write_then_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");

    let doc = Doc { name: "a".to_string(), count: 3 };
    write_json_atomic(&path, &doc).unwrap();

    let read: Option<Doc> = read_json(&path).unwrap();
    assert_eq!(read, Some(doc));
}

#[test]
fn read_missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let read: Option<Doc> = read_json(&dir.path().join("absent.json")).unwrap();
    assert_eq!(read, None);
}

#[test]
fn write_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("doc.json");
    write_json_atomic(&path, &json!({"ok": true})).unwrap();
    assert!(path.exists());
}

#[test]
fn write_replaces_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");

    write_json_atomic(&path, &Doc { name: "a".to_string(), count: 1 }).unwrap();
    write_json_atomic(&path, &Doc { name: "b".to_string(), count: 2 }).unwrap();

    let read: Option<Doc> = read_json(&path).unwrap();
    assert_eq!(read, Some(Doc { name: "b".to_string(), count: 2 }));
}

#[test]
fn no_temp_files_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");
    write_json_atomic(&path, &json!({"k": 1})).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["doc.json".to_string()]);
}

#[test]
fn malformed_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");
    std::fs::write(&path, b"{not json").unwrap();

    let err = read_json::<Doc>(&path).unwrap_err();
    assert!(matches!(err, StorageError::Json { .. }));
}
