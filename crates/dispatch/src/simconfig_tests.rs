// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use simq_storage::SharedLayout;

fn layout() -> (tempfile::TempDir, SharedLayout) {
    let dir = tempfile::tempdir().unwrap();
    let layout = SharedLayout::new(dir.path());
    layout.ensure().unwrap();
    (dir, layout)
}

#[yare::parameterized(
    parent_escape   = { "../evil.yaml" },
    nested_escape   = { "a/../../evil.yaml" },
    absolute        = { "/etc/passwd" },
    empty           = { "" },
)]
fn traversal_is_refused(path: &str) {
    assert!(matches!(validate_rel_path(path), Err(DispatchError::BadRequest(_))));
}

#[yare::parameterized(
    plain     = { "exp.yaml" },
    nested    = { "team/exp.yaml" },
    dotted    = { "./exp.yaml" },
)]
fn relative_paths_are_accepted(path: &str) {
    assert!(validate_rel_path(path).is_ok());
}

#[test]
fn resolve_reads_names_from_yaml() {
    let (_dir, layout) = layout();
    std::fs::write(
        layout.configs_dir().join("exp.yaml"),
        "experiment:\n  name: Remote\n  run_name: RunA\n",
    )
    .unwrap();

    let resolved = resolve_existing(&layout, "exp.yaml").unwrap();
    assert_eq!(resolved.config_path, "configs/exp.yaml");
    assert_eq!(resolved.names.experiment_name, "Remote");
    assert_eq!(resolved.names.run_name, "RunA");
    assert_eq!(resolved.names.job_name, "Remote-RunA");
}

#[test]
fn resolve_accepts_prefixed_path() {
    let (_dir, layout) = layout();
    std::fs::write(layout.configs_dir().join("exp.yaml"), "experiment: {}\n").unwrap();

    let resolved = resolve_existing(&layout, "configs/exp.yaml").unwrap();
    assert_eq!(resolved.config_path, "configs/exp.yaml");
}

#[test]
fn resolve_defaults_missing_names() {
    let (_dir, layout) = layout();
    std::fs::write(layout.configs_dir().join("bare.yaml"), "other: 1\n").unwrap();

    let resolved = resolve_existing(&layout, "bare.yaml").unwrap();
    assert_eq!(
        resolved.names.job_name,
        format!("{DEFAULT_EXPERIMENT}-{DEFAULT_RUN}")
    );
}

#[test]
fn resolve_missing_file_is_bad_request() {
    let (_dir, layout) = layout();
    assert!(matches!(
        resolve_existing(&layout, "absent.yaml"),
        Err(DispatchError::BadRequest(_))
    ));
}

#[test]
fn resolve_malformed_yaml_is_bad_request() {
    let (_dir, layout) = layout();
    std::fs::write(layout.configs_dir().join("bad.yaml"), "a: [unclosed\n").unwrap();
    assert!(matches!(
        resolve_existing(&layout, "bad.yaml"),
        Err(DispatchError::BadRequest(_))
    ));
}

#[cfg(unix)]
#[test]
fn symlink_escaping_configs_is_refused() {
    let (dir, layout) = layout();
    let secret = dir.path().join("secret.yaml");
    std::fs::write(&secret, "experiment: {}\n").unwrap();
    std::os::unix::fs::symlink(&secret, layout.configs_dir().join("link.yaml")).unwrap();

    assert!(matches!(
        resolve_existing(&layout, "link.yaml"),
        Err(DispatchError::BadRequest(_))
    ));
}

#[test]
fn save_inline_writes_yaml_and_derives_names() {
    let (_dir, layout) = layout();
    let doc = json!({"experiment": {"name": "Inline", "run_name": "R1"}, "steps": 10});

    let resolved = save_inline(&layout, &doc, "saved.yaml").unwrap();
    assert_eq!(resolved.config_path, "configs/saved.yaml");
    assert_eq!(resolved.names.job_name, "Inline-R1");

    let on_disk: serde_yaml::Value =
        serde_yaml::from_slice(&std::fs::read(layout.configs_dir().join("saved.yaml")).unwrap())
            .unwrap();
    assert_eq!(on_disk["steps"], serde_yaml::Value::from(10));
}

#[yare::parameterized(
    spaces   = { "My Exp-run 1", "My_Exp-run_1" },
    slashes  = { "a/b\\c", "a_b_c" },
    keeps    = { "ok_name-1.2", "ok_name-1.2" },
)]
fn job_names_are_sanitized(raw: &str, expected: &str) {
    assert_eq!(sanitize_job_name(raw), expected);
}
