// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulation config resolution: path validation, inline saves, and
//! job-name derivation.

use crate::error::DispatchError;
use serde_json::Value;
use simq_storage::SharedLayout;
use std::path::{Component, Path};

pub(crate) const DEFAULT_EXPERIMENT: &str = "UnnamedExperiment";
pub(crate) const DEFAULT_RUN: &str = "UnnamedRun";

/// Names derived from a simulation config document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DerivedNames {
    pub experiment_name: String,
    pub run_name: String,
    pub job_name: String,
}

/// A resolved config: where it lives (relative to the shared root, with
/// the `configs/` prefix) and its parsed document.
pub(crate) struct ResolvedConfig {
    pub config_path: String,
    pub names: DerivedNames,
}

/// Reject path traversal before a config filename touches the
/// filesystem: absolute paths, `..` components, and anything that is not
/// a plain relative path are refused.
pub(crate) fn validate_rel_path(raw: &str) -> Result<(), DispatchError> {
    if raw.is_empty() {
        return Err(DispatchError::bad_request("empty config path"));
    }
    let path = Path::new(raw);
    if path.is_absolute() {
        return Err(DispatchError::bad_request(format!("absolute config path: {raw}")));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            Component::CurDir => {}
            _ => {
                return Err(DispatchError::bad_request(format!("invalid config path: {raw}")));
            }
        }
    }
    Ok(())
}

/// Resolve a `config_path` submission against the configs root.
///
/// Accepts the path with or without its `configs/` prefix, reads and
/// parses the YAML, and refuses symlinks that escape the configs
/// directory.
pub(crate) fn resolve_existing(
    layout: &SharedLayout,
    raw: &str,
) -> Result<ResolvedConfig, DispatchError> {
    let bare = raw.strip_prefix("configs/").unwrap_or(raw);
    validate_rel_path(bare)?;

    let configs_dir = layout.configs_dir();
    let path = configs_dir.join(bare);
    let doc = read_yaml(&path)?;

    // canonicalize resolves symlinks; a link pointing outside the
    // configs root must not be readable through this endpoint.
    let canonical = path
        .canonicalize()
        .map_err(|_| DispatchError::bad_request(format!("config not found: {raw}")))?;
    let canonical_root = configs_dir.canonicalize().unwrap_or(configs_dir);
    if !canonical.starts_with(&canonical_root) {
        return Err(DispatchError::bad_request(format!("invalid config path: {raw}")));
    }

    Ok(ResolvedConfig { config_path: format!("configs/{bare}"), names: derive_names(&doc) })
}

/// Save an inline config document under the configs root and resolve it.
pub(crate) fn save_inline(
    layout: &SharedLayout,
    doc: &Value,
    file_name: &str,
) -> Result<ResolvedConfig, DispatchError> {
    validate_rel_path(file_name)?;

    let yaml = serde_yaml::to_string(doc)
        .map_err(|e| DispatchError::bad_request(format!("unserializable config: {e}")))?;
    let path = layout.configs_dir().join(file_name);
    simq_storage::write_bytes_atomic(&path, yaml.as_bytes())?;

    Ok(ResolvedConfig {
        config_path: format!("configs/{file_name}"),
        names: derive_names_yaml(&serde_yaml::to_value(doc).unwrap_or_default()),
    })
}

fn read_yaml(path: &Path) -> Result<serde_yaml::Value, DispatchError> {
    let bytes = std::fs::read(path).map_err(|_| {
        DispatchError::bad_request(format!(
            "config not found: {}",
            path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
        ))
    })?;
    serde_yaml::from_slice(&bytes)
        .map_err(|e| DispatchError::bad_request(format!("malformed config: {e}")))
}

fn derive_names(doc: &serde_yaml::Value) -> DerivedNames {
    derive_names_yaml(doc)
}

/// `experiment.name` and `experiment.run_name`, sanitized into a
/// container-safe job name.
fn derive_names_yaml(doc: &serde_yaml::Value) -> DerivedNames {
    let experiment = doc.get("experiment");
    let get = |key: &str, default: &str| -> String {
        experiment
            .and_then(|e| e.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    };
    let experiment_name = get("name", DEFAULT_EXPERIMENT);
    let run_name = get("run_name", DEFAULT_RUN);
    let job_name = sanitize_job_name(&format!("{experiment_name}-{run_name}"));
    DerivedNames { experiment_name, run_name, job_name }
}

/// Replace anything outside `[A-Za-z0-9_.-]` with `_`.
pub(crate) fn sanitize_job_name(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') { c } else { '_' })
        .collect()
}

#[cfg(test)]
#[path = "simconfig_tests.rs"]
mod tests;
