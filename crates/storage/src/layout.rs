// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path layout of the shared data directory.
//!
//! ```text
//! <root>/configs/<file>.yaml
//! <root>/jobs/<job_id>/job_info.json
//! <root>/jobs/<job_id>/status.json
//! <root>/jobs/<job_id>/logs/<job_id>.log
//! <root>/jobs/<job_id>/results/result.json
//! <root>/jobs/<job_id>/progress/progress.json
//! <root>/queue/<job_id>.json
//! <root>/job_track.json
//! <root>/job_track.json.lock
//! ```

use crate::error::StorageError;
use simq_core::JobId;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolves every persisted path from the shared root.
#[derive(Debug, Clone)]
pub struct SharedLayout {
    root: PathBuf,
}

impl SharedLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn configs_dir(&self) -> PathBuf {
        self.root.join("configs")
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.root.join("jobs")
    }

    pub fn queue_dir(&self) -> PathBuf {
        self.root.join("queue")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.join("job_track.json")
    }

    pub fn registry_lock_path(&self) -> PathBuf {
        self.root.join("job_track.json.lock")
    }

    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.jobs_dir().join(job_id.as_str())
    }

    pub fn job_info_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join("job_info.json")
    }

    pub fn status_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join("status.json")
    }

    pub fn logs_dir(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join("logs")
    }

    pub fn log_path(&self, job_id: &JobId) -> PathBuf {
        self.logs_dir(job_id).join(format!("{}.log", job_id))
    }

    pub fn result_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join("results").join("result.json")
    }

    pub fn progress_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join("progress").join("progress.json")
    }

    /// Create the top-level directories. Idempotent.
    pub fn ensure(&self) -> Result<(), StorageError> {
        for dir in [self.configs_dir(), self.jobs_dir(), self.queue_dir()] {
            fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
