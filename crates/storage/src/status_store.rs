// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job status files, the source of truth for the state machine.

use crate::error::StorageError;
use crate::fs_util::{read_json, write_json_atomic};
use crate::layout::SharedLayout;
use simq_core::{JobId, StatusRecord};

/// Reads and writes `jobs/<job_id>/status.json`.
///
/// Either side of the dispatch protocol may write a given job's status
/// file (the coordinator on dispatch/requeue/cancel/force, a worker on
/// running/terminal via the coordinator), so every write is an atomic
/// replace.
#[derive(Debug, Clone)]
pub struct StatusStore {
    layout: SharedLayout,
}

impl StatusStore {
    pub fn new(layout: SharedLayout) -> Self {
        Self { layout }
    }

    pub fn read(&self, job_id: &JobId) -> Result<Option<StatusRecord>, StorageError> {
        read_json(&self.layout.status_path(job_id))
    }

    pub fn write(&self, record: &StatusRecord) -> Result<(), StorageError> {
        write_json_atomic(&self.layout.status_path(&record.job_id), record)
    }

    /// Remove a job's entire on-disk directory (status, info, logs,
    /// artifacts). Idempotent.
    pub fn delete_job_dir(&self, job_id: &JobId) -> Result<(), StorageError> {
        let dir = self.layout.job_dir(job_id);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(&dir, e)),
        }
    }
}

#[cfg(test)]
#[path = "status_store_tests.rs"]
mod tests;
