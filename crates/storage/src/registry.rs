// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job registry: `job_track.json` under an advisory exclusive lock.
//!
//! Only the coordinator writes this file, but multiple coordinator
//! requests (and, in principle, multiple coordinator processes sharing
//! the filesystem) mutate it concurrently. Writers serialize through an
//! OS advisory lock on the companion `.lock` file; the file itself is
//! replaced atomically so readers never see a torn write.
//!
//! The in-memory mirror is a best-effort read-through cache: every locked
//! section re-reads the file from disk before mutating, so external
//! writes are tolerated, and reads fall back to the cache only when the
//! on-disk copy is unreadable.

use crate::error::StorageError;
use crate::fs_util::{read_json, write_json_atomic};
use crate::layout::SharedLayout;
use fs2::FileExt;
use parking_lot::Mutex;
use simq_core::{JobId, JobRecord};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::PathBuf;

type JobMap = HashMap<JobId, JobRecord>;

pub struct Registry {
    path: PathBuf,
    lock_path: PathBuf,
    cache: Mutex<JobMap>,
}

impl Registry {
    pub fn open(layout: &SharedLayout) -> Self {
        Self {
            path: layout.registry_path(),
            lock_path: layout.registry_lock_path(),
            cache: Mutex::new(JobMap::new()),
        }
    }

    /// Run `f` against the registry map under the exclusive lock.
    ///
    /// The map is re-read from disk inside the critical section; the file
    /// is rewritten (atomically) only when `f` returns `Ok`. The lock is
    /// released on every exit path because the guard file closes on drop.
    pub fn try_mutate<T, E>(&self, f: impl FnOnce(&mut JobMap) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        // Open without truncating: the file doubles as the lock target for
        // other handles that may already hold it.
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| StorageError::Lock { path: self.lock_path.clone(), source: e })?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::Lock { path: self.lock_path.clone(), source: e })?;

        let result = (|| {
            let mut jobs: JobMap = read_json(&self.path)?.unwrap_or_default();
            let out = f(&mut jobs)?;
            write_json_atomic(&self.path, &jobs)?;
            *self.cache.lock() = jobs;
            Ok(out)
        })();

        let _ = lock_file.unlock();
        result
    }

    /// Current registry content, read from disk.
    ///
    /// Falls back to the last cached copy when the on-disk file is
    /// unreadable (a concurrent writer on a non-atomic filesystem, or a
    /// partially corrupted file).
    pub fn snapshot(&self) -> Result<JobMap, StorageError> {
        match read_json::<JobMap>(&self.path) {
            Ok(Some(jobs)) => {
                *self.cache.lock() = jobs.clone();
                Ok(jobs)
            }
            Ok(None) => Ok(JobMap::new()),
            Err(StorageError::Json { path, source }) => {
                tracing::warn!(path = %path.display(), error = %source, "registry unreadable, serving cached copy");
                Ok(self.cache.lock().clone())
            }
            Err(e) => Err(e),
        }
    }

    pub fn get(&self, job_id: &JobId) -> Result<Option<JobRecord>, StorageError> {
        Ok(self.snapshot()?.get(job_id).cloned())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
