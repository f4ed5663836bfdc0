// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pending-job queue: a directory where rename is the lock.
//!
//! Each pending job is a small JSON file named `<job_id>.json`. Claiming
//! is an atomic rename to `<job_id>.json.claim.<worker_id>`; at most one
//! worker can win because rename of a vanished source fails. A worker
//! that crashes between claiming and deleting leaves a claim file behind;
//! the stale-claim sweep at the start of every claim attempt renames it
//! back into the pool once it is older than the claim TTL.
//!
//! Ordering is FIFO by file mtime, ties broken by filename. Deployments
//! must provide POSIX atomic-rename semantics; behavior on filesystems
//! without them is undefined.

use crate::error::StorageError;
use crate::fs_util::{read_json, write_json_atomic};
use simq_core::{JobId, QueueEntry, WorkerId};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const CLAIM_INFIX: &str = ".json.claim.";

pub struct Queue {
    dir: PathBuf,
    claim_ttl: Duration,
}

impl Queue {
    pub fn new(dir: impl Into<PathBuf>, claim_ttl: Duration) -> Self {
        Self { dir: dir.into(), claim_ttl }
    }

    fn entry_path(&self, job_id: &JobId) -> PathBuf {
        self.dir.join(format!("{}.json", job_id))
    }

    /// Write (or overwrite) the pending entry for a job. Idempotent: a
    /// job has at most one entry, keyed by its id.
    pub fn enqueue(&self, entry: &QueueEntry) -> Result<(), StorageError> {
        write_json_atomic(&self.entry_path(&entry.job_id), entry)
    }

    /// Delete the entry and any lingering claim files for a job.
    /// Idempotent.
    pub fn remove(&self, job_id: &JobId) -> Result<(), StorageError> {
        let entry = self.entry_path(job_id);
        match fs::remove_file(&entry) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::io(&entry, e)),
        }

        let claim_prefix = format!("{}{}", job_id, CLAIM_INFIX);
        for path in self.list_dir()? {
            if file_name(&path).starts_with(&claim_prefix) {
                let _ = fs::remove_file(&path);
            }
        }
        Ok(())
    }

    /// Pending entries in claim order (mtime ascending).
    pub fn entries(&self) -> Result<Vec<QueueEntry>, StorageError> {
        let mut out = Vec::new();
        for path in self.pending_by_mtime()? {
            if let Some(entry) = read_json::<QueueEntry>(&path)? {
                out.push(entry);
            }
        }
        Ok(out)
    }

    /// Claim the next entry acceptable to `worker`.
    ///
    /// Sweeps stale claims first, then walks pending entries oldest-first
    /// and races for each via rename. Entries requiring a different host
    /// are released back untouched. Returns `None` when nothing matched.
    pub fn claim(&self, worker: &WorkerId) -> Result<Option<QueueEntry>, StorageError> {
        self.sweep_stale_claims()?;

        for path in self.pending_by_mtime()? {
            let claim_path = self.dir.join(format!("{}.claim.{}", file_name(&path), worker));

            // The rename is the serialization point: losing the race shows
            // up as NotFound (or AlreadyExists on link-based filesystems)
            // and we move on to the next entry.
            match fs::rename(&path, &claim_path) {
                Ok(()) => {}
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::NotFound | std::io::ErrorKind::AlreadyExists
                    ) =>
                {
                    continue;
                }
                Err(e) => return Err(StorageError::io(&path, e)),
            }

            let entry = match read_json::<QueueEntry>(&claim_path) {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(StorageError::Json { path, source }) => {
                    // A corrupt entry must not wedge the queue.
                    tracing::warn!(path = %path.display(), error = %source, "dropping unreadable queue entry");
                    let _ = fs::remove_file(&path);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if entry.require_host {
                let wanted = entry.preferred_host.as_ref();
                if wanted != Some(worker) {
                    // Not ours: release by renaming back into the pool.
                    fs::rename(&claim_path, &path).map_err(|e| StorageError::io(&claim_path, e))?;
                    continue;
                }
            }

            fs::remove_file(&claim_path).map_err(|e| StorageError::io(&claim_path, e))?;
            return Ok(Some(entry));
        }

        Ok(None)
    }

    /// Return claim files older than the claim TTL to the pool.
    ///
    /// Any worker may recover any other worker's stale claim. If the
    /// original entry name reappeared in the meantime (a requeue), the
    /// stale claim is dropped instead so a job never has two entries.
    pub fn sweep_stale_claims(&self) -> Result<usize, StorageError> {
        let mut recovered = 0;
        for path in self.list_dir()? {
            let name = file_name(&path);
            let Some(split) = name.find(CLAIM_INFIX) else { continue };

            let age = match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(mtime) => SystemTime::now().duration_since(mtime).unwrap_or_default(),
                // Vanished under us: another sweeper got there first.
                Err(_) => continue,
            };
            if age <= self.claim_ttl {
                continue;
            }

            let original = self.dir.join(format!("{}.json", &name[..split]));
            if original.exists() {
                let _ = fs::remove_file(&path);
            } else if fs::rename(&path, &original).is_ok() {
                tracing::debug!(entry = %original.display(), "recovered stale queue claim");
                recovered += 1;
            }
        }
        Ok(recovered)
    }

    fn list_dir(&self) -> Result<Vec<PathBuf>, StorageError> {
        let read = match fs::read_dir(&self.dir) {
            Ok(r) => r,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };
        let mut paths = Vec::new();
        for dirent in read {
            let dirent = dirent.map_err(|e| StorageError::io(&self.dir, e))?;
            paths.push(dirent.path());
        }
        Ok(paths)
    }

    fn pending_by_mtime(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut pending: Vec<(SystemTime, PathBuf)> = Vec::new();
        for path in self.list_dir()? {
            let name = file_name(&path);
            if !name.ends_with(".json") || name.contains(CLAIM_INFIX) {
                continue;
            }
            let mtime = fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            pending.push((mtime, path));
        }
        pending.sort();
        Ok(pending.into_iter().map(|(_, p)| p).collect())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
