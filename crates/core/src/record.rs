// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted record types: registry rows, queue entries, status files.

use crate::id::{JobId, WorkerId};
use crate::status::JobStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A job's row in the registry (`job_track.json`).
///
/// The registry mirrors the latest durable status of every job so list
/// queries never have to fan out across per-job status files. The per-job
/// `status.json` is written first; the registry row follows within the
/// same locked section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_name: String,
    /// Path of the simulation config, relative to the shared root
    /// (`configs/<file>.yaml`).
    pub config_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_host: Option<WorkerId>,
    /// True iff a target host was explicit at submission. An entry with
    /// this set is only claimable by its preferred host.
    #[serde(default)]
    pub require_host: bool,
    /// The worker the job was dispatched to; cleared on requeue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_host: Option<WorkerId>,
    pub status: JobStatus,
    /// Epoch milliseconds of the last status write.
    pub status_updated_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub experiment_name: String,
    pub run_name: String,
}

/// A pending job in the queue directory, serialized as
/// `queue/<job_id>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_host: Option<WorkerId>,
    #[serde(default)]
    pub require_host: bool,
}

/// The per-job status file (`jobs/<job_id>/status.json`).
///
/// Extras are preserved verbatim on disk: whatever a reporter attached
/// (worker id, container info, exit code, error details) round-trips
/// through the flattened map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Epoch milliseconds; refreshed on every write.
    pub status_updated_at: u64,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl StatusRecord {
    pub fn new(job_id: JobId, status: JobStatus, status_updated_at: u64) -> Self {
        Self { job_id, status, status_updated_at, extras: Map::new() }
    }

    pub fn with_extras(mut self, extras: Map<String, Value>) -> Self {
        self.extras = extras;
        self
    }
}

/// In-memory liveness entry for a worker host. Never persisted;
/// repopulates naturally as workers resume heartbeating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostHeartbeat {
    /// Epoch milliseconds of the last heartbeat (or first observation).
    pub last_seen_ms: u64,
    /// Opaque worker-reported info (versions, gpu counts, ...).
    #[serde(default)]
    pub info: Map<String, Value>,
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
