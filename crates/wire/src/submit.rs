// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-facing bodies: submission, stop, host listing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use simq_core::{JobId, JobStatus, WorkerId};

/// Body of `POST /run-simulation`.
///
/// Exactly one of `config_path` (a file already under the configs root)
/// or `config` (an inline document, saved server-side) must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    /// Pin the job to a specific worker host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_host: Option<WorkerId>,
    /// Filename for an inline `config`; defaults to `<job_id>.yaml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_as: Option<String>,
}

/// Response of `POST /run-simulation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<WorkerId>,
    pub job_name: String,
}

/// Response of `POST /stop/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopResponse {
    pub message: String,
}

/// One host in the `GET /hosts` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub name: WorkerId,
    pub online: bool,
    /// Epoch milliseconds of the last heartbeat; absent when the host has
    /// not been seen since coordinator start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<u64>,
    #[serde(default)]
    pub info: Map<String, Value>,
    /// Jobs currently dispatched to or running on this host.
    #[serde(default)]
    pub running: Vec<JobId>,
}
