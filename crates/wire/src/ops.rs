// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ops-surface bodies: forced requeue/fail/cancel and queue cleanup.

use serde::{Deserialize, Serialize};
use simq_core::{JobId, JobStatus, WorkerId};

/// Body of `POST /ops/jobs/{job_id}/requeue`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpsRequeueRequest {
    /// Bypass the state machine.
    #[serde(default)]
    pub force: bool,
    /// Override the entry's preferred host; `None` keeps the original.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_host: Option<WorkerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_host: Option<bool>,
}

/// Body of `POST /ops/jobs/{job_id}/fail` and `/cancel`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpsReasonRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub force: bool,
}

/// Result of a forced operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub message: String,
}

/// Result of `POST /ops/queue/cleanup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub removed: Vec<JobId>,
}
