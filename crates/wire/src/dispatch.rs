// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-facing bodies: polling, dispatch payloads, status reports,
//! heartbeats.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use simq_core::{JobId, WorkerId};
use std::collections::BTreeMap;

/// Body of `POST /api/agent/next-job`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NextJobRequest {
    pub worker_id: WorkerId,
}

/// A host-path to container-path bind mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeBinding {
    pub host: String,
    pub container: String,
    pub mode: String,
}

/// Everything a worker needs to run a claimed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchPayload {
    pub job_id: JobId,
    pub job_name: String,
    /// Relative to the shared root; the container sees it under `/data`.
    pub config_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_host: Option<WorkerId>,
    pub image: String,
    pub command: String,
    pub container_name: String,
    #[serde(default)]
    pub volumes: Vec<VolumeBinding>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Body of `POST /api/agent/job-status`.
///
/// Delivery is at-least-once; the coordinator treats a repeated report of
/// the current status as an idempotent refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusReport {
    pub job_id: JobId,
    /// Status kind as a string; unknown kinds are rejected with 400.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<WorkerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl StatusReport {
    pub fn new(job_id: JobId, status: impl Into<String>) -> Self {
        Self {
            job_id,
            status: status.into(),
            worker_id: None,
            container_id: None,
            container_name: None,
            exit_code: None,
            error: None,
            details: None,
        }
    }
}

/// Acknowledgement of an accepted status report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusAck {
    pub ok: bool,
    /// Set when an operator has asked for this job to stop; advisory, the
    /// worker acts on it at its next natural checkpoint.
    #[serde(default)]
    pub stop_requested: bool,
}

/// Body of `POST /api/agent/heartbeat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartbeatRequest {
    pub worker_id: WorkerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Map<String, Value>>,
}
