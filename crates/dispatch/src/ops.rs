// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forced operations: requeue, fail, cancel, queue cleanup.
//!
//! Each forced op takes a `force` flag that bypasses the state machine
//! (the write still stamps `status_updated_at`). Without it, actions
//! that would lose work are refused with a conflict.

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use serde_json::{json, Map};
use simq_core::{Clock, JobId, JobStatus, QueueEntry};
use simq_wire::{CleanupResponse, OpsReasonRequest, OpsRequeueRequest, OpsResponse};

impl<C: Clock> Dispatcher<C> {
    /// Force a job back into the queue.
    pub fn ops_requeue(
        &self,
        job_id: &JobId,
        req: &OpsRequeueRequest,
    ) -> Result<OpsResponse, DispatchError> {
        let rec = self
            .registry()
            .get(job_id)?
            .ok_or_else(|| DispatchError::NotFound(job_id.clone()))?;

        if !req.force
            && (rec.status.is_terminal()
                || matches!(rec.status, JobStatus::Running | JobStatus::StopRequested))
        {
            return Err(DispatchError::conflict(format!(
                "cannot requeue job in status {}; retry with force",
                rec.status
            )));
        }

        let preferred_host = req.preferred_host.clone().or_else(|| rec.preferred_host.clone());
        let require_host = req.require_host.unwrap_or(rec.require_host);

        // Clear any existing entry first so the job never has two.
        self.queue().remove(job_id)?;

        let mut extras = Map::new();
        extras.insert("requeued_by".to_string(), json!("ops"));
        let preferred_for_record = preferred_host.clone();
        self.write_status(job_id, JobStatus::Queued, extras, req.force, |r| {
            r.target_host = None;
            r.preferred_host = preferred_for_record;
            r.require_host = require_host;
        })?;

        self.queue().enqueue(&QueueEntry {
            job_id: job_id.clone(),
            preferred_host,
            require_host,
        })?;

        tracing::info!(job_id = %job_id, force = req.force, "ops requeue");
        Ok(OpsResponse {
            job_id: job_id.clone(),
            status: JobStatus::Queued,
            message: format!("job {job_id} requeued"),
        })
    }

    /// Force a job into FAILED.
    pub fn ops_fail(
        &self,
        job_id: &JobId,
        req: &OpsReasonRequest,
    ) -> Result<OpsResponse, DispatchError> {
        let rec = self
            .registry()
            .get(job_id)?
            .ok_or_else(|| DispatchError::NotFound(job_id.clone()))?;

        if !req.force {
            if rec.status.is_terminal() {
                return Err(DispatchError::conflict(format!(
                    "job already terminal ({}); retry with force",
                    rec.status
                )));
            }
            if matches!(rec.status, JobStatus::Queued | JobStatus::Launching) {
                return Err(DispatchError::conflict(format!(
                    "job has not started ({}); cancel it instead",
                    rec.status
                )));
            }
        }

        let reason = req.reason.clone().unwrap_or_else(|| "ops_failed".to_string());
        self.queue().remove(job_id)?;

        let mut extras = Map::new();
        extras.insert("error".to_string(), json!(reason));
        let reason_for_record = reason.clone();
        self.write_status(job_id, JobStatus::Failed, extras, req.force, |r| {
            r.error = Some(reason_for_record);
        })?;

        tracing::info!(job_id = %job_id, force = req.force, reason = %reason, "ops fail");
        Ok(OpsResponse {
            job_id: job_id.clone(),
            status: JobStatus::Failed,
            message: format!("job {job_id} failed: {reason}"),
        })
    }

    /// Force a job into CANCELED.
    pub fn ops_cancel(
        &self,
        job_id: &JobId,
        req: &OpsReasonRequest,
    ) -> Result<OpsResponse, DispatchError> {
        let rec = self
            .registry()
            .get(job_id)?
            .ok_or_else(|| DispatchError::NotFound(job_id.clone()))?;

        if !req.force && rec.status.is_terminal() {
            return Err(DispatchError::conflict(format!(
                "job already terminal ({}); retry with force",
                rec.status
            )));
        }

        let reason = req.reason.clone().unwrap_or_else(|| "ops_canceled".to_string());
        self.queue().remove(job_id)?;

        let mut extras = Map::new();
        extras.insert("reason".to_string(), json!(reason));
        self.write_status(job_id, JobStatus::Canceled, extras, req.force, |_| {})?;

        tracing::info!(job_id = %job_id, force = req.force, reason = %reason, "ops cancel");
        Ok(OpsResponse {
            job_id: job_id.clone(),
            status: JobStatus::Canceled,
            message: format!("job {job_id} canceled: {reason}"),
        })
    }

    /// Drop queue entries that no longer correspond to a pending job.
    pub fn ops_cleanup_queue(&self) -> Result<CleanupResponse, DispatchError> {
        let snapshot = self.registry().snapshot()?;
        let mut removed = Vec::new();

        for entry in self.queue().entries()? {
            let keep = snapshot
                .get(&entry.job_id)
                .map(|rec| matches!(rec.status, JobStatus::Queued | JobStatus::Launching))
                .unwrap_or(false);
            if !keep {
                self.queue().remove(&entry.job_id)?;
                removed.push(entry.job_id);
            }
        }

        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "queue cleanup removed stale entries");
        }
        removed.sort();
        Ok(CleanupResponse { removed })
    }
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod tests;
