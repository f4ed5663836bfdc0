// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orphan recovery: requeue or fail jobs whose workers went silent.
//!
//! Two independent timeouts, checked in order:
//! - status staleness: the job's status has not been touched within
//!   `job_status_ttl` (a hung container, a worker that stopped
//!   reporting);
//! - host staleness: the job's worker has not heartbeated within
//!   `heartbeat_ttl + worker_stale_grace` (a rebooted or partitioned
//!   host).
//!
//! In both cases a still-DISPATCHED job goes back to the queue with its
//! host preference preserved; anything already running is failed.

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use serde_json::{json, Map, Value};
use simq_core::{Clock, JobId, JobRecord, JobStatus, QueueEntry};

impl<C: Clock> Dispatcher<C> {
    /// Sweep all jobs once. Returns how many were requeued or failed.
    ///
    /// Runs opportunistically on list/get/dispatch calls, so staleness is
    /// bounded by the TTLs plus one call interarrival. Per-job races with
    /// live status reports lose cleanly: the transition check inside the
    /// status write rejects the reaper's edit and the sweep moves on.
    pub fn reap(&self) -> Result<usize, DispatchError> {
        let now = self.now_ms();
        let snapshot = self.registry().snapshot()?;
        let status_ttl_ms = self.config().job_status_ttl.as_millis() as u64;
        let offline_ms = (self.config().heartbeat_ttl + self.config().worker_stale_grace)
            .as_millis() as u64;

        let mut acted = 0;
        for (job_id, rec) in snapshot {
            if !rec.status.is_active() {
                continue;
            }

            let outcome = if now.saturating_sub(rec.status_updated_at) > status_ttl_ms {
                self.reap_one(&job_id, &rec, "stale_status", true)
            } else if let Some(host) = &rec.target_host {
                let last_seen = self.host_table().last_seen_or_seed(host, now);
                if now.saturating_sub(last_seen) > offline_ms {
                    self.reap_one(&job_id, &rec, "worker_offline", false)
                } else {
                    continue;
                }
            } else {
                continue;
            };

            match outcome {
                Ok(()) => acted += 1,
                // Lost the race to a live writer; nothing to recover.
                Err(DispatchError::InvalidTransition { .. })
                | Err(DispatchError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(acted)
    }

    fn reap_one(
        &self,
        job_id: &JobId,
        rec: &JobRecord,
        cause: &str,
        stale_status: bool,
    ) -> Result<(), DispatchError> {
        if rec.status == JobStatus::Dispatched {
            let mut extras = Map::new();
            if let Some(host) = &rec.target_host {
                extras.insert("requeued_from".to_string(), json!(host));
            }
            if stale_status {
                extras.insert("stale_status".to_string(), Value::Bool(true));
            } else {
                extras.insert("error".to_string(), json!("worker_offline_on_requeue"));
            }
            self.requeue_with_extras(job_id, rec, extras)?;
            tracing::warn!(job_id = %job_id, cause, "requeued orphaned job");
        } else {
            let error = if stale_status { "stale_status" } else { "worker_offline" };
            let mut extras = Map::new();
            extras.insert("error".to_string(), json!(error));
            self.write_status(job_id, JobStatus::Failed, extras, false, |r| {
                r.error = Some(error.to_string());
            })?;
            tracing::warn!(job_id = %job_id, cause, "failed orphaned job");
        }
        Ok(())
    }

    /// Put a job back in the queue with its original host preference.
    pub(crate) fn requeue_with_extras(
        &self,
        job_id: &JobId,
        rec: &JobRecord,
        extras: Map<String, Value>,
    ) -> Result<(), DispatchError> {
        self.write_status(job_id, JobStatus::Queued, extras, false, |r| {
            r.target_host = None;
        })?;
        self.queue().enqueue(&QueueEntry {
            job_id: job_id.clone(),
            preferred_host: rec.preferred_host.clone(),
            require_host: rec.require_host,
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
