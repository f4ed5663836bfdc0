// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatcher: submit, claim, report, stop, delete.

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::hosts::HostTable;
use crate::simconfig;
use serde::Serialize;
use serde_json::{json, Map, Value};
use simq_core::{Clock, JobId, JobRecord, JobStatus, QueueEntry, StatusRecord, WorkerId};
use simq_storage::{read_json, write_json_atomic, Queue, Registry, SharedLayout, StatusStore};
use simq_wire::{
    DispatchPayload, HeartbeatRequest, HostSnapshot, StatusAck, StatusReport, StopResponse,
    SubmitRequest, SubmitResponse, VolumeBinding,
};
use std::path::PathBuf;

/// One row of `GET /jobs`.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub status: JobStatus,
    pub job_info: Value,
}

/// `job_info.json` payload: the registry row plus the job id.
#[derive(Serialize)]
struct JobInfo<'a> {
    job_id: &'a JobId,
    #[serde(flatten)]
    record: &'a JobRecord,
}

/// Coordinator-side dispatch logic over the shared filesystem.
///
/// Every durable operation is point-wise atomic; cross-file consistency
/// follows the invariant order Status Store before Registry, and both
/// writes happen inside the registry's locked section so a status write
/// and its registry reflection are never observed torn.
pub struct Dispatcher<C: Clock> {
    layout: SharedLayout,
    registry: Registry,
    status: StatusStore,
    queue: Queue,
    hosts: HostTable,
    cfg: DispatchConfig,
    clock: C,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(
        shared_root: impl Into<PathBuf>,
        cfg: DispatchConfig,
        clock: C,
    ) -> Result<Self, DispatchError> {
        let layout = SharedLayout::new(shared_root);
        layout.ensure()?;
        let registry = Registry::open(&layout);
        let status = StatusStore::new(layout.clone());
        let queue = Queue::new(layout.queue_dir(), cfg.queue_claim_ttl);
        Ok(Self { layout, registry, status, queue, hosts: HostTable::new(), cfg, clock })
    }

    pub fn layout(&self) -> &SharedLayout {
        &self.layout
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.cfg
    }

    pub(crate) fn queue(&self) -> &Queue {
        &self.queue
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn host_table(&self) -> &HostTable {
        &self.hosts
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Validate, persist, and enqueue a submission.
    pub fn submit(&self, req: &SubmitRequest) -> Result<SubmitResponse, DispatchError> {
        if self.cfg.hosts.is_empty() {
            return Err(DispatchError::NoHosts);
        }
        if let Some(host) = &req.target_host {
            if !self.cfg.knows_host(host) {
                return Err(DispatchError::bad_request(format!("unknown host: {host}")));
            }
        }

        let job_id = JobId::new(uuid::Uuid::new_v4().to_string());

        let resolved = match (&req.config_path, &req.config) {
            (Some(path), _) => simconfig::resolve_existing(&self.layout, path)?,
            (None, Some(doc)) => {
                let file_name =
                    req.save_as.clone().unwrap_or_else(|| format!("{}.yaml", job_id));
                simconfig::save_inline(&self.layout, doc, &file_name)?
            }
            (None, None) => {
                return Err(DispatchError::bad_request("missing config or config_path"));
            }
        };

        let preferred_host = req.target_host.clone();
        let require_host = preferred_host.is_some();
        let now = self.clock.epoch_ms();

        let record = JobRecord {
            job_name: resolved.names.job_name.clone(),
            config_path: resolved.config_path,
            preferred_host: preferred_host.clone(),
            require_host,
            target_host: None,
            status: JobStatus::Queued,
            status_updated_at: now,
            container_id: None,
            container_name: None,
            exit_code: None,
            error: None,
            experiment_name: resolved.names.experiment_name,
            run_name: resolved.names.run_name,
        };

        self.registry.try_mutate(|jobs| {
            // Status Store first, walking the machine through its
            // creation edge, then the registry row.
            self.status.write(&StatusRecord::new(job_id.clone(), JobStatus::Launching, now))?;
            self.status.write(&StatusRecord::new(job_id.clone(), JobStatus::Queued, now))?;
            self.write_job_info(&job_id, &record)?;
            jobs.insert(job_id.clone(), record.clone());
            Ok::<_, DispatchError>(())
        })?;

        self.queue.enqueue(&QueueEntry {
            job_id: job_id.clone(),
            preferred_host: preferred_host.clone(),
            require_host,
        })?;

        tracing::info!(job_id = %job_id, job_name = %record.job_name, host = ?preferred_host, "job queued");

        Ok(SubmitResponse {
            job_id,
            status: JobStatus::Queued,
            host: preferred_host,
            job_name: record.job_name,
        })
    }

    /// Claim the next job for a polling worker and build its dispatch
    /// payload. `None` when no acceptable entry exists.
    pub fn pop_next(&self, worker: &WorkerId) -> Result<Option<DispatchPayload>, DispatchError> {
        self.reap_best_effort();
        if self.cfg.knows_host(worker) {
            self.hosts.record(worker, None, self.clock.epoch_ms());
        }

        loop {
            let Some(entry) = self.queue.claim(worker)? else {
                return Ok(None);
            };
            let job_id = entry.job_id;

            let record = match self.registry.get(&job_id)? {
                Some(rec) if matches!(rec.status, JobStatus::Queued | JobStatus::Launching) => {
                    rec
                }
                _ => {
                    // Stale entry: the job moved on (or was deleted)
                    // while the entry lingered.
                    tracing::warn!(job_id = %job_id, "dropping stale queue entry");
                    self.queue.remove(&job_id)?;
                    continue;
                }
            };

            // A still-launching job reaches the queue through its queued
            // edge before it can be dispatched.
            if record.status == JobStatus::Launching {
                self.write_status(&job_id, JobStatus::Queued, Map::new(), false, |_| {})?;
            }

            let mut extras = Map::new();
            extras.insert("worker_id".to_string(), json!(worker));
            self.write_status(&job_id, JobStatus::Dispatched, extras, false, |rec| {
                rec.target_host = Some(worker.clone());
            })?;

            let container_name =
                simconfig::sanitize_job_name(&format!("simq_{}_{}", job_id, record.job_name));

            tracing::info!(job_id = %job_id, worker = %worker, "job dispatched");

            return Ok(Some(DispatchPayload {
                job_id: job_id.clone(),
                job_name: record.job_name,
                config_path: record.config_path.clone(),
                preferred_host: record.preferred_host,
                image: self.cfg.image.clone(),
                command: format!("--config /data/{} --job_id {}", record.config_path, job_id),
                container_name,
                volumes: vec![VolumeBinding {
                    host: self.layout.root().display().to_string(),
                    container: "/data".to_string(),
                    mode: "rw".to_string(),
                }],
                env: Default::default(),
            }));
        }
    }

    /// Apply a worker's status report.
    pub fn update_status(&self, report: &StatusReport) -> Result<StatusAck, DispatchError> {
        let next = JobStatus::parse(&report.status)
            .map_err(|e| DispatchError::bad_request(e.to_string()))?;
        if !next.is_durable() {
            return Err(DispatchError::bad_request(format!(
                "status {next} cannot be reported"
            )));
        }

        let mut extras = Map::new();
        if let Some(w) = &report.worker_id {
            extras.insert("worker_id".to_string(), json!(w));
        }
        if let Some(c) = &report.container_id {
            extras.insert("container_id".to_string(), json!(c));
        }
        if let Some(c) = &report.container_name {
            extras.insert("container_name".to_string(), json!(c));
        }
        if let Some(code) = report.exit_code {
            extras.insert("exit_code".to_string(), json!(code));
        }
        if let Some(err) = &report.error {
            extras.insert("error".to_string(), json!(err));
        }
        if let Some(details) = &report.details {
            extras.insert("details".to_string(), Value::Object(details.clone()));
        }

        let final_status = self.write_status(&report.job_id, next, extras, false, |rec| {
            if let Some(c) = &report.container_id {
                rec.container_id = Some(c.clone());
            }
            if let Some(c) = &report.container_name {
                rec.container_name = Some(c.clone());
            }
            if report.exit_code.is_some() {
                rec.exit_code = report.exit_code;
            }
            if let Some(err) = &report.error {
                rec.error = Some(err.clone());
            }
        })?;

        // A job past QUEUED must not linger in the queue, whatever race
        // put it there.
        if final_status != JobStatus::Queued {
            self.queue.remove(&report.job_id)?;
        }

        if let Some(worker) = &report.worker_id {
            self.hosts.record(worker, None, self.clock.epoch_ms());
        }

        tracing::info!(job_id = %report.job_id, status = %final_status, worker = ?report.worker_id, "status recorded");

        Ok(StatusAck { ok: true, stop_requested: final_status == JobStatus::StopRequested })
    }

    /// Ask a job to stop: cancel it outright if it has not been claimed,
    /// otherwise flag it for its worker.
    pub fn stop(&self, job_id: &JobId) -> Result<StopResponse, DispatchError> {
        let record =
            self.registry.get(job_id)?.ok_or_else(|| DispatchError::NotFound(job_id.clone()))?;

        let message = match record.status {
            JobStatus::Launching | JobStatus::Queued => {
                self.queue.remove(job_id)?;
                self.write_status(job_id, JobStatus::Canceled, Map::new(), false, |_| {})?;
                format!("job {job_id} canceled before dispatch")
            }
            JobStatus::Dispatched | JobStatus::Running => {
                self.write_status(job_id, JobStatus::StopRequested, Map::new(), false, |_| {})?;
                format!("stop requested for job {job_id}")
            }
            JobStatus::StopRequested => format!("stop already requested for job {job_id}"),
            status => format!("job {job_id} already {status}"),
        };

        Ok(StopResponse { message })
    }

    /// Remove a job's registry row and its on-disk directory. The caller
    /// accepts data loss; terminal status is not required.
    pub fn delete(&self, job_id: &JobId) -> Result<(), DispatchError> {
        self.registry.try_mutate(|jobs| {
            jobs.remove(job_id).ok_or_else(|| DispatchError::NotFound(job_id.clone()))?;
            Ok::<_, DispatchError>(())
        })?;
        self.queue.remove(job_id)?;
        self.status.delete_job_dir(job_id)?;
        tracing::info!(job_id = %job_id, "job deleted");
        Ok(())
    }

    /// Record a worker heartbeat. Unknown workers are rejected.
    pub fn heartbeat(&self, req: &HeartbeatRequest) -> Result<(), DispatchError> {
        if !self.cfg.knows_host(&req.worker_id) {
            return Err(DispatchError::bad_request(format!(
                "unknown worker: {}",
                req.worker_id
            )));
        }
        self.hosts.record(&req.worker_id, req.info.clone(), self.clock.epoch_ms());
        Ok(())
    }

    /// Latest status record for a job.
    pub fn job_status(&self, job_id: &JobId) -> Result<StatusRecord, DispatchError> {
        self.reap_best_effort();
        let record =
            self.registry.get(job_id)?.ok_or_else(|| DispatchError::NotFound(job_id.clone()))?;
        match self.status.read(job_id)? {
            Some(status) => Ok(status),
            // The registry row survived but the per-job file is gone;
            // reconstruct from the mirror.
            None => Ok(StatusRecord::new(job_id.clone(), record.status, record.status_updated_at)),
        }
    }

    /// The `job_info.json` mirror for a job.
    pub fn job_info(&self, job_id: &JobId) -> Result<Value, DispatchError> {
        read_json::<Value>(&self.layout.job_info_path(job_id))?
            .ok_or_else(|| DispatchError::NotFound(job_id.clone()))
    }

    /// All jobs with their info mirrors, ordered by id.
    pub fn list_jobs(&self) -> Result<Vec<JobSummary>, DispatchError> {
        self.reap_best_effort();
        let snapshot = self.registry.snapshot()?;
        let mut jobs: Vec<JobSummary> = snapshot
            .into_iter()
            .map(|(job_id, rec)| {
                let job_info = read_json::<Value>(&self.layout.job_info_path(&job_id))
                    .unwrap_or_default()
                    .unwrap_or(Value::Null);
                JobSummary { job_id, status: rec.status, job_info }
            })
            .collect();
        jobs.sort_by(|a, b| a.job_id.cmp(&b.job_id));
        Ok(jobs)
    }

    /// Pending queue entries in claim order.
    pub fn queue_entries(&self) -> Result<Vec<QueueEntry>, DispatchError> {
        self.reap_best_effort();
        Ok(self.queue.entries()?)
    }

    /// Configured hosts with liveness and their active jobs.
    pub fn hosts_snapshot(&self) -> Result<Vec<HostSnapshot>, DispatchError> {
        self.reap_best_effort();
        let now = self.clock.epoch_ms();
        let snapshot = self.registry.snapshot()?;
        let ttl_ms = self.cfg.heartbeat_ttl.as_millis() as u64;

        Ok(self
            .cfg
            .hosts
            .iter()
            .map(|host| {
                let heartbeat = self.hosts.get(host);
                let mut running: Vec<JobId> = snapshot
                    .iter()
                    .filter(|(_, rec)| {
                        rec.status.is_active() && rec.target_host.as_ref() == Some(host)
                    })
                    .map(|(id, _)| id.clone())
                    .collect();
                running.sort();

                // A busy host running a silent long-wait task is not
                // declared dead while it still owns work.
                let fresh = heartbeat
                    .as_ref()
                    .map(|h| now.saturating_sub(h.last_seen_ms) <= ttl_ms)
                    .unwrap_or(false);
                let online = fresh || !running.is_empty();

                HostSnapshot {
                    name: host.clone(),
                    online,
                    last_seen: heartbeat.as_ref().map(|h| h.last_seen_ms),
                    info: heartbeat.map(|h| h.info).unwrap_or_default(),
                    running,
                }
            })
            .collect())
    }

    /// Contents of the result artifact, or a pending stub.
    pub fn result(&self, job_id: &JobId) -> Result<Value, DispatchError> {
        self.read_artifact(job_id, self.layout.result_path(job_id))
    }

    /// Contents of the progress artifact, or a pending stub.
    pub fn progress(&self, job_id: &JobId) -> Result<Value, DispatchError> {
        self.read_artifact(job_id, self.layout.progress_path(job_id))
    }

    /// Path of a job's log file, for streaming. Errors when the job is
    /// unknown; the file itself may not exist yet.
    pub fn log_path(&self, job_id: &JobId) -> Result<PathBuf, DispatchError> {
        self.registry.get(job_id)?.ok_or_else(|| DispatchError::NotFound(job_id.clone()))?;
        Ok(self.layout.log_path(job_id))
    }

    fn read_artifact(&self, job_id: &JobId, path: PathBuf) -> Result<Value, DispatchError> {
        self.registry.get(job_id)?.ok_or_else(|| DispatchError::NotFound(job_id.clone()))?;
        match read_json::<Value>(&path)? {
            Some(value) => Ok(value),
            None => Ok(json!({"status": "pending"})),
        }
    }

    /// The enforced status write path.
    ///
    /// Inside the registry's locked section: read the pre-image from the
    /// status store, validate the transition (unless `force`), write the
    /// status file, then reflect into the registry row and its
    /// `job_info.json` mirror. `prev == next` is an idempotent refresh so
    /// at-least-once reporters can repeat themselves.
    pub(crate) fn write_status(
        &self,
        job_id: &JobId,
        next: JobStatus,
        extras: Map<String, Value>,
        force: bool,
        mutate: impl FnOnce(&mut JobRecord),
    ) -> Result<JobStatus, DispatchError> {
        let now = self.clock.epoch_ms();
        self.registry.try_mutate(|jobs| {
            let rec =
                jobs.get_mut(job_id).ok_or_else(|| DispatchError::NotFound(job_id.clone()))?;
            let prev = match self.status.read(job_id)? {
                Some(status) => status.status,
                None => rec.status,
            };

            if !force && prev != next && !JobStatus::can_transition(prev, next) {
                return Err(DispatchError::InvalidTransition {
                    job_id: job_id.clone(),
                    prev,
                    next,
                });
            }

            let record = StatusRecord {
                job_id: job_id.clone(),
                status: next,
                status_updated_at: now,
                extras,
            };
            self.status.write(&record)?;

            rec.status = next;
            rec.status_updated_at = now;
            mutate(rec);
            self.write_job_info(job_id, rec)?;
            Ok(next)
        })
    }

    pub(crate) fn write_job_info(
        &self,
        job_id: &JobId,
        record: &JobRecord,
    ) -> Result<(), DispatchError> {
        write_json_atomic(
            &self.layout.job_info_path(job_id),
            &JobInfo { job_id, record },
        )?;
        Ok(())
    }

    /// The reaper is amortized across calls; a sweep failure must not
    /// fail the request that happened to trigger it.
    pub(crate) fn reap_best_effort(&self) {
        if let Err(e) = self.reap() {
            tracing::warn!(error = %e, "reaper sweep failed");
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
