// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent poll loop.

use crate::client::Reporter;
use crate::env::AgentConfig;
use crate::error::AgentError;
use crate::run::JobRunner;
use crate::runner::ContainerRunner;
use simq_wire::HeartbeatRequest;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Backoff ceiling for poll failures.
const POLL_BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Single-worker cooperative loop: heartbeat, poll, run, repeat.
///
/// A stop flag (set from SIGTERM/SIGINT) is honored between jobs; the
/// current job always drains.
pub struct Agent<R, P> {
    cfg: AgentConfig,
    runner: JobRunner<R, P>,
    stop: Arc<AtomicBool>,
    last_heartbeat: Option<Instant>,
}

impl<R: ContainerRunner, P: Reporter> Agent<R, P> {
    pub fn new(cfg: AgentConfig, runner: R, reporter: P, stop: Arc<AtomicBool>) -> Self {
        let job_runner = JobRunner::new(
            runner,
            reporter,
            cfg.worker_id.clone(),
            cfg.shared_dir.clone(),
            Some(cfg.docker_network.clone()),
        );
        Self { cfg, runner: job_runner, stop, last_heartbeat: None }
    }

    pub async fn run(&mut self) {
        tracing::info!(worker_id = %self.cfg.worker_id, server = %self.cfg.server, "agent started");
        let mut backoff = self.cfg.poll_interval;

        while !self.stop.load(Ordering::Relaxed) {
            self.heartbeat_if_due(false).await;

            match self.poll_once().await {
                Ok(ran_job) => {
                    backoff = self.cfg.poll_interval;
                    if ran_job {
                        // Fresh liveness after a possibly long container
                        // wait, then poll again immediately.
                        self.heartbeat_if_due(true).await;
                    } else {
                        tokio::time::sleep(self.cfg.poll_interval).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "poll failed, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(POLL_BACKOFF_CAP);
                }
            }
        }

        tracing::info!(worker_id = %self.cfg.worker_id, "agent stopping");
    }

    /// One poll cycle. Returns whether a job was claimed and run.
    async fn poll_once(&self) -> Result<bool, AgentError> {
        let Some(payload) = self.runner.reporter().next_job(&self.cfg.worker_id).await? else {
            return Ok(false);
        };
        tracing::info!(job_id = %payload.job_id, job_name = %payload.job_name, "claimed job");

        // Run errors are already reported as a failed status; the loop
        // keeps polling either way.
        if let Err(e) = self.runner.run_job(&payload).await {
            tracing::error!(job_id = %payload.job_id, error = %e, "job run failed");
        }
        Ok(true)
    }

    /// Send a heartbeat when due (or forced), swallowing errors: a
    /// missed heartbeat never interrupts job processing.
    async fn heartbeat_if_due(&mut self, force: bool) {
        if self.cfg.heartbeat_interval.is_zero() {
            return;
        }
        let due = match self.last_heartbeat {
            None => true,
            Some(at) => at.elapsed() >= self.cfg.heartbeat_interval,
        };
        if !force && !due {
            return;
        }

        let req = HeartbeatRequest { worker_id: self.cfg.worker_id.clone(), info: None };
        match self.runner.reporter().heartbeat(&req).await {
            Ok(()) => self.last_heartbeat = Some(Instant::now()),
            Err(e) => tracing::debug!(error = %e, "heartbeat failed"),
        }
    }
}
