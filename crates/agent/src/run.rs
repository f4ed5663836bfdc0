// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution of a single dispatched job.

use crate::client::Reporter;
use crate::error::AgentError;
use crate::runner::{ContainerRunner, ContainerSpec};
use simq_core::WorkerId;
use simq_wire::{DispatchPayload, StatusReport};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// Terminal status posts retry until acknowledged, up to this many
/// attempts; the coordinator's stale-status reaper is the backstop
/// beyond that.
const TERMINAL_REPORT_ATTEMPTS: u32 = 10;
const REPORT_BACKOFF_START: Duration = Duration::from_secs(1);
const REPORT_BACKOFF_CAP: Duration = Duration::from_secs(30);
const LOG_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs claimed jobs: prepare logs, start the container, stream output,
/// wait, report.
pub struct JobRunner<R, P> {
    runner: R,
    reporter: P,
    worker_id: WorkerId,
    shared_dir: PathBuf,
    docker_network: Option<String>,
}

impl<R: ContainerRunner, P: Reporter> JobRunner<R, P> {
    pub fn new(
        runner: R,
        reporter: P,
        worker_id: WorkerId,
        shared_dir: impl Into<PathBuf>,
        docker_network: Option<String>,
    ) -> Self {
        Self { runner, reporter, worker_id, shared_dir: shared_dir.into(), docker_network: docker_network.filter(|n| !n.is_empty()) }
    }

    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    fn log_path(&self, payload: &DispatchPayload) -> PathBuf {
        self.shared_dir
            .join("jobs")
            .join(payload.job_id.as_str())
            .join("logs")
            .join(format!("{}.log", payload.job_id))
    }

    /// Run one job to completion. Errors before the container starts are
    /// reported as FAILED; after that, the exit code decides.
    pub async fn run_job(&self, payload: &DispatchPayload) -> Result<(), AgentError> {
        let log_path = self.log_path(payload);
        if let Some(dir) = log_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        // Pull is best-effort; a stale local image beats no job at all.
        if let Err(e) = self.runner.pull(&payload.image).await {
            tracing::warn!(image = %payload.image, error = %e, "image pull failed, using local cache");
        }

        // A previous attempt may have left a container behind.
        if let Err(e) = self.runner.remove(&payload.container_name).await {
            tracing::warn!(container = %payload.container_name, error = %e, "stale container cleanup failed");
        }

        let mut env = payload.env.clone();
        env.entry("NVIDIA_VISIBLE_DEVICES".to_string()).or_insert_with(|| "all".to_string());
        env.entry("NVIDIA_DRIVER_CAPABILITIES".to_string())
            .or_insert_with(|| "compute,utility".to_string());

        let spec = ContainerSpec {
            name: payload.container_name.clone(),
            image: payload.image.clone(),
            command: payload.command.clone(),
            volumes: payload.volumes.clone(),
            env,
            network: self.docker_network.clone(),
        };

        let container_id = match self.runner.start(&spec).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(job_id = %payload.job_id, error = %e, "container start failed");
                let mut report = StatusReport::new(payload.job_id.clone(), "failed");
                report.worker_id = Some(self.worker_id.clone());
                report.error = Some(format!("container start failed: {e}"));
                self.report_terminal(report).await;
                return Err(e);
            }
        };

        // Logs stream in the background; the file is best-effort and the
        // terminal status post proceeds regardless of its fate.
        let log_task = match self.runner.follow_logs(&container_id).await {
            Ok(lines) => Some(tokio::spawn(stream_to_file(lines, log_path))),
            Err(e) => {
                tracing::warn!(job_id = %payload.job_id, error = %e, "log streaming unavailable");
                None
            }
        };

        let mut running = StatusReport::new(payload.job_id.clone(), "running");
        running.worker_id = Some(self.worker_id.clone());
        running.container_id = Some(container_id.clone());
        running.container_name = Some(payload.container_name.clone());
        if let Err(e) = self.reporter.report_status(&running).await {
            // Non-fatal: the terminal report is the authoritative one.
            tracing::warn!(job_id = %payload.job_id, error = %e, "running report failed");
        }

        let exit_code = self.runner.wait(&container_id).await?;
        let status = if exit_code == 0 { "finished" } else { "failed" };

        let mut terminal = StatusReport::new(payload.job_id.clone(), status);
        terminal.worker_id = Some(self.worker_id.clone());
        terminal.exit_code = Some(exit_code);
        self.report_terminal(terminal).await;

        // Give the stream a bounded drain; logs are best-effort and the
        // terminal status has already been delivered.
        if let Some(mut task) = log_task {
            if tokio::time::timeout(LOG_DRAIN_TIMEOUT, &mut task).await.is_err() {
                tracing::warn!(job_id = %payload.job_id, "log stream did not drain, abandoning");
                task.abort();
            }
        }

        tracing::info!(job_id = %payload.job_id, exit_code, status, "job complete");
        Ok(())
    }

    /// Deliver a terminal report at-least-once, with capped backoff.
    ///
    /// A conflict means an operator moved the job under us (a stop
    /// request between dispatch and exit); reconcile by reporting the
    /// container stopped instead of retrying a forbidden transition.
    async fn report_terminal(&self, report: StatusReport) {
        let mut report = report;
        let mut backoff = REPORT_BACKOFF_START;
        for attempt in 1..=TERMINAL_REPORT_ATTEMPTS {
            match self.reporter.report_status(&report).await {
                Ok(_) => return,
                Err(e) if e.is_conflict() && report.status != "stopped" => {
                    tracing::warn!(
                        job_id = %report.job_id,
                        status = %report.status,
                        "terminal report conflicted, reconciling as stopped"
                    );
                    report.status = "stopped".to_string();
                }
                Err(e) if e.is_conflict() => {
                    tracing::error!(job_id = %report.job_id, error = %e, "terminal report rejected");
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        job_id = %report.job_id,
                        attempt,
                        error = %e,
                        "terminal report failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(REPORT_BACKOFF_CAP);
                }
            }
        }
        tracing::error!(job_id = %report.job_id, "terminal report abandoned after retries");
    }
}

/// Append log lines to the job's log file, flushing per line.
async fn stream_to_file(mut lines: mpsc::Receiver<String>, path: impl AsRef<Path>) {
    let file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())
        .await;
    let mut file = match file {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.as_ref().display(), error = %e, "cannot open log file");
            return;
        }
    };

    while let Some(line) = lines.recv().await {
        let record = format!("{line}\n");
        if file.write_all(record.as_bytes()).await.is_err() {
            break;
        }
        let _ = file.flush().await;
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
