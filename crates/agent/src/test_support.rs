// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted fakes for agent tests.

use crate::client::Reporter;
use crate::error::AgentError;
use crate::runner::{ContainerRunner, ContainerSpec};
use async_trait::async_trait;
use parking_lot::Mutex;
use simq_core::WorkerId;
use simq_wire::{DispatchPayload, HeartbeatRequest, StatusAck, StatusReport};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Container runner that never touches Docker.
#[derive(Clone)]
pub(crate) struct FakeRunner {
    pub exit_code: i64,
    pub log_lines: Vec<String>,
    pub fail_start: bool,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl FakeRunner {
    pub fn finishing_with(exit_code: i64) -> Self {
        Self {
            exit_code,
            log_lines: vec!["step 1".to_string(), "step 2".to_string()],
            fail_start: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

#[async_trait]
impl ContainerRunner for FakeRunner {
    async fn pull(&self, image: &str) -> Result<(), AgentError> {
        self.record(format!("pull {image}"));
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), AgentError> {
        self.record(format!("remove {name}"));
        Ok(())
    }

    async fn start(&self, spec: &ContainerSpec) -> Result<String, AgentError> {
        self.record(format!("start {}", spec.name));
        if self.fail_start {
            return Err(AgentError::runner("no such image"));
        }
        Ok("cid-fake".to_string())
    }

    async fn follow_logs(&self, container_id: &str) -> Result<mpsc::Receiver<String>, AgentError> {
        self.record(format!("logs {container_id}"));
        let (tx, rx) = mpsc::channel(16);
        for line in &self.log_lines {
            let _ = tx.send(line.clone()).await;
        }
        // Dropping the sender ends the stream, like a container exiting.
        Ok(rx)
    }

    async fn wait(&self, container_id: &str) -> Result<i64, AgentError> {
        self.record(format!("wait {container_id}"));
        Ok(self.exit_code)
    }
}

/// Reporter that records status reports and can inject failures.
#[derive(Clone, Default)]
pub(crate) struct RecordingReporter {
    pub reports: Arc<Mutex<Vec<StatusReport>>>,
    pub heartbeats: Arc<Mutex<u32>>,
    /// Transient errors to serve before accepting reports.
    pub fail_reports: Arc<Mutex<u32>>,
    /// Status kinds rejected with a 409.
    pub conflict_on: Vec<String>,
}

impl RecordingReporter {
    pub fn statuses(&self) -> Vec<String> {
        self.reports.lock().iter().map(|r| r.status.clone()).collect()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn next_job(&self, _worker: &WorkerId) -> Result<Option<DispatchPayload>, AgentError> {
        Ok(None)
    }

    async fn report_status(&self, report: &StatusReport) -> Result<StatusAck, AgentError> {
        if self.conflict_on.contains(&report.status) {
            return Err(AgentError::Rejected {
                status: 409,
                detail: format!("invalid transition to {}", report.status),
            });
        }
        {
            let mut failures = self.fail_reports.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(AgentError::Rejected {
                    status: 500,
                    detail: "coordinator unavailable".to_string(),
                });
            }
        }
        self.reports.lock().push(report.clone());
        Ok(StatusAck { ok: true, stop_requested: false })
    }

    async fn heartbeat(&self, _req: &HeartbeatRequest) -> Result<(), AgentError> {
        *self.heartbeats.lock() += 1;
        Ok(())
    }
}

/// A payload the fakes understand.
pub(crate) fn payload(job_id: &str) -> DispatchPayload {
    DispatchPayload {
        job_id: simq_core::JobId::new(job_id),
        job_name: "Exp-Run".to_string(),
        config_path: "configs/exp.yaml".to_string(),
        preferred_host: None,
        image: "simq/simulator:latest".to_string(),
        command: format!("--config /data/configs/exp.yaml --job_id {job_id}"),
        container_name: format!("simq_{job_id}_Exp-Run"),
        volumes: Vec::new(),
        env: Default::default(),
    }
}
