// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the coordinator's agent surface.

use crate::error::AgentError;
use async_trait::async_trait;
use reqwest::StatusCode;
use simq_core::WorkerId;
use simq_wire::{DispatchPayload, HeartbeatRequest, NextJobRequest, StatusAck, StatusReport};
use std::time::Duration;

/// The agent's view of the coordinator. A trait so job-run logic is
/// testable without a live server.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Poll for work. `None` when the coordinator has nothing for us.
    async fn next_job(&self, worker: &WorkerId) -> Result<Option<DispatchPayload>, AgentError>;

    async fn report_status(&self, report: &StatusReport) -> Result<StatusAck, AgentError>;

    async fn heartbeat(&self, req: &HeartbeatRequest) -> Result<(), AgentError>;
}

/// Reqwest-backed [`Reporter`] with explicit request timeouts.
pub struct CoordinatorClient {
    base: String,
    http: reqwest::Client,
}

impl CoordinatorClient {
    /// Poll requests wait longer than the rest; the coordinator may hold
    /// them briefly while it sweeps the queue.
    const POLL_TIMEOUT: Duration = Duration::from_secs(10);
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(base: impl Into<String>) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { base: base.into().trim_end_matches('/').to_string(), http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Pull the error detail out of a rejection body, best-effort.
async fn rejection(response: reqwest::Response) -> AgentError {
    let status = response.status().as_u16();
    let detail = match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("detail")
            .and_then(|d| d.as_str())
            .unwrap_or("unspecified")
            .to_string(),
        Err(_) => "unspecified".to_string(),
    };
    AgentError::Rejected { status, detail }
}

#[async_trait]
impl Reporter for CoordinatorClient {
    async fn next_job(&self, worker: &WorkerId) -> Result<Option<DispatchPayload>, AgentError> {
        let response = self
            .http
            .post(self.url("/api/agent/next-job"))
            .timeout(Self::POLL_TIMEOUT)
            .json(&NextJobRequest { worker_id: worker.clone() })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.json().await?)),
            StatusCode::NO_CONTENT => Ok(None),
            _ => Err(rejection(response).await),
        }
    }

    async fn report_status(&self, report: &StatusReport) -> Result<StatusAck, AgentError> {
        let response = self
            .http
            .post(self.url("/api/agent/job-status"))
            .json(report)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(response.json().await?)
    }

    async fn heartbeat(&self, req: &HeartbeatRequest) -> Result<(), AgentError> {
        let response = self
            .http
            .post(self.url("/api/agent/heartbeat"))
            .json(req)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }
}
