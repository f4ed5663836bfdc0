// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route table for the coordinator API.

mod agent;
mod client;
mod ops;

use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the full coordinator router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Client surface
        .route("/run-simulation", post(client::run_simulation))
        .route("/status/:job_id", get(client::status))
        .route("/result/:job_id", get(client::result))
        .route("/progress/:job_id", get(client::progress))
        .route("/logs/:job_id", get(client::logs))
        .route("/file-logs/:job_id", get(client::logs))
        .route("/stop/:job_id", post(client::stop))
        .route("/jobs", get(client::jobs))
        .route("/queue", get(client::queue))
        .route("/job-info/:job_id", get(client::job_info))
        .route("/job/:job_id", delete(client::delete_job))
        .route("/hosts", get(client::hosts))
        // Agent surface
        .route("/api/agent/next-job", post(agent::next_job))
        .route("/api/agent/job-status", post(agent::job_status))
        .route("/api/agent/heartbeat", post(agent::heartbeat))
        // Ops surface
        .route("/ops/jobs/:job_id/requeue", post(ops::requeue))
        .route("/ops/jobs/:job_id/fail", post(ops::fail))
        .route("/ops/jobs/:job_id/cancel", post(ops::cancel))
        .route("/ops/queue/cleanup", post(ops::cleanup_queue))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
