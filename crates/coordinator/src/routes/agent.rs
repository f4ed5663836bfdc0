// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-facing handlers: the pull-based dispatch protocol.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use simq_wire::{HeartbeatRequest, NextJobRequest, StatusReport};

/// 200 with a dispatch payload, or 204 when no work is available.
pub async fn next_job(
    State(state): State<AppState>,
    Json(req): Json<NextJobRequest>,
) -> Result<Response, ApiError> {
    match state.dispatcher.pop_next(&req.worker_id)? {
        Some(payload) => Ok(Json(payload).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn job_status(
    State(state): State<AppState>,
    Json(report): Json<StatusReport>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.update_status(&report)?))
}

pub async fn heartbeat(
    State(state): State<AppState>,
    Json(req): Json<HeartbeatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.dispatcher.heartbeat(&req)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
