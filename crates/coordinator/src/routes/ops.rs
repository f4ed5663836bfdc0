// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ops handlers: forced requeue/fail/cancel and queue cleanup.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use simq_core::JobId;
use simq_wire::{OpsReasonRequest, OpsRequeueRequest};

pub async fn requeue(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
    Json(req): Json<OpsRequeueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.ops_requeue(&job_id, &req)?))
}

pub async fn fail(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
    Json(req): Json<OpsReasonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.ops_fail(&job_id, &req)?))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
    Json(req): Json<OpsReasonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.ops_cancel(&job_id, &req)?))
}

pub async fn cleanup_queue(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.ops_cleanup_queue()?))
}
