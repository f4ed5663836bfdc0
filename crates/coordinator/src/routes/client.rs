// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-facing handlers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use simq_core::JobId;
use simq_dispatch::DispatchError;
use simq_wire::SubmitRequest;
use tokio_util::io::ReaderStream;

pub async fn run_simulation(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = state.dispatcher.submit(&req)?;
    Ok(Json(resp))
}

pub async fn status(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.job_status(&job_id)?))
}

pub async fn result(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.result(&job_id)?))
}

pub async fn progress(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.progress(&job_id)?))
}

/// Stream the job's log file as plain text.
pub async fn logs(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<Response, ApiError> {
    let path = state.dispatcher.log_path(&job_id)?;
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| DispatchError::NotFound(job_id.clone()))?;
    let stream = ReaderStream::new(file);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(stream))
        .map_err(|e| {
            tracing::error!(error = %e, "failed to build log stream response");
            ApiError(DispatchError::NotFound(job_id))
        })
}

pub async fn stop(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.stop(&job_id)?))
}

pub async fn jobs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.list_jobs()?))
}

pub async fn queue(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.queue_entries()?))
}

pub async fn job_info(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.job_info(&job_id)?))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<impl IntoResponse, ApiError> {
    state.dispatcher.delete(&job_id)?;
    Ok(Json(serde_json::json!({ "message": format!("job {job_id} deleted") })))
}

pub async fn hosts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dispatcher.hosts_snapshot()?))
}
