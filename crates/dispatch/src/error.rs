// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher error kinds.
//!
//! These map one-to-one onto HTTP status codes at the API boundary:
//! NotFound is 404, BadRequest 400, InvalidTransition and Conflict 409,
//! NoHosts 503, Storage 500. Storage errors carry filesystem paths and
//! are logged server-side, never surfaced to callers.

use simq_core::{JobId, JobStatus};
use simq_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("{0}")]
    BadRequest(String),

    #[error("invalid transition {prev} -> {next} for job {job_id}")]
    InvalidTransition { job_id: JobId, prev: JobStatus, next: JobStatus },

    #[error("{0}")]
    Conflict(String),

    #[error("no hosts configured")]
    NoHosts,

    #[error("storage error")]
    Storage(#[from] StorageError),
}

impl DispatchError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
