// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single place dispatch errors become HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use simq_dispatch::DispatchError;

/// Wrapper giving [`DispatchError`] an HTTP shape.
#[derive(Debug)]
pub struct ApiError(pub DispatchError);

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::InvalidTransition { .. } | DispatchError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            DispatchError::NoHosts => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Storage failures carry filesystem paths; log them server-side
        // and keep the body generic.
        let detail = match &self.0 {
            DispatchError::Storage(e) => {
                tracing::error!(error = ?e, "internal storage error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
