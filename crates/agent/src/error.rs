// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A non-2xx coordinator response.
    #[error("coordinator rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("container runner: {0}")]
    Runner(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    pub fn runner(msg: impl Into<String>) -> Self {
        Self::Runner(msg.into())
    }

    /// A 409 means the coordinator refused the transition, not that the
    /// request failed; retrying the same report will never succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Rejected { status: 409, .. })
    }
}
