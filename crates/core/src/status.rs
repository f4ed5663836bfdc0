// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status state machine.
//!
//! Statuses fall into three groups:
//! - creation/dispatch: `launching`, `queued`, `dispatched`
//! - active: `running`, `stop_requested`
//! - terminal: `finished`, `failed`, `stopped`, `canceled`
//!
//! plus two utility kinds, `not_found` and `unknown`, which appear in API
//! responses but are never stored as a job's durable status.
//!
//! [`JobStatus::can_transition`] is the single source of truth for which
//! edges exist. Enforcement (including the forced-ops bypass) lives in the
//! dispatcher's status write path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created on the coordinator; metadata being prepared.
    Launching,
    /// Queue entry written; not yet claimed by a worker.
    Queued,
    /// Claimed by a worker but the container has not started.
    Dispatched,
    /// Container started.
    Running,
    /// An operator asked for a stop; the worker has not confirmed yet.
    StopRequested,
    /// Exit code 0.
    Finished,
    /// Non-zero exit code, or reaped after its worker went silent.
    Failed,
    /// Intentionally stopped after it had started.
    Stopped,
    /// Canceled before the container started.
    Canceled,
    /// Utility: the job (or its artifacts) could not be located.
    NotFound,
    /// Utility: fallback when no durable status is available.
    Unknown,
}

/// Error returned when a status string does not name a known kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown job status {0:?}")]
pub struct UnknownStatus(pub String);

impl JobStatus {
    /// Terminal statuses never transition out (absent a forced override).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Stopped | Self::Canceled)
    }

    /// A job currently owned by a worker.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Dispatched | Self::Running | Self::StopRequested)
    }

    /// Whether this kind may be stored as a job's durable status.
    pub fn is_durable(&self) -> bool {
        !matches!(self, Self::NotFound | Self::Unknown)
    }

    /// The allowed transition table.
    ///
    /// `prev == next` is not an edge here; the status write path treats it
    /// as an idempotent refresh so at-least-once reporters can repeat
    /// themselves safely.
    pub fn can_transition(prev: Self, next: Self) -> bool {
        use JobStatus::*;
        match prev {
            Launching => matches!(next, Queued | Running | Canceled),
            Queued => matches!(next, Dispatched | Canceled),
            Dispatched => {
                matches!(next, Running | Failed | Canceled | StopRequested | Queued)
            }
            Running => matches!(next, Finished | Failed | StopRequested | Stopped | Canceled),
            StopRequested => matches!(next, Stopped | Failed | Canceled),
            Finished | Failed | Stopped | Canceled => false,
            NotFound | Unknown => false,
        }
    }

    /// Parse a wire status string, rejecting unknown kinds.
    pub fn parse(s: &str) -> Result<Self, UnknownStatus> {
        s.parse()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Launching => "launching",
            Self::Queued => "queued",
            Self::Dispatched => "dispatched",
            Self::Running => "running",
            Self::StopRequested => "stop_requested",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
            Self::Canceled => "canceled",
            Self::NotFound => "not_found",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "launching" => Self::Launching,
            "queued" => Self::Queued,
            "dispatched" => Self::Dispatched,
            "running" => Self::Running,
            "stop_requested" => Self::StopRequested,
            "finished" => Self::Finished,
            "failed" => Self::Failed,
            "stopped" => Self::Stopped,
            "canceled" => Self::Canceled,
            "not_found" => Self::NotFound,
            "unknown" => Self::Unknown,
            other => return Err(UnknownStatus(other.to_string())),
        })
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
