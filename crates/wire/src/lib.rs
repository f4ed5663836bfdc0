// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! HTTP protocol DTOs shared by the coordinator and the worker agent.
//!
//! Request bodies reject unknown fields at the boundary; response bodies
//! are plain serde structs. Nothing here touches the filesystem.

mod dispatch;
mod ops;
mod submit;

pub use dispatch::{
    DispatchPayload, HeartbeatRequest, NextJobRequest, StatusAck, StatusReport, VolumeBinding,
};
pub use ops::{CleanupResponse, OpsReasonRequest, OpsRequeueRequest, OpsResponse};
pub use submit::{HostSnapshot, StopResponse, SubmitRequest, SubmitResponse};

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
