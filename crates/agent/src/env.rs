// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the agent binary.

use simq_core::WorkerId;
use std::path::PathBuf;
use std::time::Duration;

/// Agent configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Coordinator base URL.
    pub server: String,
    pub worker_id: WorkerId,
    /// Shared data root, mounted at the same path as on the coordinator.
    pub shared_dir: PathBuf,
    /// Sleep between empty polls.
    pub poll_interval: Duration,
    /// Cadence of fire-and-forget heartbeats. Zero disables them.
    pub heartbeat_interval: Duration,
    /// Docker network to attach containers to, when it exists.
    pub docker_network: String,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self {
            server: std::env::var("SIMQ_SERVER")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            worker_id: WorkerId::new(
                std::env::var("WORKER_ID").unwrap_or_else(|_| hostname()),
            ),
            shared_dir: std::env::var("SIMQ_SHARED_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/opt/simq_shared")),
            poll_interval: duration_secs("POLL_INTERVAL", Duration::from_secs(5)),
            heartbeat_interval: duration_secs("HEARTBEAT_INTERVAL", Duration::from_secs(30)),
            docker_network: std::env::var("SIMQ_DOCKER_NETWORK")
                .unwrap_or_else(|_| "simq_network".to_string()),
        }
    }
}

fn duration_secs(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// The kernel hostname, matching what operators put in the host set.
fn hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "worker".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
