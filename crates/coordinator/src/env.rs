// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the coordinator binary.

use simq_core::WorkerId;
use simq_dispatch::DispatchConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Shared data root: `SIMQ_SHARED_DIR`, defaulting to the conventional
/// mount point.
pub fn shared_dir() -> PathBuf {
    std::env::var("SIMQ_SHARED_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/opt/simq_shared"))
}

/// Listen address: `SIMQ_LISTEN`, default `0.0.0.0:8000`.
pub fn listen_addr() -> String {
    std::env::var("SIMQ_LISTEN").unwrap_or_else(|_| "0.0.0.0:8000".to_string())
}

/// Known worker hosts: `SIMQ_HOSTS`, comma-separated worker ids.
pub fn hosts() -> Vec<WorkerId> {
    std::env::var("SIMQ_HOSTS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(WorkerId::new)
        .collect()
}

fn duration_secs(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Dispatcher configuration from the environment.
pub fn dispatch_config() -> DispatchConfig {
    let defaults = DispatchConfig::default();
    DispatchConfig {
        hosts: hosts(),
        image: std::env::var("SIMQ_IMAGE").unwrap_or(defaults.image),
        job_status_ttl: duration_secs("JOB_STATUS_TTL", defaults.job_status_ttl),
        heartbeat_ttl: duration_secs("HEARTBEAT_TTL", defaults.heartbeat_ttl),
        worker_stale_grace: duration_secs("WORKER_STALE_GRACE", defaults.worker_stale_grace),
        queue_claim_ttl: duration_secs("QUEUE_CLAIM_TTL", defaults.queue_claim_ttl),
    }
}
