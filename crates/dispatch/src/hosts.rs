// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory worker liveness table.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use simq_core::{HostHeartbeat, WorkerId};
use std::collections::HashMap;

/// Last-seen times and worker-reported info, keyed by worker id.
///
/// Never persisted: after a coordinator restart the table repopulates as
/// workers heartbeat, and [`HostTable::last_seen_or_seed`] keeps the
/// reaper from declaring a host dead before it had a chance to.
#[derive(Default)]
pub struct HostTable {
    inner: Mutex<HashMap<WorkerId, HostHeartbeat>>,
}

impl HostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heartbeat. `info` replaces the previous map when present.
    pub fn record(&self, worker: &WorkerId, info: Option<Map<String, Value>>, now_ms: u64) {
        let mut hosts = self.inner.lock();
        let entry = hosts
            .entry(worker.clone())
            .or_insert_with(|| HostHeartbeat { last_seen_ms: now_ms, info: Map::new() });
        entry.last_seen_ms = now_ms;
        if let Some(info) = info {
            entry.info = info;
        }
    }

    pub fn last_seen(&self, worker: &WorkerId) -> Option<u64> {
        self.inner.lock().get(worker).map(|h| h.last_seen_ms)
    }

    /// Last-seen time, seeding an unseen host as just-seen.
    ///
    /// A host can hold dispatched jobs across a coordinator restart; the
    /// seed gives it one full liveness window to heartbeat before the
    /// reaper may act on it.
    pub fn last_seen_or_seed(&self, worker: &WorkerId, now_ms: u64) -> u64 {
        let mut hosts = self.inner.lock();
        hosts
            .entry(worker.clone())
            .or_insert_with(|| HostHeartbeat { last_seen_ms: now_ms, info: Map::new() })
            .last_seen_ms
    }

    pub fn get(&self, worker: &WorkerId) -> Option<HostHeartbeat> {
        self.inner.lock().get(worker).cloned()
    }
}

#[cfg(test)]
#[path = "hosts_tests.rs"]
mod tests;
