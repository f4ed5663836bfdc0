// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for dispatcher tests.

use crate::{DispatchConfig, Dispatcher};
use simq_core::{FakeClock, WorkerId};
use simq_wire::{SubmitRequest, SubmitResponse};

pub(crate) struct Harness {
    pub dir: tempfile::TempDir,
    pub clock: FakeClock,
    pub dispatcher: Dispatcher<FakeClock>,
}

impl Harness {
    /// A dispatcher over a fresh temp shared root with the given hosts.
    pub fn with_hosts(hosts: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let clock = FakeClock::new();
        let cfg = DispatchConfig::new(hosts.iter().copied().map(WorkerId::new).collect());
        let dispatcher = Dispatcher::new(dir.path(), cfg, clock.clone()).unwrap();
        Self { dir, clock, dispatcher }
    }

    /// Drop a simulation config under the configs root.
    pub fn write_config(&self, file_name: &str, experiment: &str, run: &str) {
        let configs = self.dir.path().join("configs");
        std::fs::create_dir_all(&configs).unwrap();
        std::fs::write(
            configs.join(file_name),
            format!("experiment:\n  name: {experiment}\n  run_name: {run}\n"),
        )
        .unwrap();
    }

    /// Submit against a config file, optionally pinned to a host.
    pub fn submit(&self, config: &str, target_host: Option<&str>) -> SubmitResponse {
        self.write_config(config, "Exp", "Run");
        self.dispatcher
            .submit(&SubmitRequest {
                config_path: Some(config.to_string()),
                config: None,
                target_host: target_host.map(WorkerId::new),
                save_as: None,
            })
            .unwrap()
    }
}
