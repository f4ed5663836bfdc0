// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `simq-agent`: per-host worker agent.

use simq_agent::{Agent, AgentConfig, CoordinatorClient, DockerCli};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = AgentConfig::from_env();
    let client = CoordinatorClient::new(cfg.server.clone())?;

    let stop = Arc::new(AtomicBool::new(false));
    spawn_signal_listener(Arc::clone(&stop));

    let mut agent = Agent::new(cfg, DockerCli::new(), client, stop);
    agent.run().await;
    Ok(())
}

/// SIGTERM/SIGINT set the stop flag; the loop exits after the current
/// job completes.
fn spawn_signal_listener(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            ) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "cannot install SIGTERM handler");
                    let _ = ctrl_c.await;
                    stop.store(true, Ordering::Relaxed);
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }

        tracing::info!("shutdown signal received, finishing current job");
        stop.store(true, Ordering::Relaxed);
    });
}
