// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `simqd`: the simq coordinator daemon.

use simq_core::SystemClock;
use simq_coordinator::{build_router, env, AppState};
use simq_dispatch::Dispatcher;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let shared = env::shared_dir();
    let cfg = env::dispatch_config();
    if cfg.hosts.is_empty() {
        tracing::warn!("SIMQ_HOSTS is empty; submissions will be refused until hosts are configured");
    }

    let dispatcher = Dispatcher::new(&shared, cfg, SystemClock)?;
    let app = build_router(AppState::new(dispatcher));

    let addr = env::listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, shared = %shared.display(), "coordinator listening");

    axum::serve(listener, app).await?;
    Ok(())
}
