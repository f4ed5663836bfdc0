// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared handler state.

use simq_core::SystemClock;
use simq_dispatch::Dispatcher;
use std::sync::Arc;

/// The dispatcher as the binary runs it, on the real clock.
pub type AppDispatcher = Dispatcher<SystemClock>;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<AppDispatcher>,
}

impl AppState {
    pub fn new(dispatcher: AppDispatcher) -> Self {
        Self { dispatcher: Arc::new(dispatcher) }
    }
}
