// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The simq coordinator HTTP server (`simqd`).
//!
//! This crate is a thin boundary: handlers deserialize wire bodies, call
//! the dispatcher, and translate [`simq_dispatch::DispatchError`] kinds
//! into status codes in exactly one place ([`error`]).

pub mod env;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
