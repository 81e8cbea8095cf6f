//! Batchwise inventory service library.
//!
//! Batch-level inventory with expiry-ordered (FIFO) consumption, an expiry
//! radar, a stock adjustment ledger and reconciliation of the per-product
//! stock aggregate. Exposed as a library so the HTTP binary, the CLI and the
//! integration tests share one engine.
//!
//! # Layout
//!
//! - `db` - storage traits with `PostgreSQL` and in-memory implementations
//! - `services` - the inventory engine, clock and expiry alerter
//! - `routes` - axum handlers over [`state::AppState`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
