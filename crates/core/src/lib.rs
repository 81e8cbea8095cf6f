//! Batchwise Core - Shared types library.
//!
//! This crate provides common types used across all Batchwise components:
//! - `server` - Inventory engine, storage backends and the JSON API
//! - `cli` - Command-line tools for migrations, seeding and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, adjustment categories and expiry bands
//! - [`batch_code`] - Human-readable batch code generation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod batch_code;
pub mod types;

pub use batch_code::{batch_code_prefix, generate_batch_code};
pub use types::*;
