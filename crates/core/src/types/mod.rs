//! Core types for Batchwise.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod id;

pub use category::*;
pub use id::*;
