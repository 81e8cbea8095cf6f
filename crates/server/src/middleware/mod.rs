//! Request extractors and middleware.
//!
//! - `actor` - Who is performing a stock change, from the `X-Actor` header

pub mod actor;

pub use actor::{ACTOR_HEADER, Actor};
