//! Actor extractor.
//!
//! Every stock change is attributed to an actor in the adjustment ledger.
//! Callers identify themselves with the `X-Actor` header; requests without it
//! are recorded as `anonymous`.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::services::inventory::ANONYMOUS_ACTOR;

/// Header carrying the actor name.
pub const ACTOR_HEADER: &str = "x-actor";

/// Longest actor name kept; longer values are truncated.
const MAX_ACTOR_LEN: usize = 128;

/// The caller performing a request.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(actor: Actor) -> impl IntoResponse {
///     format!("Hello, {}!", actor.as_str())
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(String);

impl Actor {
    /// The actor name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_header(value: Option<&str>) -> Self {
        let name = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or(ANONYMOUS_ACTOR, |v| v);
        Self(name.chars().take(MAX_ACTOR_LEN).collect())
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok());
        Ok(Self::from_header(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_blank_header_is_anonymous() {
        assert_eq!(Actor::from_header(None).as_str(), "anonymous");
        assert_eq!(Actor::from_header(Some("   ")).as_str(), "anonymous");
    }

    #[test]
    fn test_header_is_trimmed_and_capped() {
        assert_eq!(Actor::from_header(Some(" till-3 ")).as_str(), "till-3");
        let long = "x".repeat(300);
        assert_eq!(Actor::from_header(Some(&long)).as_str().len(), MAX_ACTOR_LEN);
    }
}
