// src/types/mod.rs
//! Domain types shared across the engine.
//!
//! Strongly-typed identifiers keep page ids and space keys from being
//! confused with arbitrary strings deep inside the include machinery.

mod ids;

pub use ids::{Id, PageId, PageMarker, SpaceKey, SpaceMarker};

use thiserror::Error;

/// Validation failures for domain values constructed from user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Page id must not be empty")]
    EmptyPageId,

    #[error("Page id contains whitespace or control characters: {0:?}")]
    MalformedPageId(String),

    #[error("Space key must be alphanumeric: {0:?}")]
    MalformedSpaceKey(String),
}
