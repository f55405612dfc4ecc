// src/types/ids.rs
use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Strong typing for identifiers with phantom types.
///
/// A `PageId` and a `SpaceKey` are both strings on the wire, but mixing
/// them up inside the include machinery would silently break cycle
/// detection. The phantom parameter makes that a compile error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

/// Marker type for Confluence page/content ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageMarker;

/// Marker type for Confluence space keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceMarker;

pub type PageId = Id<PageMarker>;
pub type SpaceKey = Id<SpaceMarker>;

impl<T> Id<T> {
    /// Create an id from an already validated string (internal use).
    pub(crate) fn from_validated(value: String) -> Self {
        Self {
            value,
            _phantom: PhantomData,
        }
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl PageId {
    /// Parse a page id, trimming surrounding whitespace.
    ///
    /// Confluence content ids are opaque tokens (usually numeric, but
    /// title-based references also flow through here), so validation only
    /// rejects values that could never address a page.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyPageId);
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::MalformedPageId(input.to_string()));
        }
        Ok(Self::from_validated(trimmed.to_string()))
    }
}

impl SpaceKey {
    /// Parse a space key; Confluence keys are short alphanumeric tokens.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::MalformedSpaceKey(input.to_string()));
        }
        Ok(Self::from_validated(trimmed.to_string()))
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for PageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        PageId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for SpaceKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        SpaceKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn page_id_trims_whitespace() {
        let id = PageId::parse("  123456  ").unwrap();
        assert_eq!(id.as_str(), "123456");
    }

    #[test]
    fn page_id_rejects_empty() {
        assert_eq!(PageId::parse("   "), Err(ValidationError::EmptyPageId));
    }

    #[test]
    fn page_id_rejects_interior_whitespace() {
        assert!(matches!(
            PageId::parse("12 34"),
            Err(ValidationError::MalformedPageId(_))
        ));
    }

    #[test]
    fn space_key_accepts_alphanumeric() {
        let key = SpaceKey::parse("DOCS1").unwrap();
        assert_eq!(key.as_str(), "DOCS1");
    }

    #[test]
    fn space_key_rejects_punctuation() {
        assert!(SpaceKey::parse("DO-CS").is_err());
    }
}
