// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the system.
//! Node-level failures (`MacroError`) are recoverable and feed the
//! fallback resolver; pass-level failures (`ConversionError`) abort a
//! document conversion. Only a broken DOM capability is pass-level.

use std::fmt;
use thiserror::Error;

/// Why a single macro could not be converted, as a typed vocabulary.
///
/// Instead of matching against magic strings, the failure modes are
/// encoded in the type system. The fallback resolver and the statistics
/// sink both dispatch on this enum, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroErrorKind {
    /// No registered processor claims this macro type.
    UnsupportedMacro,
    /// The processor ran but could not produce output.
    ProcessingFailed,
    /// The processor exceeded its wall-clock budget.
    Timeout,
    /// An include chain hit the depth bound or revisited an ancestor page.
    RecursiveInclude,
    /// A required macro parameter was absent or empty.
    MissingParameters,
    /// An external collaborator (page fetch) failed.
    ExternalDependency,
    /// The storage-format fragment could not be parsed.
    DomParsing,
    /// The processed tree could not be serialized back to markup.
    HtmlSerialization,
}

impl MacroErrorKind {
    /// Canonical name used in degraded comments and conversion reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedMacro => "UNSUPPORTED_MACRO",
            Self::ProcessingFailed => "PROCESSING_FAILED",
            Self::Timeout => "TIMEOUT",
            Self::RecursiveInclude => "RECURSIVE_INCLUDE",
            Self::MissingParameters => "MISSING_PARAMETERS",
            Self::ExternalDependency => "EXTERNAL_DEPENDENCY",
            Self::DomParsing => "DOM_PARSING_ERROR",
            Self::HtmlSerialization => "HTML_SERIALIZATION_ERROR",
        }
    }
}

impl fmt::Display for MacroErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable, node-level processing failure.
///
/// Every `MacroError` is caught at the orchestrator boundary and turned
/// into fallback content; it never aborts the document pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct MacroError {
    pub kind: MacroErrorKind,
    pub message: String,
}

impl MacroError {
    pub fn new(kind: MacroErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for the depth/cycle failures raised by the include machinery.
    pub fn recursive(message: impl Into<String>) -> Self {
        Self::new(MacroErrorKind::RecursiveInclude, message)
    }

    /// Shorthand for failures of the page-fetch collaborator.
    pub fn external(message: impl Into<String>) -> Self {
        Self::new(MacroErrorKind::ExternalDependency, message)
    }

    /// Shorthand for a processor that ran but produced no usable output.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(MacroErrorKind::ProcessingFailed, message)
    }
}

impl From<FetchError> for MacroError {
    fn from(err: FetchError) -> Self {
        MacroError::external(err.to_string())
    }
}

/// Typed failures of the page-fetch capability.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Page not found: {page_id}")]
    NotFound { page_id: String },

    #[error("Permission denied for page {page_id}: {reason}")]
    PermissionDenied { page_id: String, reason: String },

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Malformed page response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// Whether this failure is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Pass-level error type.
///
/// Returned by `process_document` only for precondition violations (a
/// broken DOM capability) and by the application surface for I/O,
/// configuration, and fetch failures outside the engine.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("DOM parsing failed: {0}")]
    DomParsing(String),

    #[error("HTML serialization failed: {0}")]
    HtmlSerialization(String),

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl From<quick_xml::Error> for ConversionError {
    fn from(err: quick_xml::Error) -> Self {
        ConversionError::DomParsing(err.to_string())
    }
}

impl From<quick_xml::encoding::EncodingError> for ConversionError {
    fn from(err: quick_xml::encoding::EncodingError) -> Self {
        ConversionError::DomParsing(err.to_string())
    }
}

// Allow converting from anyhow::Error at the application boundary,
// preserving the error chain as a message.
impl From<anyhow::Error> for ConversionError {
    fn from(err: anyhow::Error) -> Self {
        ConversionError::Internal {
            message: err.to_string(),
            source: None,
        }
    }
}

/// A per-node error recorded in the conversion result.
///
/// Pairs the failure with the macro it struck and where in the document
/// that macro sat, so callers can surface a precise degradation list.
#[derive(Debug, Clone)]
pub struct ProcessingError {
    pub macro_type: String,
    pub kind: MacroErrorKind,
    pub message: String,
    pub position: crate::model::Span,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(MacroErrorKind::Timeout.as_str(), "TIMEOUT");
        assert_eq!(
            MacroErrorKind::RecursiveInclude.as_str(),
            "RECURSIVE_INCLUDE"
        );
        assert_eq!(MacroErrorKind::DomParsing.as_str(), "DOM_PARSING_ERROR");
    }

    #[test]
    fn fetch_errors_map_to_external_dependency() {
        let err: MacroError = FetchError::NotFound {
            page_id: "123".to_string(),
        }
        .into();
        assert_eq!(err.kind, MacroErrorKind::ExternalDependency);
        assert!(err.message.contains("123"));
    }

    #[test]
    fn only_network_failures_are_retryable() {
        assert!(FetchError::Network("reset".into()).is_retryable());
        assert!(!FetchError::NotFound {
            page_id: "1".into()
        }
        .is_retryable());
    }
}
