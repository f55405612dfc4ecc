// src/lib.rs
//! confluence2md library: converts Confluence storage-format macros into Markdown.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `ConversionError`, `MacroError`, `MacroErrorKind`, `FetchError`
//! - **Configuration**: `ConversionConfig`, `CommandLineInput`
//! - **Engine**: `MacroEngine`, `ProcessingContext`, `ProcessingResult`, `ProcessorRegistry`
//! - **Fallbacks**: `FallbackStrategy`, `FallbackRecord`, `FallbackResolver`
//! - **Domain model**: `MacroNode`, `ParameterValue`, `Span`
//! - **DOM capability**: `HtmlNode`, `StorageXmlParser`, `StorageXmlSerializer`
//! - **Processors**: the stock processor set plus the `MacroProcessor` contract
//! - **Page fetching**: `PageFetcher`, `ConfluenceHttpClient`, `CachedPageFetcher`
//!
//! `MacroEngine::process_document` is the engine's sole entry point;
//! everything else in this crate either feeds it or consumes its result.

mod api;
mod config;
mod constants;
mod dom;
mod engine;
mod error;
mod error_recovery;
mod model;
mod processors;
mod types;

// --- Error Handling ---
pub use crate::error::{
    ConversionError, FetchError, MacroError, MacroErrorKind, ProcessingError,
};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, ConversionConfig};

// --- Engine ---
pub use crate::engine::{
    FallbackRecord, FallbackResolver, FallbackStrategy, MacroEngine, ProcessingContext,
    ProcessingResult, ProcessingStats, ProcessorRegistration, ProcessorRegistry,
    RegistrationPolicy, TypeStats,
};

// --- Domain Model ---
pub use crate::model::{
    discover_macro_nodes, extract_body, extract_parameters, ExtractedBody, MacroNode,
    ParameterValue, Span,
};

// --- Domain Types ---
pub use crate::types::{Id, PageId, PageMarker, SpaceKey, SpaceMarker};

// --- DOM Capability ---
pub use crate::dom::{
    convert_html_entities, serialize_fragment, HtmlNode, StorageXmlParser, StorageXmlSerializer,
};

// --- Processors ---
pub use crate::processors::{
    build_default_registry, flatten_inline, normalize_block, require_parameters,
    ChartMacroProcessor, CodeMacroProcessor, IncludeMacroProcessor, MacroProcessor,
    MarkdownMacroProcessor, OutputMode, PanelKind, PanelMacroProcessor, TableMacroProcessor,
};

// --- Page Fetching ---
pub use crate::api::{CachedPageFetcher, ConfluenceHttpClient, OfflinePageFetcher, PageFetcher};

// --- Retry Helper ---
pub use crate::error_recovery::retry_with_backoff;
