// src/engine/mod.rs
//! The macro processing engine.
//!
//! `MacroEngine::process_document` is the engine's sole public entry
//! point: it discovers macro-shaped nodes, dispatches each through the
//! processor registry, converts per-node failures to fallback content,
//! and stitches replacements back in document order.

mod context;
mod fallback;
mod pipeline;
mod registry;
mod stats;

pub use context::ProcessingContext;
pub use fallback::{degraded_comment, FallbackRecord, FallbackResolver, FallbackStrategy};
pub use pipeline::{MacroEngine, ProcessingResult};
pub use registry::{ProcessorRegistration, ProcessorRegistry, RegistrationPolicy};
pub use stats::{ProcessingStats, StatsSink, TypeStats};
