// src/processors/mod.rs
//! Macro processors: one per macro family.
//!
//! Every processor implements the same lifecycle: declare a type key and
//! priority, claim nodes via `can_handle`, and rewrite a claimed node to
//! Markdown in `process`. Processing must not mutate shared state; a
//! processor that fails must leave enough information behind for the
//! fallback resolver to reconstruct what was lost.

mod chart;
mod code;
mod include;
mod markdown;
mod panel;
mod table;

pub use chart::ChartMacroProcessor;
pub use code::CodeMacroProcessor;
pub use include::IncludeMacroProcessor;
pub use markdown::{flatten_inline, normalize_block, MarkdownMacroProcessor, OutputMode};
pub use panel::{PanelKind, PanelMacroProcessor};
pub use table::TableMacroProcessor;

use crate::config::ConversionConfig;
use crate::engine::{degraded_comment, MacroEngine, ProcessingContext, ProcessorRegistry};
use crate::error::{MacroError, MacroErrorKind};
use crate::model::MacroNode;
use async_trait::async_trait;
use std::sync::Arc;

/// The shared lifecycle every macro handler implements.
///
/// `process` may suspend on external I/O (include fetches) and may
/// recurse through the orchestrator with a derived context, but it never
/// touches state outside its own locals. On failure the engine can
/// always reconstruct a human-diffable comment from the node alone, so
/// no processor may consume information it does not return.
#[async_trait]
pub trait MacroProcessor: Send + Sync {
    /// Unique macro type key this processor registers under.
    fn macro_type(&self) -> &str;

    /// Higher priority wins when several processors could claim a node.
    fn priority(&self) -> i32 {
        0
    }

    /// Config can force a processor off without unregistering it.
    fn enabled(&self) -> bool {
        true
    }

    /// Pure predicate: does this processor claim the node?
    fn can_handle(&self, node: &MacroNode) -> bool {
        node.macro_type == self.macro_type()
    }

    /// Rewrite the node to Markdown.
    async fn process(
        &self,
        node: &MacroNode,
        ctx: &ProcessingContext,
        engine: &MacroEngine,
    ) -> Result<String, MacroError>;

    /// Replacement comment for content this processor had to drop.
    fn degraded_fallback(&self, node: &MacroNode, error: &MacroError) -> String {
        degraded_comment(node, error)
    }
}

/// Validate that every named parameter is present and non-empty.
///
/// Fails with `MISSING_PARAMETERS` naming exactly the absent ones.
pub fn require_parameters(node: &MacroNode, names: &[&str]) -> Result<(), MacroError> {
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| {
            node.parameters
                .get(*name)
                .map_or(true, |value| value.is_empty())
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MacroError::new(
            MacroErrorKind::MissingParameters,
            format!("missing required parameter(s): {}", missing.join(", ")),
        ))
    }
}

/// Build a registry carrying the stock processor set.
///
/// Registration is still subject to the config's policy lists, so a
/// blacklisted stock processor simply never lands.
pub fn build_default_registry(
    config: &ConversionConfig,
    fetcher: &Arc<dyn crate::api::PageFetcher>,
) -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new(config.registration_policy());

    registry.register(Arc::new(MarkdownMacroProcessor::from_config(config)));
    registry.register(Arc::new(CodeMacroProcessor::new()));
    for kind in PanelKind::all() {
        registry.register(Arc::new(PanelMacroProcessor::new(*kind)));
    }
    registry.register(Arc::new(TableMacroProcessor::new()));
    registry.register(Arc::new(ChartMacroProcessor::new()));
    registry.register(Arc::new(IncludeMacroProcessor::new(Arc::clone(fetcher))));

    registry
}
