// src/processors/include.rs
//! Include macro: bounded, cycle-safe recursive page expansion.
//!
//! Expansion walks a fixed ladder: depth check, cycle check, fetch,
//! recurse, wrap. Every rung can fail, and every failure stays inside
//! this one macro: an unreachable included page never fails the parent
//! document's conversion.

use super::MacroProcessor;
use crate::api::PageFetcher;
use crate::engine::{MacroEngine, ProcessingContext};
use crate::error::{MacroError, MacroErrorKind};
use crate::model::MacroNode;
use crate::types::PageId;
use async_trait::async_trait;
use std::sync::Arc;

/// Processor for `include` macros.
pub struct IncludeMacroProcessor {
    fetcher: Arc<dyn PageFetcher>,
}

impl IncludeMacroProcessor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// The include target: the unnamed link parameter, or an explicit
    /// `page`/`pageId` parameter.
    fn target_page(node: &MacroNode) -> Result<PageId, MacroError> {
        let raw = node
            .parameter_text("")
            .or_else(|| node.parameter_text("page"))
            .or_else(|| node.parameter_text("pageId"));
        let Some(raw) = raw else {
            // Fail through the shared validator so the error names the
            // canonical parameter.
            super::require_parameters(node, &["page"])?;
            return Err(MacroError::new(
                MacroErrorKind::MissingParameters,
                "include macro names no target page",
            ));
        };
        PageId::parse(&raw).map_err(|err| {
            MacroError::new(
                MacroErrorKind::MissingParameters,
                format!("include target is not a valid page reference: {err}"),
            )
        })
    }
}

impl std::fmt::Debug for IncludeMacroProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncludeMacroProcessor").finish()
    }
}

#[async_trait]
impl MacroProcessor for IncludeMacroProcessor {
    fn macro_type(&self) -> &str {
        "include"
    }

    /// Includes outrank everything: an include body may itself contain
    /// any other macro, so it must be claimed before broader handlers.
    fn priority(&self) -> i32 {
        20
    }

    async fn process(
        &self,
        node: &MacroNode,
        ctx: &ProcessingContext,
        engine: &MacroEngine,
    ) -> Result<String, MacroError> {
        let target = Self::target_page(node)?;

        // Depth bound first: a pathological chain must terminate here
        // regardless of what the pages contain.
        if ctx.depth_exhausted(engine.config().max_recursion_depth) {
            return Err(MacroError::recursive(format!(
                "include depth {} reached expanding page {}; not descending into {}",
                ctx.recursion_depth, ctx.page_id, target
            )));
        }

        // Cycle check is path-scoped: the same page under two unrelated
        // siblings is fine, the same page twice on one path is not.
        if ctx.would_cycle(&target) {
            return Err(MacroError::recursive(format!(
                "cycle detected: page {target} is already on the include path"
            )));
        }

        let body = self.fetcher.fetch_page_body(&target).await?;

        let child_ctx = ctx.descend_into(target.clone());
        let child_result = engine
            .process_fragment(&body, &child_ctx, Some("include"))
            .await
            .map_err(|err| {
                MacroError::new(
                    MacroErrorKind::ProcessingFailed,
                    format!("included page {target} could not be converted: {err}"),
                )
            })?;

        if !child_result.errors.is_empty() {
            log::warn!(
                "[{}] Included page {} degraded {} macro(s)",
                ctx.session_id,
                target,
                child_result.errors.len()
            );
        }

        Ok(format!(
            "<!-- included from page {} -->\n{}",
            target, child_result.processed_content
        ))
    }
}
