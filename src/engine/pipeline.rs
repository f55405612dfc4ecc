// src/engine/pipeline.rs
//! Pipeline orchestrator: document scanning, dispatch, and reassembly.

use super::context::ProcessingContext;
use super::fallback::{FallbackRecord, FallbackResolver};
use super::registry::ProcessorRegistry;
use super::stats::{ProcessingStats, StatsSink};
use crate::api::PageFetcher;
use crate::config::ConversionConfig;
use crate::constants::CHARS_PER_MACRO_ESTIMATE;
use crate::dom::{convert_html_entities, StorageXmlParser};
use crate::error::{ConversionError, MacroError, MacroErrorKind, ProcessingError};
use crate::model::{discover_macro_nodes, MacroNode, Span};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Terminal value of one document conversion.
///
/// Never mutated after return. `success` is false only when the pass
/// itself could not run (see [`MacroEngine::convert`]); degraded macros
/// keep `success` true and surface through `errors`/`fallbacks_used`.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub success: bool,
    pub processed_content: String,
    pub stats: ProcessingStats,
    pub errors: Vec<ProcessingError>,
    pub fallbacks_used: Vec<FallbackRecord>,
}

/// Outcome of dispatching a single node.
struct NodeOutcome {
    replacement: String,
    error: Option<ProcessingError>,
    fallback: Option<FallbackRecord>,
}

/// The macro processing engine.
///
/// Holds the processor registry, the page-fetch collaborator used by
/// include expansion, and the per-pass policy configuration. One engine
/// serves any number of conversions; all per-pass state lives in the
/// [`ProcessingContext`] and pass-local sinks.
pub struct MacroEngine {
    registry: Arc<ProcessorRegistry>,
    fetcher: Arc<dyn PageFetcher>,
    config: ConversionConfig,
    fallback: FallbackResolver,
    parser: StorageXmlParser,
}

impl MacroEngine {
    pub fn new(
        registry: Arc<ProcessorRegistry>,
        fetcher: Arc<dyn PageFetcher>,
        config: ConversionConfig,
    ) -> Self {
        let fallback = FallbackResolver::new(
            config.default_fallback,
            config.per_macro_fallback.clone(),
        );
        Self {
            registry,
            fetcher,
            config,
            fallback,
            parser: StorageXmlParser::new(),
        }
    }

    /// The page-fetch collaborator (used by the include processor).
    pub fn fetcher(&self) -> &Arc<dyn PageFetcher> {
        &self.fetcher
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Convert one storage-format fragment.
    ///
    /// The engine's sole public entry point. Node-level failures degrade
    /// to fallback content and never abort the pass; only a fragment the
    /// DOM capability cannot parse is an error.
    pub fn process_document<'a>(
        &'a self,
        html: &'a str,
        ctx: &'a ProcessingContext,
    ) -> BoxFuture<'a, Result<ProcessingResult, ConversionError>> {
        self.process_fragment(html, ctx, None)
    }

    /// Convert a fragment, tolerating pass-level failure.
    ///
    /// A fragment that cannot be parsed comes back unconverted with
    /// `success == false` and the fatal error recorded, so outer export
    /// pipelines can carry on with their remaining pages.
    pub async fn convert(&self, html: &str, ctx: &ProcessingContext) -> ProcessingResult {
        match self.process_document(html, ctx).await {
            Ok(result) => result,
            Err(err) => {
                log::error!("Document pass failed for page {}: {err}", ctx.page_id);
                ProcessingResult {
                    success: false,
                    processed_content: html.to_string(),
                    stats: ProcessingStats::default(),
                    errors: vec![ProcessingError {
                        macro_type: "document".to_string(),
                        kind: MacroErrorKind::DomParsing,
                        message: err.to_string(),
                        position: Span::default(),
                    }],
                    fallbacks_used: Vec::new(),
                }
            }
        }
    }

    /// Recursive entry used for include expansion: same pass semantics,
    /// but discovered nodes carry the enclosing macro as their parent.
    pub(crate) fn process_fragment<'a>(
        &'a self,
        html: &'a str,
        ctx: &'a ProcessingContext,
        parent_macro: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ProcessingResult, ConversionError>> {
        async move {
            let pass_started = Instant::now();
            let prepared = convert_html_entities(html);
            let tree = self.parser.parse(&prepared)?;

            let mut nodes = discover_macro_nodes(&tree, ctx.recursion_depth, parent_macro);
            for node in &mut nodes {
                node.priority = self
                    .registry
                    .resolve(node)
                    .map(|r| r.priority)
                    .unwrap_or_default();
            }
            log::debug!(
                "[{}] Discovered {} macro node(s) at depth {} in page {}",
                ctx.session_id,
                nodes.len(),
                ctx.recursion_depth,
                ctx.page_id
            );

            let sink = StatsSink::new();
            let outcomes = if ctx.concurrency_enabled && nodes.len() > 1 {
                self.dispatch_concurrently(&nodes, ctx, &sink).await
            } else {
                let mut outcomes = Vec::with_capacity(nodes.len());
                for node in &nodes {
                    outcomes.push(self.process_one(node, ctx, &sink).await);
                }
                outcomes
            };

            // Reassemble in recorded-position order: concurrency must not
            // leak into document ordering.
            let mut output =
                String::with_capacity(prepared.len() + nodes.len() * CHARS_PER_MACRO_ESTIMATE);
            let mut errors = Vec::new();
            let mut fallbacks_used = Vec::new();
            let mut cursor = 0;
            for (node, outcome) in nodes.iter().zip(outcomes) {
                let start = node.position.start.clamp(cursor, prepared.len());
                let end = node.position.end.clamp(start, prepared.len());
                output.push_str(&prepared[cursor..start]);
                output.push_str(&outcome.replacement);
                cursor = end;

                if let Some(error) = outcome.error {
                    errors.push(error);
                }
                if let Some(record) = outcome.fallback {
                    fallbacks_used.push(record);
                }
            }
            output.push_str(&prepared[cursor..]);

            let stats = sink.snapshot();
            log::info!(
                "[{}] Converted page {}: {} macro(s), {} degraded, {} skipped in {:?}",
                ctx.session_id,
                ctx.page_id,
                stats.total,
                stats.failed,
                stats.skipped,
                pass_started.elapsed()
            );

            Ok(ProcessingResult {
                success: true,
                processed_content: output,
                stats,
                errors,
                fallbacks_used,
            })
        }
        .boxed()
    }

    async fn dispatch_concurrently(
        &self,
        nodes: &[MacroNode],
        ctx: &ProcessingContext,
        sink: &StatsSink,
    ) -> Vec<NodeOutcome> {
        let bound = self.config.max_concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(bound));
        join_all(nodes.iter().map(|node| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // The semaphore is never closed while the pass runs.
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("macro dispatch semaphore closed");
                self.process_one(node, ctx, sink).await
            }
        }))
        .await
    }

    /// Dispatch one node through the registry, racing its timeout.
    async fn process_one(
        &self,
        node: &MacroNode,
        ctx: &ProcessingContext,
        sink: &StatsSink,
    ) -> NodeOutcome {
        let Some(registration) = self.registry.resolve(node) else {
            return self.handle_unknown(node, sink);
        };

        let processor = Arc::clone(&registration.processor);
        let started = Instant::now();
        // Losing the race drops the processing future, cancelling any
        // in-flight fetch at its next suspension point.
        let raced = tokio::time::timeout(ctx.timeout, processor.process(node, ctx, self)).await;
        let latency = started.elapsed();

        match raced {
            Ok(Ok(replacement)) => {
                sink.record(&node.macro_type, latency, true);
                NodeOutcome {
                    replacement,
                    error: None,
                    fallback: None,
                }
            }
            Ok(Err(error)) => self.degrade(node, error, latency, sink),
            Err(_) => self.degrade(
                node,
                MacroError::new(
                    MacroErrorKind::Timeout,
                    format!("processing exceeded {:?}", ctx.timeout),
                ),
                latency,
                sink,
            ),
        }
    }

    fn handle_unknown(&self, node: &MacroNode, sink: &StatsSink) -> NodeOutcome {
        if self.config.preserve_unknown_macros {
            log::debug!(
                "Unknown macro '{}' preserved verbatim at {}..{}",
                node.macro_type,
                node.position.start,
                node.position.end
            );
            sink.record_skipped();
            return NodeOutcome {
                replacement: node.raw_content.clone(),
                error: None,
                fallback: None,
            };
        }

        let error = MacroError::new(
            MacroErrorKind::UnsupportedMacro,
            format!("no processor registered for '{}'", node.macro_type),
        );
        self.degrade(node, error, Duration::ZERO, sink)
    }

    /// Convert a node-level failure to fallback content plus records.
    fn degrade(
        &self,
        node: &MacroNode,
        error: MacroError,
        latency: Duration,
        sink: &StatsSink,
    ) -> NodeOutcome {
        sink.record(&node.macro_type, latency, false);
        let (replacement, record) = self.fallback.resolve(node, &error);
        NodeOutcome {
            replacement,
            error: Some(ProcessingError {
                macro_type: node.macro_type.clone(),
                kind: error.kind,
                message: error.message,
                position: node.position,
            }),
            fallback: Some(record),
        }
    }
}
