// src/engine/fallback.rs
//! Fallback strategy selection and replacement-content generation.
//!
//! When a macro cannot be converted, the resolver maps the error kind
//! plus the configured strategy to replacement content. Replacement
//! content is a pure function of the node, the error, and the strategy,
//! so identical inputs always degrade to byte-identical output.

use crate::error::{MacroError, MacroErrorKind};
use crate::model::{MacroNode, Span};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;

/// Configured policy for replacing unprocessable macro content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackStrategy {
    /// Keep the original storage-format markup verbatim (lossless).
    #[default]
    PreserveHtml,
    /// Flatten the element to its visible text.
    ConvertToText,
    /// Replace with a human-diffable comment carrying type, error, and
    /// extracted parameters.
    AddComment,
    /// Drop the macro from the output.
    Skip,
}

impl fmt::Display for FallbackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PreserveHtml => "preserve-html",
            Self::ConvertToText => "convert-to-text",
            Self::AddComment => "add-comment",
            Self::Skip => "skip",
        };
        f.write_str(name)
    }
}

/// One fallback application, recorded in the conversion result.
///
/// Append-only; accumulated per pass and discarded with it.
#[derive(Debug, Clone)]
pub struct FallbackRecord {
    pub macro_type: String,
    pub original_error_kind: MacroErrorKind,
    pub strategy_used: FallbackStrategy,
    pub fallback_content: String,
    pub timestamp: DateTime<Utc>,
    pub position: Span,
}

/// Maps an error kind plus configured strategy to replacement content.
#[derive(Debug, Clone, Default)]
pub struct FallbackResolver {
    default_strategy: FallbackStrategy,
    per_macro: HashMap<String, FallbackStrategy>,
}

impl FallbackResolver {
    pub fn new(
        default_strategy: FallbackStrategy,
        per_macro: HashMap<String, FallbackStrategy>,
    ) -> Self {
        Self {
            default_strategy,
            per_macro,
        }
    }

    /// The strategy that applies to a macro type.
    pub fn strategy_for(&self, macro_type: &str) -> FallbackStrategy {
        self.per_macro
            .get(macro_type)
            .copied()
            .unwrap_or(self.default_strategy)
    }

    /// Produce replacement content plus its record for a failed node.
    pub fn resolve(&self, node: &MacroNode, error: &MacroError) -> (String, FallbackRecord) {
        let strategy = self.strategy_for(&node.macro_type);
        let content = match strategy {
            FallbackStrategy::PreserveHtml => node.raw_content.clone(),
            FallbackStrategy::ConvertToText => node.element.flattened_text().trim().to_string(),
            FallbackStrategy::AddComment => degraded_comment(node, error),
            FallbackStrategy::Skip => String::new(),
        };

        log::debug!(
            "Degrading macro '{}' at {}..{} via {} after {}",
            node.macro_type,
            node.position.start,
            node.position.end,
            strategy,
            error
        );

        let record = FallbackRecord {
            macro_type: node.macro_type.clone(),
            original_error_kind: error.kind,
            strategy_used: strategy,
            fallback_content: content.clone(),
            timestamp: Utc::now(),
            position: node.position,
        };
        (content, record)
    }
}

/// Reconstruct a human-diffable comment for an unconvertible macro.
///
/// Carries the macro type, the error, and the extracted parameters, so
/// no information silently disappears from the output. Parameters render
/// in document order, keeping the comment deterministic.
pub fn degraded_comment(node: &MacroNode, error: &MacroError) -> String {
    let mut comment = String::with_capacity(128);
    write!(
        comment,
        "<!-- macro:{} error:{}",
        node.macro_type, error.kind
    )
    .unwrap();
    if !error.message.is_empty() {
        write!(comment, " ({})", error.message).unwrap();
    }
    if !node.parameters.is_empty() {
        comment.push_str(" params:");
        for (name, value) in &node.parameters {
            let shown = if name.is_empty() { "default" } else { name };
            write!(comment, " {shown}={value}").unwrap();
        }
    }
    comment.push_str(" -->");
    comment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StorageXmlParser;
    use crate::model::discover_macro_nodes;
    use pretty_assertions::assert_eq;

    fn sample_node() -> MacroNode {
        let tree = StorageXmlParser::new()
            .parse(
                r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">rust</ac:parameter><ac:plain-text-body><![CDATA[x]]></ac:plain-text-body></ac:structured-macro>"#,
            )
            .unwrap();
        discover_macro_nodes(&tree, 0, None).remove(0)
    }

    fn timeout_error() -> MacroError {
        MacroError::new(MacroErrorKind::Timeout, "exceeded 10s")
    }

    #[test]
    fn preserve_html_is_lossless() {
        let node = sample_node();
        let resolver = FallbackResolver::default();
        let (content, record) = resolver.resolve(&node, &timeout_error());

        assert_eq!(content, node.raw_content);
        assert_eq!(record.strategy_used, FallbackStrategy::PreserveHtml);
        assert_eq!(record.original_error_kind, MacroErrorKind::Timeout);
    }

    #[test]
    fn comment_carries_type_error_and_parameters() {
        let node = sample_node();
        let resolver = FallbackResolver::new(FallbackStrategy::AddComment, HashMap::new());
        let (content, _) = resolver.resolve(&node, &timeout_error());

        assert_eq!(
            content,
            "<!-- macro:code error:TIMEOUT (exceeded 10s) params: language=rust -->"
        );
    }

    #[test]
    fn per_macro_strategy_overrides_default() {
        let mut per_macro = HashMap::new();
        per_macro.insert("code".to_string(), FallbackStrategy::Skip);
        let resolver = FallbackResolver::new(FallbackStrategy::AddComment, per_macro);

        let (content, record) = resolver.resolve(&sample_node(), &timeout_error());
        assert_eq!(content, "");
        assert_eq!(record.strategy_used, FallbackStrategy::Skip);
    }

    #[test]
    fn replacement_content_is_deterministic() {
        let node = sample_node();
        let resolver = FallbackResolver::new(FallbackStrategy::AddComment, HashMap::new());
        let (first, _) = resolver.resolve(&node, &timeout_error());
        let (second, _) = resolver.resolve(&node, &timeout_error());
        assert_eq!(first, second);
    }
}
