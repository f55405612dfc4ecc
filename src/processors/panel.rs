// src/processors/panel.rs
//! Admonition panel family: info, note, tip, warning, error.
//!
//! Each subtype maps to an icon plus a blockquote; multi-line bodies are
//! blockquote-prefixed per line so the panel stays visually grouped.

use super::MacroProcessor;
use crate::constants::PANEL_ICONS;
use crate::engine::{MacroEngine, ProcessingContext};
use crate::error::MacroError;
use crate::model::MacroNode;
use async_trait::async_trait;

/// The admonition subtypes Confluence ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Info,
    Note,
    Tip,
    Warning,
    Error,
}

impl PanelKind {
    pub fn all() -> &'static [PanelKind] {
        &[
            PanelKind::Info,
            PanelKind::Note,
            PanelKind::Tip,
            PanelKind::Warning,
            PanelKind::Error,
        ]
    }

    pub fn macro_type(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    fn icon(self) -> &'static str {
        PANEL_ICONS
            .iter()
            .find(|(name, _)| *name == self.macro_type())
            .map(|(_, icon)| *icon)
            .unwrap_or("\u{2139}\u{fe0f}")
    }
}

/// Processor for one admonition subtype; registered once per kind.
#[derive(Debug)]
pub struct PanelMacroProcessor {
    kind: PanelKind,
}

impl PanelMacroProcessor {
    pub fn new(kind: PanelKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl MacroProcessor for PanelMacroProcessor {
    fn macro_type(&self) -> &str {
        self.kind.macro_type()
    }

    fn priority(&self) -> i32 {
        10
    }

    async fn process(
        &self,
        node: &MacroNode,
        _ctx: &ProcessingContext,
        _engine: &MacroEngine,
    ) -> Result<String, MacroError> {
        // Rich bodies are flattened to text; a panel is prose, not markup.
        let body = node
            .element
            .find_child("rich-text-body")
            .map(|rich| rich.flattened_text())
            .unwrap_or_else(|| node.body.clone());
        let body = body.trim();
        let title = node.parameter_text("title");

        let mut lines = Vec::new();
        let mut first_prefix = format!("> {}", self.kind.icon());
        if let Some(title) = title {
            first_prefix.push_str(&format!(" **{title}**"));
            lines.push(first_prefix);
            for line in body.lines() {
                lines.push(format!("> {}", line.trim()));
            }
        } else {
            let mut body_lines = body.lines();
            match body_lines.next() {
                Some(first) => lines.push(format!("{first_prefix} {}", first.trim())),
                None => lines.push(first_prefix),
            }
            for line in body_lines {
                lines.push(format!("> {}", line.trim()));
            }
        }

        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StorageXmlParser;
    use crate::engine::tests_support::{bare_engine, root_context};
    use crate::model::discover_macro_nodes;
    use pretty_assertions::assert_eq;

    async fn render(html: &str, kind: PanelKind) -> String {
        let tree = StorageXmlParser::new().parse(html).unwrap();
        let node = discover_macro_nodes(&tree, 0, None).remove(0);
        PanelMacroProcessor::new(kind)
            .process(&node, &root_context(), &bare_engine())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn info_panel_gets_icon_and_blockquote() {
        let out = render(
            r#"<ac:structured-macro ac:name="info"><ac:rich-text-body><p>Heads up.</p></ac:rich-text-body></ac:structured-macro>"#,
            PanelKind::Info,
        )
        .await;
        assert_eq!(out, "> \u{2139}\u{fe0f} Heads up.");
    }

    #[tokio::test]
    async fn multiline_bodies_are_prefixed_per_line() {
        let out = render(
            r#"<ac:structured-macro ac:name="warning"><ac:plain-text-body><![CDATA[first
second]]></ac:plain-text-body></ac:structured-macro>"#,
            PanelKind::Warning,
        )
        .await;
        assert_eq!(out, "> \u{26a0}\u{fe0f} first\n> second");
    }

    #[tokio::test]
    async fn titled_panel_bolds_the_title_line() {
        let out = render(
            r#"<ac:structured-macro ac:name="tip"><ac:parameter ac:name="title">Shortcut</ac:parameter><ac:rich-text-body><p>Use x.</p></ac:rich-text-body></ac:structured-macro>"#,
            PanelKind::Tip,
        )
        .await;
        assert_eq!(out, "> \u{1f4a1} **Shortcut**\n> Use x.");
    }
}
