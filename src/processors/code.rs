// src/processors/code.rs
//! Code macro: fenced block with language, title, and disclosure handling.

use super::MacroProcessor;
use crate::engine::{MacroEngine, ProcessingContext};
use crate::error::MacroError;
use crate::model::MacroNode;
use async_trait::async_trait;
use std::fmt::Write;

/// Processor for `code` macros.
#[derive(Debug, Default)]
pub struct CodeMacroProcessor;

impl CodeMacroProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MacroProcessor for CodeMacroProcessor {
    fn macro_type(&self) -> &str {
        "code"
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
        let body = node
            .cdata_content
            .as_deref()
            .unwrap_or(&node.body)
            .trim_end_matches('\n');
        let language = node.parameter_text("language").unwrap_or_default();
        let title = node.parameter_text("title");
        let line_numbers = node
            .parameter("linenumbers")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let collapse = node
            .parameter("collapse")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let fenced = format!("```{language}\n{body}\n```");

        let mut out = String::with_capacity(fenced.len() + 64);
        if collapse {
            let summary = title.as_deref().unwrap_or("Code");
            write!(
                out,
                "<details>\n<summary>{summary}</summary>\n\n{fenced}\n</details>"
            )
            .unwrap();
        } else {
            if let Some(title) = &title {
                writeln!(out, "<!-- {title} -->").unwrap();
            }
            out.push_str(&fenced);
        }

        if line_numbers {
            // Markdown has no native line numbering; keep the fact visible.
            out.push_str("\n<!-- line numbers were shown in the source -->");
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests_support::{bare_engine, root_context};
    use crate::model::discover_macro_nodes;
    use crate::dom::StorageXmlParser;
    use pretty_assertions::assert_eq;

    fn code_node(html: &str) -> MacroNode {
        let tree = StorageXmlParser::new().parse(html).unwrap();
        discover_macro_nodes(&tree, 0, None).remove(0)
    }

    #[tokio::test]
    async fn titled_block_matches_expected_shape() {
        let node = code_node(
            r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">javascript</ac:parameter><ac:parameter ac:name="title">Demo</ac:parameter><ac:plain-text-body><![CDATA[console.log('x')]]></ac:plain-text-body></ac:structured-macro>"#,
        );
        let engine = bare_engine();
        let out = CodeMacroProcessor::new()
            .process(&node, &root_context(), &engine)
            .await
            .unwrap();

        assert!(out.contains("<!-- Demo -->\n```javascript\nconsole.log('x')\n```"));
    }

    #[tokio::test]
    async fn collapse_wraps_in_disclosure() {
        let node = code_node(
            r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="title">Long</ac:parameter><ac:parameter ac:name="collapse">true</ac:parameter><ac:plain-text-body><![CDATA[x]]></ac:plain-text-body></ac:structured-macro>"#,
        );
        let engine = bare_engine();
        let out = CodeMacroProcessor::new()
            .process(&node, &root_context(), &engine)
            .await
            .unwrap();

        assert_eq!(
            out,
            "<details>\n<summary>Long</summary>\n\n```\nx\n```\n</details>"
        );
    }

    #[tokio::test]
    async fn line_numbers_leave_a_note() {
        let node = code_node(
            r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="linenumbers">true</ac:parameter><ac:plain-text-body><![CDATA[x]]></ac:plain-text-body></ac:structured-macro>"#,
        );
        let engine = bare_engine();
        let out = CodeMacroProcessor::new()
            .process(&node, &root_context(), &engine)
            .await
            .unwrap();

        assert!(out.ends_with("<!-- line numbers were shown in the source -->"));
    }
}
