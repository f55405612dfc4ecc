// src/processors/table.rs
//! Table handling: pipe tables where lossless, original markup otherwise.
//!
//! Markdown pipe tables cannot express merged cells or sort affordances.
//! When a table uses either, rewriting would lose information, so the
//! original markup is preserved verbatim instead.

use super::MacroProcessor;
use crate::dom::HtmlNode;
use crate::engine::{MacroEngine, ProcessingContext};
use crate::error::MacroError;
use crate::model::MacroNode;
use async_trait::async_trait;

/// Processor for tables: both `<table>` elements and table macros.
#[derive(Debug, Default)]
pub struct TableMacroProcessor;

impl TableMacroProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MacroProcessor for TableMacroProcessor {
    fn macro_type(&self) -> &str {
        "table"
    }

    /// Low priority: this processor's claim (anything table-shaped) is
    /// broad, so macro-specific processors must win scans.
    fn priority(&self) -> i32 {
        5
    }

    fn can_handle(&self, node: &MacroNode) -> bool {
        node.macro_type == "table" || node.element.is_tag("table")
    }

    async fn process(
        &self,
        node: &MacroNode,
        _ctx: &ProcessingContext,
        _engine: &MacroEngine,
    ) -> Result<String, MacroError> {
        let table = if node.element.is_tag("table") {
            &node.element
        } else {
            node.element
                .find_descendant("table")
                .ok_or_else(|| MacroError::failed("table macro carries no table content"))?
        };

        if table.has_merged_cells() || has_sort_affordance(table) {
            log::debug!(
                "Table at {}..{} uses merged cells or sorting; preserving markup",
                node.position.start,
                node.position.end
            );
            return Ok(node.raw_content.clone());
        }

        render_pipe_table(table)
            .ok_or_else(|| MacroError::failed("table has no renderable rows"))
    }
}

/// Whether the table advertises interactive sorting.
fn has_sort_affordance(table: &HtmlNode) -> bool {
    let sortable = |n: &HtmlNode| {
        n.attrs
            .get("class")
            .is_some_and(|c| c.contains("sortable"))
            || n.attr("sortable").is_some()
    };
    sortable(table) || table.descendant_matches(&sortable)
}

/// Render a table element as a Markdown pipe table.
///
/// The first row serves as the header. Returns `None` for tables with
/// no rows or no cells.
pub(crate) fn render_pipe_table(table: &HtmlNode) -> Option<String> {
    let mut rows = Vec::new();
    collect_rows(table, &mut rows);

    let cells: Vec<Vec<String>> = rows.iter().map(|row| row_cells(row)).collect();
    let width = cells.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return None;
    }

    let mut lines = Vec::with_capacity(cells.len() + 1);
    for (i, row) in cells.iter().enumerate() {
        let mut padded = row.clone();
        padded.resize(width, String::new());
        lines.push(format!("| {} |", padded.join(" | ")));
        if i == 0 {
            lines.push(format!("|{}", " --- |".repeat(width)));
        }
    }
    Some(lines.join("\n"))
}

fn collect_rows<'a>(element: &'a HtmlNode, out: &mut Vec<&'a HtmlNode>) {
    for child in &element.children {
        if child.is_tag("tr") {
            out.push(child);
        } else if child.is_tag("thead") || child.is_tag("tbody") || child.is_tag("tfoot") {
            collect_rows(child, out);
        }
    }
}

fn row_cells(row: &HtmlNode) -> Vec<String> {
    row.children
        .iter()
        .filter(|c| c.is_tag("th") || c.is_tag("td"))
        .map(|cell| {
            cell.flattened_text()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .replace('|', "\\|")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StorageXmlParser;
    use crate::engine::tests_support::{bare_engine, root_context};
    use crate::model::discover_macro_nodes;
    use pretty_assertions::assert_eq;

    async fn render(html: &str) -> String {
        let tree = StorageXmlParser::new().parse(html).unwrap();
        let node = discover_macro_nodes(&tree, 0, None).remove(0);
        TableMacroProcessor::new()
            .process(&node, &root_context(), &bare_engine())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn simple_table_becomes_pipe_table() {
        let out = render(
            "<table><thead><tr><th>Name</th><th>Age</th></tr></thead><tbody><tr><td>Ada</td><td>36</td></tr></tbody></table>",
        )
        .await;
        assert_eq!(out, "| Name | Age |\n| --- | --- |\n| Ada | 36 |");
    }

    #[tokio::test]
    async fn ragged_rows_are_padded() {
        let out = render("<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>").await;
        assert_eq!(out, "| a | b |\n| --- | --- |\n| c |  |");
    }

    #[tokio::test]
    async fn merged_cells_preserve_original_markup() {
        let html = r#"<table><tr><td rowspan="2">a</td><td>b</td></tr><tr><td>c</td></tr></table>"#;
        let out = render(html).await;
        assert_eq!(out, html);
    }

    #[tokio::test]
    async fn sortable_tables_preserve_original_markup() {
        let html = r#"<table class="confluenceTable sortable"><tr><td>a</td></tr></table>"#;
        let out = render(html).await;
        assert_eq!(out, html);
    }

    #[tokio::test]
    async fn cell_pipes_are_escaped() {
        let out = render("<table><tr><td>a|b</td></tr></table>").await;
        assert_eq!(out, "| a\\|b |\n| --- |");
    }
}
