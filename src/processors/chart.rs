// src/processors/chart.rs
//! Chart macro: degraded to its underlying data table.
//!
//! Markdown cannot represent charts. The chart macro's body carries the
//! source data as a table, so the data survives as a pipe table with a
//! caption naming the chart that used to render it.

use super::table::render_pipe_table;
use super::MacroProcessor;
use crate::engine::{MacroEngine, ProcessingContext};
use crate::error::MacroError;
use crate::model::MacroNode;
use async_trait::async_trait;

/// Processor for `chart` macros.
#[derive(Debug, Default)]
pub struct ChartMacroProcessor;

impl ChartMacroProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MacroProcessor for ChartMacroProcessor {
    fn macro_type(&self) -> &str {
        "chart"
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
        let table = node
            .element
            .find_descendant("table")
            .ok_or_else(|| MacroError::failed("chart macro carries no data table"))?;
        let rendered = render_pipe_table(table)
            .ok_or_else(|| MacroError::failed("chart data table has no rows"))?;

        let chart_type = node.parameter_text("type").unwrap_or_else(|| "chart".to_string());
        let caption = match node.parameter_text("title") {
            Some(title) => format!("*{title} ({chart_type})*"),
            None => format!("*({chart_type})*"),
        };

        Ok(format!(
            "<!-- chart rendered as its data table -->\n{caption}\n\n{rendered}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StorageXmlParser;
    use crate::engine::tests_support::{bare_engine, root_context};
    use crate::error::MacroErrorKind;
    use crate::model::discover_macro_nodes;
    use pretty_assertions::assert_eq;

    fn chart_node(html: &str) -> MacroNode {
        let tree = StorageXmlParser::new().parse(html).unwrap();
        discover_macro_nodes(&tree, 0, None).remove(0)
    }

    #[tokio::test]
    async fn chart_degrades_to_captioned_data_table() {
        let node = chart_node(
            r#"<ac:structured-macro ac:name="chart"><ac:parameter ac:name="type">pie</ac:parameter><ac:parameter ac:name="title">Sales</ac:parameter><ac:rich-text-body><table><tr><th>Region</th><th>Total</th></tr><tr><td>EU</td><td>10</td></tr></table></ac:rich-text-body></ac:structured-macro>"#,
        );
        let out = ChartMacroProcessor::new()
            .process(&node, &root_context(), &bare_engine())
            .await
            .unwrap();

        assert_eq!(
            out,
            "<!-- chart rendered as its data table -->\n*Sales (pie)*\n\n| Region | Total |\n| --- | --- |\n| EU | 10 |"
        );
    }

    #[tokio::test]
    async fn chart_without_data_fails_processing() {
        let node = chart_node(
            r#"<ac:structured-macro ac:name="chart"><ac:rich-text-body><p>no data</p></ac:rich-text-body></ac:structured-macro>"#,
        );
        let err = ChartMacroProcessor::new()
            .process(&node, &root_context(), &bare_engine())
            .await
            .unwrap_err();
        assert_eq!(err.kind, MacroErrorKind::ProcessingFailed);
    }
}
