// src/model/macro_node.rs
//! Discovered macro nodes and document scanning.

use super::parameters::{extract_body, extract_parameters, ParameterValue};
use crate::dom::{serialize_fragment, HtmlNode};
use indexmap::IndexMap;

/// Byte span of a macro element within its document fragment.
///
/// Spans order macros within a pass and anchor error reports; they are
/// relative to the entity-converted fragment the pass parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// One macro-shaped element lifted out of a document.
///
/// Immutable after creation; belongs to exactly one document pass.
#[derive(Debug, Clone)]
pub struct MacroNode {
    /// Macro type key (`code`, `info`, `include`, ...). Plain tables are
    /// macro-shaped too and discovered under the `table` type.
    pub macro_type: String,
    /// The element subtree as parsed.
    pub element: HtmlNode,
    /// Typed parameters in document order.
    pub parameters: IndexMap<String, ParameterValue>,
    /// The original markup of the whole element, for lossless fallback.
    pub raw_content: String,
    /// Extracted body: literal text for plain bodies, markup for rich ones.
    pub body: String,
    /// The CDATA payload, when the body arrived in one.
    pub cdata_content: Option<String>,
    /// Where the element sat in the fragment.
    pub position: Span,
    /// Claiming processor's priority; filled in at dispatch resolution.
    pub priority: i32,
    /// How many macro expansions deep this node was discovered.
    pub nesting_level: u8,
    /// Type of the enclosing macro when discovered inside resolved output.
    pub parent_macro: Option<String>,
}

impl MacroNode {
    /// Build a node from a macro-shaped element.
    fn from_element(
        macro_type: &str,
        element: &HtmlNode,
        nesting_level: u8,
        parent_macro: Option<&str>,
    ) -> Self {
        let extracted = extract_body(element);
        Self {
            macro_type: macro_type.to_string(),
            parameters: extract_parameters(element),
            raw_content: serialize_fragment(element),
            body: extracted.content,
            cdata_content: extracted.cdata,
            position: Span::new(element.span.0, element.span.1),
            priority: 0,
            nesting_level,
            parent_macro: parent_macro.map(str::to_string),
            element: element.clone(),
        }
    }

    /// Parameter value by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters.get(name)
    }

    /// Parameter rendered to text, when present and non-empty.
    pub fn parameter_text(&self, name: &str) -> Option<String> {
        self.parameters
            .get(name)
            .filter(|v| !v.is_empty())
            .map(ParameterValue::to_text)
    }
}

/// Scan a parsed fragment for macro-shaped nodes in document order.
///
/// Only outermost macros are discovered: the content of a macro body is
/// the claiming processor's business (the include processor feeds its
/// resolved output back through the orchestrator, which scans again at
/// `nesting_level + 1`). Layout containers are descended through so
/// macros inside sections and divs are not missed.
pub fn discover_macro_nodes(
    root: &HtmlNode,
    nesting_level: u8,
    parent_macro: Option<&str>,
) -> Vec<MacroNode> {
    let mut nodes = Vec::new();
    for child in &root.children {
        collect_macros(child, nesting_level, parent_macro, &mut nodes);
    }
    nodes
}

fn collect_macros(
    element: &HtmlNode,
    nesting_level: u8,
    parent_macro: Option<&str>,
    out: &mut Vec<MacroNode>,
) {
    if let Some(name) = element.macro_name() {
        out.push(MacroNode::from_element(
            name,
            element,
            nesting_level,
            parent_macro,
        ));
        return;
    }

    if element.is_tag("table") {
        out.push(MacroNode::from_element(
            "table",
            element,
            nesting_level,
            parent_macro,
        ));
        return;
    }

    for child in &element.children {
        collect_macros(child, nesting_level, parent_macro, out);
    }
}
