// src/dom/tree.rs
//! Tree node representation for parsed storage-format markup.

use indexmap::IndexMap;

/// Confluence `ac:` namespace URI.
pub const AC_NAMESPACE: &str = "http://www.atlassian.com/schema/confluence/4/ac/";

/// Node in a parsed storage-format tree.
///
/// Follows the tag/text/tail shape: `text` is the content before the
/// first child, `tail` is the content following this element inside its
/// parent. Attributes keep document order so re-serialization is
/// byte-stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HtmlNode {
    /// Element tag name, including any namespace prefix (`ac:structured-macro`).
    pub tag: String,
    /// Direct text content.
    pub text: String,
    /// Text after the element (XML tail).
    pub tail: String,
    /// Element attributes in document order.
    pub attrs: IndexMap<String, String>,
    /// Child nodes.
    pub children: Vec<HtmlNode>,
    /// Raw CDATA payload, if the element's text arrived in a CDATA section.
    pub cdata: Option<String>,
    /// Byte span of this element in the parsed fragment (start, end).
    pub span: (usize, usize),
}

impl HtmlNode {
    /// Create a new node with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute, preserving insertion order.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Set children.
    pub fn with_children(mut self, children: Vec<HtmlNode>) -> Self {
        self.children = children;
        self
    }

    /// Look up an attribute under any of the spellings Confluence markup
    /// uses for namespaced names: `ac:name`, `{uri}name`, or plain `name`.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .get(&format!("ac:{local}"))
            .or_else(|| self.attrs.get(&format!("{{{AC_NAMESPACE}}}{local}")))
            .or_else(|| self.attrs.get(local))
            .map(String::as_str)
    }

    /// Whether the tag matches a local name regardless of namespace spelling.
    pub fn is_tag(&self, local: &str) -> bool {
        self.tag == local
            || self.tag == format!("ac:{local}")
            || self.tag == format!("ri:{local}")
            || self.tag == format!("{{{AC_NAMESPACE}}}{local}")
    }

    /// Whether this node is a `<ac:structured-macro>` element.
    pub fn is_structured_macro(&self) -> bool {
        self.is_tag("structured-macro")
    }

    /// The macro name of a structured-macro element (`ac:name` attribute).
    pub fn macro_name(&self) -> Option<&str> {
        if self.is_structured_macro() {
            self.attr("name")
        } else {
            None
        }
    }

    /// First child whose tag matches the local name.
    pub fn find_child(&self, local: &str) -> Option<&HtmlNode> {
        self.children.iter().find(|c| c.is_tag(local))
    }

    /// All children whose tag matches the local name.
    pub fn find_children(&self, local: &str) -> Vec<&HtmlNode> {
        self.children.iter().filter(|c| c.is_tag(local)).collect()
    }

    /// First descendant (depth-first) whose tag matches the local name.
    pub fn find_descendant(&self, local: &str) -> Option<&HtmlNode> {
        for child in &self.children {
            if child.is_tag(local) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(local) {
                return Some(found);
            }
        }
        None
    }

    /// Flattened text of this node and all descendants, tails included.
    pub fn flattened_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
            out.push_str(&child.tail);
        }
    }

    /// Whether any cell-bearing descendant carries a merged-cell attribute.
    pub fn has_merged_cells(&self) -> bool {
        self.descendant_matches(&|n| {
            n.attrs
                .keys()
                .any(|k| k == "rowspan" || k == "colspan" || k.ends_with(":rowspan"))
        })
    }

    /// Depth-first predicate search over descendants.
    pub fn descendant_matches(&self, pred: &dyn Fn(&HtmlNode) -> bool) -> bool {
        self.children
            .iter()
            .any(|c| pred(c) || c.descendant_matches(pred))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn macro_node(name: &str) -> HtmlNode {
        HtmlNode::new("ac:structured-macro").with_attr("ac:name", name)
    }

    #[test]
    fn attr_resolves_namespace_spellings() {
        let prefixed = HtmlNode::new("ac:structured-macro").with_attr("ac:name", "code");
        let uri = HtmlNode::new("ac:structured-macro")
            .with_attr(format!("{{{AC_NAMESPACE}}}name"), "code");
        let plain = HtmlNode::new("ac:structured-macro").with_attr("name", "code");

        assert_eq!(prefixed.attr("name"), Some("code"));
        assert_eq!(uri.attr("name"), Some("code"));
        assert_eq!(plain.attr("name"), Some("code"));
    }

    #[test]
    fn macro_name_requires_structured_macro_tag() {
        assert_eq!(macro_node("info").macro_name(), Some("info"));
        let p = HtmlNode::new("p").with_attr("ac:name", "info");
        assert_eq!(p.macro_name(), None);
    }

    #[test]
    fn flattened_text_includes_tails() {
        let strong = HtmlNode::new("strong").with_text("Bold");
        let mut p = HtmlNode::new("p").with_text("Before ");
        let mut s = strong;
        s.tail = " after".to_string();
        p.children.push(s);

        assert_eq!(p.flattened_text(), "Before Bold after");
    }

    #[test]
    fn merged_cell_detection_sees_nested_spans() {
        let td = HtmlNode::new("td").with_attr("rowspan", "2");
        let tr = HtmlNode::new("tr").with_children(vec![td]);
        let table = HtmlNode::new("table").with_children(vec![tr]);

        assert!(table.has_merged_cells());
        assert!(!HtmlNode::new("table").has_merged_cells());
    }
}
