// src/dom/serializer.rs
//! Storage-format serializer with CDATA support.

use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;

use super::tree::HtmlNode;

/// Pattern for matching plain-text-body elements whose CDATA must be restored.
static PLAIN_TEXT_BODY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)(<(?:ac:|ns\d+:)?plain-text-body[^>]*>)(.*?)(</(?:ac:|ns\d+:)?plain-text-body>)",
    )
    .expect("invalid plain-text-body regex")
});

/// Serialize `HtmlNode` trees back to Confluence storage format.
pub struct StorageXmlSerializer;

impl StorageXmlSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Serialize a parsed tree to markup.
    ///
    /// The root wrapper element is skipped, and CDATA sections are
    /// restored for `ac:plain-text-body` elements so code payloads
    /// survive a parse/serialize round trip byte-for-byte.
    pub fn serialize(&self, tree: &HtmlNode) -> String {
        let mut out = String::with_capacity(4096);

        for child in &tree.children {
            serialize_node(child, &mut out);
        }

        restore_cdata_sections(&out)
    }
}

impl Default for StorageXmlSerializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a single element (not a root wrapper) to markup.
pub fn serialize_fragment(node: &HtmlNode) -> String {
    let mut out = String::with_capacity(1024);
    serialize_node_no_tail(node, &mut out);
    restore_cdata_sections(&out)
}

fn serialize_node(node: &HtmlNode, out: &mut String) {
    serialize_node_no_tail(node, out);

    if !node.tail.is_empty() {
        out.push_str(&escape_text(&node.tail));
    }
}

fn serialize_node_no_tail(node: &HtmlNode, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag);

    // IndexMap preserves document order, keeping output byte-stable.
    for (key, value) in &node.attrs {
        write!(out, r#" {}="{}""#, key, escape_attr(value)).unwrap();
    }

    if node.children.is_empty() && node.text.is_empty() {
        out.push_str(" />");
    } else {
        out.push('>');

        if !node.text.is_empty() {
            out.push_str(&escape_text(&node.text));
        }

        for child in &node.children {
            serialize_node(child, out);
        }

        write!(out, "</{}>", node.tag).unwrap();
    }
}

/// Escape text for XML content.
fn escape_text(text: &str) -> String {
    escape_xml(text, false)
}

/// Escape text for XML attribute values.
fn escape_attr(text: &str) -> String {
    escape_xml(text, true)
}

fn escape_xml(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            '\'' if escape_quotes => result.push_str("&apos;"),
            _ => result.push(ch),
        }
    }
    result
}

/// Restore CDATA sections for plain-text-body elements.
fn restore_cdata_sections(html: &str) -> String {
    PLAIN_TEXT_BODY_PATTERN
        .replace_all(html, |caps: &regex::Captures| {
            let tag_start = &caps[1];
            let content = &caps[2];
            let tag_end = &caps[3];

            // Unescape XML entities that were escaped during serialization
            let content = content
                .replace("&lt;", "<")
                .replace("&gt;", ">")
                .replace("&quot;", "\"")
                .replace("&apos;", "'")
                .replace("&amp;", "&");

            format!("{tag_start}<![CDATA[{content}]]>{tag_end}")
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StorageXmlParser;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_simple_element() {
        let root =
            HtmlNode::new("root").with_children(vec![HtmlNode::new("p").with_text("Hello")]);

        assert_eq!(StorageXmlSerializer::new().serialize(&root), "<p>Hello</p>");
    }

    #[test]
    fn serializes_tail_text() {
        let mut strong = HtmlNode::new("strong").with_text("Bold");
        strong.tail = " text".to_string();
        let p = HtmlNode::new("p").with_children(vec![strong]);
        let root = HtmlNode::new("root").with_children(vec![p]);

        assert_eq!(
            StorageXmlSerializer::new().serialize(&root),
            "<p><strong>Bold</strong> text</p>"
        );
    }

    #[test]
    fn escapes_special_characters() {
        let p = HtmlNode::new("p").with_text("a < b & c > d");
        let root = HtmlNode::new("root").with_children(vec![p]);

        assert_eq!(
            StorageXmlSerializer::new().serialize(&root),
            "<p>a &lt; b &amp; c &gt; d</p>"
        );
    }

    #[test]
    fn macro_round_trip_restores_cdata() {
        let html = r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">rust</ac:parameter><ac:plain-text-body><![CDATA[if a < b { n() }
next line]]></ac:plain-text-body></ac:structured-macro>"#;
        let tree = StorageXmlParser::new().parse(html).unwrap();
        let out = StorageXmlSerializer::new().serialize(&tree);

        assert_eq!(out, html);
    }

    #[test]
    fn fragment_serialization_omits_tail() {
        let mut p = HtmlNode::new("p").with_text("body");
        p.tail = " trailing".to_string();

        assert_eq!(serialize_fragment(&p), "<p>body</p>");
    }
}
