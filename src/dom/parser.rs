// src/dom/parser.rs
//! Storage-format XHTML parser with namespace support.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::entities::convert_html_entities;
use super::tree::HtmlNode;
use crate::error::ConversionError;
use indexmap::IndexMap;

/// Confluence XML namespaces.
const NAMESPACES: &[(&str, &str)] = &[
    ("ac", "http://www.atlassian.com/schema/confluence/4/ac/"),
    ("ri", "http://www.atlassian.com/schema/confluence/4/ri/"),
];

/// Wrapper tag added around the fragment so `ac:`/`ri:` prefixes resolve.
const ROOT_TAG: &str = "c2m-root";

/// Parse Confluence storage-format fragments into `HtmlNode` trees.
pub struct StorageXmlParser;

impl StorageXmlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a storage-format fragment to a tree.
    ///
    /// The fragment is wrapped in a root element declaring the `ac:` and
    /// `ri:` namespaces, named HTML entities are converted to Unicode
    /// first, and CDATA payloads are preserved verbatim. Each element
    /// records its byte span relative to the entity-converted fragment.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::DomParsing` if the fragment is not
    /// well-formed XML.
    pub fn parse(&self, html: &str) -> Result<HtmlNode, ConversionError> {
        let html = convert_html_entities(html);

        let namespace_decls = NAMESPACES
            .iter()
            .map(|(prefix, uri)| format!(r#"xmlns:{prefix}="{uri}""#))
            .collect::<Vec<_>>()
            .join(" ");
        let prefix = format!("<{ROOT_TAG} {namespace_decls}>");
        let origin = prefix.len() as u64;
        let wrapped = format!("{prefix}{html}</{ROOT_TAG}>");

        let mut reader = Reader::from_str(&wrapped);
        reader.config_mut().trim_text(false);

        // Consume the wrapper's Start event, then parse its contents.
        match reader.read_event()? {
            Event::Start(_) => {}
            other => {
                return Err(ConversionError::DomParsing(format!(
                    "expected root element, got {other:?}"
                )))
            }
        }

        let mut root = HtmlNode::new(ROOT_TAG);
        self.parse_children(&mut reader, &mut root, ROOT_TAG, origin)?;
        root.span = (0, html.len());
        Ok(root)
    }

    fn parse_children(
        &self,
        reader: &mut Reader<&[u8]>,
        node: &mut HtmlNode,
        parent_tag: &str,
        origin: u64,
    ) -> Result<(), ConversionError> {
        loop {
            let pos_before = reader.buffer_position();
            match reader.read_event()? {
                Event::Start(e) => {
                    let child_tag = decode_tag(reader, &e);
                    let mut child = HtmlNode::new(child_tag.clone());
                    child.attrs = decode_attrs(reader, &e);
                    child.span.0 = rel_pos(pos_before, origin);
                    self.parse_children(reader, &mut child, &child_tag, origin)?;
                    child.span.1 = rel_pos(reader.buffer_position(), origin);
                    node.children.push(child);
                }
                Event::Empty(e) => {
                    let mut child = HtmlNode::new(decode_tag(reader, &e));
                    child.attrs = decode_attrs(reader, &e);
                    child.span = (
                        rel_pos(pos_before, origin),
                        rel_pos(reader.buffer_position(), origin),
                    );
                    node.children.push(child);
                }
                Event::Text(e) => {
                    let text = reader.decoder().decode(&e)?.into_owned();
                    append_text(node, &text);
                }
                Event::GeneralRef(e) => {
                    // Entity references the reader did not resolve (&lt; &gt; &amp;)
                    let entity = reader.decoder().decode(&e)?.into_owned();
                    let text = decode_entity(&entity);
                    append_text(node, &text);
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    node.cdata
                        .get_or_insert_with(String::new)
                        .push_str(&text);
                    append_text(node, &text);
                }
                Event::End(e) => {
                    let end_tag = decode_tag_from_bytes(reader, e.name().as_ref());
                    if end_tag == parent_tag {
                        return Ok(());
                    }
                    // Mismatched end tag - continue
                }
                Event::Eof => {
                    return Ok(());
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
        }
    }
}

impl Default for StorageXmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Position of an event relative to the start of the unwrapped fragment.
fn rel_pos(absolute: u64, origin: u64) -> usize {
    absolute.saturating_sub(origin) as usize
}

fn decode_tag(reader: &Reader<&[u8]>, e: &BytesStart) -> String {
    decode_tag_from_bytes(reader, e.name().as_ref())
}

fn decode_tag_from_bytes(reader: &Reader<&[u8]>, name: &[u8]) -> String {
    reader.decoder().decode(name).map_or_else(
        |_| String::from_utf8_lossy(name).into_owned(),
        std::borrow::Cow::into_owned,
    )
}

fn decode_attrs(reader: &Reader<&[u8]>, e: &BytesStart) -> IndexMap<String, String> {
    let mut attrs = IndexMap::new();
    for attr in e.attributes().flatten() {
        let key = reader.decoder().decode(attr.key.as_ref()).map_or_else(
            |_| String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            std::borrow::Cow::into_owned,
        );

        // Skip namespace declarations
        if key.starts_with("xmlns") {
            continue;
        }

        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            std::borrow::Cow::into_owned,
        );

        attrs.insert(key, value);
    }
    attrs
}

/// Append text to the node's text or the last child's tail.
fn append_text(node: &mut HtmlNode, text: &str) {
    if let Some(last_child) = node.children.last_mut() {
        last_child.tail.push_str(text);
    } else {
        node.text.push_str(text);
    }
}

/// Decode XML entity references to their character values.
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "amp" => "&".to_string(),
        "apos" => "'".to_string(),
        "quot" => "\"".to_string(),
        // Numeric character references
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        // Unknown entity - preserve as-is
        _ => format!("&{entity};"),
    }
}
