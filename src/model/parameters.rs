// src/model/parameters.rs
//! Parameter and body extraction for macro elements.
//!
//! Extraction is a pure function of the element and never fails: any
//! internal oddity degrades to an empty parameter set or empty body so
//! the caller can proceed to the fallback path.

use crate::dom::{serialize_fragment, HtmlNode};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

lazy_static! {
    /// CDATA payload pattern-matched out of raw markup when no explicit
    /// body element is present.
    static ref CDATA_PATTERN: Regex =
        Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("invalid CDATA regex");
}

/// A typed macro parameter value.
///
/// Confluence stores every parameter as a string; values that look like
/// booleans or numbers are coerced so processors can consume them
/// without re-parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParameterValue {
    /// Coerce a raw parameter string into a typed value.
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" | "TRUE" | "True" => return Self::Bool(true),
            "false" | "FALSE" | "False" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(int) = trimmed.parse::<i64>() {
            return Self::Int(int);
        }
        if let Ok(float) = trimmed.parse::<f64>() {
            if float.is_finite() {
                return Self::Float(float);
            }
        }
        Self::Str(raw.to_string())
    }

    /// The value as a boolean, when it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value rendered back to its string form.
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s.clone(),
        }
    }

    /// Whether the value is empty after trimming (empty strings count as
    /// missing for `require_parameters`).
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Str(s) if s.trim().is_empty())
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Extract typed parameters from a macro element.
///
/// Sources, in order: `<ac:parameter ac:name="...">` children, then
/// `data-*` attributes on the element itself. A parameter child without
/// a name attribute is Confluence's "default" parameter and is stored
/// under the empty key.
pub fn extract_parameters(element: &HtmlNode) -> IndexMap<String, ParameterValue> {
    let mut parameters = IndexMap::new();

    for param in element.find_children("parameter") {
        let name = param.attr("name").unwrap_or_default().to_string();
        let value = parameter_text(param);
        parameters.insert(name, ParameterValue::coerce(&value));
    }

    for (key, value) in &element.attrs {
        if let Some(name) = key.strip_prefix("data-") {
            parameters
                .entry(name.to_string())
                .or_insert_with(|| ParameterValue::coerce(value));
        }
    }

    parameters
}

/// The literal value of a parameter element.
///
/// Link-valued parameters (include targets) carry their payload in a
/// nested `ri:page` element rather than text content.
fn parameter_text(param: &HtmlNode) -> String {
    if !param.text.trim().is_empty() {
        return param.text.trim().to_string();
    }
    if let Some(page_ref) = param.find_descendant("page") {
        if let Some(title) = page_ref
            .attrs
            .get("ri:content-title")
            .or_else(|| page_ref.attrs.get("content-title"))
        {
            return title.clone();
        }
    }
    param.flattened_text().trim().to_string()
}

/// A macro's extracted body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedBody {
    /// Body content: literal text for plain bodies, markup for rich bodies.
    pub content: String,
    /// The CDATA payload, when the body arrived in one.
    pub cdata: Option<String>,
}

/// Extract a macro's literal body.
///
/// Preference order: an explicit plain-text body child, else a rich-text
/// body child returned as markup, else a CDATA section pattern-matched
/// out of the remaining markup, else the element's flattened text.
pub fn extract_body(element: &HtmlNode) -> ExtractedBody {
    if let Some(plain) = element.find_child("plain-text-body") {
        let cdata = plain.cdata.clone();
        let content = cdata.clone().unwrap_or_else(|| plain.text.clone());
        return ExtractedBody {
            content,
            cdata,
        };
    }

    if let Some(rich) = element.find_child("rich-text-body") {
        let mut markup = String::new();
        markup.push_str(&rich.text);
        for child in &rich.children {
            markup.push_str(&serialize_fragment(child));
            markup.push_str(&child.tail);
        }
        return ExtractedBody {
            content: markup,
            cdata: None,
        };
    }

    let raw = serialize_fragment(element);
    if let Some(caps) = CDATA_PATTERN.captures(&raw) {
        let payload = caps[1].to_string();
        return ExtractedBody {
            content: payload.clone(),
            cdata: Some(payload),
        };
    }

    ExtractedBody {
        content: element.flattened_text().trim().to_string(),
        cdata: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StorageXmlParser;
    use pretty_assertions::assert_eq;

    fn parse_macro(html: &str) -> HtmlNode {
        StorageXmlParser::new().parse(html).unwrap().children[0].clone()
    }

    #[test]
    fn coerces_scalar_types() {
        assert_eq!(ParameterValue::coerce("true"), ParameterValue::Bool(true));
        assert_eq!(ParameterValue::coerce("False"), ParameterValue::Bool(false));
        assert_eq!(ParameterValue::coerce("42"), ParameterValue::Int(42));
        assert_eq!(ParameterValue::coerce("-7"), ParameterValue::Int(-7));
        assert_eq!(ParameterValue::coerce("2.5"), ParameterValue::Float(2.5));
        assert_eq!(
            ParameterValue::coerce("javascript"),
            ParameterValue::Str("javascript".to_string())
        );
    }

    #[test]
    fn extracts_named_parameters_in_document_order() {
        let node = parse_macro(
            r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">rust</ac:parameter><ac:parameter ac:name="linenumbers">true</ac:parameter></ac:structured-macro>"#,
        );
        let params = extract_parameters(&node);

        assert_eq!(
            params.keys().collect::<Vec<_>>(),
            vec!["language", "linenumbers"]
        );
        assert_eq!(
            params.get("language"),
            Some(&ParameterValue::Str("rust".to_string()))
        );
        assert_eq!(params.get("linenumbers"), Some(&ParameterValue::Bool(true)));
    }

    #[test]
    fn extracts_data_attributes_as_parameters() {
        let node = parse_macro(
            r#"<ac:structured-macro ac:name="chart" data-width="640">x</ac:structured-macro>"#,
        );
        let params = extract_parameters(&node);
        assert_eq!(params.get("width"), Some(&ParameterValue::Int(640)));
    }

    #[test]
    fn named_parameter_wins_over_data_attribute() {
        let node = parse_macro(
            r#"<ac:structured-macro ac:name="chart" data-width="640"><ac:parameter ac:name="width">800</ac:parameter></ac:structured-macro>"#,
        );
        let params = extract_parameters(&node);
        assert_eq!(params.get("width"), Some(&ParameterValue::Int(800)));
    }

    #[test]
    fn link_parameter_resolves_page_title() {
        let node = parse_macro(
            r#"<ac:structured-macro ac:name="include"><ac:parameter ac:name=""><ac:link><ri:page ri:content-title="Target Page" /></ac:link></ac:parameter></ac:structured-macro>"#,
        );
        let params = extract_parameters(&node);
        assert_eq!(
            params.get(""),
            Some(&ParameterValue::Str("Target Page".to_string()))
        );
    }

    #[test]
    fn body_prefers_plain_text_child() {
        let node = parse_macro(
            r#"<ac:structured-macro ac:name="code"><ac:plain-text-body><![CDATA[let x = 1;]]></ac:plain-text-body><ac:rich-text-body><p>ignored</p></ac:rich-text-body></ac:structured-macro>"#,
        );
        let body = extract_body(&node);
        assert_eq!(body.content, "let x = 1;");
        assert_eq!(body.cdata.as_deref(), Some("let x = 1;"));
    }

    #[test]
    fn rich_body_is_returned_as_markup() {
        let node = parse_macro(
            r#"<ac:structured-macro ac:name="info"><ac:rich-text-body><p>Take <strong>care</strong></p></ac:rich-text-body></ac:structured-macro>"#,
        );
        let body = extract_body(&node);
        assert_eq!(body.content, "<p>Take <strong>care</strong></p>");
        assert_eq!(body.cdata, None);
    }

    #[test]
    fn falls_back_to_flattened_text() {
        let node = parse_macro(r#"<ac:structured-macro ac:name="info">bare text</ac:structured-macro>"#);
        let body = extract_body(&node);
        assert_eq!(body.content, "bare text");
    }
}
