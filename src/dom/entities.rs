// src/dom/entities.rs
//! HTML entity to Unicode conversion.
//!
//! Confluence storage format is XHTML and freely uses named HTML entities
//! that are not part of XML. They are converted to Unicode before parsing;
//! standard XML entities (amp, lt, gt, quot, apos) are preserved as-is so
//! the XML reader can resolve them itself.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ENTITY_PATTERN: Regex =
        Regex::new(r"&([a-zA-Z]+);").expect("invalid entity regex");
}

/// Convert named HTML entities to Unicode characters.
pub fn convert_html_entities(html: &str) -> String {
    ENTITY_PATTERN
        .replace_all(html, |caps: &regex::Captures| {
            let entity_name = &caps[1];
            entity_to_unicode(entity_name)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Map HTML entity name to Unicode character.
fn entity_to_unicode(name: &str) -> Option<&'static str> {
    Some(match name {
        // Common entities
        "nbsp" => "\u{00a0}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "bull" => "\u{2022}",
        "hellip" => "\u{2026}",

        // Arrows
        "rarr" => "\u{2192}",
        "larr" => "\u{2190}",
        "harr" => "\u{2194}",
        "uarr" => "\u{2191}",
        "darr" => "\u{2193}",

        // Math symbols
        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        "ne" => "\u{2260}",
        "plusmn" => "\u{00b1}",
        "times" => "\u{00d7}",
        "divide" => "\u{00f7}",

        // Legal symbols
        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",

        // Currency
        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "yen" => "\u{00a5}",
        "cent" => "\u{00a2}",

        // Misc symbols
        "deg" => "\u{00b0}",
        "para" => "\u{00b6}",
        "sect" => "\u{00a7}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "middot" => "\u{00b7}",

        // Unknown entity - return None to preserve as-is
        _ => return None,
    })
}
