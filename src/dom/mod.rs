// src/dom/mod.rs
//! DOM access capability for Confluence storage format.
//!
//! The engine only needs three things from a DOM layer: parse a
//! storage-format fragment into a tree, traverse/query that tree, and
//! serialize a subtree back to markup. This module provides a conformant
//! implementation on top of `quick-xml`; nothing outside it touches the
//! XML library, so the implementation can be swapped without the engine
//! noticing.

mod entities;
mod parser;
mod serializer;
mod tree;

pub use entities::convert_html_entities;
pub use parser::StorageXmlParser;
pub use serializer::{serialize_fragment, StorageXmlSerializer};
pub use tree::HtmlNode;
