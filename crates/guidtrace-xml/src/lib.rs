//! XML side of GUID traceability.
//!
//! Parses a document into an arena of nodes with `quick-xml`, infers the
//! document's descriptive fields by keyword search, and finds attribute
//! values that are indexed GUIDs. Pure synchronous; no database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use std::collections::HashSet;
//!
//! use guidtrace_xml::{Document, KeywordRules, classify, find_matches};
//!
//! let doc = Document::parse(br#"<Bus port="A429-1"><Signal id="G1"/></Bus>"#).unwrap();
//! let fields = classify(&doc, &KeywordRules::default());
//! let guids: HashSet<String> = ["G1".to_string()].into();
//! let matches = find_matches(&doc, &guids);
//! println!("port={:?}, {} matches", fields.physical_port, matches.len());
//! ```

mod classify;
pub mod error;
mod matcher;
mod tree;

pub use classify::{KeywordRules, classify};
pub use error::{Error, Result};
pub use matcher::find_matches;
pub use tree::{Attribute, Document, Node, NodeId, PreOrder};
