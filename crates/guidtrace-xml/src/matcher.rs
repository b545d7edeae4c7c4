//! Attribute-value matching against an identifier set.

use guidtrace_core::{document::GuidMatch, index::GuidLookup};

use crate::tree::Document;

/// Every attribute whose value is exactly a known GUID, in pre-order.
///
/// Only attribute values are compared; element text never produces a match.
pub fn find_matches(doc: &Document, guids: &impl GuidLookup) -> Vec<GuidMatch> {
  let mut matches = Vec::new();
  for (id, node) in doc.pre_order() {
    let mut node_path: Option<String> = None;
    for attr in &node.attributes {
      if !guids.contains_guid(&attr.value) {
        continue;
      }
      let path = node_path.get_or_insert_with(|| doc.node_path(id));
      matches.push(GuidMatch {
        guid:      attr.value.clone(),
        node_path: path.clone(),
        attribute: attr.name.clone(),
      });
    }
  }
  matches
}
