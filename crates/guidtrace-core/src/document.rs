//! Rows produced by scanning one document: its metadata, the GUID matches
//! found in it, and the record metadata of every matched GUID.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::record::{MetadataField, RecordFields};

/// Classifier output. Each field is `None` when no keyword matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFields {
  pub physical_port: Option<String>,
  pub message_name:  Option<String>,
  pub dp_name:       Option<String>,
  pub full_name:     Option<String>,
}

impl DocumentFields {
  fn slot(&mut self, field: MetadataField) -> &mut Option<String> {
    match field {
      MetadataField::PhysicalPort => &mut self.physical_port,
      MetadataField::MessageName => &mut self.message_name,
      MetadataField::DpName => &mut self.dp_name,
      MetadataField::FullName => &mut self.full_name,
    }
  }

  /// Assign `field` unless it already holds a value. Returns whether the
  /// value was taken.
  pub fn fill(&mut self, field: MetadataField, value: &str) -> bool {
    let slot = self.slot(field);
    if slot.is_some() {
      return false;
    }
    *slot = Some(value.to_owned());
    true
  }

  pub fn is_complete(&self) -> bool {
    self.physical_port.is_some()
      && self.message_name.is_some()
      && self.dp_name.is_some()
      && self.full_name.is_some()
  }
}

/// One row of `xml_metadata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
  /// Absolute path; the unique key.
  pub path:       PathBuf,
  pub file_name:  String,
  pub fields:     DocumentFields,
  /// Local wall-clock time the document was parsed, second precision.
  pub parse_time: NaiveDateTime,
}

/// A GUID found in an attribute value of one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuidMatch {
  pub guid:      String,
  /// Tag names from the root to the matching node, joined with `/`.
  pub node_path: String,
  pub attribute: String,
}

/// One row of `guid_xml_mapping` as read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMatch {
  pub guid:      String,
  pub path:      PathBuf,
  pub node_path: String,
  pub attribute: String,
}

/// One row of `excel_metadata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
  pub guid:       String,
  pub fields:     RecordFields,
  /// First input row carrying this GUID.
  pub source_row: usize,
}

/// Everything written for one document, committed atomically.
#[derive(Debug, Clone)]
pub struct DocumentBatch {
  pub document: DocumentMetadata,
  pub matches:  Vec<GuidMatch>,
  pub records:  Vec<RecordMetadata>,
}

/// Rows actually inserted by a commit; ignored duplicates are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
  pub document_inserted: bool,
  pub matches_inserted:  usize,
  pub records_inserted:  usize,
}

/// Row counts of the three tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
  pub documents: usize,
  pub matches:   usize,
  pub records:   usize,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_keeps_the_first_value() {
    let mut fields = DocumentFields::default();
    assert!(fields.fill(MetadataField::PhysicalPort, "A1"));
    assert!(!fields.fill(MetadataField::PhysicalPort, "B2"));
    assert_eq!(fields.physical_port.as_deref(), Some("A1"));
    assert!(!fields.is_complete());
  }
}
