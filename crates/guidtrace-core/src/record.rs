//! Source records and the descriptive fields they carry.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// One of the four descriptive fields shared by interface records and
/// classified documents.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetadataField {
  PhysicalPort,
  MessageName,
  DpName,
  FullName,
}

/// Descriptive metadata of a source record. Absent cells are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
  pub physical_port: String,
  pub message_name:  String,
  pub dp_name:       String,
  pub full_name:     String,
}

impl RecordFields {
  pub fn set(&mut self, field: MetadataField, value: String) {
    match field {
      MetadataField::PhysicalPort => self.physical_port = value,
      MetadataField::MessageName => self.message_name = value,
      MetadataField::DpName => self.dp_name = value,
      MetadataField::FullName => self.full_name = value,
    }
  }
}

/// One row of the input table, projected onto the columns the index uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
  /// The join key. Empty means the row has no identifier.
  pub guid:       String,
  pub fields:     RecordFields,
  /// 0-based position of the row in the input table.
  pub source_row: usize,
}

impl SourceRecord {
  pub fn has_guid(&self) -> bool { !self.guid.is_empty() }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn field_names_are_snake_case() {
    let names: Vec<String> = MetadataField::iter().map(|f| f.to_string()).collect();
    assert_eq!(names, ["physical_port", "message_name", "dp_name", "full_name"]);
  }

  #[test]
  fn set_fills_the_named_slot() {
    let mut fields = RecordFields::default();
    for field in MetadataField::iter() {
      fields.set(field, field.as_ref().to_uppercase());
    }
    assert_eq!(fields.physical_port, "PHYSICAL_PORT");
    assert_eq!(fields.message_name, "MESSAGE_NAME");
    assert_eq!(fields.dp_name, "DP_NAME");
    assert_eq!(fields.full_name, "FULL_NAME");
  }
}
