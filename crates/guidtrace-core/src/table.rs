//! The input record table and its annotated form.
//!
//! The table is a plain grid of strings produced by an external loader.
//! Columns the reconciliation does not know about pass through untouched.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, record::MetadataField};

// ─── Column configuration ────────────────────────────────────────────────────

/// Names of the input columns holding the identifier and the four
/// descriptive fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
  pub guid:          String,
  pub physical_port: String,
  pub message_name:  String,
  pub dp_name:       String,
  pub full_name:     String,
}

impl Default for ColumnMap {
  fn default() -> Self {
    Self {
      guid:          "Guid".into(),
      physical_port: "PhysicalPort".into(),
      message_name:  "Word_Name/Message_Name".into(),
      dp_name:       "DP_Name".into(),
      full_name:     "Fullname".into(),
    }
  }
}

impl ColumnMap {
  pub fn column_for(&self, field: MetadataField) -> &str {
    match field {
      MetadataField::PhysicalPort => &self.physical_port,
      MetadataField::MessageName => &self.message_name,
      MetadataField::DpName => &self.dp_name,
      MetadataField::FullName => &self.full_name,
    }
  }

  /// The identifier column followed by the four metadata columns.
  pub fn required(&self) -> [&str; 5] {
    [
      &self.guid,
      &self.physical_port,
      &self.message_name,
      &self.dp_name,
      &self.full_name,
    ]
  }
}

/// Names of the three columns appended to the table by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultColumns {
  pub exists:      String,
  pub match_count: String,
  pub match_files: String,
}

impl Default for ResultColumns {
  fn default() -> Self {
    Self {
      exists:      "exists".into(),
      match_count: "match_count".into(),
      match_files: "match_files".into(),
    }
  }
}

// ─── Record table ────────────────────────────────────────────────────────────

/// A header row plus data rows. Every row is padded to the header width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
  headers: Vec<String>,
  rows:    Vec<Vec<String>>,
}

impl RecordTable {
  pub fn new(headers: Vec<String>) -> Self { Self { headers, rows: Vec::new() } }

  /// Append a row. Short rows are padded with empty cells; cells beyond the
  /// header width are kept.
  pub fn push_row(&mut self, mut row: Vec<String>) {
    if row.len() < self.headers.len() {
      row.resize(self.headers.len(), String::new());
    }
    self.rows.push(row);
  }

  pub fn headers(&self) -> &[String] { &self.headers }

  pub fn rows(&self) -> &[Vec<String>] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.headers.iter().position(|h| h == name)
  }

  /// Cell content, or `""` when the row or column does not exist.
  pub fn cell(&self, row: usize, column: usize) -> &str {
    self
      .rows
      .get(row)
      .and_then(|r| r.get(column))
      .map(String::as_str)
      .unwrap_or("")
  }

  pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> Result<()> {
    let cells = self.rows.get_mut(row).ok_or(Error::RowOutOfRange(row))?;
    if cells.len() <= column {
      cells.resize(column + 1, String::new());
    }
    cells[column] = value.into();
    Ok(())
  }

  /// Add a column filled with `fill`, or reset an existing column of the
  /// same name. Returns its index.
  pub fn add_column(&mut self, name: &str, fill: &str) -> usize {
    let index = match self.column_index(name) {
      Some(index) => index,
      None => {
        self.headers.push(name.to_owned());
        self.headers.len() - 1
      }
    };
    let width = self.headers.len();
    for row in &mut self.rows {
      if row.len() < width {
        row.resize(width, String::new());
      }
      row[index] = fill.to_owned();
    }
    index
  }
}

// ─── Annotated table ─────────────────────────────────────────────────────────

/// The input table with the three result columns attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedTable {
  table:       RecordTable,
  exists:      usize,
  match_count: usize,
  match_files: usize,
}

impl AnnotatedTable {
  /// Append the result columns, initialised to not-found.
  pub fn new(mut table: RecordTable, columns: &ResultColumns) -> Self {
    let exists = table.add_column(&columns.exists, "false");
    let match_count = table.add_column(&columns.match_count, "0");
    let match_files = table.add_column(&columns.match_files, "");
    Self { table, exists, match_count, match_files }
  }

  /// Mark every row in `rows` as found in the given distinct file names.
  pub fn mark_matched(&mut self, rows: &[usize], files: &BTreeSet<String>) -> Result<()> {
    let count = files.len().to_string();
    let names = files.iter().map(String::as_str).collect::<Vec<_>>().join(",");
    for &row in rows {
      self.table.set_cell(row, self.exists, "true")?;
      self.table.set_cell(row, self.match_count, count.as_str())?;
      self.table.set_cell(row, self.match_files, names.as_str())?;
    }
    Ok(())
  }

  pub fn is_matched(&self, row: usize) -> bool { self.table.cell(row, self.exists) == "true" }

  pub fn match_count(&self, row: usize) -> usize {
    self.table.cell(row, self.match_count).parse().unwrap_or(0)
  }

  pub fn match_files(&self, row: usize) -> &str { self.table.cell(row, self.match_files) }

  pub fn table(&self) -> &RecordTable { &self.table }

  pub fn into_table(self) -> RecordTable { self.table }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table() -> RecordTable {
    let mut t = RecordTable::new(vec!["Guid".into(), "Note".into()]);
    t.push_row(vec!["G1".into(), "first".into()]);
    t.push_row(vec!["G2".into()]);
    t
  }

  #[test]
  fn short_rows_are_padded() {
    let t = table();
    assert_eq!(t.rows()[1], vec!["G2".to_string(), String::new()]);
    assert_eq!(t.cell(1, 1), "");
    assert_eq!(t.cell(7, 0), "");
  }

  #[test]
  fn result_columns_start_unmatched() {
    let annotated = AnnotatedTable::new(table(), &ResultColumns::default());
    let headers = annotated.table().headers();
    assert_eq!(headers, ["Guid", "Note", "exists", "match_count", "match_files"]);
    assert!(!annotated.is_matched(0));
    assert_eq!(annotated.match_count(1), 0);
    assert_eq!(annotated.match_files(1), "");
  }

  #[test]
  fn existing_result_column_is_reset_not_duplicated() {
    let mut t = RecordTable::new(vec!["Guid".into(), "exists".into()]);
    t.push_row(vec!["G1".into(), "true".into()]);
    let annotated = AnnotatedTable::new(t, &ResultColumns::default());
    assert_eq!(annotated.table().headers().len(), 4);
    assert!(!annotated.is_matched(0));
  }

  #[test]
  fn mark_matched_joins_sorted_names() {
    let mut annotated = AnnotatedTable::new(table(), &ResultColumns::default());
    let files: BTreeSet<String> = ["b.xml", "a.xml"].into_iter().map(String::from).collect();
    annotated.mark_matched(&[0], &files).unwrap();
    assert!(annotated.is_matched(0));
    assert_eq!(annotated.match_count(0), 2);
    assert_eq!(annotated.match_files(0), "a.xml,b.xml");
    assert!(!annotated.is_matched(1));
  }

  #[test]
  fn mark_matched_rejects_unknown_rows() {
    let mut annotated = AnnotatedTable::new(table(), &ResultColumns::default());
    let err = annotated.mark_matched(&[5], &BTreeSet::new()).unwrap_err();
    assert!(matches!(err, Error::RowOutOfRange(5)));
  }
}
