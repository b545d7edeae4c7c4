//! The in-memory record index: GUID → record metadata, the rows sharing that
//! GUID, and the documents it has been observed in.
//!
//! The index is rebuilt for every run and never shrinks during one.

use std::collections::{BTreeSet, HashMap, HashSet};

use strum::IntoEnumIterator as _;

use crate::{
  Error, Result,
  document::RecordMetadata,
  record::{MetadataField, RecordFields, SourceRecord},
  table::{AnnotatedTable, ColumnMap, RecordTable, ResultColumns},
};

// ─── Lookup seam ─────────────────────────────────────────────────────────────

/// Exact-match membership test used by the attribute matcher.
pub trait GuidLookup {
  fn contains_guid(&self, value: &str) -> bool;
}

impl GuidLookup for HashSet<String> {
  fn contains_guid(&self, value: &str) -> bool { self.contains(value) }
}

impl GuidLookup for RecordIndex {
  fn contains_guid(&self, value: &str) -> bool { self.entries.contains_key(value) }
}

// ─── Index ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
  /// Metadata of the last row indexed under this GUID.
  pub fields: RecordFields,
  /// Every row ordinal carrying this GUID, in table order. Never empty.
  pub rows:   Vec<usize>,
  /// Distinct bare file names the GUID has been observed in.
  pub files:  BTreeSet<String>,
}

impl IndexEntry {
  pub fn first_row(&self) -> usize { self.rows.first().copied().unwrap_or_default() }
}

#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
  entries: HashMap<String, IndexEntry>,
}

impl RecordIndex {
  /// Validate `table`, attach the result columns and index every row with a
  /// non-empty identifier.
  pub fn build(
    table: RecordTable,
    columns: &ColumnMap,
    results: &ResultColumns,
  ) -> Result<(Self, AnnotatedTable)> {
    let mut missing: Vec<String> = Vec::new();
    for name in columns.required() {
      if table.column_index(name).is_none() && !missing.iter().any(|m| m == name) {
        missing.push(name.to_owned());
      }
    }
    if !missing.is_empty() {
      return Err(Error::MissingColumns(missing));
    }

    let mut index = Self::default();
    for record in source_records(&table, columns) {
      if record.has_guid() {
        index.insert(record);
      }
    }

    Ok((index, AnnotatedTable::new(table, results)))
  }

  fn insert(&mut self, record: SourceRecord) {
    let entry = self.entries.entry(record.guid).or_insert_with(|| IndexEntry {
      fields: RecordFields::default(),
      rows:   Vec::new(),
      files:  BTreeSet::new(),
    });
    entry.fields = record.fields;
    entry.rows.push(record.source_row);
  }

  pub fn get(&self, guid: &str) -> Option<&IndexEntry> { self.entries.get(guid) }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Record that `guid` was seen in `file_name`. Returns `false` if the GUID
  /// is not indexed.
  pub fn observe(&mut self, guid: &str, file_name: &str) -> bool {
    match self.entries.get_mut(guid) {
      Some(entry) => {
        if !entry.files.contains(file_name) {
          entry.files.insert(file_name.to_owned());
        }
        true
      }
      None => false,
    }
  }

  /// A detached copy of the keys, for workers that only need membership.
  pub fn key_set(&self) -> HashSet<String> { self.entries.keys().cloned().collect() }

  /// The metadata row persisted the first time `guid` is matched.
  pub fn record_metadata(&self, guid: &str) -> Option<RecordMetadata> {
    self.entries.get(guid).map(|entry| RecordMetadata {
      guid:       guid.to_owned(),
      fields:     entry.fields.clone(),
      source_row: entry.first_row(),
    })
  }

  /// Write existence, file count and file names into every row of each GUID
  /// in `matched`. Returns the number of rows written.
  pub fn annotate<'a>(
    &self,
    matched: impl IntoIterator<Item = &'a String>,
    table: &mut AnnotatedTable,
  ) -> Result<usize> {
    let mut written = 0;
    for guid in matched {
      if let Some(entry) = self.entries.get(guid.as_str()) {
        table.mark_matched(&entry.rows, &entry.files)?;
        written += entry.rows.len();
      }
    }
    Ok(written)
  }
}

/// Project every table row onto the configured columns. Absent cells read
/// as empty strings.
pub fn source_records<'a>(
  table: &'a RecordTable,
  columns: &'a ColumnMap,
) -> impl Iterator<Item = SourceRecord> + 'a {
  let guid_col = table.column_index(&columns.guid);
  let field_cols: Vec<(MetadataField, Option<usize>)> = MetadataField::iter()
    .map(|f| (f, table.column_index(columns.column_for(f))))
    .collect();

  (0..table.len()).map(move |row| {
    let read = |col: Option<usize>| col.map(|c| table.cell(row, c)).unwrap_or("").to_owned();
    let mut fields = RecordFields::default();
    for &(field, col) in &field_cols {
      fields.set(field, read(col));
    }
    SourceRecord { guid: read(guid_col), fields, source_row: row }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn headers() -> Vec<String> {
    ["Guid", "PhysicalPort", "Word_Name/Message_Name", "DP_Name", "Fullname", "Extra"]
      .into_iter()
      .map(String::from)
      .collect()
  }

  fn row(guid: &str, port: &str) -> Vec<String> {
    vec![guid.into(), port.into(), "MSG".into(), "DP".into(), "Full".into(), "x".into()]
  }

  fn build(rows: Vec<Vec<String>>) -> (RecordIndex, AnnotatedTable) {
    let mut table = RecordTable::new(headers());
    for r in rows {
      table.push_row(r);
    }
    RecordIndex::build(table, &ColumnMap::default(), &ResultColumns::default()).unwrap()
  }

  #[test]
  fn rows_sharing_a_guid_share_an_entry() {
    let (index, _) = build(vec![row("G1", "A1"), row("G1", "A1"), row("G2", "A2")]);
    assert_eq!(index.len(), 2);
    assert_eq!(index.get("G1").unwrap().rows, vec![0, 1]);
    assert_eq!(index.get("G2").unwrap().rows, vec![2]);
    assert_eq!(index.get("G2").unwrap().fields.physical_port, "A2");
  }

  #[test]
  fn empty_identifiers_are_not_indexed() {
    let (index, table) = build(vec![row("", "A0"), row("G1", "A1")]);
    assert_eq!(index.len(), 1);
    assert!(!index.contains_guid(""));
    assert!(!table.is_matched(0));
  }

  #[test]
  fn last_row_metadata_wins() {
    let (index, _) = build(vec![row("G1", "first"), row("G1", "second")]);
    let entry = index.get("G1").unwrap();
    assert_eq!(entry.fields.physical_port, "second");
    assert_eq!(entry.first_row(), 0);
  }

  #[test]
  fn missing_columns_are_all_named() {
    let mut table = RecordTable::new(vec!["Guid".into(), "PhysicalPort".into()]);
    table.push_row(vec!["G1".into(), "A1".into()]);
    let err = RecordIndex::build(table, &ColumnMap::default(), &ResultColumns::default())
      .unwrap_err();
    match err {
      Error::MissingColumns(cols) => {
        assert_eq!(cols, ["Word_Name/Message_Name", "DP_Name", "Fullname"]);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn short_rows_read_as_empty_metadata() {
    let (index, _) = build(vec![vec!["G1".into()]]);
    assert_eq!(index.get("G1").unwrap().fields, RecordFields::default());
  }

  #[test]
  fn observe_collects_distinct_names() {
    let (mut index, _) = build(vec![row("G1", "A1")]);
    assert!(index.observe("G1", "a.xml"));
    assert!(index.observe("G1", "a.xml"));
    assert!(index.observe("G1", "b.xml"));
    assert!(!index.observe("G9", "a.xml"));
    assert_eq!(index.get("G1").unwrap().files.len(), 2);
  }

  #[test]
  fn annotate_writes_every_row_of_a_guid() {
    let (mut index, mut table) = build(vec![row("G1", "A1"), row("G1", "A1"), row("G2", "A2")]);
    index.observe("G1", "bus.xml");
    let matched: BTreeSet<String> = ["G1".to_string()].into();
    let written = index.annotate(&matched, &mut table).unwrap();

    assert_eq!(written, 2);
    for r in [0, 1] {
      assert!(table.is_matched(r));
      assert_eq!(table.match_count(r), 1);
      assert_eq!(table.match_files(r), "bus.xml");
    }
    assert!(!table.is_matched(2));
  }

  #[test]
  fn record_metadata_has_last_row_fields_and_first_row_ordinal() {
    let (index, _) = build(vec![row("X", "A"), row("G1", "A1"), row("G1", "B2")]);
    let meta = index.record_metadata("G1").unwrap();
    assert_eq!(meta.source_row, 1);
    assert_eq!(meta.fields.physical_port, "B2");
    assert_eq!(meta.fields.message_name, "MSG");
    assert!(index.record_metadata("nope").is_none());
  }
}
