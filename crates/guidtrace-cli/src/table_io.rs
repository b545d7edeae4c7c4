//! CSV loading and saving of the record table.

use std::path::Path;

use anyhow::{Context as _, Result};
use guidtrace_core::table::RecordTable;

/// Read a CSV file with a header row. Rows may be ragged.
pub fn read_table(path: &Path) -> Result<RecordTable> {
  let mut reader = csv::ReaderBuilder::new()
    .flexible(true)
    .from_path(path)
    .with_context(|| format!("failed to open input table {}", path.display()))?;

  let headers = reader
    .headers()
    .with_context(|| format!("failed to read header row of {}", path.display()))?
    .iter()
    .enumerate()
    .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}') } else { h })
    .map(|h| h.trim().to_owned())
    .collect();

  let mut table = RecordTable::new(headers);
  for (line, record) in reader.records().enumerate() {
    let record =
      record.with_context(|| format!("malformed row {} in {}", line + 1, path.display()))?;
    table.push_row(record.iter().map(str::to_owned).collect());
  }
  Ok(table)
}

/// Write `table` as CSV, header row first.
pub fn write_table(path: &Path, table: &RecordTable) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let mut writer = csv::WriterBuilder::new()
    .flexible(true)
    .from_path(path)
    .with_context(|| format!("failed to create output table {}", path.display()))?;
  writer.write_record(table.headers())?;
  for row in table.rows() {
    writer.write_record(row)?;
  }
  writer.flush().context("failed to flush output table")?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_ragged_rows_and_strips_bom() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.csv");
    std::fs::write(&path, "\u{feff}Guid,PhysicalPort,Notes\nG1,A1,ok\nG2\n").unwrap();

    let table = read_table(&path).unwrap();
    assert_eq!(table.headers(), ["Guid", "PhysicalPort", "Notes"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.cell(1, 0), "G2");
    assert_eq!(table.cell(1, 2), "");
  }

  #[test]
  fn written_tables_read_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/annotated.csv");
    let mut table = RecordTable::new(vec!["Guid".into(), "match_files".into()]);
    table.push_row(vec!["G1".into(), "a.xml,b.xml".into()]);

    write_table(&path, &table).unwrap();
    assert_eq!(read_table(&path).unwrap(), table);
  }

  #[test]
  fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_table(&dir.path().join("absent.csv")).is_err());
  }
}
