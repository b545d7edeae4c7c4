//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Paths are stored lossily as UTF-8 strings. Parse timestamps use
//! `YYYY-MM-DD HH:MM:SS`. Row ordinals are stored as `INTEGER`.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use guidtrace_core::{
  document::{DocumentFields, DocumentMetadata, RecordMetadata, StoredMatch},
  record::RecordFields,
};

use crate::{Error, Result};

pub const PARSE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── Path ─────────────────────────────────────────────────────────────────────

pub fn encode_path(path: &Path) -> String { path.to_string_lossy().into_owned() }

pub fn decode_path(s: String) -> PathBuf { PathBuf::from(s) }

// ─── Parse time ───────────────────────────────────────────────────────────────

pub fn encode_parse_time(t: NaiveDateTime) -> String { t.format(PARSE_TIME_FORMAT).to_string() }

pub fn decode_parse_time(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, PARSE_TIME_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Source row ───────────────────────────────────────────────────────────────

pub fn encode_source_row(row: usize) -> i64 { i64::try_from(row).unwrap_or(i64::MAX) }

pub fn decode_source_row(v: i64) -> Result<usize> {
  usize::try_from(v).map_err(|_| Error::SourceRow(v))
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

/// Intermediate representation of an `xml_metadata` row read from SQLite.
pub struct RawDocument {
  pub path:          String,
  pub file_name:     String,
  pub physical_port: Option<String>,
  pub message_name:  Option<String>,
  pub dp_name:       Option<String>,
  pub full_name:     Option<String>,
  pub parse_time:    String,
}

pub const DOCUMENT_COLUMNS: &str = "xml_file_path, xml_file_name, physical_port, message_name, \
                                    dp_name, full_name, parse_time";

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      path:          row.get(0)?,
      file_name:     row.get(1)?,
      physical_port: row.get(2)?,
      message_name:  row.get(3)?,
      dp_name:       row.get(4)?,
      full_name:     row.get(5)?,
      parse_time:    row.get(6)?,
    })
  }

  pub fn into_document(self) -> Result<DocumentMetadata> {
    Ok(DocumentMetadata {
      parse_time: decode_parse_time(&self.parse_time)?,
      path:       decode_path(self.path),
      file_name:  self.file_name,
      fields:     DocumentFields {
        physical_port: self.physical_port,
        message_name:  self.message_name,
        dp_name:       self.dp_name,
        full_name:     self.full_name,
      },
    })
  }
}

/// Intermediate representation of a `guid_xml_mapping` row.
pub struct RawMatch {
  pub guid:      String,
  pub path:      String,
  pub node_path: String,
  pub attribute: String,
}

pub const MATCH_COLUMNS: &str = "guid, xml_file_path, match_node_path, match_attribute";

impl RawMatch {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      guid:      row.get(0)?,
      path:      row.get(1)?,
      node_path: row.get(2)?,
      attribute: row.get(3)?,
    })
  }

  pub fn into_match(self) -> StoredMatch {
    StoredMatch {
      guid:      self.guid,
      path:      decode_path(self.path),
      node_path: self.node_path,
      attribute: self.attribute,
    }
  }
}

/// Intermediate representation of an `excel_metadata` row.
pub struct RawRecord {
  pub guid:          String,
  pub physical_port: Option<String>,
  pub message_name:  Option<String>,
  pub dp_name:       Option<String>,
  pub full_name:     Option<String>,
  pub source_row:    Option<i64>,
}

pub const RECORD_COLUMNS: &str = "guid, physical_port, message_name, dp_name, full_name, source_row";

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      guid:          row.get(0)?,
      physical_port: row.get(1)?,
      message_name:  row.get(2)?,
      dp_name:       row.get(3)?,
      full_name:     row.get(4)?,
      source_row:    row.get(5)?,
    })
  }

  pub fn into_record(self) -> Result<RecordMetadata> {
    Ok(RecordMetadata {
      guid:       self.guid,
      fields:     RecordFields {
        physical_port: self.physical_port.unwrap_or_default(),
        message_name:  self.message_name.unwrap_or_default(),
        dp_name:       self.dp_name.unwrap_or_default(),
        full_name:     self.full_name.unwrap_or_default(),
      },
      source_row: decode_source_row(self.source_row.unwrap_or_default())?,
    })
  }
}
