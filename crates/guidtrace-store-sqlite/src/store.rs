//! The SQLite implementation of [`TraceStore`]: [`SqliteStore`].

use std::path::{Path, PathBuf};

use guidtrace_core::{
  document::{
    CommitSummary, DocumentBatch, DocumentMetadata, GuidMatch, RecordMetadata, StoreCounts,
    StoredMatch,
  },
  store::TraceStore,
};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use crate::{
  Result,
  encode::{
    DOCUMENT_COLUMNS, MATCH_COLUMNS, RECORD_COLUMNS, RawDocument, RawMatch, RawRecord,
    encode_parse_time, encode_path, encode_source_row,
  },
  schema::{RESET, SCHEMA, SCHEMA_VERSION, UNIQUE_MATCHES},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A traceability store backed by a single SQLite file.
///
/// A file-backed store holds no connection between operations: each call
/// opens the file, runs to commit or rollback, and closes it again, so a
/// failed write can never leave a lock behind for the next document.
#[derive(Clone)]
pub struct SqliteStore {
  location: Location,
}

#[derive(Clone)]
enum Location {
  File(PathBuf),
  /// A private in-memory database lives only as long as its connection, so
  /// the connection is shared. Cloning is cheap; it is reference-counted.
  Memory(tokio_rusqlite::Connection),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let store = Self { location: Location::File(path.as_ref().to_path_buf()) };
    store.init_schema().await?;
    debug!(path = %path.as_ref().display(), "sqlite store ready");
    Ok(store)
  }

  /// Open a private in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { location: Location::Memory(conn) };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .with_connection(|conn| Ok(apply_schema(conn)?))
      .await
  }

  /// Run `f` on a connection scoped to this one operation.
  async fn with_connection<F, R>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
  {
    match &self.location {
      Location::Memory(conn) => Ok(conn.call(f).await?),
      Location::File(path) => {
        let conn = tokio_rusqlite::Connection::open(path).await?;
        let outcome = conn.call(f).await;
        let closed = conn.close().await;
        let value = outcome?;
        closed?;
        Ok(value)
      }
    }
  }

  async fn query_matches(&self, column: &'static str, key: String) -> Result<Vec<StoredMatch>> {
    let sql = format!("SELECT {MATCH_COLUMNS} FROM guid_xml_mapping WHERE {column} = ?1 ORDER BY id");
    let raws: Vec<RawMatch> = self
      .with_connection(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![key], RawMatch::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawMatch::into_match).collect())
  }
}

// ─── Statements ──────────────────────────────────────────────────────────────

/// Create missing tables, then migrate a file older than [`SCHEMA_VERSION`].
fn apply_schema(conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
  conn.execute_batch(SCHEMA)?;
  let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
  if version < SCHEMA_VERSION {
    let tx = conn.transaction()?;
    tx.execute_batch(UNIQUE_MATCHES)?;
    tx.commit()?;
    debug!(from = version, to = SCHEMA_VERSION, "store schema migrated");
  }
  Ok(())
}

fn insert_document(conn: &rusqlite::Connection, doc: &DocumentMetadata) -> rusqlite::Result<bool> {
  let inserted = conn.execute(
    "INSERT OR IGNORE INTO xml_metadata (
       xml_file_path, xml_file_name, physical_port, message_name,
       dp_name, full_name, parse_time
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_path(&doc.path),
      doc.file_name,
      doc.fields.physical_port,
      doc.fields.message_name,
      doc.fields.dp_name,
      doc.fields.full_name,
      encode_parse_time(doc.parse_time),
    ],
  )?;
  Ok(inserted > 0)
}

fn insert_matches(
  conn: &rusqlite::Connection,
  path: &str,
  matches: &[GuidMatch],
) -> rusqlite::Result<usize> {
  let mut stmt = conn.prepare_cached(
    "INSERT OR IGNORE INTO guid_xml_mapping (
       guid, xml_file_path, match_node_path, match_attribute
     ) VALUES (?1, ?2, ?3, ?4)",
  )?;
  let mut inserted = 0;
  for m in matches {
    inserted += stmt.execute(rusqlite::params![m.guid, path, m.node_path, m.attribute])?;
  }
  Ok(inserted)
}

fn insert_record(conn: &rusqlite::Connection, record: &RecordMetadata) -> rusqlite::Result<bool> {
  let inserted = conn.execute(
    "INSERT OR IGNORE INTO excel_metadata (
       guid, physical_port, message_name, dp_name, full_name, source_row
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      record.guid,
      record.fields.physical_port,
      record.fields.message_name,
      record.fields.dp_name,
      record.fields.full_name,
      encode_source_row(record.source_row),
    ],
  )?;
  Ok(inserted > 0)
}

// ─── TraceStore impl ─────────────────────────────────────────────────────────

impl TraceStore for SqliteStore {
  type Error = crate::Error;

  // ── Maintenance ───────────────────────────────────────────────────────────

  async fn ensure_schema(&self) -> Result<()> { self.init_schema().await }

  async fn reset(&self) -> Result<()> {
    self
      .with_connection(|conn| {
        apply_schema(conn)?;
        let tx = conn.transaction()?;
        tx.execute_batch(RESET)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    debug!("store tables cleared");
    Ok(())
  }

  // ── Insert-or-ignore writes ───────────────────────────────────────────────

  async fn upsert_document(&self, document: DocumentMetadata) -> Result<bool> {
    self
      .with_connection(move |conn| Ok(insert_document(conn, &document)?))
      .await
  }

  async fn upsert_matches(&self, path: &Path, matches: Vec<GuidMatch>) -> Result<usize> {
    let path_str = encode_path(path);
    self
      .with_connection(move |conn| {
        let tx = conn.transaction()?;
        let inserted = insert_matches(&tx, &path_str, &matches)?;
        tx.commit()?;
        Ok(inserted)
      })
      .await
  }

  async fn upsert_record(&self, record: RecordMetadata) -> Result<bool> {
    self
      .with_connection(move |conn| Ok(insert_record(conn, &record)?))
      .await
  }

  async fn commit_document(&self, batch: DocumentBatch) -> Result<CommitSummary> {
    self
      .with_connection(move |conn| {
        // Dropping `tx` on an early return rolls the whole batch back.
        let tx = conn.transaction()?;
        let path_str = encode_path(&batch.document.path);

        let document_inserted = insert_document(&tx, &batch.document)?;
        let matches_inserted = insert_matches(&tx, &path_str, &batch.matches)?;
        let mut records_inserted = 0;
        for record in &batch.records {
          if insert_record(&tx, record)? {
            records_inserted += 1;
          }
        }

        tx.commit()?;
        Ok(CommitSummary { document_inserted, matches_inserted, records_inserted })
      })
      .await
  }

  // ── Key lookups ───────────────────────────────────────────────────────────

  async fn get_document(&self, path: &Path) -> Result<Option<DocumentMetadata>> {
    let path_str = encode_path(path);
    let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM xml_metadata WHERE xml_file_path = ?1");

    let raw: Option<RawDocument> = self
      .with_connection(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![path_str], RawDocument::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn documents_by_name(&self, file_name: &str) -> Result<Vec<DocumentMetadata>> {
    let name = file_name.to_owned();
    let sql = format!(
      "SELECT {DOCUMENT_COLUMNS} FROM xml_metadata WHERE xml_file_name = ?1 ORDER BY xml_file_path"
    );

    let raws: Vec<RawDocument> = self
      .with_connection(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![name], RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn matches_for_guid(&self, guid: &str) -> Result<Vec<StoredMatch>> {
    self.query_matches("guid", guid.to_owned()).await
  }

  async fn matches_for_document(&self, path: &Path) -> Result<Vec<StoredMatch>> {
    self.query_matches("xml_file_path", encode_path(path)).await
  }

  async fn get_record(&self, guid: &str) -> Result<Option<RecordMetadata>> {
    let guid = guid.to_owned();
    let sql = format!("SELECT {RECORD_COLUMNS} FROM excel_metadata WHERE guid = ?1");

    let raw: Option<RawRecord> = self
      .with_connection(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![guid], RawRecord::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn sample_document(&self) -> Result<Option<DocumentMetadata>> {
    let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM xml_metadata ORDER BY id LIMIT 1");

    let raw: Option<RawDocument> = self
      .with_connection(move |conn| {
        Ok(conn.query_row(&sql, [], RawDocument::from_row).optional()?)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn counts(&self) -> Result<StoreCounts> {
    self
      .with_connection(|conn| {
        let count = |table: &str| -> rusqlite::Result<usize> {
          let n: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
          Ok(n as usize)
        };
        Ok(StoreCounts {
          documents: count("xml_metadata")?,
          matches:   count("guid_xml_mapping")?,
          records:   count("excel_metadata")?,
        })
      })
      .await
  }
}
