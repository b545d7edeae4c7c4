//! Integration tests for `SqliteStore` against in-memory and file databases.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use guidtrace_core::{
  document::{
    DocumentBatch, DocumentFields, DocumentMetadata, GuidMatch, RecordMetadata, StoreCounts,
  },
  record::RecordFields,
  store::TraceStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn parse_time() -> NaiveDateTime {
  NaiveDateTime::parse_from_str("2026-01-05 09:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

fn document(path: &str) -> DocumentMetadata {
  let path = PathBuf::from(path);
  let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
  DocumentMetadata {
    path,
    file_name,
    fields: DocumentFields {
      physical_port: Some("A429-RX1".into()),
      message_name:  Some("ALT_MSG".into()),
      dp_name:       None,
      full_name:     None,
    },
    parse_time: parse_time(),
  }
}

fn guid_match(guid: &str, node_path: &str, attribute: &str) -> GuidMatch {
  GuidMatch { guid: guid.into(), node_path: node_path.into(), attribute: attribute.into() }
}

fn record(guid: &str, row: usize) -> RecordMetadata {
  RecordMetadata {
    guid:       guid.into(),
    fields:     RecordFields {
      physical_port: "A1".into(),
      message_name:  "MSG".into(),
      dp_name:       "DP".into(),
      full_name:     "Full".into(),
    },
    source_row: row,
  }
}

fn batch(path: &str) -> DocumentBatch {
  DocumentBatch {
    document: document(path),
    matches:  vec![
      guid_match("G1", "Icd/Bus/Signal", "id"),
      guid_match("G1", "Icd/Bus/Signal", "ref"),
      guid_match("G2", "Icd/Signal", "id"),
    ],
    records:  vec![record("G1", 0), record("G2", 2)],
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn commit_document_writes_all_three_tables() {
  let s = store().await;
  let summary = s.commit_document(batch("/corpus/bus.xml")).await.unwrap();

  assert!(summary.document_inserted);
  assert_eq!(summary.matches_inserted, 3);
  assert_eq!(summary.records_inserted, 2);

  let counts = s.counts().await.unwrap();
  assert_eq!((counts.documents, counts.matches, counts.records), (1, 3, 2));
}

#[tokio::test]
async fn repeated_commit_is_a_no_op() {
  let s = store().await;
  s.commit_document(batch("/corpus/bus.xml")).await.unwrap();
  let before = s.counts().await.unwrap();

  let summary = s.commit_document(batch("/corpus/bus.xml")).await.unwrap();
  assert!(!summary.document_inserted);
  assert_eq!(summary.matches_inserted, 0);
  assert_eq!(summary.records_inserted, 0);
  assert_eq!(s.counts().await.unwrap(), before);
}

#[tokio::test]
async fn record_metadata_is_written_once_per_guid() {
  let s = store().await;
  assert!(s.upsert_record(record("G1", 4)).await.unwrap());
  assert!(!s.upsert_record(record("G1", 9)).await.unwrap());

  let stored = s.get_record("G1").await.unwrap().unwrap();
  assert_eq!(stored.source_row, 4);
  assert_eq!(stored.fields.dp_name, "DP");
}

#[tokio::test]
async fn document_upsert_keeps_the_first_row() {
  let s = store().await;
  let mut first = document("/corpus/a.xml");
  assert!(s.upsert_document(first.clone()).await.unwrap());

  first.fields.physical_port = Some("other".into());
  assert!(!s.upsert_document(first).await.unwrap());

  let stored = s.get_document(Path::new("/corpus/a.xml")).await.unwrap().unwrap();
  assert_eq!(stored.fields.physical_port.as_deref(), Some("A429-RX1"));
  assert_eq!(stored.parse_time, parse_time());
}

#[tokio::test]
async fn same_guid_in_different_attributes_is_kept() {
  let s = store().await;
  let inserted = s
    .upsert_matches(Path::new("/corpus/a.xml"), vec![
      guid_match("G1", "Icd/Signal", "id"),
      guid_match("G1", "Icd/Signal", "source"),
      guid_match("G1", "Icd/Signal", "id"),
    ])
    .await
    .unwrap();
  assert_eq!(inserted, 2);
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn lookups_by_path_name_and_guid() {
  let s = store().await;
  s.commit_document(batch("/corpus/a/bus.xml")).await.unwrap();
  s.commit_document(batch("/corpus/b/bus.xml")).await.unwrap();

  let doc = s.get_document(Path::new("/corpus/a/bus.xml")).await.unwrap().unwrap();
  assert_eq!(doc.file_name, "bus.xml");
  assert!(doc.fields.dp_name.is_none());

  let named = s.documents_by_name("bus.xml").await.unwrap();
  assert_eq!(named.len(), 2);
  assert_eq!(named[0].path, PathBuf::from("/corpus/a/bus.xml"));

  let g2 = s.matches_for_guid("G2").await.unwrap();
  assert_eq!(g2.len(), 2);
  assert!(g2.iter().all(|m| m.node_path == "Icd/Signal" && m.attribute == "id"));

  let in_a = s.matches_for_document(Path::new("/corpus/a/bus.xml")).await.unwrap();
  assert_eq!(in_a.len(), 3);

  assert!(s.get_document(Path::new("/nope.xml")).await.unwrap().is_none());
  assert!(s.get_record("G9").await.unwrap().is_none());
}

#[tokio::test]
async fn sample_document_is_the_first_written() {
  let s = store().await;
  assert!(s.sample_document().await.unwrap().is_none());

  s.commit_document(batch("/corpus/first.xml")).await.unwrap();
  s.commit_document(batch("/corpus/second.xml")).await.unwrap();
  let sample = s.sample_document().await.unwrap().unwrap();
  assert_eq!(sample.file_name, "first.xml");
}

#[tokio::test]
async fn a_failing_write_rolls_back_the_whole_document() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("trace.db");
  let s = SqliteStore::open(&db).await.unwrap();

  let conn = rusqlite::Connection::open(&db).unwrap();
  conn
    .execute_batch(
      "CREATE TRIGGER reject_g2 BEFORE INSERT ON excel_metadata
       WHEN NEW.guid = 'G2'
       BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
    )
    .unwrap();
  drop(conn);

  assert!(s.commit_document(batch("/corpus/bus.xml")).await.is_err());
  assert_eq!(s.counts().await.unwrap(), StoreCounts::default());

  // The next document is unaffected by the failed one.
  let mut next = batch("/corpus/next.xml");
  next.records.retain(|r| r.guid != "G2");
  s.commit_document(next).await.unwrap();
  assert_eq!(s.counts().await.unwrap().documents, 1);
}

// ─── Maintenance ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_clears_rows_but_keeps_schema() {
  let s = store().await;
  s.commit_document(batch("/corpus/bus.xml")).await.unwrap();
  s.reset().await.unwrap();

  assert_eq!(s.counts().await.unwrap(), StoreCounts::default());
  let summary = s.commit_document(batch("/corpus/bus.xml")).await.unwrap();
  assert!(summary.document_inserted);
}

#[tokio::test]
async fn file_store_persists_across_handles() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("trace.db");

  let s = SqliteStore::open(&db).await.unwrap();
  s.commit_document(batch("/corpus/bus.xml")).await.unwrap();
  drop(s);

  let reopened = SqliteStore::open(&db).await.unwrap();
  assert_eq!(reopened.counts().await.unwrap().documents, 1);
}

#[tokio::test]
async fn reset_on_a_missing_file_creates_the_schema() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("fresh.db");
  let s = SqliteStore::open(&db).await.unwrap();
  for suffix in ["", "-wal", "-shm"] {
    let _ = std::fs::remove_file(dir.path().join(format!("fresh.db{suffix}")));
  }
  assert!(!db.exists());

  s.reset().await.unwrap();
  assert_eq!(s.counts().await.unwrap(), StoreCounts::default());
}

#[tokio::test]
async fn opening_an_unversioned_file_collapses_duplicate_matches() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("legacy.db");
  {
    let conn = rusqlite::Connection::open(&db).unwrap();
    conn
      .execute_batch(
        "CREATE TABLE xml_metadata (
           id INTEGER PRIMARY KEY AUTOINCREMENT,
           xml_file_path TEXT NOT NULL UNIQUE, xml_file_name TEXT NOT NULL,
           physical_port TEXT, message_name TEXT, dp_name TEXT, full_name TEXT,
           parse_time TIMESTAMP NOT NULL
         );
         CREATE TABLE guid_xml_mapping (
           id INTEGER PRIMARY KEY AUTOINCREMENT,
           guid TEXT NOT NULL, xml_file_path TEXT NOT NULL,
           match_node_path TEXT NOT NULL, match_attribute TEXT NOT NULL
         );
         CREATE TABLE excel_metadata (
           id INTEGER PRIMARY KEY AUTOINCREMENT,
           guid TEXT NOT NULL UNIQUE, physical_port TEXT, message_name TEXT,
           dp_name TEXT, full_name TEXT, source_row INTEGER
         );
         INSERT INTO guid_xml_mapping (guid, xml_file_path, match_node_path, match_attribute)
         VALUES ('G1', '/corpus/bus.xml', 'Icd/Bus/Signal', 'id'),
                ('G1', '/corpus/bus.xml', 'Icd/Bus/Signal', 'id'),
                ('G1', '/corpus/bus.xml', 'Icd/Bus/Signal', 'id');",
      )
      .unwrap();
  }

  let s = SqliteStore::open(&db).await.unwrap();
  assert_eq!(s.counts().await.unwrap().matches, 1);

  let summary = s.commit_document(batch("/corpus/bus.xml")).await.unwrap();
  assert_eq!(summary.matches_inserted, 2);
  assert_eq!(s.counts().await.unwrap().matches, 3);
  drop(s);

  let conn = rusqlite::Connection::open(&db).unwrap();
  let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0)).unwrap();
  assert_eq!(version, crate::schema::SCHEMA_VERSION);
}
