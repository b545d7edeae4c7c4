//! The `TraceStore` trait.
//!
//! Implemented by storage backends (e.g. `guidtrace-store-sqlite`). The
//! engine depends on this abstraction, not on any concrete backend.

use std::{future::Future, path::Path};

use crate::document::{
  CommitSummary, DocumentBatch, DocumentMetadata, GuidMatch, RecordMetadata, StoreCounts,
  StoredMatch,
};

/// Durable traceability store.
///
/// Every write is insert-or-ignore: repeating a write whose uniqueness key
/// (document path, full match tuple, record GUID) already exists is a no-op,
/// so a whole scan can be re-run safely.
pub trait TraceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Maintenance ───────────────────────────────────────────────────────

  /// Create tables and indexes if they do not exist.
  fn ensure_schema(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete every row from every table, keeping the schema. Creates the
  /// schema first when the store is new.
  fn reset(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Insert-or-ignore writes ───────────────────────────────────────────

  /// Returns `true` if the row was inserted, `false` if the path existed.
  fn upsert_document(
    &self,
    document: DocumentMetadata,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns the number of match rows actually inserted.
  fn upsert_matches<'a>(
    &'a self,
    path: &'a Path,
    matches: Vec<GuidMatch>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Returns `true` if the row was inserted, `false` if the GUID existed.
  fn upsert_record(
    &self,
    record: RecordMetadata,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Perform all three writes for one document in a single transaction.
  /// On error nothing from the batch is kept.
  fn commit_document(
    &self,
    batch: DocumentBatch,
  ) -> impl Future<Output = Result<CommitSummary, Self::Error>> + Send + '_;

  // ── Key lookups ───────────────────────────────────────────────────────

  fn get_document<'a>(
    &'a self,
    path: &'a Path,
  ) -> impl Future<Output = Result<Option<DocumentMetadata>, Self::Error>> + Send + 'a;

  fn documents_by_name<'a>(
    &'a self,
    file_name: &'a str,
  ) -> impl Future<Output = Result<Vec<DocumentMetadata>, Self::Error>> + Send + 'a;

  fn matches_for_guid<'a>(
    &'a self,
    guid: &'a str,
  ) -> impl Future<Output = Result<Vec<StoredMatch>, Self::Error>> + Send + 'a;

  fn matches_for_document<'a>(
    &'a self,
    path: &'a Path,
  ) -> impl Future<Output = Result<Vec<StoredMatch>, Self::Error>> + Send + 'a;

  fn get_record<'a>(
    &'a self,
    guid: &'a str,
  ) -> impl Future<Output = Result<Option<RecordMetadata>, Self::Error>> + Send + 'a;

  /// Any one stored document, used by the post-run verification.
  fn sample_document(
    &self,
  ) -> impl Future<Output = Result<Option<DocumentMetadata>, Self::Error>> + Send + '_;

  fn counts(&self) -> impl Future<Output = Result<StoreCounts, Self::Error>> + Send + '_;
}
