//! Scanning a single document: parse, classify, match, persist.

use std::{
  collections::BTreeSet,
  path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime, SubsecRound as _};
use guidtrace_core::{
  document::{CommitSummary, DocumentBatch, DocumentFields, DocumentMetadata, GuidMatch},
  index::{GuidLookup, RecordIndex},
  store::TraceStore,
};
use guidtrace_xml::{Document, KeywordRules, classify, find_matches};
use tracing::{debug, error, info, warn};

/// What a document yielded before anything is persisted.
#[derive(Debug, Clone)]
pub struct DocumentScan {
  pub path:       PathBuf,
  pub file_name:  String,
  pub fields:     DocumentFields,
  pub matches:    Vec<GuidMatch>,
  pub parse_time: NaiveDateTime,
}

impl DocumentScan {
  /// Distinct GUIDs among the matches.
  pub fn guids(&self) -> BTreeSet<String> { self.matches.iter().map(|m| m.guid.clone()).collect() }

  fn into_batch(self, index: &RecordIndex) -> DocumentBatch {
    let records = self
      .guids()
      .iter()
      .filter_map(|guid| index.record_metadata(guid))
      .collect();
    DocumentBatch {
      document: DocumentMetadata {
        path:       self.path,
        file_name:  self.file_name,
        fields:     self.fields,
        parse_time: self.parse_time,
      },
      matches: self.matches,
      records,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
  ParseFailed,
  NoMatches,
  Committed(CommitSummary),
  CommitFailed,
}

/// Result of scanning one file, folded into the run report by the driver.
#[derive(Debug, Clone)]
pub struct FileOutcome {
  pub status:      FileStatus,
  pub matched:     BTreeSet<String>,
  /// Match triples produced, including any the store already held.
  pub match_count: usize,
}

impl FileOutcome {
  fn parse_failed() -> Self {
    Self { status: FileStatus::ParseFailed, matched: BTreeSet::new(), match_count: 0 }
  }
}

/// Parse `path` and collect its classification and GUID matches. Touches
/// neither the index nor the store, so it can run on any thread.
pub fn analyze_document(
  path: &Path,
  guids: &impl GuidLookup,
  rules: &KeywordRules,
) -> guidtrace_xml::Result<DocumentScan> {
  let doc = Document::parse_file(path)?;
  Ok(DocumentScan {
    path:       path.to_path_buf(),
    file_name:  file_name_of(path),
    fields:     classify(&doc, rules),
    matches:    find_matches(&doc, guids),
    parse_time: Local::now().naive_local().trunc_subsecs(0),
  })
}

/// Scan one document against `index` and persist any matches.
///
/// Never fails: a parse error or a rolled-back commit is logged and reported
/// through [`FileStatus`], and the GUIDs found still count toward the run.
pub async fn scan_document<S: TraceStore>(
  path: &Path,
  index: &mut RecordIndex,
  store: &S,
  rules: &KeywordRules,
) -> FileOutcome {
  let scan = analyze_document(path, &*index, rules);
  record_scan(path, scan, index, store).await
}

/// Fold an analysed document into the index and commit it.
pub(crate) async fn record_scan<S: TraceStore>(
  path: &Path,
  scan: guidtrace_xml::Result<DocumentScan>,
  index: &mut RecordIndex,
  store: &S,
) -> FileOutcome {
  let scan = match scan {
    Ok(scan) => scan,
    Err(err) => {
      warn!(file = %path.display(), error = %err, "skipping document that failed to parse");
      return FileOutcome::parse_failed();
    }
  };

  let matched = scan.guids();
  let match_count = scan.matches.len();
  for m in &scan.matches {
    index.observe(&m.guid, &scan.file_name);
  }

  if scan.matches.is_empty() {
    debug!(file = %scan.file_name, "no GUID matches");
    return FileOutcome { status: FileStatus::NoMatches, matched, match_count };
  }

  let file_name = scan.file_name.clone();
  let status = match store.commit_document(scan.into_batch(index)).await {
    Ok(summary) => {
      info!(file = %file_name, guids = matched.len(), matches = match_count, "document committed");
      FileStatus::Committed(summary)
    }
    Err(err) => {
      error!(file = %file_name, error = %err, "database write failed; document rolled back");
      FileStatus::CommitFailed
    }
  };

  FileOutcome { status, matched, match_count }
}

fn file_name_of(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn analyze_reports_classification_and_matches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bus.xml");
    std::fs::write(&path, r#"<Icd port="RX1"><Signal id="G1" msg="ALT"/></Icd>"#).unwrap();

    let guids: HashSet<String> = ["G1".to_string()].into();
    let scan = analyze_document(&path, &guids, &KeywordRules::default()).unwrap();

    assert_eq!(scan.file_name, "bus.xml");
    assert_eq!(scan.fields.physical_port.as_deref(), Some("RX1"));
    assert_eq!(scan.fields.message_name.as_deref(), Some("ALT"));
    assert_eq!(scan.matches.len(), 1);
    assert_eq!(scan.matches[0].node_path, "Icd/Signal");
  }

  #[test]
  fn analyze_fails_on_truncated_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.xml");
    std::fs::write(&path, r#"<Icd><Signal id="G1"#).unwrap();
    let guids: HashSet<String> = HashSet::new();
    assert!(analyze_document(&path, &guids, &KeywordRules::default()).is_err());
  }
}
