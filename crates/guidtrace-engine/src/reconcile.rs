//! The reconciliation driver: index the records, scan the corpus, annotate
//! the table.

use std::{collections::BTreeSet, path::Path, path::PathBuf, sync::Arc};

use guidtrace_core::{
  index::RecordIndex,
  store::TraceStore,
  table::{AnnotatedTable, ColumnMap, RecordTable, ResultColumns},
};
use guidtrace_xml::KeywordRules;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{Instrument as _, error, info, info_span, warn};

use crate::{
  Error, Result,
  corpus::CorpusWalker,
  scan::{FileOutcome, FileStatus, analyze_document, record_scan, scan_document},
};

// ─── Options and report ──────────────────────────────────────────────────────

/// Corpus scanning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
  /// Documents parsed at once. `1` scans strictly in sequence.
  pub concurrency:  usize,
  pub follow_links: bool,
}

impl Default for ScanOptions {
  fn default() -> Self { Self { concurrency: 1, follow_links: false } }
}

/// Counters describing one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub indexed_guids:      usize,
  pub files_enumerated:   usize,
  pub files_parsed:       usize,
  pub parse_failures:     usize,
  pub files_with_matches: usize,
  pub commit_failures:    usize,
  pub match_triples:      usize,
  pub matched_guids:      usize,
  pub rows_annotated:     usize,
}

impl RunReport {
  fn absorb(&mut self, outcome: &FileOutcome) {
    match outcome.status {
      FileStatus::ParseFailed => self.parse_failures += 1,
      FileStatus::NoMatches => self.files_parsed += 1,
      FileStatus::Committed(_) => {
        self.files_parsed += 1;
        self.files_with_matches += 1;
      }
      FileStatus::CommitFailed => {
        self.files_parsed += 1;
        self.files_with_matches += 1;
        self.commit_failures += 1;
      }
    }
    self.match_triples += outcome.match_count;
  }
}

/// The output of a run.
#[derive(Debug, Clone)]
pub struct Reconciliation {
  pub table:   AnnotatedTable,
  pub matched: BTreeSet<String>,
  pub report:  RunReport,
}

// ─── Driver ──────────────────────────────────────────────────────────────────

/// Orchestrates one reconciliation run against a store.
pub struct Reconciler<'a, S> {
  store:       &'a S,
  columns:     ColumnMap,
  results:     ResultColumns,
  rules:       KeywordRules,
  options:     ScanOptions,
  reset_store: bool,
}

impl<'a, S: TraceStore> Reconciler<'a, S> {
  pub fn new(store: &'a S) -> Self {
    Self {
      store,
      columns: ColumnMap::default(),
      results: ResultColumns::default(),
      rules: KeywordRules::default(),
      options: ScanOptions::default(),
      reset_store: false,
    }
  }

  pub fn columns(mut self, columns: ColumnMap) -> Self {
    self.columns = columns;
    self
  }

  pub fn result_columns(mut self, results: ResultColumns) -> Self {
    self.results = results;
    self
  }

  pub fn keywords(mut self, rules: KeywordRules) -> Self {
    self.rules = rules;
    self
  }

  pub fn options(mut self, options: ScanOptions) -> Self {
    self.options = options;
    self
  }

  /// Clear the store before scanning.
  pub fn reset_store(mut self, reset: bool) -> Self {
    self.reset_store = reset;
    self
  }

  /// Run the full reconciliation of `table` against the XML files under
  /// `corpus_root`.
  ///
  /// Fails only on run-level problems: missing input columns or a store that
  /// cannot be reset or initialised. An empty index or corpus is not an
  /// error; the table is returned with every row unmatched.
  pub async fn run(&self, table: RecordTable, corpus_root: &Path) -> Result<Reconciliation> {
    let span = info_span!("reconcile", corpus = %corpus_root.display());
    self.run_inner(table, corpus_root).instrument(span).await
  }

  async fn run_inner(&self, table: RecordTable, corpus_root: &Path) -> Result<Reconciliation> {
    if self.reset_store {
      self.store.reset().await.map_err(Error::store)?;
      info!("store cleared");
    }
    self.store.ensure_schema().await.map_err(Error::store)?;

    let (mut index, mut table) = RecordIndex::build(table, &self.columns, &self.results)?;
    let mut report = RunReport { indexed_guids: index.len(), ..RunReport::default() };
    info!(rows = table.table().len(), guids = index.len(), "record index built");

    if index.is_empty() {
      warn!("no rows carry a GUID; nothing to reconcile");
      return Ok(Reconciliation { table, matched: BTreeSet::new(), report });
    }

    let files = CorpusWalker::new(corpus_root)
      .follow_links(self.options.follow_links)
      .enumerate();
    report.files_enumerated = files.len();
    info!(files = files.len(), "corpus enumerated");

    if files.is_empty() {
      warn!("no XML files in corpus; nothing to reconcile");
      return Ok(Reconciliation { table, matched: BTreeSet::new(), report });
    }

    let matched = if self.options.concurrency > 1 {
      self.scan_concurrently(files, &mut index, &mut report).await
    } else {
      self.scan_sequentially(&files, &mut index, &mut report).await
    };

    report.matched_guids = matched.len();
    report.rows_annotated = index.annotate(&matched, &mut table)?;
    info!(
      guids = report.matched_guids,
      rows = report.rows_annotated,
      parse_failures = report.parse_failures,
      commit_failures = report.commit_failures,
      "reconciliation finished"
    );

    Ok(Reconciliation { table, matched, report })
  }

  async fn scan_sequentially(
    &self,
    files: &[PathBuf],
    index: &mut RecordIndex,
    report: &mut RunReport,
  ) -> BTreeSet<String> {
    let mut matched = BTreeSet::new();
    for path in files {
      let outcome = scan_document(path, index, self.store, &self.rules).await;
      report.absorb(&outcome);
      matched.extend(outcome.matched);
    }
    matched
  }

  /// Parse up to `concurrency` documents at once on blocking workers. Workers
  /// only read a detached key set; index updates and commits happen here, one
  /// document at a time, as results come back.
  async fn scan_concurrently(
    &self,
    files: Vec<PathBuf>,
    index: &mut RecordIndex,
    report: &mut RunReport,
  ) -> BTreeSet<String> {
    let keys = Arc::new(index.key_set());
    let rules = Arc::new(self.rules.clone());
    let mut pending = files.into_iter();
    let mut workers = JoinSet::new();
    let mut matched = BTreeSet::new();

    loop {
      while workers.len() < self.options.concurrency {
        let Some(path) = pending.next() else { break };
        let keys = Arc::clone(&keys);
        let rules = Arc::clone(&rules);
        workers.spawn_blocking(move || {
          let scan = analyze_document(&path, &*keys, &rules);
          (path, scan)
        });
      }

      let Some(joined) = workers.join_next().await else { break };
      match joined {
        Ok((path, scan)) => {
          let outcome = record_scan(&path, scan, index, self.store).await;
          report.absorb(&outcome);
          matched.extend(outcome.matched);
        }
        Err(err) => {
          error!(error = %err, "scan worker failed");
          report.parse_failures += 1;
        }
      }
    }
    matched
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn report_counts_each_status() {
    let mut report = RunReport::default();
    for status in [
      FileStatus::ParseFailed,
      FileStatus::NoMatches,
      FileStatus::Committed(Default::default()),
      FileStatus::CommitFailed,
    ] {
      report.absorb(&FileOutcome { status, matched: BTreeSet::new(), match_count: 2 });
    }
    assert_eq!(report.parse_failures, 1);
    assert_eq!(report.files_parsed, 3);
    assert_eq!(report.files_with_matches, 2);
    assert_eq!(report.commit_failures, 1);
    assert_eq!(report.match_triples, 8);
  }

  #[test]
  fn scan_options_default_to_sequential() {
    assert_eq!(ScanOptions::default().concurrency, 1);
  }
}
