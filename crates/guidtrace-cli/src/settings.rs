//! Layered run configuration: an optional TOML file overridden by
//! `GUIDTRACE_*` environment variables.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use guidtrace_core::{
  record::MetadataField,
  table::{ColumnMap, ResultColumns},
};
use guidtrace_engine::ScanOptions;
use guidtrace_xml::KeywordRules;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub input_path:     PathBuf,
  pub output_path:    PathBuf,
  pub corpus_root:    PathBuf,
  pub store_path:     PathBuf,
  pub columns:        ColumnMap,
  pub result_columns: ResultColumns,
  pub scan:           ScanOptions,
  /// Replacement keyword lists, keyed by field. Fields left out keep the
  /// built-in keywords.
  pub keywords:       BTreeMap<MetadataField, Vec<String>>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      input_path:     PathBuf::from("records.csv"),
      output_path:    PathBuf::from("records_annotated.csv"),
      corpus_root:    PathBuf::from("xml"),
      store_path:     PathBuf::from("guidtrace.db"),
      columns:        ColumnMap::default(),
      result_columns: ResultColumns::default(),
      scan:           ScanOptions::default(),
      keywords:       BTreeMap::new(),
    }
  }
}

impl Settings {
  /// Read `path` if it exists, then apply the environment on top.
  /// `GUIDTRACE_SCAN__CONCURRENCY=4` sets `scan.concurrency`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("GUIDTRACE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  /// Classifier rules with any configured keyword lists swapped in.
  pub fn keyword_rules(&self) -> KeywordRules {
    self
      .keywords
      .iter()
      .fold(KeywordRules::default(), |rules, (field, keywords)| {
        rules.with_keywords(*field, keywords.clone())
      })
  }

  /// Expand a leading `~` in every configured path.
  pub fn expand_paths(mut self) -> Self {
    for path in [
      &mut self.input_path,
      &mut self.output_path,
      &mut self.corpus_root,
      &mut self.store_path,
    ] {
      *path = expand_tilde(path);
    }
    self
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
