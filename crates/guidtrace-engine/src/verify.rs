//! Post-run sanity check: a stored document must be retrievable both by its
//! path and by its bare file name.

use std::path::PathBuf;

use guidtrace_core::store::TraceStore;
use serde::Serialize;
use tracing::{info, warn};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
  pub path:          PathBuf,
  pub file_name:     String,
  pub found_by_path: bool,
  pub found_by_name: bool,
}

impl Verification {
  pub fn is_consistent(&self) -> bool { self.found_by_path && self.found_by_name }
}

/// Look one sample document up both ways. `Ok(None)` when the store holds no
/// documents.
pub async fn verify<S: TraceStore>(store: &S) -> Result<Option<Verification>> {
  let Some(sample) = store.sample_document().await.map_err(Error::store)? else {
    return Ok(None);
  };

  let by_path = store.get_document(&sample.path).await.map_err(Error::store)?;
  let by_name = store
    .documents_by_name(&sample.file_name)
    .await
    .map_err(Error::store)?;

  let verification = Verification {
    found_by_path: by_path.is_some_and(|d| d.file_name == sample.file_name),
    found_by_name: by_name.iter().any(|d| d.path == sample.path),
    path:          sample.path,
    file_name:     sample.file_name,
  };

  if verification.is_consistent() {
    info!(
      path = %verification.path.display(),
      file = %verification.file_name,
      "store verification passed"
    );
  } else {
    warn!(
      path = %verification.path.display(),
      by_path = verification.found_by_path,
      by_name = verification.found_by_name,
      "store verification failed"
    );
  }
  Ok(Some(verification))
}
