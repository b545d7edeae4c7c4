//! Corpus enumeration: every `.xml` file under a root, recursively.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Deterministic walker over a corpus directory.
#[derive(Debug, Clone)]
pub struct CorpusWalker {
  root:         PathBuf,
  follow_links: bool,
}

impl CorpusWalker {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into(), follow_links: false } }

  /// Control whether symlinked directories are descended into. Symlinks to
  /// files are listed either way.
  pub fn follow_links(mut self, follow: bool) -> Self {
    self.follow_links = follow;
    self
  }

  /// Absolute paths of every file whose extension is `xml` in any case,
  /// sorted. Entries that cannot be read are logged and skipped; a missing
  /// root yields an empty list.
  pub fn enumerate(&self) -> Vec<PathBuf> {
    let root = match std::path::absolute(&self.root) {
      Ok(root) => root,
      Err(err) => {
        warn!(root = %self.root.display(), error = %err, "cannot resolve corpus root");
        return Vec::new();
      }
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(self.follow_links) {
      match entry {
        Ok(entry) if is_xml(entry.path()) && is_file(&entry) => {
          files.push(entry.into_path());
        }
        Ok(_) => {}
        Err(err) => {
          let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
          warn!(path = %path, error = %err, "skipping unreadable corpus entry");
        }
      }
    }
    files.sort();
    debug!(root = %root.display(), count = files.len(), "enumerated corpus");
    files
  }
}

/// Shorthand for `CorpusWalker::new(root).enumerate()`.
pub fn enumerate(root: impl Into<PathBuf>) -> Vec<PathBuf> { CorpusWalker::new(root).enumerate() }

/// A regular file, or a symlink whose target is one. Dangling links are not.
fn is_file(entry: &walkdir::DirEntry) -> bool {
  entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

fn is_xml(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}
