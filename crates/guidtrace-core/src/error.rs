//! Error types for `guidtrace-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The input table lacks columns the index needs. Fatal for a run.
  #[error("input table is missing required columns: {}", .0.join(", "))]
  MissingColumns(Vec<String>),

  #[error("row {0} is out of range")]
  RowOutOfRange(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
