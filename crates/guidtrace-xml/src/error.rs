//! Error types for the guidtrace-xml parser.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("xml error: {0}")]
  Xml(#[from] quick_xml::Error),

  #[error("malformed attribute: {0}")]
  Attribute(#[from] quick_xml::events::attributes::AttrError),

  #[error("undecodable text: {0}")]
  Encoding(#[from] quick_xml::encoding::EncodingError),

  #[error("input is not valid {0}")]
  Undecodable(&'static str),

  #[error("document has no root element")]
  NoRoot,

  #[error("second root element <{0}>")]
  MultipleRoots(String),

  #[error("text outside the root element")]
  TextOutsideRoot,

  #[error("unexpected closing tag")]
  UnmatchedEnd,

  #[error("element <{0}> is never closed")]
  Unclosed(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
