//! Core types and trait definitions for GUID traceability.
//!
//! This crate is deliberately free of XML and database dependencies. It owns
//! the input record table, the in-memory [`index::RecordIndex`], the rows
//! persisted per scanned document, and the [`store::TraceStore`] abstraction
//! that storage backends implement.

pub mod document;
pub mod error;
pub mod index;
pub mod record;
pub mod store;
pub mod table;

pub use error::{Error, Result};
