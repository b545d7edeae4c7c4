//! GUID reconciliation engine.
//!
//! Enumerates an XML corpus, scans each document against a
//! [`RecordIndex`](guidtrace_core::index::RecordIndex), persists what it finds
//! through any [`TraceStore`](guidtrace_core::store::TraceStore), and annotates
//! the input table with the results.

pub mod corpus;
pub mod error;
pub mod reconcile;
pub mod scan;
pub mod verify;

pub use error::{Error, Result};
pub use reconcile::{Reconciler, Reconciliation, RunReport, ScanOptions};
pub use scan::{DocumentScan, FileOutcome, FileStatus, scan_document};
pub use verify::{Verification, verify};
