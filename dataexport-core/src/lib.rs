//! Value formatting, column redaction and table export engine for dataexport.
//!
//! This crate turns rows read from a relational table into flat files
//! (delimited text or SQL `insert` statements). Columns listed in a
//! [`RedactionDirectory`] have their values replaced by a deterministic
//! SHA-256 digest so exported data can be shared without exposing real
//! values while staying joinable across files.
//!
//! # Security Guarantees
//! - Database access is read-only (`select` statements only)
//! - Credentials and the digest secret are zeroed on drop and never logged
//! - The digest is one-way pseudonymization, not encryption: short or
//!   guessable values can be recovered by dictionary attack
//!
//! # Architecture
//! - `digest`: one-way transform of (value, secret) into a printable token
//! - `redaction`: (table, column) directory built from `table;column` lines
//! - `format`: type dispatch from [`ColumnValue`] to output text
//! - `export`: per-table streaming from a [`RowSource`] into `<table>.csv|sql`
//! - `adapters`: row source traits and the SQL Server adapter

pub mod adapters;
pub mod digest;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod models;
pub mod redaction;
pub mod security;
pub mod tables;

// Re-export commonly used types
pub use adapters::{AuthMode, ConnectionConfig, RowCursor, RowSource};
pub use digest::{DigestScheme, digest};
pub use error::{DataExportError, Result};
pub use export::{ExportConfig, ExportSummary, TableExporter, TableReport};
pub use format::{ValueFormatter, format_value};
pub use logging::init_logging;
pub use models::{ColumnValue, OutputMode};
pub use redaction::RedactionDirectory;
pub use security::{Credentials, Secret};
pub use tables::{TableSpec, parse_table_list, read_table_list};
