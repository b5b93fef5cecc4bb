//! Row source traits and database adapters.
//!
//! The exporter only depends on [`RowSource`] and [`RowCursor`]; the SQL
//! Server adapter in `mssql` is one implementation. Tests provide in-memory
//! sources.
//!
//! # Module Structure
//! - `config`: Connection configuration (`ConnectionConfig`, `AuthMode`)
//! - `mssql`: SQL Server adapter over tiberius (feature `mssql`)

use crate::{Result, models::ColumnValue, tables::TableSpec};
use async_trait::async_trait;

pub mod config;

#[cfg(feature = "mssql")]
pub mod mssql;

pub use config::{AuthMode, ConnectionConfig, DEFAULT_PORT};

/// Something that can run a table's query and hand back a row cursor.
///
/// Only one cursor is open at a time: the cursor borrows the source
/// mutably until it is dropped.
#[async_trait]
pub trait RowSource: Send {
    /// Runs the select statement for `table` and returns a forward-only cursor.
    ///
    /// # Errors
    /// Returns [`DataExportError::Query`](crate::DataExportError::Query) if the
    /// query cannot be started.
    async fn open_table<'a>(&'a mut self, table: &TableSpec) -> Result<Box<dyn RowCursor + 'a>>;

    /// Credential-free description of the source for logs.
    fn description(&self) -> String;
}

/// Forward-only cursor over one query's rows.
///
/// Dropping the cursor releases it.
#[async_trait]
pub trait RowCursor: Send {
    /// Ordered column names, fixed for the life of the cursor.
    fn columns(&self) -> &[String];

    /// Reads the next row into `buffer`, one value per column.
    ///
    /// `buffer` must be exactly as long as [`columns`](Self::columns).
    ///
    /// # Returns
    /// `true` if a row was read, `false` at end of rows
    ///
    /// # Errors
    /// Returns [`DataExportError::Scan`](crate::DataExportError::Scan) if the
    /// row cannot be decoded.
    async fn scan_into(&mut self, buffer: &mut [ColumnValue]) -> Result<bool>;
}
