//! Error types for the export engine.
//!
//! Errors never carry passwords or the digest secret. Connection failures
//! only describe the target through the credential-free `Display` of
//! [`ConnectionConfig`](crate::adapters::ConnectionConfig).

use thiserror::Error;

/// Main error type for dataexport operations.
///
/// # Security
/// Connection strings, passwords and the digest secret are never included in
/// error output.
#[derive(Debug, Error)]
pub enum DataExportError {
    /// Configuration, table list or redaction source is missing or malformed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Database connection or authentication failed
    #[error("Database connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The query for a table could not be started
    #[error("Query for table '{table}' could not be started")]
    Query {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A row's values could not be decoded
    #[error("Failed to read row {row}: {context}")]
    Scan { row: u64, context: String },

    /// Output file could not be created or written
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The redaction directory was queried before it was built
    #[error("Redaction directory has not been built; build it from a configuration source first")]
    NotBuilt,

    /// A table export stopped part-way through
    #[error("Export of table '{table}' failed after {rows} rows")]
    TableExport {
        table: String,
        rows: u64,
        #[source]
        source: Box<DataExportError>,
    },
}

/// Convenience type alias for Results with `DataExportError`
pub type Result<T> = std::result::Result<T, DataExportError>;

impl DataExportError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a connection error with sanitized context
    pub fn connection_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a query error for the given table
    pub fn query_failed<E>(table: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query {
            table: table.into(),
            source: Box::new(error),
        }
    }

    /// Creates a scan error for the 1-based row number
    pub fn scan_failed(row: u64, context: impl Into<String>) -> Self {
        Self::Scan {
            row,
            context: context.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wraps an error with the table being exported and the rows written so far.
    ///
    /// Errors that are already wrapped are returned unchanged.
    pub fn in_table(self, table: impl Into<String>, rows: u64) -> Self {
        match self {
            wrapped @ Self::TableExport { .. } => wrapped,
            other => Self::TableExport {
                table: table.into(),
                rows,
                source: Box::new(other),
            },
        }
    }

    /// Formats the error followed by every underlying cause, `: `-separated.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(error) = cause {
            message.push_str(": ");
            message.push_str(&error.to_string());
            cause = error.source();
        }
        message
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = DataExportError::configuration("Output type must be CSV or SQL");
        assert!(error.to_string().contains("CSV or SQL"));

        let error = DataExportError::scan_failed(3, "column 2 has an unsupported type");
        assert_eq!(
            error.to_string(),
            "Failed to read row 3: column 2 has an unsupported type"
        );
    }

    #[test]
    fn test_in_table_wraps_once() {
        let error = DataExportError::scan_failed(5, "column 2 could not be decoded")
            .in_table("dbo.users", 4);
        assert_eq!(
            error.to_string(),
            "Export of table 'dbo.users' failed after 4 rows"
        );

        let rewrapped = error.in_table("other", 9);
        match rewrapped {
            DataExportError::TableExport { table, rows, source } => {
                assert_eq!(table, "dbo.users");
                assert_eq!(rows, 4);
                assert!(matches!(*source, DataExportError::Scan { row: 5, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_report_includes_every_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::StorageFull, "No space left on device");
        let error = DataExportError::io("Failed to write to users.csv", io).in_table("users", 1);

        assert_eq!(
            error.report(),
            "Export of table 'users' failed after 1 rows: \
             I/O operation failed: Failed to write to users.csv: No space left on device"
        );
        assert_eq!(
            DataExportError::NotBuilt.report(),
            DataExportError::NotBuilt.to_string()
        );
    }

    #[test]
    fn test_query_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "Invalid object name");
        let error = DataExportError::query_failed("missing_table", io);
        assert!(error.to_string().contains("missing_table"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
