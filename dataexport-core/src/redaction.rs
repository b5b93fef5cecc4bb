//! Directory of table columns whose values must be replaced by a digest.
//!
//! The directory is built once from a line-oriented source of
//! `table;column` pairs and is read-only afterwards. Table and column names
//! are lowercased and trimmed on both insert and lookup.

use crate::{Result, error::DataExportError};
use std::collections::{BTreeSet, HashMap};
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

/// Lowercases and trims a table or column name.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Mapping of table name to the set of columns that require redaction.
///
/// A directory created with [`RedactionDirectory::new`] has not been built and
/// every lookup fails with [`DataExportError::NotBuilt`]. Use
/// [`RedactionDirectory::empty`] for a built directory that redacts nothing.
///
/// # Example
/// ```rust
/// use dataexport_core::RedactionDirectory;
///
/// let mut directory = RedactionDirectory::new();
/// let count = directory.build("dbo.Users; Email\n".as_bytes()).unwrap();
///
/// assert_eq!(count, 1);
/// assert!(directory.requires_redaction("DBO.USERS", "email ").unwrap());
/// assert!(!directory.requires_redaction("dbo.users", "id").unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RedactionDirectory {
    tables: Option<HashMap<String, BTreeSet<String>>>,
}

impl RedactionDirectory {
    /// Creates a directory that has not been built yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a built directory with no redacted columns.
    pub fn empty() -> Self {
        Self {
            tables: Some(HashMap::new()),
        }
    }

    /// Builds the directory from `table;column` lines.
    ///
    /// Blank lines are skipped. Duplicate pairs are accepted and stored once.
    /// Any previous contents are replaced.
    ///
    /// # Returns
    /// The number of pairs read
    ///
    /// # Errors
    /// Returns a configuration error if the source cannot be read or a line
    /// is not exactly one `table;column` pair (extra `;` fields included).
    /// The directory is left unchanged on error.
    pub fn build<R: BufRead>(&mut self, source: R) -> Result<usize> {
        let mut tables: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut count = 0_usize;

        for (index, line) in source.lines().enumerate() {
            let line_number = index.saturating_add(1);
            let line = line.map_err(|e| {
                DataExportError::configuration(format!(
                    "Failed to read redaction configuration at line {}: {}",
                    line_number, e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split(';');
            let (table, column) = match (fields.next(), fields.next(), fields.next()) {
                (Some(table), Some(column), None) => {
                    Some((normalize_name(table), normalize_name(column)))
                }
                _ => None,
            }
            .filter(|(table, column)| !table.is_empty() && !column.is_empty())
            .ok_or_else(|| {
                DataExportError::configuration(format!(
                    "Redaction configuration line {} must be in table;column format",
                    line_number
                ))
            })?;

            debug!("Redacting column '{}' of table '{}'", column, table);
            tables.entry(table).or_default().insert(column);
            count = count.saturating_add(1);
        }

        self.tables = Some(tables);
        Ok(count)
    }

    /// Opens `path` and builds the directory from its contents.
    ///
    /// # Errors
    /// Returns a configuration error if the file cannot be opened or parsed.
    pub fn build_from_path(&mut self, path: &Path) -> Result<usize> {
        let file = std::fs::File::open(path).map_err(|e| {
            DataExportError::configuration(format!(
                "Failed to open redaction configuration {}: {}",
                path.display(),
                e
            ))
        })?;

        self.build(std::io::BufReader::new(file))
    }

    /// Checks whether `column` of `table` must be redacted.
    ///
    /// A table that is not in the directory simply has no redacted columns.
    ///
    /// # Errors
    /// Returns [`DataExportError::NotBuilt`] if the directory was never built.
    pub fn requires_redaction(&self, table: &str, column: &str) -> Result<bool> {
        let tables = self.tables.as_ref().ok_or(DataExportError::NotBuilt)?;

        Ok(tables
            .get(&normalize_name(table))
            .is_some_and(|columns| columns.contains(&normalize_name(column))))
    }

    /// Returns true once [`build`](Self::build) has succeeded.
    pub const fn is_built(&self) -> bool {
        self.tables.is_some()
    }

    /// Number of tables with at least one redacted column.
    pub fn table_count(&self) -> usize {
        self.tables.as_ref().map_or(0, HashMap::len)
    }

    /// Total number of distinct redacted columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables
            .as_ref()
            .map_or(0, |tables| tables.values().map(BTreeSet::len).sum())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    const LIBRARY: &str = "testdb.dbo.test_table;firstname\ntestdb.dbo.test_table;lastname\n";

    #[test]
    fn test_build_and_lookup() {
        let mut directory = RedactionDirectory::new();
        let count = directory.build(LIBRARY.as_bytes()).unwrap();
        assert_eq!(count, 2);

        let table = "testdb.dbo.test_table";
        assert!(directory.requires_redaction(table, "firstname").unwrap());
        assert!(directory.requires_redaction(table, "lastname").unwrap());
        assert!(!directory.requires_redaction(table, "Address1").unwrap());
    }

    #[test]
    fn test_lookup_before_build_fails() {
        let directory = RedactionDirectory::new();
        assert!(!directory.is_built());
        assert!(matches!(
            directory.requires_redaction("users", "email"),
            Err(DataExportError::NotBuilt)
        ));
    }

    #[test]
    fn test_empty_directory_is_built() {
        let directory = RedactionDirectory::empty();
        assert!(directory.is_built());
        assert!(!directory.requires_redaction("users", "email").unwrap());
    }

    #[test]
    fn test_lookup_is_case_and_whitespace_insensitive() {
        let mut directory = RedactionDirectory::new();
        directory.build("  Users ;  EMail  \n".as_bytes()).unwrap();

        assert!(directory.requires_redaction("users", "email").unwrap());
        assert!(directory.requires_redaction(" USERS", "Email ").unwrap());
    }

    #[test]
    fn test_unknown_table_is_not_an_error() {
        let mut directory = RedactionDirectory::new();
        directory.build(LIBRARY.as_bytes()).unwrap();
        assert!(!directory.requires_redaction("orders", "firstname").unwrap());
    }

    #[test]
    fn test_duplicates_are_idempotent() {
        let mut directory = RedactionDirectory::new();
        let count = directory
            .build("users;email\nUSERS;Email\nusers;phone\n".as_bytes())
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(directory.table_count(), 1);
        assert_eq!(directory.column_count(), 2);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let mut directory = RedactionDirectory::new();
        let count = directory
            .build("\nusers;email\n   \n\norders;card\n".as_bytes())
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(directory.table_count(), 2);
    }

    #[test]
    fn test_malformed_line_is_rejected() {
        for source in ["users\n", "users;\n", ";email\n", "users;email\nbroken\n"] {
            let mut directory = RedactionDirectory::new();
            let result = directory.build(source.as_bytes());
            assert!(
                matches!(result, Err(DataExportError::Configuration { .. })),
                "expected configuration error for {:?}",
                source
            );
            assert!(!directory.is_built());
        }
    }

    #[test]
    fn test_extra_fields_line() {
        let mut directory = RedactionDirectory::new();
        directory.build("orders;card\n".as_bytes()).unwrap();

        let result = directory.build("users;phone\nusers;email;pii\n".as_bytes());
        match result {
            Err(DataExportError::Configuration { message }) => {
                assert!(message.contains("line 2"), "{}", message);
            }
            other => panic!("expected configuration error, got {:?}", other),
        }

        // previous contents survive the failed build
        assert!(directory.requires_redaction("orders", "card").unwrap());
        assert!(!directory.requires_redaction("users", "phone").unwrap());
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut directory = RedactionDirectory::new();
        directory.build("users;email\n".as_bytes()).unwrap();
        directory.build("orders;card\n".as_bytes()).unwrap();

        assert!(!directory.requires_redaction("users", "email").unwrap());
        assert!(directory.requires_redaction("orders", "card").unwrap());
    }

    #[test]
    fn test_build_from_missing_path() {
        let mut directory = RedactionDirectory::new();
        let result = directory.build_from_path(Path::new("/nonexistent/redact.lib"));
        assert!(matches!(result, Err(DataExportError::Configuration { .. })));
    }
}
