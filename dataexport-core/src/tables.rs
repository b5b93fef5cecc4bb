//! Table list parsing.
//!
//! Each non-blank line names a table, optionally followed by `;` and a row
//! filter expression used as the query's `where` clause.

use crate::redaction::normalize_name;
use crate::{Result, error::DataExportError};
use std::io::BufRead;
use std::path::Path;

/// A table to export and its optional row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Lowercased, trimmed table name as written in the table list
    pub name: String,
    /// Lowercased, trimmed filter expression
    pub filter: Option<String>,
}

impl TableSpec {
    /// Creates a spec, normalizing the name and filter.
    ///
    /// An empty or whitespace-only filter means no filter.
    pub fn new(name: &str, filter: Option<&str>) -> Self {
        Self {
            name: normalize_name(name),
            filter: filter.map(normalize_name).filter(|f| !f.is_empty()),
        }
    }

    /// Parses one table list line (`table` or `table;filter`).
    ///
    /// Everything after the first `;` is the filter. Returns `None` for blank
    /// lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        if line.trim().is_empty() {
            return None;
        }

        let spec = match line.split_once(';') {
            Some((table, filter)) => Self::new(table, Some(filter)),
            None => Self::new(line, None),
        };
        Some(spec)
    }

    /// The statement the row source runs for this table.
    ///
    /// # Example
    /// ```rust
    /// use dataexport_core::TableSpec;
    ///
    /// let spec = TableSpec::new("dbo.Users", Some("Active = 1"));
    /// assert_eq!(spec.select_statement(), "select * from dbo.users where active = 1");
    /// ```
    pub fn select_statement(&self) -> String {
        match &self.filter {
            Some(filter) => format!("select * from {} where {}", self.name, filter),
            None => format!("select * from {}", self.name),
        }
    }
}

impl std::fmt::Display for TableSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{} (where {})", self.name, filter),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Reads a table list, skipping blank lines.
///
/// # Errors
/// Returns a configuration error if the source cannot be read or names a
/// table with an empty name (for example a line starting with `;`).
pub fn parse_table_list<R: BufRead>(source: R) -> Result<Vec<TableSpec>> {
    let mut tables = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line_number = index.saturating_add(1);
        let line = line.map_err(|e| {
            DataExportError::configuration(format!(
                "Failed to read table list at line {}: {}",
                line_number, e
            ))
        })?;

        if let Some(spec) = TableSpec::parse_line(&line) {
            if spec.name.is_empty() {
                return Err(DataExportError::configuration(format!(
                    "Table list line {} has no table name",
                    line_number
                )));
            }
            tables.push(spec);
        }
    }

    Ok(tables)
}

/// Opens `path` and reads the table list from it.
///
/// # Errors
/// Returns a configuration error if the file cannot be opened or parsed.
pub fn read_table_list(path: &Path) -> Result<Vec<TableSpec>> {
    let file = std::fs::File::open(path).map_err(|e| {
        DataExportError::configuration(format!(
            "Failed to open table list {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_table_list(std::io::BufReader::new(file))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_without_filter() {
        let spec = TableSpec::parse_line("  TestDB.dbo.Users  ").unwrap();
        assert_eq!(spec.name, "testdb.dbo.users");
        assert_eq!(spec.filter, None);
        assert_eq!(spec.select_statement(), "select * from testdb.dbo.users");
    }

    #[test]
    fn test_parse_table_with_filter() {
        let spec = TableSpec::parse_line("orders; Created > '2017-01-01' ").unwrap();
        assert_eq!(spec.name, "orders");
        assert_eq!(spec.filter.as_deref(), Some("created > '2017-01-01'"));
        assert_eq!(
            spec.select_statement(),
            "select * from orders where created > '2017-01-01'"
        );
    }

    #[test]
    fn test_empty_filter_means_none() {
        assert_eq!(TableSpec::parse_line("users;").unwrap().filter, None);
        assert_eq!(TableSpec::parse_line("users;   ").unwrap().filter, None);
    }

    #[test]
    fn test_filter_keeps_text_after_first_separator() {
        let spec = TableSpec::parse_line("users;a = 1;b = 2").unwrap();
        assert_eq!(spec.filter.as_deref(), Some("a = 1;b = 2"));
    }

    #[test]
    fn test_parse_table_list_skips_blank_lines() {
        let tables = parse_table_list("users\n\n  \norders;id > 10\n".as_bytes()).unwrap();
        assert_eq!(
            tables,
            vec![
                TableSpec::new("users", None),
                TableSpec::new("orders", Some("id > 10")),
            ]
        );
    }

    #[test]
    fn test_parse_table_list_rejects_missing_name() {
        let result = parse_table_list("users\n;id > 10\n".as_bytes());
        assert!(matches!(result, Err(DataExportError::Configuration { .. })));
    }

    #[test]
    fn test_read_missing_table_list() {
        let result = read_table_list(Path::new("/nonexistent/tables.txt"));
        assert!(matches!(result, Err(DataExportError::Configuration { .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(TableSpec::new("Users", None).to_string(), "users");
        assert_eq!(
            TableSpec::new("users", Some("id = 1")).to_string(),
            "users (where id = 1)"
        );
    }
}
