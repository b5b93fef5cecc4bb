//! Table exporter: streams rows from a [`RowSource`] into one file per table.
//!
//! For each table the exporter opens a cursor, resolves the column list and
//! each column's redaction flag once, writes the preamble, formats and writes
//! every row, then writes the trailer. Tables are exported one after another;
//! the first error stops the run.

use crate::adapters::{RowCursor, RowSource};
use crate::digest::DigestScheme;
use crate::format::ValueFormatter;
use crate::models::{ColumnValue, OutputMode};
use crate::redaction::RedactionDirectory;
use crate::security::Secret;
use crate::tables::TableSpec;
use crate::{Result, error::DataExportError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

/// Default field separator for delimited output.
pub const DEFAULT_SEPARATOR: &str = ";";

/// Rows between progress messages at DEBUG level.
const PROGRESS_INTERVAL: u64 = 10_000;

/// Run-wide export settings.
///
/// # Example
/// ```rust
/// use dataexport_core::{ExportConfig, OutputMode};
///
/// let config = ExportConfig::new(std::env::temp_dir())
///     .with_mode(OutputMode::SqlInsert)
///     .with_separator("|");
///
/// assert!(config.validate().is_ok());
/// assert!(config.output_path("dbo.users").ends_with("dbo.users.sql"));
/// ```
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory receiving `<table>.csv` / `<table>.sql`
    pub output_dir: PathBuf,
    /// Output format
    pub mode: OutputMode,
    /// Field separator for delimited output (SQL output always uses a comma)
    pub separator: String,
    /// Shared secret appended before hashing
    pub secret: Secret,
    /// Digest encoding, fixed for the whole run
    pub scheme: DigestScheme,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            mode: OutputMode::Delimited,
            separator: DEFAULT_SEPARATOR.to_string(),
            secret: Secret::default(),
            scheme: DigestScheme::Sha256Hex,
        }
    }
}

impl ExportConfig {
    /// Creates a config writing to `output_dir` with default settings.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the output mode.
    pub const fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder method to set the delimited-mode separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Builder method to set the digest secret.
    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secret = secret;
        self
    }

    /// Builder method to set the digest scheme.
    pub const fn with_scheme(mut self, scheme: DigestScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Validates export settings.
    ///
    /// # Errors
    /// Returns a configuration error if the separator is empty or the output
    /// directory does not exist.
    pub fn validate(&self) -> Result<()> {
        if self.separator.is_empty() {
            return Err(DataExportError::configuration("separator cannot be empty"));
        }

        if !self.output_dir.is_dir() {
            return Err(DataExportError::configuration(format!(
                "output directory {} does not exist",
                self.output_dir.display()
            )));
        }

        Ok(())
    }

    /// Path of the output file for `table`.
    pub fn output_path(&self, table: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", table, self.mode.extension()))
    }

    /// Column names joined by the mode's separator.
    ///
    /// This is the header line in delimited mode and the column list of every
    /// `insert` statement in SQL mode.
    pub fn header(&self, columns: &[String]) -> String {
        columns.join(self.mode.field_separator(&self.separator))
    }
}

/// Result of exporting one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    /// Table name as written in the table list
    pub table: String,
    /// Rows written
    pub rows: u64,
    /// Output file
    pub path: PathBuf,
}

/// Result of a whole export run.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// One report per exported table, in table list order
    pub tables: Vec<TableReport>,
    /// Wall-clock time for the run
    pub elapsed: Duration,
}

impl ExportSummary {
    /// Total rows across all tables.
    pub fn total_rows(&self) -> u64 {
        self.tables
            .iter()
            .fold(0_u64, |total, report| total.saturating_add(report.rows))
    }
}

/// Exports tables using a redaction directory and run-wide settings.
#[derive(Debug)]
pub struct TableExporter<'d> {
    directory: &'d RedactionDirectory,
    config: ExportConfig,
}

impl<'d> TableExporter<'d> {
    /// Creates an exporter.
    pub const fn new(directory: &'d RedactionDirectory, config: ExportConfig) -> Self {
        Self { directory, config }
    }

    /// Export settings in use.
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Exports every table in order, stopping at the first failure.
    ///
    /// # Errors
    /// Returns the first table's error; files of earlier tables stay on disk.
    pub async fn export_all<S>(&self, source: &mut S, tables: &[TableSpec]) -> Result<ExportSummary>
    where
        S: RowSource + ?Sized,
    {
        let started = Instant::now();
        let mut summary = ExportSummary::default();

        info!(
            "Exporting {} tables from {} as {}",
            tables.len(),
            source.description(),
            self.config.mode
        );

        for table in tables {
            let rows = self.export_table(source, table).await?;
            summary.tables.push(TableReport {
                table: table.name.clone(),
                rows,
                path: self.config.output_path(&table.name),
            });
        }

        summary.elapsed = started.elapsed();
        Ok(summary)
    }

    /// Exports one table and returns the number of rows written.
    ///
    /// The output file is created fresh. On failure the partial file is
    /// flushed and left on disk.
    ///
    /// # Errors
    /// - [`DataExportError::Query`] if the query cannot be started
    /// - [`DataExportError::TableExport`] wrapping an I/O or scan error, with
    ///   the number of rows written before the failure
    pub async fn export_table<S>(&self, source: &mut S, table: &TableSpec) -> Result<u64>
    where
        S: RowSource + ?Sized,
    {
        info!("Exporting table {}", table);

        let mut cursor = source.open_table(table).await?;
        let columns = cursor.columns().to_vec();
        let redaction = self.resolve_redaction(&table.name, &columns);

        let path = self.config.output_path(&table.name);
        let file = tokio::fs::File::create(&path).await.map_err(|e| {
            DataExportError::io(format!("Failed to create {}", path.display()), e)
                .in_table(&table.name, 0)
        })?;
        let mut writer = BufWriter::new(file);

        let mut rows = 0_u64;
        let streamed = self
            .write_table(
                cursor.as_mut(),
                &table.name,
                &columns,
                &redaction,
                &mut writer,
                &path,
                &mut rows,
            )
            .await;
        drop(cursor);

        let flushed = writer
            .shutdown()
            .await
            .map_err(|e| DataExportError::io(format!("Failed to flush {}", path.display()), e));

        match (streamed, flushed) {
            (Ok(()), Ok(())) => {
                info!("Exported table: {}, {} rows exported", table.name, rows);
                Ok(rows)
            }
            (Ok(()), Err(e)) => Err(e.in_table(&table.name, rows)),
            (Err(e), flushed) => {
                if let Err(flush_error) = flushed {
                    warn!("{}", flush_error);
                }
                Err(e.in_table(&table.name, rows))
            }
        }
    }

    /// Looks up every column's redaction flag once per table.
    ///
    /// `None` marks a column whose status could not be determined; its
    /// fields are written empty.
    fn resolve_redaction(&self, table: &str, columns: &[String]) -> Vec<Option<bool>> {
        let flags: Vec<Option<bool>> = columns
            .iter()
            .map(|column| match self.directory.requires_redaction(table, column) {
                Ok(redact) => {
                    if redact {
                        debug!("Column '{}' of table '{}' will be redacted", column, table);
                    }
                    Some(redact)
                }
                Err(e) => {
                    debug!("Redaction lookup for '{}.{}' failed: {}", table, column, e);
                    None
                }
            })
            .collect();

        if flags.iter().any(Option::is_none) {
            warn!(
                "Redaction status unknown for table '{}'; affected columns will be written empty",
                table
            );
        }

        flags
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_table<W>(
        &self,
        cursor: &mut (dyn RowCursor + '_),
        table: &str,
        columns: &[String],
        redaction: &[Option<bool>],
        writer: &mut W,
        path: &Path,
        rows: &mut u64,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mode = self.config.mode;
        let header = self.config.header(columns);
        let separator = mode.field_separator(&self.config.separator);
        let formatter =
            ValueFormatter::new(mode, self.config.secret.expose()).with_scheme(self.config.scheme);

        match mode {
            OutputMode::Delimited => write_line(writer, &header, path).await?,
            OutputMode::SqlInsert => {
                write_line(writer, &format!("set identity_insert {} on", table), path).await?;
            }
        }

        let mut buffer = vec![ColumnValue::Null; columns.len()];
        let mut line = String::new();

        while cursor.scan_into(&mut buffer).await? {
            line.clear();
            for (index, (value, redact)) in buffer.iter().zip(redaction).enumerate() {
                if index > 0 {
                    line.push_str(separator);
                }
                if let Some(redact) = redact {
                    line.push_str(&formatter.format(value, *redact));
                }
            }

            match mode {
                OutputMode::Delimited => write_line(writer, &line, path).await?,
                OutputMode::SqlInsert => {
                    let statement =
                        format!("insert into {} ({}) values ({})", table, header, line);
                    write_line(writer, &statement, path).await?;
                }
            }

            *rows = rows.saturating_add(1);
            if rows.is_multiple_of(PROGRESS_INTERVAL) {
                debug!("Table {}: {} rows written", table, rows);
            }
        }

        if mode == OutputMode::SqlInsert {
            write_line(writer, &format!("set identity_insert {} off", table), path).await?;
        }

        Ok(())
    }
}

async fn write_line<W>(writer: &mut W, line: &str, path: &Path) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let write_failed =
        |e| DataExportError::io(format!("Failed to write to {}", path.display()), e);

    writer.write_all(line.as_bytes()).await.map_err(write_failed)?;
    writer.write_all(b"\n").await.map_err(write_failed)
}
