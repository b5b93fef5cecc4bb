//! Conversion of column values into output text.
//!
//! Dispatch is on the value kind. Redaction only applies to text, bytes,
//! numbers and other values; nulls, booleans, timestamps and unique
//! identifiers are always written as-is.

use crate::digest::DigestScheme;
use crate::models::{ColumnValue, OutputMode};

/// Timestamp layout used in both output modes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Formats column values for one export run.
///
/// Holds the run-wide settings so the exporter only has to pass the value and
/// the per-column redaction flag.
#[derive(Debug, Clone, Copy)]
pub struct ValueFormatter<'a> {
    mode: OutputMode,
    secret: &'a str,
    scheme: DigestScheme,
}

impl<'a> ValueFormatter<'a> {
    /// Creates a formatter using the canonical hex digest.
    pub const fn new(mode: OutputMode, secret: &'a str) -> Self {
        Self {
            mode,
            secret,
            scheme: DigestScheme::Sha256Hex,
        }
    }

    /// Builder method to set the digest scheme.
    pub const fn with_scheme(mut self, scheme: DigestScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Output mode this formatter writes for.
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Formats one value, replacing it with a digest when `redact` is set.
    pub fn format(&self, value: &ColumnValue, redact: bool) -> String {
        match value {
            ColumnValue::Null => "null".to_string(),
            ColumnValue::Boolean(b) => b.to_string(),
            ColumnValue::Timestamp(ts) => self.quoted(&ts.format(TIMESTAMP_FORMAT).to_string()),
            ColumnValue::Uuid(id) => self.quoted(&id.hyphenated().to_string()),
            ColumnValue::Text(text) => self.text(text, redact),
            ColumnValue::Bytes(bytes) => self.text(&String::from_utf8_lossy(bytes), redact),
            ColumnValue::Integer(n) => self.plain(n.to_string(), redact),
            ColumnValue::Float(f) => self.plain(format!("{:.6}", f), redact),
            ColumnValue::Other(text) => self.plain(text.clone(), redact),
        }
    }

    fn digest(&self, text: &str) -> String {
        self.scheme.apply(text, self.secret)
    }

    /// Character data: digested or escaped, then quoted for SQL.
    fn text(&self, text: &str, redact: bool) -> String {
        match (self.mode, redact) {
            (OutputMode::Delimited, true) => self.digest(text),
            (OutputMode::Delimited, false) => text.to_string(),
            (OutputMode::SqlInsert, true) => format!("'{}'", self.digest(text)),
            (OutputMode::SqlInsert, false) => format!("'{}'", escape_sql_string(text)),
        }
    }

    /// Unquoted literals: numbers and other values.
    fn plain(&self, text: String, redact: bool) -> String {
        if redact { self.digest(&text) } else { text }
    }

    fn quoted(&self, text: &str) -> String {
        match self.mode {
            OutputMode::Delimited => text.to_string(),
            OutputMode::SqlInsert => format!("'{}'", text),
        }
    }
}

/// Doubles single quotes so the text can sit inside a SQL string literal.
pub fn escape_sql_string(text: &str) -> String {
    text.replace('\'', "''")
}

/// Formats one value with the canonical digest scheme.
///
/// # Example
/// ```rust
/// use dataexport_core::format::format_value;
/// use dataexport_core::{ColumnValue, OutputMode};
///
/// let value = ColumnValue::Text("O'Brien".to_string());
/// assert_eq!(format_value(&value, false, OutputMode::SqlInsert, ""), "'O''Brien'");
/// assert_eq!(format_value(&ColumnValue::Null, true, OutputMode::SqlInsert, ""), "null");
/// ```
pub fn format_value(value: &ColumnValue, redact: bool, mode: OutputMode, secret: &str) -> String {
    ValueFormatter::new(mode, secret).format(value, redact)
}
