//! Data model shared by row sources, the formatter and the exporter.

use chrono::NaiveDateTime;
use uuid::Uuid;

/// A single column value read from a row cursor.
///
/// The set of kinds is closed; drivers map anything outside it into
/// [`ColumnValue::Other`] with a best-effort textual form.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ColumnValue {
    /// SQL NULL of any column type
    #[default]
    Null,
    /// BIT columns
    Boolean(bool),
    /// TINYINT through BIGINT, widened
    Integer(i64),
    /// REAL and FLOAT, widened
    Float(f64),
    /// Character data
    Text(String),
    /// Binary data that is not a unique identifier
    Bytes(Vec<u8>),
    /// DATETIME, SMALLDATETIME, DATETIME2 and DATETIMEOFFSET
    Timestamp(NaiveDateTime),
    /// UNIQUEIDENTIFIER
    Uuid(Uuid),
    /// Any other driver value (decimal, date, time, xml) as text
    Other(String),
}

impl ColumnValue {
    /// Short name of the value kind, for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
            Self::Uuid(_) => "uuid",
            Self::Other(_) => "other",
        }
    }
}

/// Output file format, fixed for one export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputMode {
    /// Header line plus one separator-delimited line per row (`.csv`)
    #[default]
    Delimited,
    /// `insert into` statements bracketed by `identity_insert` (`.sql`)
    SqlInsert,
}

impl OutputMode {
    /// File extension used for a table's output file.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Delimited => "csv",
            Self::SqlInsert => "sql",
        }
    }

    /// Separator placed between fields and header names.
    ///
    /// SQL output always uses a comma; delimited output uses the configured
    /// separator.
    pub const fn field_separator(self, configured: &str) -> &str {
        match self {
            Self::Delimited => configured,
            Self::SqlInsert => ",",
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delimited => write!(f, "CSV"),
            Self::SqlInsert => write!(f, "SQL"),
        }
    }
}

impl std::str::FromStr for OutputMode {
    type Err = crate::error::DataExportError;

    /// Accepts the CLI spellings `CSV` and `SQL` (case-sensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CSV" => Ok(Self::Delimited),
            "SQL" => Ok(Self::SqlInsert),
            other => Err(crate::error::DataExportError::configuration(format!(
                "Output type must be CSV or SQL, got '{}'",
                other
            ))),
        }
    }
}
