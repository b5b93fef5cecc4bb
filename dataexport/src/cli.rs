//! Command-line arguments and their validation.
//!
//! Validation never prompts and never opens a connection, so every invalid
//! combination is reported before any export begins.

use clap::{Args, Parser, ValueEnum};
use dataexport_core::{
    AuthMode, ConnectionConfig, Credentials, DataExportError, DigestScheme, ExportConfig,
    OutputMode, Result, Secret,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "dataexport")]
#[command(about = "Export SQL Server tables to CSV or SQL with redacted columns")]
#[command(version)]
#[command(long_about = "
dataexport - SQL Server table export with column redaction

Exports every table named in the table list to <output>/<table>.csv or
<output>/<table>.sql. Columns named in the redaction file are replaced by
a SHA-256 digest of the value and the shared secret, so the same value
always maps to the same token across tables and runs.

TABLE LIST (-t), one entry per line:
  testdb.dbo.customers
  testdb.dbo.orders;created > '2017-01-01'

REDACTION FILE (-e), one column per line:
  testdb.dbo.customers;email

The digest is pseudonymization, not encryption: values with few possible
inputs can be recovered by dictionary attack.

EXAMPLES:
  dataexport -H db01 -U exporter -t tables.txt -e redact.txt -o out
  dataexport -H db01 -U exporter -t tables.txt -T SQL -s
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// SQL Server host (`host` or `host\instance`)
    #[arg(short = 'H', long, help = "Required. SQL Server host to connect to")]
    pub host: Option<String>,

    /// TCP port
    #[arg(short, long, default_value_t = dataexport_core::adapters::DEFAULT_PORT)]
    pub port: u16,

    /// Initial catalog
    #[arg(short, long, help = "Initial catalog/database to connect to")]
    pub catalog: Option<String>,

    /// Login name
    #[arg(
        short = 'U',
        long,
        help = "Required unless using integrated authentication; user to connect as"
    )]
    pub user: Option<String>,

    /// Login password (prompted for when omitted)
    #[arg(
        short = 'P',
        long,
        env = "DATAEXPORT_PASSWORD",
        hide_env_values = true,
        help = "Password for the user; prompted for if not given"
    )]
    pub password: Option<String>,

    /// Use integrated authentication
    #[arg(long, help = "Use integrated (Windows) authentication instead of a SQL login")]
    pub integrated: bool,

    /// Table list file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Required. File listing tables to export, one per line as <table> or <table>;<filter>"
    )]
    pub tables: Option<PathBuf>,

    /// Redaction configuration file
    #[arg(
        short = 'e',
        long = "redact",
        value_name = "FILE",
        help = "File listing columns to redact, one per line as <table>;<column>"
    )]
    pub redact: Option<PathBuf>,

    /// Output directory
    #[arg(
        short,
        long,
        value_name = "DIR",
        help = "Directory to write output to (default: current directory)"
    )]
    pub output: Option<PathBuf>,

    /// Output type
    #[arg(
        short = 'T',
        long = "output-type",
        default_value = "CSV",
        help = "Output file type: CSV (default) or SQL"
    )]
    pub output_type: String,

    /// Prompt for the digest secret
    #[arg(short = 's', long, help = "Prompt for the secret to use when creating digests")]
    pub ask_secret: bool,

    /// Digest secret from the environment
    #[arg(
        long,
        env = "DATAEXPORT_SECRET",
        hide_env_values = true,
        help = "Secret to use when creating digests"
    )]
    pub secret: Option<String>,

    /// Field separator for CSV output
    #[arg(long, default_value = dataexport_core::export::DEFAULT_SEPARATOR)]
    pub separator: String,

    /// Digest encoding
    #[arg(long, value_enum, default_value_t = SchemeArg::Hex)]
    pub digest_scheme: SchemeArg,

    /// Trust the server certificate
    #[arg(long, help = "Accept the server TLS certificate without validation")]
    pub trust_cert: bool,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub connect_timeout: u64,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// Digest encodings selectable on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemeArg {
    /// Lowercase hex SHA-256 (canonical)
    Hex,
    /// Base64 SHA-256, compatible with earlier exports
    Base64,
}

impl From<SchemeArg> for DigestScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Hex => Self::Sha256Hex,
            SchemeArg::Base64 => Self::Sha256Base64,
        }
    }
}

/// Validated run settings.
#[derive(Debug)]
pub struct Settings {
    pub connection: ConnectionConfig,
    pub credentials: Credentials,
    pub tables: PathBuf,
    pub redact: Option<PathBuf>,
    pub export: ExportConfig,
    /// Password must be prompted for before connecting
    pub needs_password: bool,
    /// Secret must be prompted for before exporting
    pub ask_secret: bool,
}

impl Cli {
    /// Checks flag combinations and builds run settings.
    ///
    /// # Errors
    /// Returns a configuration error for a missing host, a missing user
    /// without integrated authentication, a missing table list, an unknown
    /// output type, or an invalid export setting.
    pub fn settings(self) -> Result<Settings> {
        let host = self
            .host
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| DataExportError::configuration("Invalid hostname provided, see -H"))?;

        let tables = self.tables.ok_or_else(|| {
            DataExportError::configuration(
                "Tables configuration is required, but has not been provided, see -t",
            )
        })?;

        let mode: OutputMode = self.output_type.parse()?;

        let auth = if self.integrated {
            AuthMode::Integrated
        } else {
            AuthMode::SqlServer
        };

        let mut connection = ConnectionConfig::new(host)
            .with_port(self.port)
            .with_auth(auth)
            .with_trust_cert(self.trust_cert)
            .with_connect_timeout(Duration::from_secs(self.connect_timeout));
        if let Some(catalog) = self.catalog.filter(|c| !c.is_empty()) {
            connection = connection.with_database(catalog);
        }

        let (credentials, needs_password) = match auth {
            AuthMode::Integrated => (Credentials::integrated(), false),
            AuthMode::SqlServer => {
                let user = self.user.filter(|u| !u.trim().is_empty()).ok_or_else(|| {
                    DataExportError::configuration(
                        "A user is required unless --integrated is set, see -U",
                    )
                })?;
                connection = connection.with_username(user.clone());
                let needs_password = self.password.is_none();
                (Credentials::new(user, self.password), needs_password)
            }
        };
        connection.validate()?;

        let output_dir = match self.output {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(|e| {
                DataExportError::io("Failed to determine the current directory", e)
            })?,
        };

        let export = ExportConfig::new(output_dir)
            .with_mode(mode)
            .with_separator(self.separator)
            .with_secret(Secret::new(self.secret.unwrap_or_default()))
            .with_scheme(self.digest_scheme.into());
        export.validate()?;

        Ok(Settings {
            connection,
            credentials,
            tables,
            redact: self.redact,
            export,
            needs_password,
            ask_secret: self.ask_secret,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dataexport").chain(args.iter().copied())).unwrap()
    }

    fn base_args(output: &str) -> Vec<String> {
        ["-H", "db01", "-U", "exporter", "-P", "pw", "-t", "tables.txt", "-o", output]
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn parse_owned(args: &[String]) -> Cli {
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        parse(&refs)
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = parse_owned(&base_args(dir.path().to_str().unwrap()))
            .settings()
            .unwrap();

        assert_eq!(settings.connection.host, "db01");
        assert_eq!(settings.connection.port, 1433);
        assert_eq!(settings.connection.username.as_deref(), Some("exporter"));
        assert_eq!(settings.credentials.password(), Some("pw"));
        assert!(!settings.needs_password);
        assert_eq!(settings.export.mode, OutputMode::Delimited);
        assert_eq!(settings.export.separator, ";");
        assert_eq!(settings.export.scheme, DigestScheme::Sha256Hex);
        assert!(settings.export.secret.is_empty());
        assert_eq!(settings.tables, PathBuf::from("tables.txt"));
        assert_eq!(settings.redact, None);
    }

    #[test]
    fn test_sql_output_and_options() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path().to_str().unwrap());
        args.extend(
            [
                "-T", "SQL", "-p", "1444", "-c", "sales", "-e", "redact.txt", "-s",
                "--digest-scheme", "base64", "--separator", "|",
            ]
            .iter()
            .map(ToString::to_string),
        );

        let settings = parse_owned(&args).settings().unwrap();
        assert_eq!(settings.export.mode, OutputMode::SqlInsert);
        assert_eq!(settings.connection.port, 1444);
        assert_eq!(settings.connection.database.as_deref(), Some("sales"));
        assert_eq!(settings.redact, Some(PathBuf::from("redact.txt")));
        assert!(settings.ask_secret);
        assert_eq!(settings.export.scheme, DigestScheme::Sha256Base64);
        assert_eq!(settings.export.separator, "|");
    }

    #[test]
    fn test_missing_host_is_rejected() {
        let cli = parse(&["-U", "exporter", "-t", "tables.txt"]);
        assert!(matches!(
            cli.settings(),
            Err(DataExportError::Configuration { .. })
        ));
    }

    #[test]
    fn test_missing_tables_is_rejected() {
        let cli = parse(&["-H", "db01", "-U", "exporter"]);
        let error = cli.settings().unwrap_err();
        assert!(error.to_string().contains("-t"));
    }

    #[test]
    fn test_missing_user_without_integrated_is_rejected() {
        let cli = parse(&["-H", "db01", "-t", "tables.txt"]);
        let error = cli.settings().unwrap_err();
        assert!(error.to_string().contains("-U"));
    }

    #[test]
    fn test_integrated_needs_no_user_or_password() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&[
            "-H",
            "db01",
            "--integrated",
            "-t",
            "tables.txt",
            "-o",
            dir.path().to_str().unwrap(),
        ]);

        let settings = cli.settings().unwrap();
        assert_eq!(settings.connection.auth, AuthMode::Integrated);
        assert!(!settings.needs_password);
    }

    #[test]
    fn test_missing_password_is_prompted() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&[
            "-H",
            "db01",
            "-U",
            "exporter",
            "-t",
            "tables.txt",
            "-o",
            dir.path().to_str().unwrap(),
        ]);

        // DATAEXPORT_PASSWORD is not set in the test environment
        if std::env::var_os("DATAEXPORT_PASSWORD").is_none() {
            assert!(cli.settings().unwrap().needs_password);
        }
    }

    #[test]
    fn test_unknown_output_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path().to_str().unwrap());
        args.extend(["-T", "JSON"].iter().map(ToString::to_string));

        let error = parse_owned(&args).settings().unwrap_err();
        assert!(error.to_string().contains("CSV or SQL"));
    }

    #[test]
    fn test_missing_output_directory_is_rejected() {
        let args = base_args("/nonexistent/output/dir");
        assert!(parse_owned(&args).settings().is_err());
    }
}
