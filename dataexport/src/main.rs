//! SQL Server table export tool
//!
//! Exports each listed table to a delimited or SQL insert file, replacing
//! configured columns with a keyed SHA-256 digest.

mod cli;

use clap::Parser;
use cli::{Cli, Settings};
use dataexport_core::{
    Credentials, DataExportError, RedactionDirectory, Result, RowSource, Secret, TableExporter,
    adapters::mssql::MssqlSource, init_logging, read_table_list,
};
use tracing::{debug, error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let quiet = cli.global.quiet;

    init_logging(cli.global.verbose, quiet)?;

    let mut settings = cli.settings().map_err(|e| {
        error!("{}", e.report());
        e
    })?;

    if settings.needs_password {
        let password = prompt("Password: ")?;
        settings.credentials =
            Credentials::new(settings.credentials.username().to_string(), Some(password));
    }
    if settings.ask_secret {
        settings.export.secret = Secret::new(prompt("Secret: ")?);
    }

    if let Err(e) = run(settings, quiet).await {
        error!("{}", e.report());
        return Err(e);
    }

    Ok(())
}

/// Reads a hidden value from the terminal.
fn prompt(label: &str) -> Result<String> {
    rpassword::prompt_password(label).map_err(|e| {
        DataExportError::io(
            format!("Failed to read {}", label.trim_end_matches(": ").to_lowercase()),
            e,
        )
    })
}

async fn run(settings: Settings, quiet: bool) -> Result<()> {
    let tables = read_table_list(&settings.tables)?;
    if tables.is_empty() {
        warn!("Table list {} names no tables", settings.tables.display());
    }
    info!("Loaded {} tables from {}", tables.len(), settings.tables.display());

    let directory = match &settings.redact {
        Some(path) => {
            let mut directory = RedactionDirectory::new();
            let columns = directory.build_from_path(path)?;
            info!(
                "Loaded {} redacted columns across {} tables from {}",
                columns,
                directory.table_count(),
                path.display()
            );
            directory
        }
        None => {
            debug!("No redaction configuration given; values are exported as read");
            RedactionDirectory::empty()
        }
    };

    if directory.column_count() > 0 && settings.export.secret.is_empty() {
        warn!("No digest secret given; redacted values are plain SHA-256 digests of the value");
    }

    info!("Connecting to {}", settings.connection);
    let mut source = MssqlSource::connect(settings.connection, &settings.credentials).await?;
    drop(settings.credentials);
    debug!("Connected to {}", source.description());

    let exporter = TableExporter::new(&directory, settings.export);
    let summary = exporter.export_all(&mut source, &tables).await?;

    info!(
        "Exported {} rows from {} tables in {:.2?}",
        summary.total_rows(),
        summary.tables.len(),
        summary.elapsed
    );
    if !quiet {
        for report in &summary.tables {
            println!("{}\t{}\t{}", report.table, report.rows, report.path.display());
        }
    }

    Ok(())
}
