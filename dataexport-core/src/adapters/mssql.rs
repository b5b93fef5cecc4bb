//! SQL Server row source.
//!
//! This module provides the tiberius-backed [`RowSource`] used by the
//! `dataexport` binary:
//! - One TDS connection per run, reused for every table
//! - Named instances (`host\instance`) resolved through SQL Browser
//! - Driver values mapped onto the closed [`ColumnValue`] set
//!
//! # Security
//! - Credentials are consumed when the driver config is built and never logged
//! - Connection errors describe the target without username or password

use super::{AuthMode, ConnectionConfig, RowCursor, RowSource};
use crate::{
    Result, error::DataExportError, models::ColumnValue, security::Credentials,
    tables::TableSpec,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures::{TryStreamExt, stream::BoxStream};
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql, Row, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

/// Builds the tiberius configuration from connection settings and credentials.
///
/// # Errors
/// Returns a configuration error if integrated authentication is requested on
/// a platform without support for it.
pub fn driver_config(config: &ConnectionConfig, credentials: &Credentials) -> Result<Config> {
    let (host, instance) = config.host_and_instance();

    let mut tiberius_config = Config::new();
    tiberius_config.host(host);
    tiberius_config.port(config.port);
    tiberius_config.application_name("dataexport");

    if let Some(instance) = instance {
        tiberius_config.instance_name(instance);
    }

    if let Some(database) = config.database.as_deref().filter(|db| !db.is_empty()) {
        tiberius_config.database(database);
    }

    if config.trust_cert {
        tiberius_config.trust_cert();
    }

    match config.auth {
        AuthMode::SqlServer => {
            tiberius_config.authentication(AuthMethod::sql_server(
                credentials.username(),
                credentials.password().unwrap_or(""),
            ));
        }
        #[cfg(windows)]
        AuthMode::Integrated => {
            tiberius_config.authentication(AuthMethod::Integrated);
        }
        #[cfg(not(windows))]
        AuthMode::Integrated => {
            return Err(DataExportError::configuration(
                "integrated authentication is only supported on Windows builds",
            ));
        }
    }

    Ok(tiberius_config)
}

/// SQL Server source holding one open connection.
pub struct MssqlSource {
    client: Client<Compat<TcpStream>>,
    config: ConnectionConfig,
}

impl MssqlSource {
    /// Connects and authenticates against the server.
    ///
    /// # Errors
    /// Returns a configuration error for invalid settings and a connection
    /// error if the server cannot be reached or rejects the login.
    pub async fn connect(config: ConnectionConfig, credentials: &Credentials) -> Result<Self> {
        config.validate()?;
        let tiberius_config = driver_config(&config, credentials)?;

        info!("Opening connection to {}", config);

        let tcp = tokio::time::timeout(config.connect_timeout, Self::open_tcp(&tiberius_config))
            .await
            .map_err(|e| {
                DataExportError::connection_failed(format!("Timed out connecting to {}", config), e)
            })?
            .map_err(|e| {
                DataExportError::connection_failed(format!("Could not reach {}", config), e)
            })?;

        tcp.set_nodelay(true).map_err(|e| {
            DataExportError::connection_failed(format!("Could not configure socket for {}", config), e)
        })?;

        let client = Client::connect(tiberius_config, tcp.compat_write())
            .await
            .map_err(|e| {
                DataExportError::connection_failed(format!("Login to {} failed", config), e)
            })?;

        debug!("Connected to {}", config);
        Ok(Self { client, config })
    }

    async fn open_tcp(tiberius_config: &Config) -> tiberius::Result<TcpStream> {
        // Resolves the instance port through SQL Browser when an instance
        // name is set, otherwise connects to host:port directly.
        TcpStream::connect_named(tiberius_config).await
    }
}

#[async_trait]
impl RowSource for MssqlSource {
    async fn open_table<'a>(&'a mut self, table: &TableSpec) -> Result<Box<dyn RowCursor + 'a>> {
        let statement = table.select_statement();
        debug!("Executing: {}", statement);

        let mut stream = self
            .client
            .simple_query(statement)
            .await
            .map_err(|e| DataExportError::query_failed(&table.name, e))?;

        let columns = stream
            .columns()
            .await
            .map_err(|e| DataExportError::query_failed(&table.name, e))?
            .map(|columns| columns.iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        Ok(Box::new(MssqlCursor {
            columns,
            rows: stream.into_row_stream(),
            scanned: 0,
        }))
    }

    fn description(&self) -> String {
        format!("SQL Server source ({})", self.config)
    }
}

/// Cursor over one `simple_query` result set.
struct MssqlCursor<'a> {
    columns: Vec<String>,
    rows: BoxStream<'a, tiberius::Result<Row>>,
    scanned: u64,
}

#[async_trait]
impl RowCursor for MssqlCursor<'_> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn scan_into(&mut self, buffer: &mut [ColumnValue]) -> Result<bool> {
        let row_number = self.scanned.saturating_add(1);

        let Some(row) = self
            .rows
            .try_next()
            .await
            .map_err(|e| DataExportError::scan_failed(row_number, e.to_string()))?
        else {
            return Ok(false);
        };

        if row.len() != buffer.len() {
            return Err(DataExportError::scan_failed(
                row_number,
                format!("expected {} values, got {}", buffer.len(), row.len()),
            ));
        }

        for (index, (slot, data)) in buffer.iter_mut().zip(row).enumerate() {
            *slot = column_value(data).map_err(|e| {
                DataExportError::scan_failed(
                    row_number,
                    format!("column {} could not be decoded: {}", index.saturating_add(1), e),
                )
            })?;
        }

        self.scanned = row_number;
        Ok(true)
    }
}

/// Maps one tiberius value onto [`ColumnValue`].
///
/// Decimal, date-only, time-only and XML values become
/// [`ColumnValue::Other`] with their textual form.
///
/// # Errors
/// Returns the driver error if a temporal value cannot be converted.
pub fn column_value(data: ColumnData<'static>) -> tiberius::Result<ColumnValue> {
    let value = match data {
        ColumnData::U8(v) => v.map_or(ColumnValue::Null, |n| ColumnValue::Integer(i64::from(n))),
        ColumnData::I16(v) => v.map_or(ColumnValue::Null, |n| ColumnValue::Integer(i64::from(n))),
        ColumnData::I32(v) => v.map_or(ColumnValue::Null, |n| ColumnValue::Integer(i64::from(n))),
        ColumnData::I64(v) => v.map_or(ColumnValue::Null, ColumnValue::Integer),
        ColumnData::F32(v) => v.map_or(ColumnValue::Null, |n| ColumnValue::Float(f64::from(n))),
        ColumnData::F64(v) => v.map_or(ColumnValue::Null, ColumnValue::Float),
        ColumnData::Bit(v) => v.map_or(ColumnValue::Null, ColumnValue::Boolean),
        ColumnData::String(v) => v.map_or(ColumnValue::Null, |s| ColumnValue::Text(s.into_owned())),
        ColumnData::Guid(v) => v.map_or(ColumnValue::Null, ColumnValue::Uuid),
        ColumnData::Binary(v) => v.map_or(ColumnValue::Null, |b| ColumnValue::Bytes(b.into_owned())),
        ColumnData::Numeric(v) => v.map_or(ColumnValue::Null, |n| ColumnValue::Other(n.to_string())),
        ColumnData::Xml(v) => v.map_or(ColumnValue::Null, |x| {
            ColumnValue::Other(x.into_owned().into_string())
        }),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(&data)?.map_or(ColumnValue::Null, ColumnValue::Timestamp)
        }
        ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(&data)?
            .map_or(ColumnValue::Null, |ts| ColumnValue::Timestamp(ts.naive_local())),
        ColumnData::Date(_) => NaiveDate::from_sql(&data)?.map_or(ColumnValue::Null, |d| {
            ColumnValue::Other(d.format("%Y-%m-%d").to_string())
        }),
        ColumnData::Time(_) => NaiveTime::from_sql(&data)?.map_or(ColumnValue::Null, |t| {
            ColumnValue::Other(t.format("%H:%M:%S%.f").to_string())
        }),
    };

    Ok(value)
}
