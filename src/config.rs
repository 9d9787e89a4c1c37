//! Runtime backend selection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::command::{Command, Executed};
use crate::driver::{Connection, Connector};
use crate::error::DriverError;
use crate::results::DataSet;
use crate::types::DatabaseType;

#[cfg(feature = "mssql")]
use crate::mssql::{MssqlConnection, MssqlConnector};
#[cfg(feature = "sqlite")]
use crate::sqlite::{SqliteConnection, SqliteConnector, SqliteOptions};

/// Which database to talk to and how to reach it, typically read from a config file.
///
/// ```rust
/// use dac_middleware::prelude::*;
///
/// let cfg: DacConfig = serde_json::from_str(
///     r#"{ "database_type": "sqlite", "connection_string": "Data Source=:memory:" }"#,
/// )
/// .unwrap();
/// assert_eq!(cfg.database_type, DatabaseType::Sqlite);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DacConfig {
    pub database_type: DatabaseType,
    /// A file path or `Data Source=<path>` for `SQLite`, an ADO.NET string for SQL Server.
    pub connection_string: String,
}

impl DacConfig {
    #[must_use]
    pub fn new(database_type: DatabaseType, connection_string: impl Into<String>) -> Self {
        Self {
            database_type,
            connection_string: connection_string.into(),
        }
    }

    /// Build the connector for the configured backend.
    ///
    /// # Errors
    /// `DriverError::Unimplemented` when the backend's feature is disabled, or
    /// `DriverError::ConfigError` when the connection string is invalid.
    pub fn connector(&self) -> Result<AnyConnector, DriverError> {
        match self.database_type {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => Ok(AnyConnector::Sqlite(SqliteConnector::new(
                SqliteOptions::new(sqlite_path(&self.connection_string)?),
            ))),
            #[cfg(feature = "mssql")]
            DatabaseType::Mssql => Ok(AnyConnector::Mssql(MssqlConnector::from_ado_string(
                &self.connection_string,
            )?)),
            #[allow(unreachable_patterns)]
            other => Err(DriverError::Unimplemented(format!(
                "{other:?} support is not enabled in this build"
            ))),
        }
    }
}

#[cfg(feature = "sqlite")]
fn sqlite_path(connection_string: &str) -> Result<String, DriverError> {
    let trimmed = connection_string.trim();
    if !trimmed.contains('=') {
        return Ok(trimmed.to_string());
    }
    trimmed
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("data source"))
        .map(|(_, value)| value.trim().to_string())
        .ok_or_else(|| {
            DriverError::ConfigError("sqlite connection string has no Data Source".to_string())
        })
}

/// Connector dispatching to whichever backend a [`DacConfig`] selected.
#[derive(Debug, Clone)]
pub enum AnyConnector {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnector),
    #[cfg(feature = "mssql")]
    Mssql(MssqlConnector),
}

/// Connection opened by an [`AnyConnector`].
pub enum AnyConnection {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
    #[cfg(feature = "mssql")]
    Mssql(MssqlConnection),
}

#[async_trait]
impl Connector for AnyConnector {
    type Connection = AnyConnection;

    async fn open(&self) -> Result<AnyConnection, DriverError> {
        match self {
            #[cfg(feature = "sqlite")]
            AnyConnector::Sqlite(connector) => Ok(AnyConnection::Sqlite(connector.open().await?)),
            #[cfg(feature = "mssql")]
            AnyConnector::Mssql(connector) => Ok(AnyConnection::Mssql(connector.open().await?)),
        }
    }

    fn connection_string(&self) -> &str {
        match self {
            #[cfg(feature = "sqlite")]
            AnyConnector::Sqlite(connector) => connector.connection_string(),
            #[cfg(feature = "mssql")]
            AnyConnector::Mssql(connector) => connector.connection_string(),
        }
    }
}

#[async_trait]
impl Connection for AnyConnection {
    async fn execute_non_query(
        &mut self,
        command: &Command,
    ) -> Result<Executed<u64>, DriverError> {
        match self {
            #[cfg(feature = "sqlite")]
            AnyConnection::Sqlite(conn) => conn.execute_non_query(command).await,
            #[cfg(feature = "mssql")]
            AnyConnection::Mssql(conn) => conn.execute_non_query(command).await,
        }
    }

    async fn execute_query(&mut self, command: &Command) -> Result<Executed<DataSet>, DriverError> {
        match self {
            #[cfg(feature = "sqlite")]
            AnyConnection::Sqlite(conn) => conn.execute_query(command).await,
            #[cfg(feature = "mssql")]
            AnyConnection::Mssql(conn) => conn.execute_query(command).await,
        }
    }

    async fn begin_transaction(&mut self) -> Result<(), DriverError> {
        match self {
            #[cfg(feature = "sqlite")]
            AnyConnection::Sqlite(conn) => conn.begin_transaction().await,
            #[cfg(feature = "mssql")]
            AnyConnection::Mssql(conn) => conn.begin_transaction().await,
        }
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        match self {
            #[cfg(feature = "sqlite")]
            AnyConnection::Sqlite(conn) => conn.commit().await,
            #[cfg(feature = "mssql")]
            AnyConnection::Mssql(conn) => conn.commit().await,
        }
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        match self {
            #[cfg(feature = "sqlite")]
            AnyConnection::Sqlite(conn) => conn.rollback().await,
            #[cfg(feature = "mssql")]
            AnyConnection::Mssql(conn) => conn.rollback().await,
        }
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        match self {
            #[cfg(feature = "sqlite")]
            AnyConnection::Sqlite(conn) => conn.close().await,
            #[cfg(feature = "mssql")]
            AnyConnection::Mssql(conn) => conn.close().await,
        }
    }
}
