use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::driver::Connector;
use crate::error::DriverError;

use super::connection::SqliteConnection;
use super::query::register_return_value_function;

/// Options for opening `SQLite` connections.
///
/// `SQLite` has no stored procedures; commands with the stored-procedure shape run the SQL
/// body registered here under the procedure's name.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub db_path: String,
    pub wal: bool,
    pub busy_timeout: Option<Duration>,
    pub procedures: HashMap<String, String>,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            wal: true,
            busy_timeout: None,
            procedures: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    /// Register `body` as the SQL run for stored procedure `name`.
    #[must_use]
    pub fn with_procedure(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.procedures.insert(name.into(), body.into());
        self
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn procedure(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.opts = self.opts.with_procedure(name, body);
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Build a connector for these options.
    #[must_use]
    pub fn build(self) -> SqliteConnector {
        SqliteConnector::new(self.finish())
    }
}

/// Opens one `rusqlite` connection per call.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    options: SqliteOptions,
    procedures: Arc<HashMap<String, String>>,
}

impl SqliteConnector {
    #[must_use]
    pub fn new(options: SqliteOptions) -> Self {
        let procedures = Arc::new(options.procedures.clone());
        Self {
            options,
            procedures,
        }
    }

    #[must_use]
    pub fn builder(db_path: String) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.options
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    type Connection = SqliteConnection;

    async fn open(&self) -> Result<SqliteConnection, DriverError> {
        let path = self.options.db_path.clone();
        let wal = self.options.wal;
        let busy_timeout = self.options.busy_timeout;

        let (conn, return_slot) = spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&path)?;
            if let Some(timeout) = busy_timeout {
                conn.busy_timeout(timeout)?;
            }
            if wal {
                // journal_mode answers with the resulting mode
                conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
            }
            let return_slot = register_return_value_function(&conn)?;
            Ok::<_, DriverError>((conn, return_slot))
        })
        .await
        .map_err(|e| DriverError::ConnectionError(format!("sqlite spawn_blocking join error: {e}")))??;

        debug!(path = %self.options.db_path, "sqlite connection opened");
        Ok(SqliteConnection::new(
            conn,
            return_slot,
            Arc::clone(&self.procedures),
        ))
    }

    fn connection_string(&self) -> &str {
        &self.options.db_path
    }
}
