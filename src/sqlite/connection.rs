use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::InterruptHandle;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::command::{Command, Executed};
use crate::driver::Connection;
use crate::error::DriverError;
use crate::results::DataSet;
use crate::types::CommandShape;

use super::params::Params;
use super::query::{ReturnSlot, run_batch};

const INTERRUPT_RETRY: Duration = Duration::from_millis(5);

pub(crate) type SharedSqliteConnection = Arc<tokio::sync::Mutex<rusqlite::Connection>>;

/// One open `SQLite` connection; blocking work runs on tokio's blocking pool.
pub struct SqliteConnection {
    conn: Option<SharedSqliteConnection>,
    interrupt: Arc<InterruptHandle>,
    return_slot: ReturnSlot,
    procedures: Arc<HashMap<String, String>>,
}

impl SqliteConnection {
    pub(crate) fn new(
        conn: rusqlite::Connection,
        return_slot: ReturnSlot,
        procedures: Arc<HashMap<String, String>>,
    ) -> Self {
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Self {
            conn: Some(Arc::new(tokio::sync::Mutex::new(conn))),
            interrupt,
            return_slot,
            procedures,
        }
    }

    fn conn_handle(&self) -> Result<SharedSqliteConnection, DriverError> {
        self.conn
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| DriverError::ConnectionError("sqlite connection is closed".into()))
    }

    /// SQL text to run for `command`, resolved by its shape.
    fn sql_for(&self, command: &Command) -> Result<String, DriverError> {
        match command.shape() {
            CommandShape::Text => Ok(command.text().to_string()),
            CommandShape::TableDirect => Ok(format!(
                "SELECT * FROM \"{}\"",
                command.text().replace('"', "\"\"")
            )),
            CommandShape::StoredProcedure => {
                self.procedures.get(command.text()).cloned().ok_or_else(|| {
                    DriverError::ExecutionError(format!(
                        "stored procedure '{}' is not registered for this sqlite database",
                        command.text()
                    ))
                })
            }
        }
    }

    async fn run(&mut self, command: &Command) -> Result<Executed<(u64, DataSet)>, DriverError> {
        let sql = self.sql_for(command)?;
        let params = Params::convert(command.parameters());
        let slot = Arc::clone(&self.return_slot);
        debug!(shape = ?command.shape(), params = params.0.len(), "sqlite execute");
        run_blocking(self.conn_handle()?, move |guard| {
            run_batch(guard, &sql, &params, &slot)
        })
        .await
    }

    /// Interrupt whatever statement still holds the connection, e.g. one whose
    /// future was dropped on cancellation, until the lock is free again.
    async fn interrupt_running(&self, shared: &SharedSqliteConnection) {
        while shared.try_lock().is_err() {
            debug!("interrupting running sqlite statement before rollback");
            self.interrupt.interrupt();
            tokio::time::sleep(INTERRUPT_RETRY).await;
        }
    }

    async fn execute_plain(&mut self, sql: &'static str) -> Result<(), DriverError> {
        run_blocking(self.conn_handle()?, move |guard| {
            guard.execute_batch(sql).map_err(DriverError::SqliteError)
        })
        .await
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn execute_non_query(
        &mut self,
        command: &Command,
    ) -> Result<Executed<u64>, DriverError> {
        Ok(self.run(command).await?.map(|(affected, _)| affected))
    }

    async fn execute_query(&mut self, command: &Command) -> Result<Executed<DataSet>, DriverError> {
        Ok(self.run(command).await?.map(|(_, data)| data))
    }

    async fn begin_transaction(&mut self) -> Result<(), DriverError> {
        self.execute_plain("BEGIN").await
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.execute_plain("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        let shared = self.conn_handle()?;
        self.interrupt_running(&shared).await;
        run_blocking(shared, |guard| {
            // a failed COMMIT or a constraint error may already have ended the transaction
            if guard.is_autocommit() {
                return Ok(());
            }
            guard.execute_batch("ROLLBACK").map_err(DriverError::SqliteError)
        })
        .await
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        let Some(shared) = self.conn.take() else {
            return Ok(());
        };
        match Arc::try_unwrap(shared) {
            Ok(mutex) => {
                let conn = mutex.into_inner();
                spawn_blocking(move || conn.close().map_err(|(_, e)| DriverError::SqliteError(e)))
                    .await
                    .map_err(|e| {
                        DriverError::ConnectionError(format!("sqlite spawn_blocking join error: {e}"))
                    })?
            }
            Err(_still_running) => {
                // a cancelled statement still holds the connection; stop it and let the
                // blocking task drop the last handle
                debug!("interrupting running sqlite statement on close");
                self.interrupt.interrupt();
                Ok(())
            }
        }
    }
}

async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, DriverError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, DriverError> + Send + 'static,
    R: Send + 'static,
{
    spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| DriverError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
