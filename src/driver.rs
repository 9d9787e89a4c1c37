//! The driver collaborator: a connection factory plus the per-connection command and
//! transaction operations the executor relies on.
//!
//! Implemented by the `sqlite` and `mssql` backends, by [`AnyConnector`](crate::config::AnyConnector)
//! for runtime dispatch, and by the scripted test driver.

use async_trait::async_trait;

use crate::command::{Command, Executed};
use crate::error::DriverError;
use crate::results::{DataReader, DataSet};
use crate::types::DbValue;

/// Opens connections for one database.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection;

    /// Open a new connection.
    async fn open(&self) -> Result<Self::Connection, DriverError>;

    /// Connection string this connector was built from.
    fn connection_string(&self) -> &str;
}

/// One open connection.
///
/// Every `execute_*` call attaches the command's status slot and reports what was read
/// back in [`Executed::return_value`].
#[async_trait]
pub trait Connection: Send {
    /// Execute and return the number of rows affected.
    async fn execute_non_query(&mut self, command: &Command)
    -> Result<Executed<u64>, DriverError>;

    /// Execute and collect every result table.
    async fn execute_query(&mut self, command: &Command) -> Result<Executed<DataSet>, DriverError>;

    /// First column of the first row of the first result, or [`DbValue::Null`].
    async fn execute_scalar(&mut self, command: &Command) -> Result<Executed<DbValue>, DriverError> {
        let executed = self.execute_query(command).await?;
        Ok(executed.map(|data| {
            data.table(0)
                .and_then(|table| table.row(0))
                .and_then(|row| row.get_by_index(0))
                .cloned()
                .unwrap_or(DbValue::Null)
        }))
    }

    /// Execute and return a forward-only reader over the results.
    async fn execute_reader(
        &mut self,
        command: &Command,
    ) -> Result<Executed<DataReader>, DriverError> {
        let executed = self.execute_query(command).await?;
        Ok(executed.map(DataReader::new))
    }

    async fn begin_transaction(&mut self) -> Result<(), DriverError>;

    async fn commit(&mut self) -> Result<(), DriverError>;

    async fn rollback(&mut self) -> Result<(), DriverError>;

    /// Close the connection. Called at most once; the connection is not used afterwards.
    async fn close(&mut self) -> Result<(), DriverError>;
}
