use async_trait::async_trait;
use tracing::debug;

use super::client::MssqlClient;
use super::query;
use crate::command::{Command, Executed};
use crate::driver::Connection;
use crate::error::DriverError;
use crate::results::DataSet;

/// One open SQL Server connection.
pub struct MssqlConnection {
    client: Option<MssqlClient>,
}

impl MssqlConnection {
    pub(crate) fn new(client: MssqlClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    fn client(&mut self) -> Result<&mut MssqlClient, DriverError> {
        self.client
            .as_mut()
            .ok_or_else(|| DriverError::ConnectionError("sql server connection is closed".into()))
    }

    async fn simple(&mut self, sql: &str) -> Result<(), DriverError> {
        self.client()?.simple_query(sql).await?.into_results().await?;
        Ok(())
    }
}

#[async_trait]
impl Connection for MssqlConnection {
    async fn execute_non_query(
        &mut self,
        command: &Command,
    ) -> Result<Executed<u64>, DriverError> {
        debug!(shape = ?command.shape(), "mssql execute non-query");
        query::execute_non_query(self.client()?, command).await
    }

    async fn execute_query(&mut self, command: &Command) -> Result<Executed<DataSet>, DriverError> {
        debug!(shape = ?command.shape(), "mssql execute query");
        query::execute_query(self.client()?, command).await
    }

    async fn begin_transaction(&mut self) -> Result<(), DriverError> {
        self.simple("BEGIN TRANSACTION").await
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.simple("COMMIT TRANSACTION").await
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        self.simple("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION").await
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        match self.client.take() {
            Some(client) => Ok(client.close().await?),
            None => Ok(()),
        }
    }
}
