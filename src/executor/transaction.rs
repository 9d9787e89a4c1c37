use super::commands;
use crate::command::Command;
use crate::driver::Connection;
use crate::error::BatchError;
use crate::results::{DataReader, DataSet, FillTarget, Paging};
use crate::types::DbValue;

/// Handle to the open transaction given to a transactional unit of work.
///
/// Commands run through it get the same return-code check as the executor's typed
/// helpers. Commit and rollback stay with the executor.
pub struct Transaction<'c, C: Connection + ?Sized> {
    conn: &'c mut C,
}

impl<'c, C: Connection + ?Sized> Transaction<'c, C> {
    pub(crate) fn new(conn: &'c mut C) -> Self {
        Self { conn }
    }

    /// Execute and return the rows affected.
    ///
    /// # Errors
    /// Driver failures, or `ReturnedErrorCode` for a non-zero status.
    pub async fn non_query(&mut self, command: &Command) -> Result<u64, BatchError> {
        commands::non_query(&mut *self.conn, command).await
    }

    /// # Errors
    /// Driver failures, or `ReturnedErrorCode` for a non-zero status.
    pub async fn scalar(&mut self, command: &Command) -> Result<DbValue, BatchError> {
        commands::scalar(&mut *self.conn, command).await
    }

    /// # Errors
    /// Driver failures, or `ReturnedErrorCode` for a non-zero status.
    pub async fn reader(&mut self, command: &Command) -> Result<DataReader, BatchError> {
        commands::reader(&mut *self.conn, command).await
    }

    /// # Errors
    /// Driver failures, or `ReturnedErrorCode` for a non-zero status.
    pub async fn data_set(&mut self, command: &Command) -> Result<DataSet, BatchError> {
        commands::data_set(&mut *self.conn, command, Paging::ALL).await
    }

    /// Load results into `target` and return the number of rows loaded.
    ///
    /// # Errors
    /// Driver failures, or `ReturnedErrorCode` for a non-zero status.
    pub async fn fill<F>(
        &mut self,
        command: &Command,
        target: &mut F,
        paging: Paging,
    ) -> Result<usize, BatchError>
    where
        F: FillTarget + ?Sized,
    {
        commands::fill(&mut *self.conn, command, target, paging).await
    }

    /// The underlying connection, for driver calls without a status check.
    pub fn connection(&mut self) -> &mut C {
        &mut *self.conn
    }
}
