use super::commands;
use super::{BatchOptions, DataBase};
use crate::command::Command;
use crate::driver::Connector;
use crate::error::{DacError, PartialResult};
use crate::results::{DataReader, DataSet, DataTable, FillTarget, Paging};
use crate::types::DbValue;

impl<C: Connector> DataBase<C> {
    /// Execute `command` and return the rows affected.
    ///
    /// # Errors
    /// The classified failure, or `ReturnedErrorCode` for a non-zero status.
    pub async fn execute_non_query(
        &self,
        command: Command,
        options: BatchOptions,
    ) -> Result<u64, DacError> {
        self.execute_batch(
            move |conn| Box::pin(async move { commands::non_query(conn, &command).await }),
            options,
        )
        .await
    }

    /// Execute `command` and return the first column of the first row.
    ///
    /// # Errors
    /// The classified failure, or `ReturnedErrorCode` for a non-zero status.
    pub async fn execute_scalar(
        &self,
        command: Command,
        options: BatchOptions,
    ) -> Result<DbValue, DacError> {
        self.execute_batch(
            move |conn| Box::pin(async move { commands::scalar(conn, &command).await }),
            options,
        )
        .await
    }

    /// Execute `command` and return a forward-only reader over its results.
    ///
    /// The results are buffered, so the connection is released before this returns.
    ///
    /// # Errors
    /// The classified failure, or `ReturnedErrorCode` for a non-zero status.
    pub async fn execute_reader(
        &self,
        command: Command,
        options: BatchOptions,
    ) -> Result<DataReader, DacError> {
        self.execute_batch(
            move |conn| Box::pin(async move { commands::reader(conn, &command).await }),
            options,
        )
        .await
    }

    /// Execute `command` and return its first result table.
    ///
    /// # Errors
    /// The classified failure, or `ReturnedErrorCode` for a non-zero status.
    pub async fn get_data_table(
        &self,
        command: Command,
        paging: Paging,
        options: BatchOptions,
    ) -> Result<DataTable, DacError> {
        let mut table = DataTable::new(DataSet::table_name(0));
        self.fill_data_table(command, &mut table, paging, options)
            .await?;
        Ok(table)
    }

    /// Execute `command` and return all of its result tables.
    ///
    /// # Errors
    /// The classified failure, or `ReturnedErrorCode` for a non-zero status.
    pub async fn get_data_set(
        &self,
        command: Command,
        paging: Paging,
        options: BatchOptions,
    ) -> Result<DataSet, DacError> {
        self.execute_batch(
            move |conn| Box::pin(async move { commands::data_set(conn, &command, paging).await }),
            options,
        )
        .await
    }

    /// Load the first result table of `command` into `target`.
    ///
    /// Rows are merged into what `target` already holds. Returns the number of rows loaded.
    ///
    /// # Errors
    /// The classified failure, or `ReturnedErrorCode` for a non-zero status; in the latter
    /// case the rows have been loaded too.
    pub async fn fill_data_table(
        &self,
        command: Command,
        target: &mut DataTable,
        paging: Paging,
        options: BatchOptions,
    ) -> Result<usize, DacError> {
        let result = self.get_data_set(command, paging, options).await;
        load_into(target, result)
    }

    /// Load every result table of `command` into `target`, merging tables by name.
    ///
    /// # Errors
    /// The classified failure, or `ReturnedErrorCode` for a non-zero status; in the latter
    /// case the rows have been loaded too.
    pub async fn fill_data_set(
        &self,
        command: Command,
        target: &mut DataSet,
        paging: Paging,
        options: BatchOptions,
    ) -> Result<usize, DacError> {
        let result = self.get_data_set(command, paging, options).await;
        load_into(target, result)
    }
}

fn load_into<F: FillTarget + ?Sized>(
    target: &mut F,
    result: Result<DataSet, DacError>,
) -> Result<usize, DacError> {
    match result {
        Ok(data) => Ok(target.fill(data, Paging::ALL)),
        Err(err) => {
            if let Some(PartialResult::Data(data)) = err.partial_result() {
                target.fill(data.clone(), Paging::ALL);
            }
            Err(err)
        }
    }
}
