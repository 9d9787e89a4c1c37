//! Status-checking command helpers for use inside units of work.
//!
//! Each helper executes one command on a borrowed connection, reads the status slot and
//! turns a non-zero code into [`DacError::ReturnedErrorCode`] carrying whatever the
//! command produced.

use tracing::debug;

use crate::command::{Command, Executed};
use crate::driver::Connection;
use crate::error::{BatchError, DacError, PartialResult};
use crate::results::{DataReader, DataSet, FillTarget, Paging};
use crate::types::DbValue;

fn check_status<T>(
    command: &Command,
    executed: Executed<T>,
    partial: impl FnOnce(T) -> PartialResult,
) -> Result<T, BatchError> {
    match executed.status() {
        0 => Ok(executed.value),
        code => {
            debug!(code, shape = ?command.shape(), "command returned non-zero status");
            Err(DacError::returned_error_code(code, partial(executed.value)).into())
        }
    }
}

/// Execute and return the rows affected.
///
/// # Errors
/// Driver failures, or `ReturnedErrorCode` with `PartialResult::RowsAffected`.
pub async fn non_query<C>(conn: &mut C, command: &Command) -> Result<u64, BatchError>
where
    C: Connection + ?Sized,
{
    command.check_parameters()?;
    let executed = conn.execute_non_query(command).await?;
    check_status(command, executed, PartialResult::RowsAffected)
}

/// Execute and return the first column of the first row.
///
/// # Errors
/// Driver failures, or `ReturnedErrorCode` with `PartialResult::Scalar`.
pub async fn scalar<C>(conn: &mut C, command: &Command) -> Result<DbValue, BatchError>
where
    C: Connection + ?Sized,
{
    command.check_parameters()?;
    let executed = conn.execute_scalar(command).await?;
    check_status(command, executed, PartialResult::Scalar)
}

/// Execute and return a forward-only reader.
///
/// # Errors
/// Driver failures, or `ReturnedErrorCode` with `PartialResult::Reader`.
pub async fn reader<C>(conn: &mut C, command: &Command) -> Result<DataReader, BatchError>
where
    C: Connection + ?Sized,
{
    command.check_parameters()?;
    let executed = conn.execute_reader(command).await?;
    check_status(command, executed, PartialResult::Reader)
}

/// Execute and return every result table, with `paging` applied to the first one.
///
/// # Errors
/// Driver failures, or `ReturnedErrorCode` with `PartialResult::Data`.
pub async fn data_set<C>(
    conn: &mut C,
    command: &Command,
    paging: Paging,
) -> Result<DataSet, BatchError>
where
    C: Connection + ?Sized,
{
    command.check_parameters()?;
    let executed = conn.execute_query(command).await?;
    check_status(command, executed.map(|data| data.paged(paging)), PartialResult::Data)
}

/// Execute and load the results into `target`; returns the number of rows loaded.
///
/// On a non-zero status the rows are still loaded before the error is returned.
///
/// # Errors
/// Driver failures, or `ReturnedErrorCode` with `PartialResult::Data`.
pub async fn fill<C, F>(
    conn: &mut C,
    command: &Command,
    target: &mut F,
    paging: Paging,
) -> Result<usize, BatchError>
where
    C: Connection + ?Sized,
    F: FillTarget + ?Sized,
{
    match data_set(conn, command, paging).await {
        Ok(data) => Ok(target.fill(data, Paging::ALL)),
        Err(err) => {
            if let BatchError::Classified(DacError::ReturnedErrorCode { partial, .. }) = &err {
                if let PartialResult::Data(data) = partial.as_ref() {
                    target.fill(data.clone(), Paging::ALL);
                }
            }
            Err(err)
        }
    }
}
