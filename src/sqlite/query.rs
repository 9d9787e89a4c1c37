use std::sync::{Arc, Mutex};

use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::{Batch, Connection};

use crate::command::Executed;
use crate::error::DriverError;
use crate::results::{DataSet, DataTable};
use crate::types::DbValue;

use super::params::Params;

/// SQL function a command calls to set its status code, e.g. `SELECT dac_return_value(42);`.
pub const RETURN_VALUE_FUNCTION: &str = "dac_return_value";

#[derive(Debug, Default)]
pub(crate) struct ReturnState {
    value: Option<i64>,
    invoked: bool,
}

/// Status slot shared between a connection and its `dac_return_value` function.
pub(crate) type ReturnSlot = Arc<Mutex<ReturnState>>;

fn lock(slot: &ReturnSlot) -> std::sync::MutexGuard<'_, ReturnState> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Register `dac_return_value(code)` on `conn`; it records `code` and returns it.
pub(crate) fn register_return_value_function(conn: &Connection) -> Result<ReturnSlot, DriverError> {
    let slot: ReturnSlot = Arc::new(Mutex::new(ReturnState::default()));
    let fn_slot = Arc::clone(&slot);
    conn.create_scalar_function(
        RETURN_VALUE_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8,
        move |ctx| {
            let code: Option<i64> = ctx.get(0)?;
            let mut state = lock(&fn_slot);
            state.value = code;
            state.invoked = true;
            Ok(code)
        },
    )?;
    Ok(slot)
}

/// Extract a `DbValue` from a `SQLite` row.
///
/// # Errors
///
/// Returns `DriverError` if the value cannot be read.
pub fn sqlite_extract_value_sync(row: &rusqlite::Row, idx: usize) -> Result<DbValue, DriverError> {
    let value: Value = row.get(idx)?;
    match value {
        Value::Null => Ok(DbValue::Null),
        Value::Integer(i) => Ok(DbValue::Int(i)),
        Value::Real(f) => Ok(DbValue::Float(f)),
        Value::Text(s) => Ok(DbValue::Text(s)),
        Value::Blob(b) => Ok(DbValue::Blob(b)),
    }
}

// Rows inserted, updated or deleted on this connection so far, triggers included.
fn total_changes(conn: &Connection) -> Result<i64, DriverError> {
    Ok(conn.query_row("SELECT total_changes()", [], |row| row.get(0))?)
}

/// Run every statement of `sql` in order.
///
/// Returns the rows changed by the whole batch, one table per row-returning statement
/// (statements that set the status code are not collected), and the status code set
/// during this call.
pub(crate) fn run_batch(
    conn: &Connection,
    sql: &str,
    params: &Params,
    slot: &ReturnSlot,
) -> Result<Executed<(u64, DataSet)>, DriverError> {
    lock(slot).value = None;

    let changes_before = total_changes(conn)?;
    let mut data = DataSet::new();
    let mut batch = Batch::new(conn, sql);

    while let Some(mut stmt) = batch.next()? {
        params.bind(&mut stmt)?;
        lock(slot).invoked = false;

        if stmt.column_count() == 0 {
            stmt.raw_execute()?;
            continue;
        }

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        let col_count = column_names.len();
        let mut table = DataTable::with_columns("", column_names);

        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut row_values = Vec::with_capacity(col_count);
            for i in 0..col_count {
                row_values.push(sqlite_extract_value_sync(row, i)?);
            }
            table.add_row_values(row_values);
        }

        if !lock(slot).invoked {
            data.add_table(table);
        }
    }

    let rows_affected = u64::try_from(total_changes(conn)? - changes_before).map_err(|e| {
        DriverError::ExecutionError(format!("sqlite affected rows conversion error: {e}"))
    })?;

    let return_value = lock(slot)
        .value
        .map(|code| {
            i32::try_from(code).map_err(|e| {
                DriverError::ExecutionError(format!("return value {code} out of range: {e}"))
            })
        })
        .transpose()?;

    Ok(Executed::new((rows_affected, data), return_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Parameters;

    fn open() -> (Connection, ReturnSlot) {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let slot = register_return_value_function(&conn).expect("register function");
        (conn, slot)
    }

    #[test]
    fn multi_statement_batches_sum_changes_and_collect_tables() {
        let (conn, slot) = open();
        let sql = "CREATE TABLE t (id INTEGER, name TEXT);
                   INSERT INTO t VALUES (@id, @name);
                   INSERT INTO t VALUES (@id + 1, NULL);
                   SELECT id, name FROM t ORDER BY id;
                   SELECT dac_return_value(0);";
        let params = Params::convert(&Parameters::new().add("id", 1).add("name", "one"));

        let executed = run_batch(&conn, sql, &params, &slot).expect("batch runs");
        let (affected, data) = executed.value;
        assert_eq!(affected, 2);
        assert_eq!(executed.return_value, Some(0));
        assert_eq!(data.len(), 1);
        let table = data.table(0).expect("one table");
        assert_eq!(table.name(), "Table");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].get("name"), Some(&DbValue::Null));
    }

    #[test]
    fn status_is_fresh_per_call() {
        let (conn, slot) = open();
        let first = run_batch(&conn, "SELECT dac_return_value(42);", &Params::default(), &slot)
            .expect("first call");
        assert_eq!(first.status(), 42);

        let second = run_batch(&conn, "SELECT 1 AS one;", &Params::default(), &slot)
            .expect("second call");
        assert_eq!(second.return_value, None);
        assert_eq!(second.value.1.len(), 1);
    }

    #[test]
    fn duplicate_names_bind_the_last_value() {
        let (conn, slot) = open();
        let params = Params::convert(&Parameters::new().add("v", 1).add("@v", 2));
        let executed = run_batch(&conn, "SELECT @v AS v;", &params, &slot).expect("select");
        let table = executed.value.1.into_first_table();
        assert_eq!(table.rows()[0].get("v"), Some(&DbValue::Int(2)));
    }
}
