use chrono::NaiveDateTime;
use futures_util::TryStreamExt;
use tiberius::{Query, QueryItem};

use super::client::MssqlClient;
use super::params::Params;
use crate::command::{Command, Executed, RETURN_VALUE_PARAMETER};
use crate::error::DriverError;
use crate::results::{DataSet, DataTable};
use crate::types::{CommandShape, DbValue};

const STATUS_KEY: &str = "dac_return_value";

/// Quote a possibly schema-qualified object name, e.g. `dbo.Orders` → `[dbo].[Orders]`.
///
/// Parts already written as `[name]` are unwrapped and quoted again.
#[must_use]
pub fn quote_object_name(name: &str) -> String {
    name.split('.')
        .map(|part| {
            let bare = part
                .strip_prefix('[')
                .and_then(|inner| inner.strip_suffix(']'))
                .map_or_else(|| part.to_string(), |inner| inner.replace("]]", "]"));
            format!("[{}]", bare.replace(']', "]]"))
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Wrap `command` into one batch that declares its parameters and the status slot,
/// runs the command, and stores the status in the session context.
///
/// Text commands set the status with `SET @return_value = ...`; stored procedures report
/// their `RETURN` value.
#[must_use]
pub fn build_batch(command: &Command, params: &Params) -> String {
    let body = match command.shape() {
        CommandShape::Text => command.text().to_string(),
        CommandShape::StoredProcedure => {
            let args = params.exec_arguments();
            let proc_name = quote_object_name(command.text());
            if args.is_empty() {
                format!("EXEC {RETURN_VALUE_PARAMETER} = {proc_name};")
            } else {
                format!("EXEC {RETURN_VALUE_PARAMETER} = {proc_name} {args};")
            }
        }
        CommandShape::TableDirect => {
            format!("SELECT * FROM {};", quote_object_name(command.text()))
        }
    };

    format!(
        "{declarations}DECLARE {RETURN_VALUE_PARAMETER} INT = NULL;\n\
         EXEC sp_set_session_context N'{STATUS_KEY}', NULL;\n\
         {body}\n\
         EXEC sp_set_session_context N'{STATUS_KEY}', {RETURN_VALUE_PARAMETER};",
        declarations = params.declarations(),
    )
}

/// Status code stored by the last batch, if any.
pub async fn read_status(client: &mut MssqlClient) -> Result<Option<i32>, DriverError> {
    let row = client
        .simple_query(format!(
            "SELECT CAST(SESSION_CONTEXT(N'{STATUS_KEY}') AS INT) AS status;"
        ))
        .await?
        .into_row()
        .await?;
    match row {
        Some(row) => Ok(row.try_get::<i32, _>(0)?),
        None => Ok(None),
    }
}

/// Execute `command` and return the total rows affected.
pub async fn execute_non_query(
    client: &mut MssqlClient,
    command: &Command,
) -> Result<Executed<u64>, DriverError> {
    let params = Params::convert(command.parameters())?;
    let sql = build_batch(command, &params);
    let mut query = Query::new(sql);
    params.bind(&mut query);

    let result = query.execute(client).await?;
    let affected = result.rows_affected().iter().sum();
    let status = read_status(client).await?;
    Ok(Executed::new(affected, status))
}

/// Execute `command` and collect each result set into a table.
pub async fn execute_query(
    client: &mut MssqlClient,
    command: &Command,
) -> Result<Executed<DataSet>, DriverError> {
    let params = Params::convert(command.parameters())?;
    let sql = build_batch(command, &params);
    let mut query = Query::new(sql);
    params.bind(&mut query);

    let mut data = DataSet::new();
    let mut current: Option<DataTable> = None;
    {
        let mut stream = query.query(client).await?;
        while let Some(item) = stream.try_next().await? {
            match item {
                QueryItem::Metadata(meta) => {
                    if let Some(table) = current.take() {
                        data.add_table(table);
                    }
                    let column_names: Vec<String> =
                        meta.columns().iter().map(|col| col.name().to_string()).collect();
                    current = Some(DataTable::with_columns("", column_names));
                }
                QueryItem::Row(row) => {
                    let Some(table) = current.as_mut() else {
                        return Err(DriverError::ExecutionError(
                            "row received before column metadata".to_string(),
                        ));
                    };
                    let col_count = table.column_names().len();
                    let mut row_values = Vec::with_capacity(col_count);
                    for i in 0..col_count {
                        row_values.push(extract_value(&row, i)?.unwrap_or(DbValue::Null));
                    }
                    table.add_row_values(row_values);
                }
            }
        }
    }
    if let Some(table) = current.take() {
        data.add_table(table);
    }

    let status = read_status(client).await?;
    Ok(Executed::new(data, status))
}

/// Extract a value from a row at a specific index
fn extract_value(row: &tiberius::Row, idx: usize) -> Result<Option<DbValue>, DriverError> {
    if let Ok(Some(val)) = row.try_get::<i32, _>(idx) {
        return Ok(Some(DbValue::Int(i64::from(val))));
    }

    if let Ok(Some(val)) = row.try_get::<i64, _>(idx) {
        return Ok(Some(DbValue::Int(val)));
    }

    if let Ok(Some(val)) = row.try_get::<i16, _>(idx) {
        return Ok(Some(DbValue::Int(i64::from(val))));
    }

    if let Ok(Some(val)) = row.try_get::<u8, _>(idx) {
        return Ok(Some(DbValue::Int(i64::from(val))));
    }

    if let Ok(Some(val)) = row.try_get::<f32, _>(idx) {
        return Ok(Some(DbValue::Float(f64::from(val))));
    }

    if let Ok(Some(val)) = row.try_get::<f64, _>(idx) {
        return Ok(Some(DbValue::Float(val)));
    }

    if let Ok(Some(val)) = row.try_get::<bool, _>(idx) {
        return Ok(Some(DbValue::Bool(val)));
    }

    if let Ok(Some(val)) = row.try_get::<NaiveDateTime, _>(idx) {
        return Ok(Some(DbValue::Timestamp(val)));
    }

    if let Ok(Some(val)) = row.try_get::<&str, _>(idx) {
        return Ok(Some(DbValue::Text(val.to_string())));
    }

    if let Ok(Some(val)) = row.try_get::<&[u8], _>(idx) {
        return Ok(Some(DbValue::Blob(val.to_vec())));
    }

    Ok(None)
}
