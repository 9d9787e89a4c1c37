use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::DriverError;
use crate::params::Parameters;
use crate::types::DbValue;

/// Convert a single `DbValue` to a rusqlite `Value`.
#[must_use]
pub fn db_value_to_sqlite_value(value: &DbValue) -> Value {
    match value {
        DbValue::Int(i) => Value::Integer(*i),
        DbValue::Float(f) => Value::Real(*f),
        DbValue::Text(s) => Value::Text(s.clone()),
        DbValue::Bool(b) => Value::Integer(i64::from(*b)),
        DbValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        DbValue::Null => Value::Null,
        DbValue::Json(jval) => Value::Text(jval.to_string()),
        DbValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Parameter name as written in SQL text: `@` is added unless the name already
/// starts with one of the `SQLite` prefixes (`@`, `:`, `$`).
#[must_use]
pub fn sql_name(name: &str) -> String {
    if name.starts_with(['@', ':', '$']) {
        name.to_string()
    } else {
        format!("@{name}")
    }
}

/// Named parameters converted once per command, reused for every statement of the batch.
#[derive(Debug, Clone, Default)]
pub struct Params(pub Vec<(String, Value)>);

impl Params {
    /// Convert middleware parameters into `SQLite` values.
    #[must_use]
    pub fn convert(params: &Parameters) -> Self {
        Params(
            params
                .iter()
                .map(|p| (sql_name(p.name()), db_value_to_sqlite_value(p.value())))
                .collect(),
        )
    }

    /// Bind every parameter the statement references; the others are skipped.
    ///
    /// When a name is given more than once the last value wins.
    ///
    /// # Errors
    /// Returns `DriverError::SqliteError` if binding fails.
    pub fn bind(&self, stmt: &mut Statement<'_>) -> Result<(), DriverError> {
        for (name, value) in &self.0 {
            if let Some(idx) = stmt.parameter_index(name)? {
                stmt.raw_bind_parameter(idx, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn names_get_a_prefix_once() {
        assert_eq!(sql_name("id"), "@id");
        assert_eq!(sql_name("@id"), "@id");
        assert_eq!(sql_name(":id"), ":id");
        assert_eq!(sql_name("$id"), "$id");
    }

    #[test]
    fn values_map_to_sqlite_storage_classes() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(12, 30, 0))
            .expect("valid timestamp");
        assert_eq!(db_value_to_sqlite_value(&DbValue::Bool(true)), Value::Integer(1));
        assert_eq!(
            db_value_to_sqlite_value(&DbValue::Timestamp(ts)),
            Value::Text("2024-03-01 12:30:00".into())
        );
        assert_eq!(db_value_to_sqlite_value(&DbValue::Null), Value::Null);
    }
}
