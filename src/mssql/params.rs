use tiberius::Query;

use crate::command::{RETURN_VALUE_PARAMETER, is_identifier};
use crate::error::DriverError;
use crate::params::Parameters;
use crate::types::DbValue;

/// T-SQL variable name for a parameter: `@` is added unless already present.
#[must_use]
pub fn variable_name(name: &str) -> String {
    if name.starts_with('@') {
        name.to_string()
    } else {
        format!("@{name}")
    }
}

/// T-SQL type used to declare a variable holding `value`.
#[must_use]
pub fn declared_type(value: &DbValue) -> &'static str {
    match value {
        DbValue::Int(_) => "BIGINT",
        DbValue::Float(_) => "FLOAT",
        DbValue::Bool(_) => "BIT",
        DbValue::Timestamp(_) => "DATETIME2",
        DbValue::Blob(_) => "VARBINARY(MAX)",
        DbValue::Text(_) | DbValue::Json(_) => "NVARCHAR(MAX)",
        DbValue::Null => "NVARCHAR(4000)",
    }
}

/// Named parameters as declared variables bound to positional `@P1..@Pn` values.
#[derive(Debug, Clone, Default)]
pub struct Params(pub Vec<(String, DbValue)>);

impl Params {
    /// A name given more than once is declared once with its last value. The reserved
    /// status slot name is never taken from the caller.
    ///
    /// # Errors
    /// Returns `DriverError::ParameterError` for a name that is not `@?[A-Za-z_][A-Za-z0-9_]*`;
    /// names are spliced into the batch text as variables.
    pub fn convert(params: &Parameters) -> Result<Self, DriverError> {
        let mut named: Vec<(String, DbValue)> = Vec::with_capacity(params.len());
        for param in params {
            let name = variable_name(param.name());
            if !is_identifier(&name[1..]) {
                return Err(DriverError::ParameterError(format!(
                    "'{}' is not a valid T-SQL variable name",
                    param.name()
                )));
            }
            if name.eq_ignore_ascii_case(RETURN_VALUE_PARAMETER) {
                continue;
            }
            match named.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(&name)) {
                Some(slot) => slot.1 = param.value().clone(),
                None => named.push((name, param.value().clone())),
            }
        }
        Ok(Params(named))
    }

    /// `DECLARE` statements for every parameter.
    #[must_use]
    pub fn declarations(&self) -> String {
        let mut sql = String::new();
        for (idx, (name, value)) in self.0.iter().enumerate() {
            sql.push_str(&format!(
                "DECLARE {name} {} = @P{};\n",
                declared_type(value),
                idx + 1
            ));
        }
        sql
    }

    /// `@a = @a, @b = @b` argument list for `EXEC`.
    #[must_use]
    pub fn exec_arguments(&self) -> String {
        self.0
            .iter()
            .map(|(name, _)| format!("{name} = {name}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Bind the values positionally, in declaration order.
    pub fn bind(&self, query: &mut Query<'_>) {
        for (_, value) in &self.0 {
            match value {
                DbValue::Int(i) => query.bind(*i),
                DbValue::Float(f) => query.bind(*f),
                DbValue::Text(s) => query.bind(s.clone()),
                DbValue::Bool(b) => query.bind(*b),
                DbValue::Timestamp(dt) => query.bind(*dt),
                DbValue::Null => query.bind(Option::<String>::None),
                DbValue::Json(jsval) => query.bind(jsval.to_string()),
                DbValue::Blob(bytes) => query.bind(bytes.clone()),
            }
        }
    }
}
