use std::sync::Arc;

use crate::error::DriverError;
use crate::params::Parameters;
use crate::types::CommandShape;

/// Name of the implicit status-code output slot attached to every command.
pub const RETURN_VALUE_PARAMETER: &str = "@return_value";

/// The integer output slot a command's callee fills with its status code.
///
/// `0` means success; an absent or NULL value also reads as `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnValueSlot {
    name: Arc<str>,
}

impl ReturnValueSlot {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for ReturnValueSlot {
    fn default() -> Self {
        Self {
            name: Arc::from(RETURN_VALUE_PARAMETER),
        }
    }
}

/// Everything a driver needs to execute one command.
///
/// Built per call and not modified afterwards; the `with_*` methods consume and return it.
/// ```rust
/// use dac_middleware::prelude::*;
///
/// let cmd = Command::stored_procedure("usp_archive_orders")
///     .with_parameters(Parameters::new().add("@before", "2024-01-01"));
/// assert_eq!(cmd.shape(), CommandShape::StoredProcedure);
/// assert_eq!(cmd.return_value().name(), "@return_value");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    text: String,
    shape: CommandShape,
    parameters: Parameters,
    return_value: ReturnValueSlot,
}

impl Command {
    /// Plain SQL text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            shape: CommandShape::Text,
            parameters: Parameters::new(),
            return_value: ReturnValueSlot::default(),
        }
    }

    pub fn stored_procedure(name: impl Into<String>) -> Self {
        Self::new(name).with_shape(CommandShape::StoredProcedure)
    }

    pub fn table_direct(table: impl Into<String>) -> Self {
        Self::new(table).with_shape(CommandShape::TableDirect)
    }

    #[must_use]
    pub fn with_shape(mut self, shape: CommandShape) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn shape(&self) -> CommandShape {
        self.shape
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn return_value(&self) -> &ReturnValueSlot {
        &self.return_value
    }

    /// Reject parameters the drivers cannot bind.
    ///
    /// # Errors
    /// Returns `DriverError::ParameterError` for an empty or blank parameter name, or one
    /// that is not an identifier with an optional `@`, `:` or `$` prefix.
    pub fn check_parameters(&self) -> Result<(), DriverError> {
        for (position, param) in self.parameters.iter().enumerate() {
            let name = param.name();
            if name.trim().is_empty() {
                return Err(DriverError::ParameterError(format!(
                    "parameter at position {position} has an empty name"
                )));
            }
            if !is_identifier(name.strip_prefix(['@', ':', '$']).unwrap_or(name)) {
                return Err(DriverError::ParameterError(format!(
                    "parameter at position {position} has an invalid name '{name}'"
                )));
            }
        }
        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A driver result together with the status code read back after execution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Executed<T> {
    pub value: T,
    pub return_value: Option<i32>,
}

impl<T> Executed<T> {
    pub fn new(value: T, return_value: Option<i32>) -> Self {
        Self {
            value,
            return_value,
        }
    }

    /// Status code, with an unset slot read as success.
    #[must_use]
    pub fn status(&self) -> i32 {
        self.return_value.unwrap_or(0)
    }

    pub fn map<U, F>(self, f: F) -> Executed<U>
    where
        F: FnOnce(T) -> U,
    {
        Executed {
            value: f(self.value),
            return_value: self.return_value,
        }
    }
}
