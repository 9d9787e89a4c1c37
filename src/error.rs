use std::borrow::Cow;

use thiserror::Error;

use crate::results::{DataReader, DataSet};
use crate::types::DbValue;

/// Boxed error used for failures that do not originate in a driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Messages attached to unexpected failures raised by the executor itself.
pub mod messages {
    pub const SYSTEM_EXCEPTION_ON_EXECUTE_SQL_BATCH_LEVEL: &str =
        "System exception on execute SQL batch level";
    pub const SQL_CONNECTION_CLOSE_EXCEPTION: &str = "SQL connection close exception";
    pub const SQL_TRANSACTION_ROLLBACK_EXCEPTION: &str = "SQL transaction rollback exception";
    pub const PARAMETER_BUILD_EXCEPTION: &str = "Failed to build command parameters";
}

/// Failures reported by a database driver (the infrastructure tier).
#[derive(Debug, Error)]
pub enum DriverError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),

    #[error("Other database error: {0}")]
    Other(String),
}

/// Whatever a command produced before its return code was found to be non-zero.
#[derive(Debug, Clone, Default)]
pub enum PartialResult {
    #[default]
    None,
    RowsAffected(u64),
    Scalar(DbValue),
    Reader(DataReader),
    Data(DataSet),
}

/// The failure tier a [`DacError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Driver or connectivity failure.
    Infrastructure,
    /// Non-zero return code reported by the executed command.
    Business,
    /// Anything else, including cleanup failures.
    Unexpected,
    /// The executor's cancellation token fired.
    Cancelled,
}

/// Classified error returned by every executor entry point.
#[derive(Debug, Error)]
pub enum DacError {
    #[error("SQL execution error: {0}")]
    SqlExecution(#[source] DriverError),

    #[error("SQL query or stored procedure returned non-zero code {code}")]
    ReturnedErrorCode {
        code: i32,
        partial: Box<PartialResult>,
    },

    #[error("{message}")]
    Generic {
        message: Cow<'static, str>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{primary} (cleanup also failed: {cleanup})")]
    CleanupFailed {
        primary: Box<DacError>,
        cleanup: Box<DacError>,
    },
}

impl DacError {
    /// Unexpected failure with a message and an optional cause.
    pub fn generic(message: impl Into<Cow<'static, str>>, source: Option<BoxError>) -> Self {
        DacError::Generic {
            message: message.into(),
            source,
        }
    }

    /// Business failure carrying the return code and what was produced so far.
    #[must_use]
    pub fn returned_error_code(code: i32, partial: PartialResult) -> Self {
        DacError::ReturnedErrorCode {
            code,
            partial: Box::new(partial),
        }
    }

    /// Tier of this error. A `CleanupFailed` reports the tier of its primary error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            DacError::SqlExecution(_) => ErrorKind::Infrastructure,
            DacError::ReturnedErrorCode { .. } => ErrorKind::Business,
            DacError::Generic { .. } => ErrorKind::Unexpected,
            DacError::Cancelled => ErrorKind::Cancelled,
            DacError::CleanupFailed { primary, .. } => primary.kind(),
        }
    }

    /// Return code of a business failure, if this is one.
    #[must_use]
    pub fn return_code(&self) -> Option<i32> {
        match self {
            DacError::ReturnedErrorCode { code, .. } => Some(*code),
            DacError::CleanupFailed { primary, .. } => primary.return_code(),
            _ => None,
        }
    }

    /// Partial result of a business failure, if this is one.
    #[must_use]
    pub fn partial_result(&self) -> Option<&PartialResult> {
        match self {
            DacError::ReturnedErrorCode { partial, .. } => Some(partial),
            DacError::CleanupFailed { primary, .. } => primary.partial_result(),
            _ => None,
        }
    }

    /// Cleanup failure that accompanied the primary error, if any.
    #[must_use]
    pub fn cleanup_error(&self) -> Option<&DacError> {
        match self {
            DacError::CleanupFailed { cleanup, .. } => Some(cleanup),
            _ => None,
        }
    }
}

/// Failure of a unit of work, before the executor classifies it.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Raised by the driver; classified as an infrastructure failure.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Already classified (e.g. a non-zero return code or a nested executor call).
    #[error(transparent)]
    Classified(#[from] DacError),

    /// Anything else; classified as an unexpected failure.
    #[error(transparent)]
    Other(BoxError),
}

impl BatchError {
    /// Wrap an arbitrary error raised inside a unit of work.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        BatchError::Other(err.into())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for BatchError {
    fn from(err: rusqlite::Error) -> Self {
        BatchError::Driver(DriverError::SqliteError(err))
    }
}

#[cfg(feature = "mssql")]
impl From<tiberius::error::Error> for BatchError {
    fn from(err: tiberius::error::Error) -> Self {
        BatchError::Driver(DriverError::MssqlError(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_failure_keeps_primary_classification() {
        let err = DacError::CleanupFailed {
            primary: Box::new(DacError::returned_error_code(
                42,
                PartialResult::RowsAffected(3),
            )),
            cleanup: Box::new(DacError::generic(
                messages::SQL_CONNECTION_CLOSE_EXCEPTION,
                None,
            )),
        };

        assert_eq!(err.kind(), ErrorKind::Business);
        assert_eq!(err.return_code(), Some(42));
        assert!(matches!(
            err.partial_result(),
            Some(PartialResult::RowsAffected(3))
        ));
        assert_eq!(
            err.cleanup_error().map(DacError::kind),
            Some(ErrorKind::Unexpected)
        );
    }

    #[test]
    fn batch_error_conversions() {
        let from_driver: BatchError = DriverError::ExecutionError("boom".into()).into();
        assert!(matches!(from_driver, BatchError::Driver(_)));

        let from_dac: BatchError = DacError::Cancelled.into();
        assert!(matches!(from_dac, BatchError::Classified(DacError::Cancelled)));

        let other = BatchError::other("plain failure");
        assert_eq!(other.to_string(), "plain failure");
    }
}
