//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::command::{Command, Executed, RETURN_VALUE_PARAMETER};
pub use crate::config::{AnyConnection, AnyConnector, DacConfig};
pub use crate::driver::{Connection, Connector};
pub use crate::error::{BatchError, DacError, DriverError, ErrorKind, PartialResult};
pub use crate::executor::{
    BatchOptions, DataBase, ExecutionOutcome, Transaction, UnitFuture, commands,
};
pub use crate::params::{
    Dynamic, IntoParameters, Parameter, ParameterShapeCache, ParameterSource, Parameters, Record,
};
pub use crate::query_builder::CommandBuilder;
pub use crate::results::{DataReader, DataRow, DataSet, DataTable, FillTarget, Paging};
pub use crate::types::{CommandShape, DatabaseType, DbValue};

pub use tokio_util::sync::CancellationToken;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteConnector, SqliteOptions, SqliteOptionsBuilder};

#[cfg(feature = "mssql")]
pub use crate::mssql::{
    MssqlClient, MssqlConnection, MssqlConnector, MssqlOptions, MssqlOptionsBuilder,
};
