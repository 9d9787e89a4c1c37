//! Async data-access layer over `SQLite` and SQL Server.
//!
//! Every call runs as a *batch*: a connection is opened, a unit of work runs on it
//! (optionally inside a transaction), and the connection is closed again. Each command
//! reports a status code through an implicit `@return_value` slot; a non-zero code is
//! a business failure that always reaches the caller. Driver failures and unexpected
//! failures can be suppressed per call through [`BatchOptions`].
//!
//! ```rust,no_run
//! use dac_middleware::prelude::*;
//!
//! # async fn demo() -> Result<(), DacError> {
//! let connector = SqliteConnector::builder("app.db".to_string()).build();
//! let db = DataBase::new(connector, CancellationToken::new());
//!
//! let open_orders = db
//!     .command("SELECT id, total FROM orders WHERE state = @state")
//!     .param("state", "open")
//!     .data_table()
//!     .await?;
//! println!("{} open orders", open_orders.len());
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod params;
pub mod prelude;
pub mod query_builder;
pub mod results;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use command::{Command, Executed};
pub use config::{AnyConnector, DacConfig};
pub use driver::{Connection, Connector};
pub use error::{BatchError, DacError, DriverError, ErrorKind, PartialResult};
pub use executor::{BatchOptions, DataBase, ExecutionOutcome, Transaction};
pub use params::{IntoParameters, Parameters};
pub use results::{DataReader, DataRow, DataSet, DataTable, Paging};
pub use types::{CommandShape, DatabaseType, DbValue};
