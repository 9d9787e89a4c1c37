//! Batch execution: connection lifecycle, transactions, return-code checks and
//! failure classification.

mod batch;
mod classify;
pub mod commands;
mod helpers;
mod outcome;
mod transaction;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::command::Command;
use crate::driver::Connector;
use crate::error::BatchError;
use crate::params::ParameterShapeCache;
use crate::query_builder::CommandBuilder;

pub use outcome::ExecutionOutcome;
pub use transaction::Transaction;

/// Future returned by a unit of work; it may borrow the connection for `'c`.
pub type UnitFuture<'c, T> = BoxFuture<'c, Result<T, BatchError>>;

/// Failure policy for one executor call.
///
/// Business failures (non-zero return codes) always propagate. Driver failures propagate
/// only with `throw_db_errors`, every other failure only with `throw_unexpected_errors`;
/// a suppressed failure makes the call return `T::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Close the connection when the call finishes. When `false` the connection is
    /// released on drop without an explicit close.
    pub close_connection: bool,
    pub throw_db_errors: bool,
    pub throw_unexpected_errors: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            close_connection: true,
            throw_db_errors: true,
            throw_unexpected_errors: true,
        }
    }
}

impl BatchOptions {
    /// Suppress driver and unexpected failures; business failures still propagate.
    #[must_use]
    pub fn suppress_all() -> Self {
        Self {
            close_connection: true,
            throw_db_errors: false,
            throw_unexpected_errors: false,
        }
    }

    #[must_use]
    pub fn with_close_connection(mut self, close: bool) -> Self {
        self.close_connection = close;
        self
    }

    #[must_use]
    pub fn with_throw_db_errors(mut self, throw: bool) -> Self {
        self.throw_db_errors = throw;
        self
    }

    #[must_use]
    pub fn with_throw_unexpected_errors(mut self, throw: bool) -> Self {
        self.throw_unexpected_errors = throw;
        self
    }
}

/// Entry point of the data-access layer for one database.
///
/// Each call opens its own connection, so a `DataBase` can be shared freely between
/// tasks. The only state shared between calls is the parameter shape cache.
pub struct DataBase<C: Connector> {
    connector: C,
    cancel: CancellationToken,
    shapes: Arc<ParameterShapeCache>,
}

impl<C: Connector> DataBase<C> {
    /// Cancelling `cancel` aborts every in-flight and future call of this executor.
    pub fn new(connector: C, cancel: CancellationToken) -> Self {
        Self {
            connector,
            cancel,
            shapes: Arc::new(ParameterShapeCache::new()),
        }
    }

    /// Share a parameter shape cache with other executors.
    #[must_use]
    pub fn with_shape_cache(mut self, shapes: Arc<ParameterShapeCache>) -> Self {
        self.shapes = shapes;
        self
    }

    #[must_use]
    pub fn connection_string(&self) -> &str {
        self.connector.connection_string()
    }

    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }

    #[must_use]
    pub fn shape_cache(&self) -> &Arc<ParameterShapeCache> {
        &self.shapes
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Start a fluent command against this database.
    pub fn command(&self, text: impl Into<String>) -> CommandBuilder<'_, C> {
        CommandBuilder::new(self, Command::new(text))
    }
}
