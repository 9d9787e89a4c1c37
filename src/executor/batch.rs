use std::future::Future;

use tracing::{debug, warn};

use super::classify::{Attempt, classify, finish, join_cleanup};
use super::transaction::Transaction;
use super::{BatchOptions, DataBase, UnitFuture};
use crate::driver::{Connection, Connector};
use crate::error::{BatchError, DacError, messages};

impl<C: Connector> DataBase<C> {
    /// Run a unit of work on a fresh connection.
    ///
    /// The connection is opened, handed to `unit`, and closed afterwards when
    /// `options.close_connection` is set, whatever the unit returned. Failures are
    /// classified according to `options`; a suppressed failure yields `T::default()`.
    ///
    /// ```rust,no_run
    /// use dac_middleware::prelude::*;
    /// use dac_middleware::executor::commands;
    ///
    /// # async fn demo(db: DataBase<SqliteConnector>) -> Result<(), DacError> {
    /// let command = Command::new("UPDATE jobs SET state = 'done' WHERE id = @id")
    ///     .with_parameters(Parameters::new().add("id", 9));
    /// let updated = db
    ///     .execute_batch(
    ///         move |conn| Box::pin(async move { commands::non_query(conn, &command).await }),
    ///         BatchOptions::default(),
    ///     )
    ///     .await?;
    /// # let _ = updated;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns the classified failure unless it was suppressed; see [`BatchOptions`].
    pub async fn execute_batch<T, F>(&self, unit: F, options: BatchOptions) -> Result<T, DacError>
    where
        T: Default + Send,
        F: for<'c> FnOnce(&'c mut C::Connection) -> UnitFuture<'c, T> + Send,
    {
        let mut conn = match self.open().await {
            Ok(conn) => conn,
            Err(err) => return finish(classify(err, &options), None, &options),
        };

        let attempt = match self.guarded(unit(&mut conn)).await {
            Ok(value) => Attempt::Ok(value),
            Err(err) => classify(err, &options),
        };

        let cleanup = Self::close(conn, &options).await;
        finish(attempt, cleanup, &options)
    }

    /// Run a unit of work inside a transaction on a fresh connection.
    ///
    /// The transaction commits when `unit` succeeds. Any failure, including a non-zero
    /// return code, a failed commit or cancellation, rolls it back before the error is
    /// classified. The connection is closed per `options.close_connection` in all cases.
    ///
    /// # Errors
    /// Returns the classified failure unless it was suppressed; see [`BatchOptions`].
    pub async fn execute_transactional_batch<T, F>(
        &self,
        unit: F,
        options: BatchOptions,
    ) -> Result<T, DacError>
    where
        T: Default + Send,
        F: for<'c> FnOnce(Transaction<'c, C::Connection>) -> UnitFuture<'c, T> + Send,
    {
        let mut conn = match self.open().await {
            Ok(conn) => conn,
            Err(err) => return finish(classify(err, &options), None, &options),
        };

        if let Err(err) = self.guarded(begin(&mut conn)).await {
            let attempt = classify(err, &options);
            let cleanup = Self::close(conn, &options).await;
            return finish(attempt, cleanup, &options);
        }

        let unit_result = self.guarded(unit(Transaction::new(&mut conn))).await;
        let result = match unit_result {
            Ok(value) => self.guarded(commit(&mut conn)).await.map(|()| value),
            Err(err) => Err(err),
        };

        let (attempt, rollback_failure) = match result {
            Ok(value) => (Attempt::Ok(value), None),
            Err(err) => {
                let rollback_failure = rollback(&mut conn).await;
                (classify(err, &options), rollback_failure)
            }
        };

        let close_failure = Self::close(conn, &options).await;
        finish(
            attempt,
            join_cleanup(rollback_failure, close_failure),
            &options,
        )
    }

    async fn open(&self) -> Result<C::Connection, BatchError> {
        debug!("opening connection");
        self.guarded(async { self.connector.open().await.map_err(BatchError::from) })
            .await
    }

    /// Race `fut` against the cancellation token; cancellation wins ties.
    async fn guarded<R, Fut>(&self, fut: Fut) -> Result<R, BatchError>
    where
        Fut: Future<Output = Result<R, BatchError>>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                debug!("operation cancelled");
                Err(DacError::Cancelled.into())
            }
            res = fut => res,
        }
    }

    async fn close(mut conn: C::Connection, options: &BatchOptions) -> Option<DacError> {
        if !options.close_connection {
            debug!("leaving connection to be released on drop");
            return None;
        }
        debug!("closing connection");
        match conn.close().await {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "closing connection failed");
                Some(DacError::generic(
                    messages::SQL_CONNECTION_CLOSE_EXCEPTION,
                    Some(Box::new(err)),
                ))
            }
        }
    }
}

async fn begin<Conn: Connection>(conn: &mut Conn) -> Result<(), BatchError> {
    debug!("beginning transaction");
    conn.begin_transaction().await.map_err(BatchError::from)
}

async fn commit<Conn: Connection>(conn: &mut Conn) -> Result<(), BatchError> {
    debug!("committing transaction");
    conn.commit().await.map_err(BatchError::from)
}

async fn rollback<Conn: Connection>(conn: &mut Conn) -> Option<DacError> {
    debug!("rolling back transaction");
    match conn.rollback().await {
        Ok(()) => None,
        Err(err) => {
            warn!(error = %err, "rollback failed");
            Some(DacError::generic(
                messages::SQL_TRANSACTION_ROLLBACK_EXCEPTION,
                Some(Box::new(err)),
            ))
        }
    }
}
