use serde::Serialize;

use crate::command::Command;
use crate::driver::Connector;
use crate::error::DacError;
use crate::executor::{BatchOptions, DataBase};
use crate::params::{Dynamic, IntoParameters, ParameterSource, Parameters, Record};
use crate::results::{DataReader, DataSet, DataTable, Paging};
use crate::types::{CommandShape, DbValue};

/// Fluent builder for one command against a [`DataBase`].
///
/// Parameters from several calls are appended in call order. A parameter conversion
/// failure is kept and returned by the terminal method.
/// ```rust,no_run
/// use dac_middleware::prelude::*;
///
/// # async fn demo(db: DataBase<SqliteConnector>) -> Result<(), DacError> {
/// let orders = db
///     .command("SELECT id, total FROM orders WHERE customer = @customer")
///     .params(vec![("customer", 17)])
///     .page(0, 50)
///     .data_table()
///     .await?;
/// # let _ = orders;
/// # Ok(())
/// # }
/// ```
pub struct CommandBuilder<'db, C: Connector> {
    db: &'db DataBase<C>,
    command: Command,
    params: Result<Parameters, DacError>,
    options: BatchOptions,
    paging: Paging,
}

impl<'db, C: Connector> CommandBuilder<'db, C> {
    pub(crate) fn new(db: &'db DataBase<C>, command: Command) -> Self {
        Self {
            db,
            command,
            params: Ok(Parameters::new()),
            options: BatchOptions::default(),
            paging: Paging::ALL,
        }
    }

    #[must_use]
    pub fn shape(mut self, shape: CommandShape) -> Self {
        self.command = self.command.with_shape(shape);
        self
    }

    /// Treat the text as a stored procedure name.
    #[must_use]
    pub fn stored_procedure(self) -> Self {
        self.shape(CommandShape::StoredProcedure)
    }

    /// Treat the text as a table name.
    #[must_use]
    pub fn table_direct(self) -> Self {
        self.shape(CommandShape::TableDirect)
    }

    /// Append parameters in any supported input shape.
    #[must_use]
    pub fn params<P: IntoParameters>(mut self, params: P) -> Self {
        let db = self.db;
        let cache = db.shape_cache();
        self.params = match self.params {
            Ok(mut current) => params.into_parameters(cache).map(|more| {
                current.extend(more);
                current
            }),
            Err(err) => Err(err),
        };
        self
    }

    /// Append a single parameter.
    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<DbValue>) -> Self {
        if let Ok(current) = &mut self.params {
            current.push(name, value);
        }
        self
    }

    /// Append the fields of a record, resolved through the executor's shape cache.
    #[must_use]
    pub fn record<S: ParameterSource>(self, record: &S) -> Self {
        self.params(Record(record))
    }

    /// Append the top-level fields of any serializable object.
    #[must_use]
    pub fn dynamic<T: Serialize + ?Sized>(self, object: &T) -> Self {
        self.params(Dynamic(object))
    }

    #[must_use]
    pub fn options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Restrict table loads to `max_records` rows starting at `start_record`;
    /// `max_records == 0` loads everything.
    #[must_use]
    pub fn page(mut self, start_record: usize, max_records: usize) -> Self {
        self.paging = Paging::new(start_record, max_records);
        self
    }

    /// The finished command.
    ///
    /// # Errors
    /// Returns the first parameter conversion failure.
    pub fn build(self) -> Result<Command, DacError> {
        let params = self.params?;
        Ok(self.command.with_parameters(params))
    }

    fn split(self) -> Result<(&'db DataBase<C>, Command, BatchOptions, Paging), DacError> {
        let (db, options, paging) = (self.db, self.options, self.paging);
        Ok((db, self.build()?, options, paging))
    }

    /// # Errors
    /// See [`DataBase::execute_non_query`].
    pub async fn non_query(self) -> Result<u64, DacError> {
        let (db, command, options, _) = self.split()?;
        db.execute_non_query(command, options).await
    }

    /// # Errors
    /// See [`DataBase::execute_scalar`].
    pub async fn scalar(self) -> Result<DbValue, DacError> {
        let (db, command, options, _) = self.split()?;
        db.execute_scalar(command, options).await
    }

    /// # Errors
    /// See [`DataBase::execute_reader`].
    pub async fn reader(self) -> Result<DataReader, DacError> {
        let (db, command, options, _) = self.split()?;
        db.execute_reader(command, options).await
    }

    /// # Errors
    /// See [`DataBase::get_data_table`].
    pub async fn data_table(self) -> Result<DataTable, DacError> {
        let (db, command, options, paging) = self.split()?;
        db.get_data_table(command, paging, options).await
    }

    /// # Errors
    /// See [`DataBase::get_data_set`].
    pub async fn data_set(self) -> Result<DataSet, DacError> {
        let (db, command, options, paging) = self.split()?;
        db.get_data_set(command, paging, options).await
    }

    /// # Errors
    /// See [`DataBase::fill_data_table`].
    pub async fn fill_table(self, target: &mut DataTable) -> Result<usize, DacError> {
        let (db, command, options, paging) = self.split()?;
        db.fill_data_table(command, target, paging, options).await
    }

    /// # Errors
    /// See [`DataBase::fill_data_set`].
    pub async fn fill_set(self, target: &mut DataSet) -> Result<usize, DacError> {
        let (db, command, options, paging) = self.split()?;
        db.fill_data_set(command, target, paging, options).await
    }
}
