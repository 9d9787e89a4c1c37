use std::collections::HashMap;
use std::sync::Arc;

use crate::types::DbValue;

/// Column names of a table plus a name → index lookup, shared by all of its rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Columns {
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            // first occurrence wins for duplicated column names
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index of a column by name
    #[must_use]
    pub fn position(&self, column_name: &str) -> Option<usize> {
        self.index.get(column_name).copied()
    }
}

/// A row from a database query result
///
/// This struct represents a single row from a database query result,
/// with access to both the column names and the values.
#[derive(Debug, Clone)]
pub struct DataRow {
    columns: Arc<Columns>,
    values: Vec<DbValue>,
}

impl DataRow {
    /// Create a new row.
    ///
    /// Missing trailing values are padded with [`DbValue::Null`]; extra values are dropped.
    #[must_use]
    pub fn new(columns: Arc<Columns>, mut values: Vec<DbValue>) -> Self {
        values.resize(columns.len(), DbValue::Null);
        Self { columns, values }
    }

    #[must_use]
    pub fn columns(&self) -> &Arc<Columns> {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.columns.position(column_name)
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&DbValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&DbValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn values(&self) -> &[DbValue] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<DbValue> {
        self.values
    }
}

impl PartialEq for DataRow {
    fn eq(&self, other: &Self) -> bool {
        self.column_names() == other.column_names() && self.values == other.values
    }
}
