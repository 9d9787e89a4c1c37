//! Helper utilities for testing and development.

use std::sync::Arc;

use crate::results::{Columns, DataRow, DataTable};
use crate::types::DbValue;

/// Create a test row with the given column names and values.
#[must_use]
pub fn create_test_row(column_names: Vec<String>, values: Vec<DbValue>) -> DataRow {
    DataRow::new(Arc::new(Columns::new(column_names)), values)
}

/// Create a named table from column names and row values.
#[must_use]
pub fn create_test_table(name: &str, column_names: &[&str], rows: Vec<Vec<DbValue>>) -> DataTable {
    let mut table = DataTable::with_columns(
        name,
        column_names.iter().map(|c| (*c).to_string()).collect(),
    );
    for values in rows {
        table.add_row_values(values);
    }
    table
}
