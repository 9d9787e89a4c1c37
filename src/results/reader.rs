use std::collections::VecDeque;

use super::row::DataRow;
use super::table::{DataSet, DataTable};
use crate::types::DbValue;

/// Forward-only reader over the result tables of one command.
///
/// Results are buffered before the connection is released, so a reader never holds a
/// connection open. Call [`read`](Self::read) to advance within the current result and
/// [`next_result`](Self::next_result) to move to the following one.
/// ```rust
/// use dac_middleware::prelude::*;
///
/// let mut table = DataTable::with_columns("", vec!["id".into()]);
/// table.add_row_values(vec![DbValue::Int(1)]);
/// table.add_row_values(vec![DbValue::Int(2)]);
/// let mut data = DataSet::new();
/// data.add_table(table);
///
/// let mut reader = DataReader::new(data);
/// let mut seen = Vec::new();
/// while reader.read() {
///     seen.push(reader.get("id").and_then(DbValue::as_int).copied());
/// }
/// assert_eq!(seen, vec![Some(1), Some(2)]);
/// assert!(!reader.next_result());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DataReader {
    current: Option<DataTable>,
    pending: VecDeque<DataTable>,
    // index of the next row `read` will move to
    cursor: usize,
    positioned: bool,
}

impl DataReader {
    #[must_use]
    pub fn new(data: DataSet) -> Self {
        let mut pending: VecDeque<DataTable> = data.into_tables().into();
        let current = pending.pop_front();
        Self {
            current,
            pending,
            cursor: 0,
            positioned: false,
        }
    }

    /// Advance to the next row of the current result. Returns `false` once exhausted.
    pub fn read(&mut self) -> bool {
        let Some(table) = &self.current else {
            return false;
        };
        if self.cursor < table.len() {
            self.cursor += 1;
            self.positioned = true;
            true
        } else {
            self.positioned = false;
            false
        }
    }

    /// Move to the next result table. Returns `false` when there is none.
    pub fn next_result(&mut self) -> bool {
        self.current = self.pending.pop_front();
        self.cursor = 0;
        self.positioned = false;
        self.current.is_some()
    }

    /// Row the reader is positioned on, if any.
    #[must_use]
    pub fn current_row(&self) -> Option<&DataRow> {
        if !self.positioned {
            return None;
        }
        self.current
            .as_ref()
            .and_then(|table| table.row(self.cursor.checked_sub(1)?))
    }

    /// Value of a column in the current row.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&DbValue> {
        self.current_row().and_then(|row| row.get(column_name))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&DbValue> {
        self.current_row().and_then(|row| row.get_by_index(index))
    }

    /// Whether the current result has any rows at all.
    #[must_use]
    pub fn has_rows(&self) -> bool {
        self.current.as_ref().is_some_and(|t| !t.is_empty())
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.current.as_ref().map_or(0, |t| t.column_names().len())
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        match &self.current {
            Some(table) => table.column_names(),
            None => &[],
        }
    }

    /// Rows not yet read from the current result, followed by the remaining results.
    #[must_use]
    pub fn into_data_set(self) -> DataSet {
        let mut data = DataSet::new();
        if let Some(table) = self.current {
            let mut rest = DataTable::with_columns(table.name(), table.column_names().to_vec());
            for row in table.into_rows().into_iter().skip(self.cursor) {
                rest.add_row_values(row.into_values());
            }
            data.add_table(rest);
        }
        for table in self.pending {
            data.add_table(table);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_results() -> DataSet {
        let mut first = DataTable::with_columns("", vec!["n".into()]);
        first.add_row_values(vec![DbValue::Int(1)]);
        first.add_row_values(vec![DbValue::Int(2)]);
        let mut second = DataTable::with_columns("", vec!["label".into()]);
        second.add_row_values(vec![DbValue::from("x")]);

        let mut data = DataSet::new();
        data.add_table(first);
        data.add_table(second);
        data
    }

    #[test]
    fn walks_rows_then_results() {
        let mut reader = DataReader::new(two_results());
        assert!(reader.current_row().is_none());
        assert!(reader.read());
        assert_eq!(reader.get("n"), Some(&DbValue::Int(1)));
        assert!(reader.read());
        assert_eq!(reader.get_by_index(0), Some(&DbValue::Int(2)));
        assert!(!reader.read());
        assert!(reader.get("n").is_none());

        assert!(reader.next_result());
        assert_eq!(reader.column_names(), ["label"]);
        assert!(reader.read());
        assert_eq!(reader.get("label"), Some(&DbValue::from("x")));
        assert!(!reader.next_result());
        assert!(!reader.read());
    }

    #[test]
    fn empty_reader_reads_nothing() {
        let mut reader = DataReader::default();
        assert!(!reader.has_rows());
        assert_eq!(reader.field_count(), 0);
        assert!(!reader.read());
    }

    #[test]
    fn remaining_rows_convert_back() {
        let mut reader = DataReader::new(two_results());
        assert!(reader.read());
        let rest = reader.into_data_set();
        assert_eq!(rest.table(0).map(DataTable::len), Some(1));
        assert_eq!(rest.table(1).map(DataTable::name), Some("Table1"));
    }
}
