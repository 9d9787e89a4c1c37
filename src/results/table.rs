use std::sync::Arc;

use super::paging::Paging;
use super::row::{Columns, DataRow};
use crate::types::DbValue;

/// One result table: shared column metadata and its rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    name: String,
    columns: Arc<Columns>,
    rows: Vec<DataRow>,
}

impl DataTable {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_columns(name: impl Into<String>, column_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns: Arc::new(Columns::new(column_names)),
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn columns(&self) -> &Arc<Columns> {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    /// Append a row in column order.
    pub fn add_row_values(&mut self, values: Vec<DbValue>) {
        self.rows.push(DataRow::new(Arc::clone(&self.columns), values));
    }

    #[must_use]
    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<DataRow> {
        self.rows
    }

    /// The same table with only the rows inside `paging`.
    #[must_use]
    pub fn paged(mut self, paging: Paging) -> Self {
        self.rows = paging.apply(self.rows);
        self
    }

    /// Merge another table into this one and return how many rows were appended.
    ///
    /// Columns are matched by name. Columns this table lacks are added (existing rows
    /// get [`DbValue::Null`] there) and the incoming rows are appended in order.
    pub fn merge(&mut self, other: DataTable) -> usize {
        let mut missing: Vec<String> = Vec::new();
        for name in other.column_names() {
            if self.columns.position(name).is_none() && !missing.contains(name) {
                missing.push(name.clone());
            }
        }

        if !missing.is_empty() {
            let mut names = self.columns.names().to_vec();
            names.extend(missing);
            let columns = Arc::new(Columns::new(names));
            self.rows = std::mem::take(&mut self.rows)
                .into_iter()
                .map(|row| DataRow::new(Arc::clone(&columns), row.into_values()))
                .collect();
            self.columns = columns;
        }

        let mapping: Vec<Option<usize>> = other
            .column_names()
            .iter()
            .map(|name| self.columns.position(name))
            .collect();

        let appended = other.rows.len();
        self.rows.reserve(appended);
        for row in other.rows {
            let mut values = vec![DbValue::Null; self.columns.len()];
            for (value, target) in row.into_values().into_iter().zip(&mapping) {
                if let Some(idx) = target {
                    values[*idx] = value;
                }
            }
            self.rows.push(DataRow::new(Arc::clone(&self.columns), values));
        }
        appended
    }
}

/// Every result table produced by one command, in order.
///
/// Tables added without a name are called `Table`, `Table1`, `Table2`, ...
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    tables: Vec<DataTable>,
}

impl DataSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default name of the table at `index`.
    #[must_use]
    pub fn table_name(index: usize) -> String {
        if index == 0 {
            "Table".to_string()
        } else {
            format!("Table{index}")
        }
    }

    pub fn add_table(&mut self, mut table: DataTable) {
        if table.name().is_empty() {
            table.set_name(Self::table_name(self.tables.len()));
        }
        self.tables.push(table);
    }

    #[must_use]
    pub fn tables(&self) -> &[DataTable] {
        &self.tables
    }

    #[must_use]
    pub fn table(&self, index: usize) -> Option<&DataTable> {
        self.tables.get(index)
    }

    #[must_use]
    pub fn table_by_name(&self, name: &str) -> Option<&DataTable> {
        self.tables.iter().find(|t| t.name() == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    #[must_use]
    pub fn into_tables(self) -> Vec<DataTable> {
        self.tables
    }

    /// First table, or an empty one named `Table` when there is none.
    #[must_use]
    pub fn into_first_table(self) -> DataTable {
        self.tables
            .into_iter()
            .next()
            .unwrap_or_else(|| DataTable::new(Self::table_name(0)))
    }

    /// The same set with `paging` applied to its first table only.
    #[must_use]
    pub fn paged(mut self, paging: Paging) -> Self {
        if let Some(first) = self.tables.first_mut() {
            let table = std::mem::take(first);
            *first = table.paged(paging);
        }
        self
    }

    /// Merge tables by name, appending the ones this set does not have yet.
    /// Returns the number of rows appended.
    pub fn merge(&mut self, other: DataSet) -> usize {
        let mut appended = 0;
        for table in other.tables {
            match self.tables.iter_mut().find(|t| t.name() == table.name()) {
                Some(existing) => appended += existing.merge(table),
                None => {
                    appended += table.len();
                    self.add_table(table);
                }
            }
        }
        appended
    }
}

/// Caller-owned structure that query results can be loaded into.
pub trait FillTarget: Send {
    /// Merge `data` into `self`, with `paging` applied to the first result table.
    /// Returns the number of rows loaded.
    fn fill(&mut self, data: DataSet, paging: Paging) -> usize;
}

impl FillTarget for DataTable {
    fn fill(&mut self, data: DataSet, paging: Paging) -> usize {
        match data.into_tables().into_iter().next() {
            Some(first) => self.merge(first.paged(paging)),
            None => 0,
        }
    }
}

impl FillTarget for DataSet {
    fn fill(&mut self, data: DataSet, paging: Paging) -> usize {
        self.merge(data.paged(paging))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people(rows: &[(i64, &str)]) -> DataTable {
        let mut table = DataTable::with_columns("", vec!["id".into(), "name".into()]);
        for (id, name) in rows {
            table.add_row_values(vec![DbValue::Int(*id), DbValue::from(*name)]);
        }
        table
    }

    #[test]
    fn merge_adds_missing_columns_and_appends_rows() {
        let mut target = people(&[(1, "ann")]);
        let mut incoming = DataTable::with_columns("", vec!["email".into(), "id".into()]);
        incoming.add_row_values(vec![DbValue::from("b@x"), DbValue::Int(2)]);

        assert_eq!(target.merge(incoming), 1);
        assert_eq!(target.column_names(), ["id", "name", "email"]);
        assert_eq!(target.len(), 2);
        assert_eq!(target.rows()[0].get("email"), Some(&DbValue::Null));
        assert_eq!(target.rows()[1].get("id"), Some(&DbValue::Int(2)));
        assert_eq!(target.rows()[1].get("name"), Some(&DbValue::Null));
    }

    #[test]
    fn data_set_names_tables_in_order() {
        let mut set = DataSet::new();
        set.add_table(people(&[]));
        set.add_table(people(&[]));
        set.add_table(DataTable::new("custom"));

        let names: Vec<&str> = set.tables().iter().map(DataTable::name).collect();
        assert_eq!(names, vec!["Table", "Table1", "custom"]);
        assert!(set.table_by_name("Table1").is_some());
    }

    #[test]
    fn fill_pages_only_the_first_table() {
        let mut data = DataSet::new();
        data.add_table(people(&[(1, "a"), (2, "b"), (3, "c"), (4, "d")]));
        data.add_table(people(&[(5, "e"), (6, "f")]));

        let mut table = DataTable::new("Table");
        assert_eq!(table.fill(data.clone(), Paging::new(1, 2)), 2);
        let ids: Vec<&DbValue> = table.rows().iter().filter_map(|r| r.get("id")).collect();
        assert_eq!(ids, vec![&DbValue::Int(2), &DbValue::Int(3)]);

        let mut set = DataSet::new();
        assert_eq!(set.fill(data, Paging::new(3, 10)), 3);
        assert_eq!(set.table(0).map(DataTable::len), Some(1));
        assert_eq!(set.table(1).map(DataTable::len), Some(2));
    }
}
