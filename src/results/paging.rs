/// Row window applied when loading a table.
///
/// `max_records == 0` loads every row and ignores `start_record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Paging {
    pub start_record: usize,
    pub max_records: usize,
}

impl Paging {
    /// Load every row.
    pub const ALL: Paging = Paging {
        start_record: 0,
        max_records: 0,
    };

    #[must_use]
    pub fn new(start_record: usize, max_records: usize) -> Self {
        Self {
            start_record,
            max_records,
        }
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        self.max_records == 0
    }

    /// Keep only the rows inside the window.
    #[must_use]
    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T> {
        if self.is_all() {
            return rows;
        }
        rows.into_iter()
            .skip(self.start_record)
            .take(self.max_records)
            .collect()
    }
}
