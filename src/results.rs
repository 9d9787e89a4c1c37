//! Shaped results: rows, tables, data sets and the buffered forward-only reader.

mod paging;
mod reader;
mod row;
mod table;

pub use paging::Paging;
pub use reader::DataReader;
pub use row::{Columns, DataRow};
pub use table::{DataSet, DataTable, FillTarget};
