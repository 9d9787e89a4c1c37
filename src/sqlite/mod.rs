// SQLite backend
//
// - config: options, builder and the connector
// - connection: the per-call connection and its transaction handling
// - params: binding parameters by name
// - query: running multi-statement text and collecting results

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::{SqliteConnector, SqliteOptions, SqliteOptionsBuilder};
pub use connection::SqliteConnection;
pub use query::RETURN_VALUE_FUNCTION;
