// SQL Server backend (tiberius)
//
// - config: options, builder and the connector
// - client: opening a raw tiberius client
// - params: declaring and binding named parameters
// - query: wrapping command text, collecting results and reading the status code
// - connection: the per-call connection and its transaction handling

pub mod client;
pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use client::{MssqlClient, create_mssql_client};
pub use config::{MssqlConnector, MssqlOptions, MssqlOptionsBuilder};
pub use connection::MssqlConnection;
