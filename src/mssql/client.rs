use tiberius::{Client, Config, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::error::DriverError;

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

/// Open a new SQL Server connection.
///
/// The port is resolved through SQL Browser when the config names an instance.
///
/// # Errors
/// Returns `DriverError::ConnectionError` if the TCP or TDS connection fails.
pub async fn create_mssql_client(config: Config) -> Result<MssqlClient, DriverError> {
    let tcp = TcpStream::connect_named(&config)
        .await
        .map_err(|e| DriverError::ConnectionError(format!("TCP connection error: {e}")))?;
    tcp.set_nodelay(true)
        .map_err(|e| DriverError::ConnectionError(format!("TCP configuration error: {e}")))?;

    Client::connect(config, tcp.compat_write())
        .await
        .map_err(|e| DriverError::ConnectionError(format!("SQL Server connection error: {e}")))
}
