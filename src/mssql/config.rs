use async_trait::async_trait;
use tiberius::{AuthMethod, Config as TiberiusConfig};
use tracing::debug;

use crate::driver::Connector;
use crate::error::DriverError;

use super::client::create_mssql_client;
use super::connection::MssqlConnection;

/// Options for connecting to SQL Server.
#[derive(Debug, Clone)]
pub struct MssqlOptions {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: Option<u16>,
    pub instance_name: Option<String>,
    pub trust_cert: bool,
}

impl MssqlOptions {
    #[must_use]
    pub fn new(server: String, database: String, user: String, password: String) -> Self {
        Self {
            server,
            database,
            user,
            password,
            port: None,
            instance_name: None,
            trust_cert: true,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_instance_name(mut self, instance_name: Option<String>) -> Self {
        self.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn with_trust_cert(mut self, trust_cert: bool) -> Self {
        self.trust_cert = trust_cert;
        self
    }

    /// ADO.NET style description of these options, without the password.
    #[must_use]
    pub fn connection_string(&self) -> String {
        let mut server = self.server.clone();
        if let Some(instance) = &self.instance_name {
            server = format!("{server}\\{instance}");
        }
        if let Some(port) = self.port {
            server = format!("{server},{port}");
        }
        format!(
            "Server=tcp:{server};Database={};User Id={};TrustServerCertificate={}",
            self.database, self.user, self.trust_cert
        )
    }
}

/// Fluent builder for MSSQL options.
#[derive(Debug, Clone)]
pub struct MssqlOptionsBuilder {
    opts: MssqlOptions,
}

impl MssqlOptionsBuilder {
    #[must_use]
    pub fn new(server: String, database: String, user: String, password: String) -> Self {
        Self {
            opts: MssqlOptions::new(server, database, user, password),
        }
    }

    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.opts.port = port;
        self
    }

    #[must_use]
    pub fn instance_name(mut self, instance_name: Option<String>) -> Self {
        self.opts.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn trust_cert(mut self, trust_cert: bool) -> Self {
        self.opts.trust_cert = trust_cert;
        self
    }

    #[must_use]
    pub fn finish(self) -> MssqlOptions {
        self.opts
    }

    /// Build a connector for these options.
    #[must_use]
    pub fn build(self) -> MssqlConnector {
        MssqlConnector::new(self.finish())
    }
}

fn build_tiberius_config(opts: &MssqlOptions) -> TiberiusConfig {
    let mut config = TiberiusConfig::new();
    config.host(&opts.server);
    config.database(&opts.database);
    config.port(opts.port.unwrap_or(1433));
    config.authentication(AuthMethod::sql_server(&opts.user, &opts.password));
    if let Some(instance) = &opts.instance_name {
        config.instance_name(instance);
    }
    if opts.trust_cert {
        config.trust_cert();
    }
    config
}

/// Opens one tiberius client per call.
#[derive(Debug, Clone)]
pub struct MssqlConnector {
    config: TiberiusConfig,
    connection_string: String,
}

impl MssqlConnector {
    #[must_use]
    pub fn new(options: MssqlOptions) -> Self {
        Self {
            config: build_tiberius_config(&options),
            connection_string: options.connection_string(),
        }
    }

    /// Connector for an ADO.NET connection string.
    ///
    /// # Errors
    /// Returns `DriverError::ConfigError` if the string cannot be parsed.
    pub fn from_ado_string(connection_string: &str) -> Result<Self, DriverError> {
        let config = TiberiusConfig::from_ado_string(connection_string)
            .map_err(|e| DriverError::ConfigError(format!("invalid ADO.NET connection string: {e}")))?;
        Ok(Self {
            config,
            connection_string: connection_string.to_string(),
        })
    }

    #[must_use]
    pub fn builder(
        server: String,
        database: String,
        user: String,
        password: String,
    ) -> MssqlOptionsBuilder {
        MssqlOptionsBuilder::new(server, database, user, password)
    }
}

#[async_trait]
impl Connector for MssqlConnector {
    type Connection = MssqlConnection;

    async fn open(&self) -> Result<MssqlConnection, DriverError> {
        let client = create_mssql_client(self.config.clone()).await?;
        debug!(addr = %self.config.get_addr(), "sql server connection opened");
        Ok(MssqlConnection::new(client))
    }

    fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_string_omits_password() {
        let opts = MssqlOptions::new("db.local".into(), "sales".into(), "app".into(), "s3cret".into())
            .with_port(Some(1444))
            .with_instance_name(Some("SQLEXPRESS".into()));
        let described = opts.connection_string();
        assert!(described.starts_with("Server=tcp:db.local\\SQLEXPRESS,1444;"));
        assert!(!described.contains("s3cret"));
    }

    #[test]
    fn ado_strings_are_validated() {
        let connector = MssqlConnector::from_ado_string(
            "server=tcp:localhost,1433;database=master;user=sa;password=pw;TrustServerCertificate=true",
        )
        .expect("valid ADO.NET string");
        assert!(connector.connection_string().contains("database=master"));
    }
}
