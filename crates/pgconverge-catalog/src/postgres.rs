//! PostgreSQL catalog adapter using information_schema
//!
//! Introspects tables through `information_schema.tables` and
//! `information_schema.columns` and executes DDL on the same connection.
//!
//! ## Usage
//!
//! ```rust,ignore
//! // Using direct credentials
//! let adapter = PostgresAdapter::connect(
//!     "localhost",
//!     5432,
//!     "mydb",
//!     "username",
//!     "password"
//! ).await?;
//!
//! // Using connection string with SSL
//! let adapter = PostgresAdapter::from_connection_string_with_tls(
//!     "host=localhost port=5432 dbname=mydb user=username password=password sslmode=require"
//! ).await?;
//! ```
//!
//! Reference: https://www.postgresql.org/docs/current/information-schema-columns.html

use crate::adapter::{CatalogAdapter, CatalogError, ColumnRow};
use pgconverge_core::{ConnectionConfig, SslMode};

use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, Config as PgConfig, NoTls};

/// Table registry lookup. The selected column is cast because
/// information_schema columns use domain types the driver cannot decode.
pub const TABLE_EXISTS_QUERY: &str =
    "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_name = $1";

/// Ordered column listing of a table
pub const COLUMNS_DESCRIBE_QUERY: &str = "\
    SELECT \
        column_name::text, \
        column_default::text, \
        is_nullable::text, \
        udt_name::text, \
        character_maximum_length::integer \
    FROM information_schema.columns \
    WHERE table_name = $1 \
    ORDER BY ordinal_position";

/// PostgreSQL catalog adapter
pub struct PostgresAdapter {
    client: Client,

    /// Connection host
    host: String,

    /// Connection port
    port: u16,

    /// Database name
    database: String,
}

impl PostgresAdapter {
    /// Connect with direct credentials over plain TCP
    pub async fn connect(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let connection = ConnectionConfig {
            host: Some(host.into()),
            port: Some(port),
            database: Some(database.into()),
            user: Some(user.into()),
            password: Some(password.into()),
            ..Default::default()
        };
        Self::from_connection_string(&connection.to_connection_string()).await
    }

    /// Connect with direct credentials over TLS
    pub async fn connect_with_tls(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let connection = ConnectionConfig {
            host: Some(host.into()),
            port: Some(port),
            database: Some(database.into()),
            user: Some(user.into()),
            password: Some(password.into()),
            ..Default::default()
        };
        Self::from_connection_string_with_tls(&connection.to_connection_string()).await
    }

    /// Connect using the `[connection]` section of the configuration
    pub async fn from_config(connection: &ConnectionConfig) -> Result<Self, CatalogError> {
        let conn_str = connection.to_connection_string();
        match connection.ssl_mode() {
            SslMode::Disable => Self::from_connection_string(&conn_str).await,
            SslMode::Require => Self::from_connection_string_with_tls(&conn_str).await,
        }
    }

    /// Create adapter from a PostgreSQL connection string
    ///
    /// Supports standard PostgreSQL connection string format:
    /// `host=localhost port=5432 dbname=mydb user=postgres password=secret`
    pub async fn from_connection_string(conn_str: &str) -> Result<Self, CatalogError> {
        let (host, port, database) = describe_target(conn_str)?;

        let (client, connection) = tokio_postgres::connect(conn_str, NoTls)
            .await
            .map_err(|e| CatalogError::Connection(format!(
                "Failed to connect to PostgreSQL at {}:{}: {}",
                host, port, e
            )))?;

        // Spawn connection handler in background
        let host_clone = host.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(host = %host_clone, port, "PostgreSQL connection error: {}", e);
            }
        });

        tracing::debug!(%host, port, %database, "connected to PostgreSQL");

        Ok(Self {
            client,
            host,
            port,
            database,
        })
    }

    /// Create adapter from a PostgreSQL connection string with TLS
    ///
    /// TLS is always used regardless of the `sslmode` in the string.
    pub async fn from_connection_string_with_tls(conn_str: &str) -> Result<Self, CatalogError> {
        let (host, port, database) = describe_target(conn_str)?;

        // Create TLS connector
        let connector = TlsConnector::builder()
            .build()
            .map_err(|e| CatalogError::Config(format!(
                "Failed to create TLS connector: {}", e
            )))?;

        let tls = MakeTlsConnector::new(connector);

        let (client, connection) = tokio_postgres::connect(conn_str, tls)
            .await
            .map_err(|e| CatalogError::Connection(format!(
                "Failed to connect to PostgreSQL at {}:{} with TLS: {}",
                host, port, e
            )))?;

        let host_clone = host.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(host = %host_clone, port, "PostgreSQL TLS connection error: {}", e);
            }
        });

        tracing::debug!(%host, port, %database, "connected to PostgreSQL with TLS");

        Ok(Self {
            client,
            host,
            port,
            database,
        })
    }

    /// Get the connection host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the connection port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the database name
    pub fn database(&self) -> &str {
        &self.database
    }
}

/// Extract host, port and database from a connection string for logging
fn describe_target(conn_str: &str) -> Result<(String, u16, String), CatalogError> {
    let config: PgConfig = conn_str.parse()
        .map_err(|e| CatalogError::Config(format!(
            "Invalid connection string: {}", e
        )))?;

    let host = config.get_hosts()
        .first()
        .map(|h| match h {
            tokio_postgres::config::Host::Tcp(name) => name.clone(),
            #[cfg(unix)]
            tokio_postgres::config::Host::Unix(path) => path.display().to_string(),
        })
        .unwrap_or_else(|| "localhost".to_string());
    let port = config.get_ports()
        .first()
        .copied()
        .unwrap_or(5432);
    let database = config.get_dbname()
        .unwrap_or("postgres")
        .to_string();

    Ok((host, port, database))
}

/// Classify a driver error
fn map_error(
    e: tokio_postgres::Error,
    context: impl FnOnce(String) -> CatalogError,
) -> CatalogError {
    let message = match e.as_db_error() {
        Some(db) => db.message().to_string(),
        None => e.to_string(),
    };

    if e.is_closed() {
        CatalogError::Connection(message)
    } else if message.contains("permission denied") {
        CatalogError::PermissionDenied(message)
    } else {
        context(message)
    }
}

#[async_trait::async_trait]
impl CatalogAdapter for PostgresAdapter {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    async fn find_table(&self, table: &str) -> Result<Option<String>, CatalogError> {
        let row = self.client
            .query_opt(TABLE_EXISTS_QUERY, &[&table])
            .await
            .map_err(|e| map_error(e, CatalogError::Query))?;

        Ok(row.map(|row| row.get(0)))
    }

    async fn column_rows(&self, table: &str) -> Result<Vec<ColumnRow>, CatalogError> {
        let rows = self.client
            .query(COLUMNS_DESCRIBE_QUERY, &[&table])
            .await
            .map_err(|e| map_error(e, CatalogError::Query))?;

        rows.iter()
            .map(|row| {
                Ok(ColumnRow {
                    name: row.try_get(0).map_err(|e| CatalogError::Query(e.to_string()))?,
                    default_expr: row.try_get(1).map_err(|e| CatalogError::Query(e.to_string()))?,
                    is_nullable: row.try_get(2).map_err(|e| CatalogError::Query(e.to_string()))?,
                    udt_name: row.try_get(3).map_err(|e| CatalogError::Query(e.to_string()))?,
                    max_length: row.try_get(4).map_err(|e| CatalogError::Query(e.to_string()))?,
                })
            })
            .collect()
    }

    async fn execute(&self, statement: &str) -> Result<u64, CatalogError> {
        self.client
            .execute(statement, &[])
            .await
            .map_err(|e| {
                map_error(e, |message| CatalogError::Execution {
                    statement: statement.to_string(),
                    message,
                })
            })
    }

    async fn test_connection(&self) -> Result<(), CatalogError> {
        self.client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| CatalogError::Query(format!("Connection test failed: {}", e)))?;
        Ok(())
    }
}
