//! Catalog adapter trait for introspection and DDL execution

/// One row of the column listing, exactly as the catalog reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    /// `column_name`
    pub name: String,

    /// `column_default`, NULL when the column has no default
    pub default_expr: Option<String>,

    /// `is_nullable` (`YES` / `NO`)
    pub is_nullable: String,

    /// `udt_name`, the catalog-internal type name (e.g. `int4`)
    pub udt_name: String,

    /// `character_maximum_length`, NULL for types without a length
    pub max_length: Option<i32>,
}

/// Errors raised by catalog access
///
/// A missing table is not an error; lookups return `None` instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Statement `{statement}` failed: {message}")]
    Execution { statement: String, message: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Trait for catalogs the reconciler can introspect and alter
#[async_trait::async_trait]
pub trait CatalogAdapter: Send + Sync {
    /// Get the adapter name (e.g., "PostgreSQL")
    fn name(&self) -> &'static str;

    /// Look a table up in the `public` schema's table registry
    ///
    /// Returns the canonical table name, or `None` when no row matches.
    async fn find_table(&self, table: &str) -> Result<Option<String>, CatalogError>;

    /// List the raw column rows of a table ordered by ordinal position
    async fn column_rows(&self, table: &str) -> Result<Vec<ColumnRow>, CatalogError>;

    /// Execute a single DDL statement, returning the affected row count
    async fn execute(&self, statement: &str) -> Result<u64, CatalogError>;

    /// Test the connection to the catalog
    async fn test_connection(&self) -> Result<(), CatalogError>;
}
