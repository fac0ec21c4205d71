//! Catalog access for schema reconciliation
//!
//! This crate reads table and column metadata from a PostgreSQL catalog
//! through its `information_schema` views and executes DDL against it.
//!
//! ## Features
//!
//! - `postgres` (default) - live PostgreSQL adapter built on tokio-postgres
//!
//! ## Example
//!
//! ```rust,ignore
//! use pgconverge_catalog::{CatalogReader, PostgresAdapter};
//!
//! let adapter = PostgresAdapter::from_connection_string("host=localhost user=postgres").await?;
//! let reader = CatalogReader::new(&adapter);
//! if let Some(table) = reader.describe_table("users").await? {
//!     let columns = reader.describe_columns(&table.name).await?;
//! }
//! ```

pub mod adapter;
pub mod mock;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod reader;

pub use adapter::{CatalogAdapter, CatalogError, ColumnRow};
pub use mock::{MockCatalog, MockCatalogBuilder};
#[cfg(feature = "postgres")]
pub use postgres::PostgresAdapter;
pub use reader::CatalogReader;
