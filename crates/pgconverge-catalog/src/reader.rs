//! Catalog reader
//!
//! Turns the raw `information_schema` rows returned by a [`CatalogAdapter`]
//! into typed descriptors. Normalization happens here so every adapter
//! surfaces the same user-facing values:
//!
//! - catalog-internal type names go through [`TYPE_ALIASES`] (`int4` becomes `int`)
//! - `is_nullable` is true only when it equals `yes`, ignoring case
//! - `max_length` and `default_expr` are kept only when the catalog value is non-null

use crate::adapter::{CatalogAdapter, CatalogError, ColumnRow};
use pgconverge_core::{ColumnDescriptor, TableDescriptor};

/// Catalog type names surfaced under a user-facing alias
pub const TYPE_ALIASES: &[(&str, &str)] = &[("int4", "int")];

/// Map a catalog type name to its user-facing alias
pub fn type_alias(udt_name: &str) -> &str {
    TYPE_ALIASES
        .iter()
        .find(|(internal, _)| *internal == udt_name)
        .map(|(_, alias)| *alias)
        .unwrap_or(udt_name)
}

/// Parse the catalog's `is_nullable` value
pub fn parse_is_nullable(value: &str) -> bool {
    value.eq_ignore_ascii_case("yes")
}

impl From<ColumnRow> for ColumnDescriptor {
    fn from(row: ColumnRow) -> Self {
        let nullable = parse_is_nullable(&row.is_nullable);
        Self {
            column_type: type_alias(&row.udt_name).to_string(),
            name: row.name,
            max_length: row.max_length.and_then(|len| u32::try_from(len).ok()),
            default_expr: row.default_expr,
            nullable,
        }
    }
}

/// Read-only view of the catalog
pub struct CatalogReader<'a> {
    adapter: &'a dyn CatalogAdapter,
}

impl<'a> CatalogReader<'a> {
    /// Create a reader over an adapter
    pub fn new(adapter: &'a dyn CatalogAdapter) -> Self {
        Self { adapter }
    }

    /// Check whether a table exists in the `public` schema
    pub async fn table_exists(&self, name: &str) -> Result<bool, CatalogError> {
        Ok(self.adapter.find_table(name).await?.is_some())
    }

    /// Describe a table, or `None` when it does not exist
    pub async fn describe_table(
        &self,
        name: &str,
    ) -> Result<Option<TableDescriptor>, CatalogError> {
        let found = self.adapter.find_table(name).await?;
        Ok(found.map(TableDescriptor::new))
    }

    /// Describe the columns of a table in ordinal order
    pub async fn describe_columns(
        &self,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, CatalogError> {
        let rows = self.adapter.column_rows(table).await?;
        tracing::debug!(table, columns = rows.len(), "describe columns");
        Ok(rows.into_iter().map(ColumnDescriptor::from).collect())
    }
}
