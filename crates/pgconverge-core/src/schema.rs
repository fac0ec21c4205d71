//! Table and column descriptors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::config::ConfigError;

/// A table as seen by the reconciler
///
/// The catalog exposes no separate table id, so the name is the identity.
/// Renaming a table changes its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name (unqualified, schema `public`)
    pub name: String,
}

impl TableDescriptor {
    /// Create a new table descriptor
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for TableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A column of a table, declared or observed
///
/// Serialized with the attribute names exposed to declarations:
/// `name`, `type`, `max_length`, `default`, `is_null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,

    /// User-facing type name (catalog names are normalized on read)
    #[serde(rename = "type")]
    pub column_type: String,

    /// Character length, only for types that carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    /// Opaque SQL default expression
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_expr: Option<String>,

    /// Whether NULL is allowed. Columns are NOT NULL unless declared otherwise.
    #[serde(default, rename = "is_null")]
    pub nullable: bool,
}

impl ColumnDescriptor {
    /// Create a NOT NULL column without length or default
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            max_length: None,
            default_expr: None,
            nullable: false,
        }
    }

    /// Set the character length
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set the default expression
    pub fn with_default(mut self, default_expr: impl Into<String>) -> Self {
        self.default_expr = Some(default_expr.into());
        self
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// Attribute set of a table resource: the name plus the ordered column list
///
/// Used for both the declared state and the observed state read back from
/// the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name
    pub name: String,

    /// Ordered column list
    #[serde(default, rename = "column")]
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSpec {
    /// Create a table spec with no columns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Create a table spec from columns
    pub fn with_columns(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column names in declared order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Load a table declaration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Load a table declaration from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn column_defaults_to_not_null() {
        let column = ColumnDescriptor::new("id", "int");
        assert!(!column.nullable);
        assert_eq!(column.max_length, None);
        assert_eq!(column.default_expr, None);
    }

    #[test]
    fn declaration_uses_exposed_attribute_names() {
        let spec = TableSpec::from_toml(
            r#"
            name = "users"

            [[column]]
            name = "id"
            type = "int"

            [[column]]
            name = "email"
            type = "varchar"
            max_length = 255
            default = "''"
            is_null = true
            "#,
        )
        .unwrap();

        assert_eq!(
            spec,
            TableSpec::with_columns(
                "users",
                vec![
                    ColumnDescriptor::new("id", "int"),
                    ColumnDescriptor::new("email", "varchar")
                        .with_max_length(255)
                        .with_default("''")
                        .with_nullable(true),
                ],
            )
        );
    }

    #[test]
    fn declaration_without_columns() {
        let spec = TableSpec::from_toml(r#"name = "empty""#).unwrap();
        assert_eq!(spec.name, "empty");
        assert!(spec.columns.is_empty());
    }

    #[test]
    fn declaration_missing_type_is_rejected() {
        let result = TableSpec::from_toml(
            r#"
            name = "users"
            [[column]]
            name = "id"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn absent_optionals_are_not_serialized() {
        let json = serde_json::to_value(ColumnDescriptor::new("id", "int")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "name": "id", "type": "int", "is_null": false })
        );
    }

    #[test]
    fn spec_lookup() {
        let spec = TableSpec::with_columns(
            "t",
            vec![ColumnDescriptor::new("a", "int"), ColumnDescriptor::new("b", "text")],
        );
        assert_eq!(spec.column_names(), vec!["a", "b"]);
        assert!(spec.find_column("b").is_some());
        assert!(spec.find_column("c").is_none());
    }
}
