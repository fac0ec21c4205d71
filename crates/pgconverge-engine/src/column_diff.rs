//! Column list diff
//!
//! Compares the old and new column lists of a table by position. Columns
//! past the end of the old list are appended; nothing else is reconciled.
//! Removed, reordered or changed columns produce no operations.

use crate::ddl::DdlStatement;
use pgconverge_core::ColumnDescriptor;

/// A change to apply to a table's columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOperation {
    /// Append a column
    Add(ColumnDescriptor),
}

impl ColumnOperation {
    /// The column this operation touches
    pub fn column(&self) -> &ColumnDescriptor {
        match self {
            ColumnOperation::Add(column) => column,
        }
    }

    /// Convert into the statement applying it to `table`
    pub fn to_statement(&self, table: &str) -> DdlStatement {
        match self {
            ColumnOperation::Add(column) => DdlStatement::AddColumn {
                table: table.to_string(),
                column: column.clone(),
            },
        }
    }
}

/// Result of diffing two column lists of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDiff {
    /// Table the operations address
    pub table: String,

    /// Operations in application order
    pub operations: Vec<ColumnOperation>,
}

impl ColumnDiff {
    /// Diff `old` against `new`
    pub fn compute(
        table: impl Into<String>,
        old: &[ColumnDescriptor],
        new: &[ColumnDescriptor],
    ) -> Self {
        let operations = new
            .iter()
            .enumerate()
            .filter(|(index, _)| *index >= old.len())
            .map(|(_, column)| ColumnOperation::Add(column.clone()))
            .collect();

        Self {
            table: table.into(),
            operations,
        }
    }

    /// Check if there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Statements applying the operations, in order
    pub fn statements(&self) -> Vec<DdlStatement> {
        self.operations
            .iter()
            .map(|op| op.to_statement(&self.table))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn col(name: &str) -> ColumnDescriptor {
        ColumnDescriptor::new(name, "text")
    }

    #[test]
    fn test_append_emits_add() {
        let diff = ColumnDiff::compute("t", &[col("a")], &[col("a"), col("b")]);

        assert_eq!(diff.operations, vec![ColumnOperation::Add(col("b"))]);
        assert_eq!(diff.operations[0].column().name, "b");
    }

    #[test]
    fn test_from_empty_adds_everything_in_order() {
        let diff = ColumnDiff::compute("t", &[], &[col("a"), col("b"), col("c")]);

        let names: Vec<&str> = diff
            .operations
            .iter()
            .map(|op| op.column().name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(diff.len(), 3);
    }

    #[test]
    fn test_equal_lists_are_empty() {
        let columns = vec![col("a"), col("b")];
        assert!(ColumnDiff::compute("t", &columns, &columns).is_empty());
    }

    #[test]
    fn test_removal_is_not_reconciled() {
        let diff = ColumnDiff::compute("t", &[col("a"), col("b")], &[col("a")]);
        assert!(diff.is_empty());

        let diff = ColumnDiff::compute("t", &[col("a")], &[]);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_reorder_is_not_reconciled() {
        let diff = ColumnDiff::compute("t", &[col("a"), col("b")], &[col("b"), col("a")]);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_changed_column_in_place_is_not_reconciled() {
        let old = vec![ColumnDescriptor::new("a", "int")];
        let new = vec![ColumnDescriptor::new("a", "bigint").with_nullable(true)];
        assert!(ColumnDiff::compute("t", &old, &new).is_empty());
    }

    #[test]
    fn test_mid_list_insert_is_positional() {
        // Only the tail past the old length is appended, whatever its name
        let old = vec![col("a"), col("c")];
        let new = vec![col("a"), col("b"), col("c")];
        let diff = ColumnDiff::compute("t", &old, &new);
        assert_eq!(diff.operations, vec![ColumnOperation::Add(col("c"))]);
    }

    #[test]
    fn test_statements_address_table() {
        let diff = ColumnDiff::compute("users", &[], &[col("email")]);
        assert_eq!(
            diff.statements(),
            vec![DdlStatement::AddColumn {
                table: "users".to_string(),
                column: col("email"),
            }]
        );
    }
}
