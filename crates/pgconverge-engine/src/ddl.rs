//! DDL synthesis
//!
//! Renders the three statements the reconciler issues. Every identifier goes
//! through [`quote_identifier`]; type names and default expressions are
//! emitted verbatim.
//!
//! ```sql
//! CREATE TABLE "users" ()
//! ALTER TABLE "users" RENAME TO "accounts"
//! ALTER TABLE "accounts" ADD COLUMN "email" varchar(255) DEFAULT '' NOT NULL
//! ```

use pgconverge_core::ColumnDescriptor;
use std::fmt;

/// Quote a PostgreSQL identifier
///
/// Wraps the name in double quotes and doubles embedded quotes. Anything from
/// the first NUL byte on is dropped, since Postgres identifiers cannot hold it.
pub fn quote_identifier(name: &str) -> String {
    let name = match name.find('\0') {
        Some(end) => &name[..end],
        None => name,
    };
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A single DDL statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlStatement {
    /// Create an empty table
    CreateTable { table: String },

    /// Rename a table
    RenameTable { from: String, to: String },

    /// Append a column to a table
    AddColumn { table: String, column: ColumnDescriptor },
}

impl DdlStatement {
    /// Render the statement as SQL
    pub fn to_sql(&self) -> String {
        match self {
            DdlStatement::CreateTable { table } => {
                format!("CREATE TABLE {} ()", quote_identifier(table))
            }
            DdlStatement::RenameTable { from, to } => format!(
                "ALTER TABLE {} RENAME TO {}",
                quote_identifier(from),
                quote_identifier(to)
            ),
            DdlStatement::AddColumn { table, column } => format!(
                "ALTER TABLE {} ADD COLUMN {} {}{}{}{}",
                quote_identifier(table),
                quote_identifier(&column.name),
                column.column_type,
                max_length_clause(column),
                default_clause(column),
                not_null_clause(column)
            ),
        }
    }

    /// Short label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            DdlStatement::CreateTable { .. } => "table create",
            DdlStatement::RenameTable { .. } => "table rename",
            DdlStatement::AddColumn { .. } => "create column",
        }
    }

    /// Human-readable description of what the statement does
    pub fn describe(&self) -> String {
        match self {
            DdlStatement::CreateTable { table } => format!("creating table \"{}\"", table),
            DdlStatement::RenameTable { from, to } => {
                format!("renaming table \"{}\" to \"{}\"", from, to)
            }
            DdlStatement::AddColumn { table, column } => {
                format!("adding column \"{}\" to table \"{}\"", column.name, table)
            }
        }
    }
}

impl fmt::Display for DdlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn max_length_clause(column: &ColumnDescriptor) -> String {
    match column.max_length {
        Some(len) if len != 0 => format!("({})", len),
        _ => String::new(),
    }
}

fn default_clause(column: &ColumnDescriptor) -> String {
    match column.default_expr.as_deref() {
        Some(expr) if !expr.is_empty() => format!(" DEFAULT {}", expr),
        _ => String::new(),
    }
}

fn not_null_clause(column: &ColumnDescriptor) -> &'static str {
    if column.nullable {
        ""
    } else {
        " NOT NULL"
    }
}
