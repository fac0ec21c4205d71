//! In-memory catalog for testing
//!
//! Holds tables in memory and applies the DDL the reconciler emits, so the
//! whole create / rename / add-column / read-back loop can run without a
//! database. Statements are parsed with `sqlparser` using the PostgreSQL
//! dialect and applied with Postgres-like rules:
//!
//! - unquoted identifiers fold to lower case, quoted ones are kept verbatim
//! - type names are stored under their catalog name (`int` is stored as `int4`)
//! - `varchar(n)` / `char(n)` record `n` as the character length
//! - columns are nullable unless declared `NOT NULL`
//! - duplicate tables or columns and unknown relations are rejected
//!
//! Every statement handed to [`CatalogAdapter::execute`] is recorded, including
//! the ones that fail.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let catalog = MockCatalog::new();
//! catalog.execute(r#"CREATE TABLE "users" ()"#).await?;
//! catalog.execute(r#"ALTER TABLE "users" ADD COLUMN "id" int NOT NULL"#).await?;
//! assert_eq!(catalog.statements().await.len(), 2);
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! // Fail any statement mentioning "email"
//! catalog.add_failure("\"email\"", CatalogError::PermissionDenied("nope".into())).await;
//!
//! // Slow every call down by 20ms
//! let catalog = MockCatalog::new().with_latency(20);
//! ```

use crate::adapter::{CatalogAdapter, CatalogError, ColumnRow};
use sqlparser::ast::{AlterTableOperation, ColumnDef, ColumnOption, Ident, ObjectName, Statement};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Tables = HashMap<String, Vec<ColumnRow>>;

/// In-memory catalog adapter
pub struct MockCatalog {
    /// Tables by name, columns in ordinal order
    tables: Arc<RwLock<Tables>>,

    /// Every statement passed to `execute`, in arrival order
    statements: Arc<RwLock<Vec<String>>>,

    /// Statements containing the pattern fail with the paired error
    failures: Arc<RwLock<Vec<(String, CatalogError)>>>,

    /// Simulate an unreachable catalog
    fail_connection: bool,

    /// Simulated latency per call (milliseconds)
    latency_ms: u64,
}

impl MockCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            statements: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(Vec::new())),
            fail_connection: false,
            latency_ms: 0,
        }
    }

    /// Seed a table with raw column rows
    pub async fn add_table(&self, name: impl Into<String>, columns: Vec<ColumnRow>) {
        self.tables.write().await.insert(name.into(), columns);
    }

    /// Make every statement containing `pattern` fail with `error`
    pub async fn add_failure(&self, pattern: impl Into<String>, error: CatalogError) {
        self.failures.write().await.push((pattern.into(), error));
    }

    /// Configure every call to fail with a connection error
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure simulated latency for all operations
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Statements executed so far
    pub async fn statements(&self) -> Vec<String> {
        self.statements.read().await.clone()
    }

    /// Forget recorded statements
    pub async fn clear_statements(&self) {
        self.statements.write().await.clear();
    }

    /// Check if a table exists
    pub async fn has_table(&self, name: &str) -> bool {
        self.tables.read().await.contains_key(name)
    }

    /// Raw column rows of a table
    pub async fn columns(&self, name: &str) -> Option<Vec<ColumnRow>> {
        self.tables.read().await.get(name).cloned()
    }

    /// Names of all tables, sorted
    pub async fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }

    fn check_connection(&self) -> Result<(), CatalogError> {
        if self.fail_connection {
            Err(CatalogError::Connection("Simulated connection failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockCatalog {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            statements: Arc::clone(&self.statements),
            failures: Arc::clone(&self.failures),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
        }
    }
}

#[async_trait::async_trait]
impl CatalogAdapter for MockCatalog {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn find_table(&self, table: &str) -> Result<Option<String>, CatalogError> {
        self.simulate_latency().await;
        self.check_connection()?;

        let tables = self.tables.read().await;
        Ok(tables.get_key_value(table).map(|(name, _)| name.clone()))
    }

    async fn column_rows(&self, table: &str) -> Result<Vec<ColumnRow>, CatalogError> {
        self.simulate_latency().await;
        self.check_connection()?;

        Ok(self.tables.read().await.get(table).cloned().unwrap_or_default())
    }

    async fn execute(&self, statement: &str) -> Result<u64, CatalogError> {
        self.simulate_latency().await;
        self.check_connection()?;

        self.statements.write().await.push(statement.to_string());

        if let Some((_, error)) = self
            .failures
            .read()
            .await
            .iter()
            .find(|(pattern, _)| statement.contains(pattern.as_str()))
        {
            return Err(error.clone());
        }

        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();
        apply_statement(&mut staged, statement).map_err(|message| CatalogError::Execution {
            statement: statement.to_string(),
            message,
        })?;
        *tables = staged;
        Ok(0)
    }

    async fn test_connection(&self) -> Result<(), CatalogError> {
        self.simulate_latency().await;
        self.check_connection()
    }
}

/// Parse and apply one DDL statement
fn apply_statement(tables: &mut Tables, sql: &str) -> Result<(), String> {
    let statements = Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .map_err(|e| format!("syntax error: {}", e))?;

    for statement in statements {
        match statement {
            Statement::CreateTable(create) => {
                let table = object_name(&create.name)?;
                if tables.contains_key(&table) {
                    return Err(format!("relation \"{}\" already exists", table));
                }
                let mut columns: Vec<ColumnRow> = Vec::new();
                for def in &create.columns {
                    add_column(&table, &mut columns, def)?;
                }
                tables.insert(table, columns);
            }
            Statement::AlterTable { name, operations, .. } => {
                let mut table = object_name(&name)?;
                for operation in operations {
                    match operation {
                        AlterTableOperation::RenameTable { table_name } => {
                            let target = object_name(&table_name)?;
                            if tables.contains_key(&target) {
                                return Err(format!("relation \"{}\" already exists", target));
                            }
                            let columns = tables
                                .remove(&table)
                                .ok_or_else(|| missing_relation(&table))?;
                            tables.insert(target.clone(), columns);
                            table = target;
                        }
                        AlterTableOperation::AddColumn { column_def, .. } => {
                            let columns = tables
                                .get_mut(&table)
                                .ok_or_else(|| missing_relation(&table))?;
                            add_column(&table, columns, &column_def)?;
                        }
                        other => {
                            return Err(format!("unsupported ALTER TABLE operation: {}", other));
                        }
                    }
                }
            }
            other => return Err(format!("unsupported statement: {}", other)),
        }
    }

    Ok(())
}

fn missing_relation(table: &str) -> String {
    format!("relation \"{}\" does not exist", table)
}

fn add_column(table: &str, columns: &mut Vec<ColumnRow>, def: &ColumnDef) -> Result<(), String> {
    let row = column_row(table, def);
    if columns.iter().any(|c| c.name == row.name) {
        return Err(format!(
            "column \"{}\" of relation \"{}\" already exists",
            row.name, table
        ));
    }
    columns.push(row);
    Ok(())
}

/// Build the catalog row Postgres would report for a column definition
fn column_row(table: &str, def: &ColumnDef) -> ColumnRow {
    let name = fold_ident(&def.name);
    let (udt_name, max_length, serial) = catalog_type(&def.data_type.to_string());

    let mut nullable = !serial;
    let mut default_expr = serial.then(|| format!("nextval('{}_{}_seq'::regclass)", table, name));

    for option in &def.options {
        match &option.option {
            ColumnOption::NotNull => nullable = false,
            ColumnOption::Null => nullable = true,
            ColumnOption::Default(expr) => default_expr = Some(expr.to_string()),
            _ => {}
        }
    }

    ColumnRow {
        name,
        default_expr,
        is_nullable: if nullable { "YES" } else { "NO" }.to_string(),
        udt_name,
        max_length,
    }
}

/// Map a rendered SQL type to `(udt_name, character length, is serial)`
fn catalog_type(rendered: &str) -> (String, Option<i32>, bool) {
    let rendered = rendered.trim().to_lowercase();
    let (base, args) = match rendered.split_once('(') {
        Some((base, rest)) => (base.trim(), rest.trim_end_matches(')').trim()),
        None => (rendered.as_str(), ""),
    };

    let udt = match base {
        "int" | "integer" | "int4" => "int4",
        "smallint" | "int2" => "int2",
        "bigint" | "int8" => "int8",
        "serial" | "serial4" => return ("int4".to_string(), None, true),
        "bigserial" | "serial8" => return ("int8".to_string(), None, true),
        "boolean" | "bool" => "bool",
        "character varying" | "varchar" => "varchar",
        "character" | "char" | "bpchar" => "bpchar",
        "real" | "float4" => "float4",
        "double precision" | "float8" => "float8",
        "decimal" | "numeric" => "numeric",
        "timestamp" | "timestamp without time zone" => "timestamp",
        "timestamptz" | "timestamp with time zone" => "timestamptz",
        other => other,
    };

    let max_length = match udt {
        "varchar" | "bpchar" => args.parse().ok(),
        _ => None,
    };

    (udt.to_string(), max_length, false)
}

fn fold_ident(ident: &Ident) -> String {
    if ident.quote_style.is_some() {
        ident.value.clone()
    } else {
        ident.value.to_lowercase()
    }
}

fn object_name(name: &ObjectName) -> Result<String, String> {
    name.0
        .last()
        .map(fold_ident)
        .ok_or_else(|| "empty object name".to_string())
}

/// Builder for creating a MockCatalog with predefined tables
///
/// ```rust,ignore
/// let catalog = MockCatalogBuilder::new()
///     .with_table("users", vec![id_row])
///     .with_latency(10)
///     .build();
/// ```
pub struct MockCatalogBuilder {
    tables: Tables,
    failures: Vec<(String, CatalogError)>,
    fail_connection: bool,
    latency_ms: u64,
}

impl MockCatalogBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            failures: Vec::new(),
            fail_connection: false,
            latency_ms: 0,
        }
    }

    /// Add a table with raw column rows
    pub fn with_table(mut self, name: impl Into<String>, columns: Vec<ColumnRow>) -> Self {
        self.tables.insert(name.into(), columns);
        self
    }

    /// Fail statements containing `pattern`
    pub fn with_failure(mut self, pattern: impl Into<String>, error: CatalogError) -> Self {
        self.failures.push((pattern.into(), error));
        self
    }

    /// Configure connection failure
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure latency
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Build the MockCatalog
    pub fn build(self) -> MockCatalog {
        MockCatalog {
            tables: Arc::new(RwLock::new(self.tables)),
            statements: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(self.failures)),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
        }
    }
}

impl Default for MockCatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}
