//! Reconciler for table resources
//!
//! Implements the lifecycle verbs over a [`CatalogAdapter`]:
//!
//! - **create**: `CREATE TABLE` (empty), adopt the name as identifier, then update
//! - **update**: rename if the name changed, append new columns, read back
//! - **read**: refresh from the catalog; a missing table clears the identifier
//! - **exists**: existence probe
//! - **delete**: forget the identifier, the table itself is left in place
//! - **import**: read under a caller-supplied identifier
//!
//! Create, update and delete hold the [`CatalogLock`] exclusively for the whole
//! verb; read, exists and import hold it shared. A failing statement aborts the
//! verb and nothing already applied is rolled back.

use crate::column_diff::ColumnDiff;
use crate::ddl::DdlStatement;
use crate::error::ReconcileError;
use crate::lock::CatalogLock;
use crate::resource::ResourceData;
use pgconverge_catalog::{CatalogAdapter, CatalogReader};
use pgconverge_core::{TableSpec, TableDescriptor};
use std::sync::Arc;

/// Statements a create of `desired` issues, in order
pub fn plan_create(desired: &TableSpec) -> Result<Vec<DdlStatement>, ReconcileError> {
    validate_name(&desired.name)?;

    let mut plan = vec![DdlStatement::CreateTable {
        table: desired.name.clone(),
    }];
    plan.extend(ColumnDiff::compute(&desired.name, &[], &desired.columns).statements());
    Ok(plan)
}

/// Statements an update of `data` issues, in order
///
/// A rename comes first; column statements address the table's name after it.
pub fn plan_update(data: &ResourceData) -> Result<Vec<DdlStatement>, ReconcileError> {
    let mut plan = Vec::new();
    let mut table = data.id().unwrap_or(data.get().name.as_str()).to_string();

    if !data.is_new_resource() {
        if let Some((from, to)) = data.name_change() {
            validate_name(to)?;
            plan.push(DdlStatement::RenameTable {
                from: from.to_string(),
                to: to.to_string(),
            });
            table = to.to_string();
        }
    }

    let (old, new) = data.column_change();
    plan.extend(ColumnDiff::compute(table, old, new).statements());
    Ok(plan)
}

fn validate_name(name: &str) -> Result<(), ReconcileError> {
    if name.is_empty() {
        return Err(ReconcileError::Validation(
            "table name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Drives table resources toward their declared state
#[derive(Clone)]
pub struct Reconciler {
    catalog: Arc<dyn CatalogAdapter>,
    lock: CatalogLock,
}

impl Reconciler {
    pub fn new(catalog: Arc<dyn CatalogAdapter>, lock: CatalogLock) -> Self {
        Self { catalog, lock }
    }

    pub fn catalog(&self) -> &dyn CatalogAdapter {
        self.catalog.as_ref()
    }

    pub fn lock(&self) -> &CatalogLock {
        &self.lock
    }

    /// Create the table, then converge its columns
    pub async fn create(&self, data: &mut ResourceData) -> Result<(), ReconcileError> {
        let name = data.get().name.clone();
        validate_name(&name)?;

        let _guard = self.lock.write().await;
        data.clear_applied();

        self.apply(data, &DdlStatement::CreateTable { table: name.clone() })
            .await?;
        data.set_id(name);
        data.mark_created();

        self.update_locked(data).await
    }

    /// Converge an existing table toward the desired state
    pub async fn update(&self, data: &mut ResourceData) -> Result<(), ReconcileError> {
        let _guard = self.lock.write().await;
        data.clear_applied();
        self.update_locked(data).await
    }

    /// Refresh the resource from the catalog
    pub async fn read(&self, data: &mut ResourceData) -> Result<(), ReconcileError> {
        let _guard = self.lock.read().await;
        self.read_locked(data).await
    }

    /// Check whether the resource's table exists
    pub async fn exists(&self, data: &ResourceData) -> Result<bool, ReconcileError> {
        let Some(id) = data.id() else {
            return Ok(false);
        };

        let _guard = self.lock.read().await;
        CatalogReader::new(self.catalog())
            .table_exists(id)
            .await
            .map_err(ReconcileError::catalog(format!("checking table \"{}\"", id)))
    }

    /// Forget the resource; the catalog table is not dropped
    pub async fn delete(&self, data: &mut ResourceData) -> Result<(), ReconcileError> {
        let _guard = self.lock.write().await;
        data.clear_applied();

        if let Some(id) = data.id() {
            tracing::warn!(table = %id, "logical delete: table is kept in the catalog");
        }
        data.clear_id();
        Ok(())
    }

    /// Read a table into a new resource keyed by `id`
    pub async fn import(&self, id: &str) -> Result<ResourceData, ReconcileError> {
        let mut data = ResourceData::from_id(id);
        self.read(&mut data).await?;
        Ok(data)
    }

    async fn update_locked(&self, data: &mut ResourceData) -> Result<(), ReconcileError> {
        for statement in plan_update(data)? {
            self.apply(data, &statement).await?;
            if let DdlStatement::RenameTable { to, .. } = statement {
                data.set_id(to);
            }
        }

        self.read_locked(data).await
    }

    async fn read_locked(&self, data: &mut ResourceData) -> Result<(), ReconcileError> {
        let Some(id) = data.id().map(str::to_string) else {
            data.clear_id();
            return Ok(());
        };

        let reader = CatalogReader::new(self.catalog());
        let table = reader
            .describe_table(&id)
            .await
            .map_err(ReconcileError::catalog(format!("reading table \"{}\"", id)))?;

        let Some(TableDescriptor { name }) = table else {
            tracing::warn!(table = %id, "table not found, removing from state");
            data.clear_id();
            return Ok(());
        };

        let columns = reader
            .describe_columns(&name)
            .await
            .map_err(ReconcileError::catalog(format!("reading columns of \"{}\"", name)))?;

        tracing::debug!(table = %name, columns = columns.len(), "table read");
        data.set_id(name.clone());
        data.set(TableSpec::with_columns(name, columns));
        Ok(())
    }

    async fn apply(
        &self,
        data: &mut ResourceData,
        statement: &DdlStatement,
    ) -> Result<(), ReconcileError> {
        let sql = statement.to_sql();
        tracing::debug!(statement = %sql, "{}", statement.kind());

        self.catalog
            .execute(&sql)
            .await
            .map_err(ReconcileError::catalog(statement.describe()))?;

        data.record_statement(sql);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgconverge_core::ColumnDescriptor;
    use pretty_assertions::assert_eq;

    fn spec(name: &str, columns: Vec<ColumnDescriptor>) -> TableSpec {
        TableSpec::with_columns(name, columns)
    }

    #[test]
    fn test_plan_create() {
        let desired = spec("users", vec![ColumnDescriptor::new("id", "int")]);
        let plan = plan_create(&desired).unwrap();
        let sql: Vec<String> = plan.iter().map(DdlStatement::to_sql).collect();

        assert_eq!(
            sql,
            vec![
                "CREATE TABLE \"users\" ()".to_string(),
                "ALTER TABLE \"users\" ADD COLUMN \"id\" int NOT NULL".to_string(),
            ]
        );
    }

    #[test]
    fn test_plan_create_rejects_empty_name() {
        assert!(matches!(
            plan_create(&TableSpec::new("")),
            Err(ReconcileError::Validation(_))
        ));
    }

    #[test]
    fn test_plan_update_renames_before_columns() {
        let data = ResourceData::existing(
            "users",
            spec("users", vec![ColumnDescriptor::new("id", "int")]),
            spec(
                "accounts",
                vec![
                    ColumnDescriptor::new("id", "int"),
                    ColumnDescriptor::new("email", "text"),
                ],
            ),
        );

        assert_eq!(
            plan_update(&data).unwrap(),
            vec![
                DdlStatement::RenameTable {
                    from: "users".to_string(),
                    to: "accounts".to_string(),
                },
                DdlStatement::AddColumn {
                    table: "accounts".to_string(),
                    column: ColumnDescriptor::new("email", "text"),
                },
            ]
        );
    }

    #[test]
    fn test_plan_update_for_new_resource_skips_rename() {
        let mut data =
            ResourceData::new_resource(spec("users", vec![ColumnDescriptor::new("id", "int")]));
        data.set_id("users");

        let plan = plan_update(&data).unwrap();
        assert_eq!(plan.len(), 1);
        assert!(matches!(plan[0], DdlStatement::AddColumn { .. }));
    }

    #[test]
    fn test_plan_update_rejects_empty_rename() {
        let data = ResourceData::existing("users", spec("users", vec![]), spec("", vec![]));
        assert!(matches!(plan_update(&data), Err(ReconcileError::Validation(_))));
    }
}
