//! Integration tests for catalog adapters
//!
//! Tests against a live PostgreSQL are marked with `#[ignore]` and can be run
//! with `cargo test -- --ignored`.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all non-ignored tests (no database required)
//! cargo test -p pgconverge-catalog --test integration_tests
//!
//! # Run PostgreSQL integration tests
//! PGHOST=localhost \
//! PGPORT=5432 \
//! PGDATABASE=mydb \
//! PGUSER=user \
//! PGPASSWORD=pass \
//! cargo test -p pgconverge-catalog --test integration_tests -- --ignored
//! ```

mod fixtures;

use pgconverge_catalog::{
    CatalogAdapter, CatalogError, CatalogReader, MockCatalog, MockCatalogBuilder,
};
use pgconverge_core::{ColumnDescriptor, TableDescriptor};
use pretty_assertions::assert_eq;

// =============================================================================
// In-memory catalog
// =============================================================================

#[tokio::test]
async fn test_reader_normalizes_users_table() {
    let catalog = MockCatalogBuilder::new()
        .with_table("users", fixtures::users_rows())
        .build();
    let reader = CatalogReader::new(&catalog);

    let columns = reader.describe_columns("users").await.unwrap();
    assert_eq!(
        columns,
        vec![
            ColumnDescriptor::new("id", "int").with_default("nextval('users_id_seq'::regclass)"),
            ColumnDescriptor::new("email", "varchar").with_max_length(255),
            ColumnDescriptor::new("display_name", "text").with_nullable(true),
            ColumnDescriptor::new("created_at", "timestamptz").with_default("now()"),
        ]
    );
}

#[tokio::test]
async fn test_reader_only_aliases_int4() {
    let catalog = MockCatalogBuilder::new()
        .with_table("mixed", fixtures::mixed_rows())
        .build();
    let reader = CatalogReader::new(&catalog);

    let columns = reader.describe_columns("mixed").await.unwrap();
    let types: Vec<&str> = columns.iter().map(|c| c.column_type.as_str()).collect();
    assert_eq!(types, vec!["int2", "int", "int8", "bpchar", "varchar", "bool"]);

    // A zero length reported by the catalog is still "present"
    assert_eq!(columns[4].max_length, Some(0));
    assert!(columns[5].nullable);
}

#[tokio::test]
async fn test_reader_sees_applied_ddl() {
    let catalog = MockCatalog::new();
    catalog.execute(r#"CREATE TABLE "events" ()"#).await.unwrap();
    catalog
        .execute(r#"ALTER TABLE "events" ADD COLUMN "id" int NOT NULL"#)
        .await
        .unwrap();
    catalog
        .execute(r#"ALTER TABLE "events" ADD COLUMN "kind" varchar(32) DEFAULT 'click' NOT NULL"#)
        .await
        .unwrap();
    catalog
        .execute(r#"ALTER TABLE "events" ADD COLUMN "payload" jsonb"#)
        .await
        .unwrap();

    let reader = CatalogReader::new(&catalog);
    assert_eq!(
        reader.describe_table("events").await.unwrap(),
        Some(TableDescriptor::new("events"))
    );
    assert_eq!(
        reader.describe_columns("events").await.unwrap(),
        vec![
            ColumnDescriptor::new("id", "int"),
            ColumnDescriptor::new("kind", "varchar")
                .with_max_length(32)
                .with_default("'click'"),
            ColumnDescriptor::new("payload", "jsonb").with_nullable(true),
        ]
    );
}

#[tokio::test]
async fn test_reader_after_rename() {
    let catalog = MockCatalogBuilder::new()
        .with_table("users", fixtures::users_rows())
        .build();
    catalog
        .execute(r#"ALTER TABLE "users" RENAME TO "accounts""#)
        .await
        .unwrap();

    let reader = CatalogReader::new(&catalog);
    assert!(!reader.table_exists("users").await.unwrap());
    assert!(reader.table_exists("accounts").await.unwrap());
    assert_eq!(reader.describe_columns("accounts").await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_latency_simulation() {
    let catalog = MockCatalog::new().with_latency(50);
    let reader = CatalogReader::new(&catalog);

    let start = std::time::Instant::now();
    let _ = reader.table_exists("users").await;
    assert!(start.elapsed().as_millis() >= 50);
}

#[tokio::test]
async fn test_connection_failure_simulation() {
    let catalog = MockCatalog::new().with_connection_failure();
    let reader = CatalogReader::new(&catalog);

    assert!(matches!(
        reader.describe_columns("users").await,
        Err(CatalogError::Connection(_))
    ));
}

// =============================================================================
// Live PostgreSQL (requires PG* environment)
// =============================================================================

#[cfg(feature = "postgres")]
mod postgres {
    use super::*;
    use pgconverge_catalog::PostgresAdapter;
    use pgconverge_core::ConnectionConfig;
    use pretty_assertions::assert_eq;

    async fn connect() -> PostgresAdapter {
        let mut connection = ConnectionConfig::default();
        connection.fill_from_env().expect("invalid PG* environment");
        PostgresAdapter::from_config(&connection)
            .await
            .expect("failed to connect to PostgreSQL")
    }

    #[tokio::test]
    #[ignore]
    async fn test_postgres_connection() {
        let adapter = connect().await;
        adapter.test_connection().await.unwrap();
        assert_eq!(adapter.name(), "PostgreSQL");
    }

    #[tokio::test]
    #[ignore]
    async fn test_postgres_describe_columns() {
        let adapter = connect().await;
        let table = format!("pgconverge_it_{}", std::process::id());

        adapter.execute(&format!(r#"CREATE TABLE "{}" ()"#, table)).await.unwrap();
        adapter
            .execute(&format!(r#"ALTER TABLE "{}" ADD COLUMN "id" int NOT NULL"#, table))
            .await
            .unwrap();
        adapter
            .execute(&format!(
                r#"ALTER TABLE "{}" ADD COLUMN "label" varchar(40) DEFAULT 'x'"#,
                table
            ))
            .await
            .unwrap();

        let reader = CatalogReader::new(&adapter);
        let exists = reader.table_exists(&table).await;
        let columns = reader.describe_columns(&table).await;

        adapter.execute(&format!(r#"DROP TABLE "{}""#, table)).await.unwrap();

        assert!(exists.unwrap());
        let columns = columns.unwrap();
        assert_eq!(columns[0], ColumnDescriptor::new("id", "int"));
        assert_eq!(columns[1].column_type, "varchar");
        assert_eq!(columns[1].max_length, Some(40));
        assert!(columns[1].nullable);
        assert!(columns[1].default_expr.as_deref().unwrap().starts_with("'x'"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_postgres_missing_table() {
        let adapter = connect().await;
        let reader = CatalogReader::new(&adapter);
        assert_eq!(reader.describe_table("pgconverge_does_not_exist").await.unwrap(), None);
    }
}
