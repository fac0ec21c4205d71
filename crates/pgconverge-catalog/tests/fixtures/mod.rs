//! Test fixtures for catalog integration tests
//!
//! Raw `information_schema.columns` rows as Postgres reports them for a few
//! common table shapes.

use pgconverge_catalog::ColumnRow;

fn row(name: &str, udt: &str, nullable: bool) -> ColumnRow {
    ColumnRow {
        name: name.to_string(),
        default_expr: None,
        is_nullable: if nullable { "YES" } else { "NO" }.to_string(),
        udt_name: udt.to_string(),
        max_length: None,
    }
}

/// A typical users table
///
/// - serial primary key (`int4` with a sequence default)
/// - bounded email, optional display name
/// - creation timestamp with a default
pub fn users_rows() -> Vec<ColumnRow> {
    vec![
        ColumnRow {
            default_expr: Some("nextval('users_id_seq'::regclass)".to_string()),
            ..row("id", "int4", false)
        },
        ColumnRow {
            max_length: Some(255),
            ..row("email", "varchar", false)
        },
        row("display_name", "text", true),
        ColumnRow {
            default_expr: Some("now()".to_string()),
            ..row("created_at", "timestamptz", false)
        },
    ]
}

/// A table covering the value shapes the reader has to normalize
pub fn mixed_rows() -> Vec<ColumnRow> {
    vec![
        row("small", "int2", false),
        row("regular", "int4", true),
        row("big", "int8", false),
        ColumnRow {
            max_length: Some(2),
            ..row("code", "bpchar", false)
        },
        ColumnRow {
            max_length: Some(0),
            ..row("odd", "varchar", true)
        },
        ColumnRow {
            is_nullable: "yes".to_string(),
            ..row("lowercase_flag", "bool", true)
        },
    ]
}
