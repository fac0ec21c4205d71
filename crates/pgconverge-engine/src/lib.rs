//! pgconverge engine - schema reconciliation
//!
//! This crate converges a declared table toward the live catalog:
//! - Column diff (append-only, positional)
//! - DDL synthesis with centralized identifier quoting
//! - Declared-state container for a table resource
//! - Reconciler implementing the create / read / update / delete verbs
//!
//! Mutating verbs are serialized through a shared [`CatalogLock`].

pub mod column_diff;
pub mod ddl;
pub mod error;
pub mod lock;
pub mod reconciler;
pub mod resource;

pub use column_diff::{ColumnDiff, ColumnOperation};
pub use ddl::{quote_identifier, DdlStatement};
pub use error::ReconcileError;
pub use lock::CatalogLock;
pub use reconciler::{plan_create, plan_update, Reconciler};
pub use resource::{Phase, ResourceData};
