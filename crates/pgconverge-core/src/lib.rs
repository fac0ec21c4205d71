//! pgconverge core
//!
//! Domain model shared by every crate in the workspace: the table and column
//! descriptors, the declared table specification, configuration and the
//! persisted resource state.

pub mod schema;
pub mod config;
pub mod state;

pub use schema::{ColumnDescriptor, TableDescriptor, TableSpec};
pub use config::{Config, ConfigError, ConnectionConfig, SslMode};
pub use state::{ResourceState, StateError};
