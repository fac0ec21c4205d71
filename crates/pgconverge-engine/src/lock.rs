//! Catalog lock
//!
//! Serializes catalog mutation across reconcilers. Mutating verbs take the
//! lock exclusively, reads take it shared. Clones share one lock.

use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared reader/writer lock over the catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogLock {
    inner: Arc<RwLock<()>>,
}

impl CatalogLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock shared
    pub async fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.inner.read().await
    }

    /// Acquire the lock exclusively
    pub async fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.inner.write().await
    }
}
