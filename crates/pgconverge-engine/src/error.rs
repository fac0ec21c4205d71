use pgconverge_catalog::CatalogError;
use thiserror::Error;

/// Errors returned by the lifecycle verbs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// A catalog call failed. `context` names the table, column or statement.
    #[error("{context}: {source}")]
    Catalog {
        context: String,
        #[source]
        source: CatalogError,
    },
}

impl ReconcileError {
    /// Wrap catalog errors with a context message, for use with `map_err`
    pub(crate) fn catalog(context: impl Into<String>) -> impl FnOnce(CatalogError) -> Self {
        let context = context.into();
        move |source| ReconcileError::Catalog { context, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn catalog_error_keeps_source() {
        let err = ReconcileError::catalog("reading table \"users\"")(CatalogError::Query(
            "relation does not exist".to_string(),
        ));

        assert_eq!(
            err.to_string(),
            "reading table \"users\": Query failed: relation does not exist"
        );
        assert!(err.source().is_some());
    }
}
