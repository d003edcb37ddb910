//! Error types for `corpreg-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.

use uuid::Uuid;

use crate::validator::Violations;

/// Boxed underlying cause of a store failure.
pub type StoreCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for all company operations.
///
/// The variants split into conditions a client can fix (`Validation`,
/// `NotFound`, `Conflict`) and infrastructure failures (`Store`), which
/// callers should log and hide.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The company failed structural validation.
    #[error("validation failed: {0}")]
    Validation(Violations),

    /// No company exists with the given id.
    #[error("company not found: {0}")]
    NotFound(Uuid),

    /// Another company already uses this name.
    #[error("company name already exists: {0}")]
    Conflict(String),

    /// The persistence layer failed while running `op`.
    #[error("company store error during {op}")]
    Store {
        op: &'static str,
        #[source]
        source: StoreCause,
    },
}

impl CoreError {
    pub fn store(op: &'static str, source: impl Into<StoreCause>) -> Self {
        CoreError::Store {
            op,
            source: source.into(),
        }
    }

    /// Returns `true` for errors caused by the request rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CoreError::Store { .. })
    }
}

/// Convenience alias used throughout `corpreg-core`.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::validator::Violation;

    #[test]
    fn not_found_displays_id() {
        let id = Uuid::nil();
        let err = CoreError::NotFound(id);
        assert_eq!(
            err.to_string(),
            "company not found: 00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn conflict_displays_name() {
        let err = CoreError::Conflict("Acme".to_string());
        assert_eq!(err.to_string(), "company name already exists: Acme");
    }

    #[test]
    fn validation_displays_joined_violations() {
        let err = CoreError::Validation(Violations::from(vec![
            Violation::new("name", "name is required"),
            Violation::new("type", "type must be one of the known company types"),
        ]));
        assert_eq!(
            err.to_string(),
            "validation failed: name is required; type must be one of the known company types"
        );
    }

    #[test]
    fn store_error_keeps_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = CoreError::store("create", io);
        assert_eq!(err.to_string(), "company store error during create");
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk gone"));
    }

    #[test]
    fn client_errors_are_classified() {
        assert!(CoreError::NotFound(Uuid::nil()).is_client_error());
        assert!(CoreError::Conflict("x".into()).is_client_error());
        assert!(!CoreError::store("get", std::io::Error::other("boom")).is_client_error());
    }
}
