//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("unsupported download protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("unsupported datasource type: {0}")]
    UnsupportedDatasourceType(String),

    #[error("datasource {id} has no {field}")]
    IncompleteDatasource { id: String, field: &'static str },

    #[error("invalid {kind} name: {value:?}")]
    InvalidName { kind: &'static str, value: String },

    #[error("archive entry escapes target directory: {0}")]
    UnsafeArchiveEntry(String),
}

impl DomainError {
    /// Whether the error comes from bad user or server input rather than the local machine.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, DomainError::UnsafeArchiveEntry(_))
    }
}
