//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::exitcode;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// An external command exited non-zero. `exit_code` is already clamped.
    #[error("{label}")]
    CommandFailed { label: String, exit_code: i32 },

    /// The remote API answered with an application-level error.
    #[error("{message}")]
    Api { message: String },

    #[error("{0}")]
    Invalid(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Exit code the process terminates with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ApplicationError::CommandFailed { exit_code, .. } => *exit_code,
            ApplicationError::Domain(e) if e.is_rejection() => exitcode::USAGE,
            ApplicationError::Api { .. }
            | ApplicationError::Invalid(_)
            | ApplicationError::NotFound(_) => exitcode::USAGE,
            ApplicationError::Domain(_)
            | ApplicationError::Config { .. }
            | ApplicationError::OperationFailed { .. } => exitcode::FAILURE,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
