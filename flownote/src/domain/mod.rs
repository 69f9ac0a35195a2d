//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod datasource;
pub mod entities;
pub mod error;

pub use datasource::{scheme_for, CredentialOverride, DatasourceDescriptor};
pub use entities::*;
pub use error::DomainError;
