//! Infrastructure layer: filesystem, process and HTTP boundaries
//!
//! Real implementations of the boundary traits live in `traits`; `di` wires
//! them (or test doubles) into the services.

pub mod di;
pub mod error;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use traits::{
    CommandOutput, CommandRunner, FileSystem, HttpTransport, ProcessCommand, RealCommandRunner,
    RealFileSystem, ReqwestTransport,
};
