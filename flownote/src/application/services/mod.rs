//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, CommandRunner, HttpTransport)
//! but are themselves concrete structs, not traits.

mod api;
mod archive;
mod dataset;
mod datasource;
mod notebook;
mod repository;
mod runner;

pub use api::ApiClient;
pub use archive::ArchiveService;
pub use dataset::DatasetService;
pub use datasource::DatasourceService;
pub use notebook::{NotebookRun, NotebookService};
pub use repository::RepositoryService;
pub use runner::{dvc, git, ProcessRunner};
