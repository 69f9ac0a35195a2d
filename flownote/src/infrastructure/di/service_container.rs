//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::{
    ApiClient, ArchiveService, DatasetService, DatasourceService, NotebookService,
    ProcessRunner, RepositoryService,
};
use crate::config::Settings;
use crate::infrastructure::traits::{
    CommandRunner, FileSystem, HttpTransport, RealCommandRunner, RealFileSystem, ReqwestTransport,
};
use crate::infrastructure::{InfraError, InfraResult};

/// Container holding the I/O boundaries shared by all services.
///
/// Services are cheap to build and are created on demand per command.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Directory every command runs in
    pub workdir: PathBuf,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,

    /// HTTP transport abstraction
    pub http: Arc<dyn HttpTransport>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings, workdir: PathBuf) -> InfraResult<Self> {
        let http = ReqwestTransport::new(None)
            .map_err(|e| InfraError::io("build HTTP client", e))?;
        Ok(Self::with_deps(
            settings,
            workdir,
            Arc::new(RealFileSystem),
            Arc::new(RealCommandRunner),
            Arc::new(http),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        workdir: PathBuf,
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        http: Arc<dyn HttpTransport>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            workdir,
            fs,
            cmd,
            http,
        }
    }

    pub fn runner(&self) -> ProcessRunner {
        ProcessRunner::new(Arc::clone(&self.cmd), self.workdir.clone())
    }

    pub fn archive(&self) -> ArchiveService {
        ArchiveService::new()
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(Arc::clone(&self.http), Arc::clone(&self.settings))
    }

    pub fn repository(&self) -> RepositoryService {
        RepositoryService::new(
            Arc::clone(&self.fs),
            self.runner(),
            self.archive(),
            Arc::clone(&self.settings),
        )
    }

    pub fn datasets(&self) -> DatasetService {
        DatasetService::new(
            Arc::clone(&self.fs),
            self.runner(),
            self.archive(),
            self.api(),
        )
    }

    pub fn notebooks(&self) -> NotebookService {
        NotebookService::new(Arc::clone(&self.fs), self.runner(), self.api())
    }

    pub fn datasources(&self) -> DatasourceService {
        DatasourceService::new(
            Arc::clone(&self.fs),
            self.api(),
            Arc::clone(&self.settings),
        )
    }
}
