//! Remote dataset download
//!
//! HTTP datasets are zip archives unpacked into `<slug>/`; GIT datasets are
//! cloned into `<slug>/` and their dvc payload pulled.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, instrument};

use crate::application::services::api::ApiClient;
use crate::application::services::archive::ArchiveService;
use crate::application::services::runner::{dvc, git, ProcessRunner};
use crate::application::{ApplicationError, ApplicationResult, ResultExt};
use crate::domain::{DatasetDescriptor, Protocol, ARCHIVE_SUFFIX};
use crate::infrastructure::traits::FileSystem;

const DATASETS_QUERY: &str = "query Datasets($ids: [ID!]!) { datasets(ids: $ids) { id slug downloadOption { protocol url } } }";

/// Dataset lookup and download service.
pub struct DatasetService {
    fs: Arc<dyn FileSystem>,
    runner: ProcessRunner,
    archive: ArchiveService,
    api: ApiClient,
}

impl DatasetService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        runner: ProcessRunner,
        archive: ArchiveService,
        api: ApiClient,
    ) -> Self {
        Self {
            fs,
            runner,
            archive,
            api,
        }
    }

    /// Query dataset descriptors by id.
    pub fn fetch(&self, ids: &[String]) -> ApplicationResult<Vec<DatasetDescriptor>> {
        let data = self.api.request(DATASETS_QUERY, json!({ "ids": ids }))?;
        let datasets = match data.get("datasets") {
            Some(value) if !value.is_null() => serde_json::from_value(value.clone())
                .with_context(|| "decode datasets".to_string())?,
            _ => Vec::new(),
        };
        Ok(datasets)
    }

    /// Download every dataset that declares a URL.
    ///
    /// # Returns
    /// The local dataset directories, relative to the working directory
    ///
    /// # Errors
    /// `NotFound` when the API knows none of the ids, or none of them has a
    /// download url.
    #[instrument(skip(self))]
    pub fn pull(&self, ids: &[String]) -> ApplicationResult<Vec<PathBuf>> {
        let datasets = self.fetch(ids)?;
        if datasets.is_empty() {
            return Err(ApplicationError::NotFound(format!(
                "no datasets for ids: {}",
                ids.join(", ")
            )));
        }

        let mut directories = Vec::new();
        for dataset in &datasets {
            let Some(option) = &dataset.download_option else {
                debug!("pull: {} has no download option", dataset.id);
                continue;
            };
            let Some(url) = option.url() else {
                debug!("pull: {} has no download url", dataset.id);
                continue;
            };
            let directory = dataset.directory_name()?;
            match option.protocol()? {
                Protocol::Http => self.pull_http(directory, url)?,
                Protocol::Git => self.pull_git(directory, url)?,
            }
            directories.push(PathBuf::from(directory));
        }
        if directories.is_empty() {
            return Err(ApplicationError::NotFound(format!(
                "no downloadable datasets for ids: {}",
                ids.join(", ")
            )));
        }
        Ok(directories)
    }

    fn pull_http(&self, directory: &str, url: &str) -> ApplicationResult<()> {
        let workdir = self.runner.workdir();
        let archive = workdir.join(format!("{directory}{ARCHIVE_SUFFIX}"));
        let target = workdir.join(directory);

        self.api.download(url, &archive)?;
        self.fs
            .create_dir_all(&target)
            .with_path_context("create directory", &target)?;
        self.archive.extract(&archive, &target)?;
        self.fs
            .remove_file(&archive)
            .with_path_context("remove archive", &archive)?;
        Ok(())
    }

    fn pull_git(&self, directory: &str, url: &str) -> ApplicationResult<()> {
        self.runner
            .run(git(["clone", url, directory]), "git clone failed")?;
        self.runner
            .run(dvc(["pull"]).current_dir(directory), "dvc pull failed")?;
        Ok(())
    }
}
