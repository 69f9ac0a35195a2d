//! Headless notebook execution
//!
//! The API issues one-time URLs: one to fetch a notebook snapshot, one to
//! receive the executed notebook.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::instrument;

use crate::application::services::api::{field, ApiClient};
use crate::application::services::runner::ProcessRunner;
use crate::application::{ApplicationError, ApplicationResult, ResultExt};
use crate::domain::validate_path_component;
use crate::infrastructure::traits::{FileSystem, ProcessCommand};

const SNAPSHOT_MUTATION: &str = "mutation CreateNotebookSnapshotUrl($notebookId: ID!) { createNotebookSnapshotUrl(notebookId: $notebookId) { url } }";
const OUTPUT_MUTATION: &str = "mutation CreateNotebookOutputUrl($notebookId: ID!) { createNotebookOutputUrl(notebookId: $notebookId) { url } }";

/// Outcome of a notebook run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookRun {
    /// Executed notebook on disk
    pub output: PathBuf,
    /// Whether the executed notebook was uploaded
    pub uploaded: bool,
}

/// Notebook snapshot execution service.
pub struct NotebookService {
    fs: Arc<dyn FileSystem>,
    runner: ProcessRunner,
    api: ApiClient,
}

impl NotebookService {
    pub fn new(fs: Arc<dyn FileSystem>, runner: ProcessRunner, api: ApiClient) -> Self {
        Self { fs, runner, api }
    }

    fn issue_url(&self, mutation: &str, name: &str, notebook_id: &str) -> ApplicationResult<String> {
        let data = self
            .api
            .request(mutation, json!({ "notebookId": notebook_id }))?;
        field(&data, name)?
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApplicationError::NotFound(format!("{name} returned no url")))
    }

    /// Download, execute and optionally upload a notebook.
    ///
    /// The snapshot is fetched into a temporary directory; the executed
    /// notebook is written to `<output_dir>/<id>.ipynb` (relative to the
    /// working directory).
    #[instrument(skip(self))]
    pub fn run(
        &self,
        notebook_id: &str,
        output_dir: Option<&str>,
        upload: bool,
    ) -> ApplicationResult<NotebookRun> {
        let stem = validate_path_component("notebook id", notebook_id)?;
        let snapshot_url = self.issue_url(SNAPSHOT_MUTATION, "createNotebookSnapshotUrl", notebook_id)?;

        let staging = tempfile::Builder::new()
            .prefix("flownote-notebook-")
            .tempdir()
            .with_context(|| "create staging directory".to_string())?;
        let snapshot = staging.path().join(format!("{stem}.ipynb"));
        self.api.download(&snapshot_url, &snapshot)?;

        let output_dir = output_dir
            .map(|d| self.runner.workdir().join(d))
            .unwrap_or_else(|| self.runner.workdir().to_path_buf());
        self.fs
            .create_dir_all(&output_dir)
            .with_path_context("create directory", &output_dir)?;

        self.runner.run(
            ProcessCommand::new("jupyter")
                .args(["nbconvert", "--to", "notebook", "--execute"])
                .arg(snapshot.to_string_lossy())
                .arg("--output-dir")
                .arg(output_dir.to_string_lossy())
                .args(["--output", stem]),
            "notebook execution failed",
        )?;
        let output = output_dir.join(format!("{stem}.ipynb"));

        if upload {
            let output_url = self.issue_url(OUTPUT_MUTATION, "createNotebookOutputUrl", notebook_id)?;
            self.api.upload(&output_url, &output)?;
        }

        Ok(NotebookRun {
            output,
            uploaded: upload,
        })
    }
}
