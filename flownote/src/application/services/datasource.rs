//! Datasource descriptors and connection strings

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::application::services::api::{field, ApiClient};
use crate::application::{ApplicationError, ApplicationResult, ResultExt};
use crate::config::Settings;
use crate::domain::{validate_path_component, CredentialOverride, DatasourceDescriptor};
use crate::infrastructure::traits::FileSystem;

const DATASOURCE_QUERY: &str = "query Datasource($id: ID!) { datasource(id: $id) { id name type host port database user password } }";

/// Datasource lookup service.
pub struct DatasourceService {
    fs: Arc<dyn FileSystem>,
    api: ApiClient,
    settings: Arc<Settings>,
}

impl DatasourceService {
    pub fn new(fs: Arc<dyn FileSystem>, api: ApiClient, settings: Arc<Settings>) -> Self {
        Self { fs, api, settings }
    }

    /// Raw datasource descriptor as returned by the API.
    pub fn describe(&self, id: &str) -> ApplicationResult<Value> {
        let data = self.api.request(DATASOURCE_QUERY, json!({ "id": id }))?;
        Ok(field(&data, "datasource")?.clone())
    }

    /// Path of the local credential override for a datasource.
    pub fn credentials_path(&self, id: &str) -> ApplicationResult<PathBuf> {
        let id = validate_path_component("datasource id", id)?;
        Ok(self.settings.credentials_dir.join(format!("{id}.json")))
    }

    fn load_credentials(&self, id: &str) -> ApplicationResult<Option<CredentialOverride>> {
        let path = self.credentials_path(id)?;
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        debug!("load_credentials: {}", path.display());
        let content = self
            .fs
            .read_to_string(&path)
            .with_path_context("read credentials", &path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ApplicationError::Config {
                message: format!("parse {}: {}", path.display(), e),
            })
    }

    /// Connection string with any local credential override applied.
    pub fn connection_string(&self, id: &str) -> ApplicationResult<String> {
        let value = self.describe(id)?;
        let descriptor: DatasourceDescriptor =
            serde_json::from_value(value).with_context(|| format!("decode datasource {id}"))?;
        let credentials = self.load_credentials(id)?;
        Ok(descriptor.connection_string(credentials.as_ref())?)
    }
}
