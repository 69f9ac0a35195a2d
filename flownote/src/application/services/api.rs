//! Remote API client
//!
//! Single request/response exchanges against the flownote GraphQL endpoint:
//! `{query, variables}` goes out, `{data, errors?}` comes back.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, ResultExt};
use crate::config::Settings;
use crate::infrastructure::traits::HttpTransport;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<ErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    message: Option<String>,
}

/// Client for the remote dataset/notebook/datasource API.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    settings: Arc<Settings>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, settings: Arc<Settings>) -> Self {
        Self {
            transport,
            settings,
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = self.settings.api_token.as_deref().filter(|t| !t.is_empty()) {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }

    /// Send one query and return its `data` member.
    ///
    /// A non-empty `errors` array fails with the first error's message.
    pub fn request(&self, query: &str, variables: Value) -> ApplicationResult<Value> {
        let url = &self.settings.api_url;
        debug!("request: POST {}", url);
        let body = json!({ "query": query, "variables": variables });

        let response = self
            .transport
            .post_json(url, &self.headers(), &body)
            .with_context(|| format!("request {url}"))?;
        let envelope: Envelope =
            serde_json::from_value(response).with_context(|| format!("decode response from {url}"))?;

        if let Some(first) = envelope.errors.as_deref().and_then(<[ErrorEntry]>::first) {
            let message = first
                .message
                .clone()
                .unwrap_or_else(|| "remote API reported an error".to_string());
            debug!("request: API error: {}", message);
            return Err(ApplicationError::Api { message });
        }

        Ok(envelope.data.unwrap_or(Value::Null))
    }

    /// Fetch a payload URL to a local file.
    pub fn download(&self, url: &str, dest: &Path) -> ApplicationResult<u64> {
        debug!("download: {} -> {}", url, dest.display());
        self.transport
            .download(url, dest)
            .with_context(|| format!("download {url}"))
    }

    /// Upload a local file to an issued URL.
    pub fn upload(&self, url: &str, src: &Path) -> ApplicationResult<()> {
        debug!("upload: {} -> {}", src.display(), url);
        self.transport
            .upload(url, src)
            .with_context(|| format!("upload {}", src.display()))
    }
}

/// Pull `data[field]` out of a response, failing when it is absent or null.
pub(crate) fn field<'a>(data: &'a Value, field: &str) -> ApplicationResult<&'a Value> {
    match data.get(field) {
        Some(Value::Null) | None => Err(ApplicationError::NotFound(format!(
            "remote API returned no {field}"
        ))),
        Some(value) => Ok(value),
    }
}
