//! Domain entities: naming conventions, version tags and dataset descriptors

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::DomainError;

/// Suffix of the pointer files dvc commits into git.
pub const DATA_SUFFIX: &str = ".dvc";

/// Suffix appended to a packed path.
pub const ARCHIVE_SUFFIX: &str = ".zip";

/// Suffix of a pointer file whose payload is a packed archive.
pub const ARCHIVE_TRACKING_SUFFIX: &str = ".zip.dvc";

/// Which of the two version-control tools a remote belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    /// git: history, tags, pointer files
    Metadata,
    /// dvc: content-addressed payload storage
    Data,
}

/// Append the dvc pointer suffix unless the target already carries it.
pub fn with_data_suffix(target: &str) -> String {
    if target.ends_with(DATA_SUFFIX) {
        target.to_string()
    } else {
        format!("{target}{DATA_SUFFIX}")
    }
}

/// Strip trailing separators so `data/` and `data` pack to the same archive.
pub fn trim_trailing_separator(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        path
    } else {
        trimmed
    }
}

/// Archive path for a packed target: `path + ".zip"`.
///
/// # Examples
/// ```
/// use std::path::{Path, PathBuf};
/// use flownote::domain::archive_path;
///
/// assert_eq!(archive_path(Path::new("data/images/")), PathBuf::from("data/images.zip"));
/// ```
pub fn archive_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(format!("{}{ARCHIVE_SUFFIX}", trim_trailing_separator(&raw)))
}

/// Directory an archive unpacks into: the parent of its base name.
///
/// An archive without a directory component unpacks into the current directory.
pub fn extraction_dir(archive: &Path) -> PathBuf {
    let raw = archive.to_string_lossy();
    let base = raw.strip_suffix(ARCHIVE_SUFFIX).unwrap_or(&raw);
    match Path::new(base).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Archive path recovered from a tracked `*.zip.dvc` pointer file.
pub fn archive_from_tracking_file(tracked: &str) -> Option<&str> {
    let tracked = tracked.trim();
    if tracked.ends_with(ARCHIVE_TRACKING_SUFFIX) {
        tracked.strip_suffix(DATA_SUFFIX)
    } else {
        None
    }
}

/// Data target behind a tracked `*.dvc` pointer file.
pub fn tracked_data_target(tracked: &str) -> Option<&str> {
    tracked.trim().strip_suffix(DATA_SUFFIX).filter(|t| !t.is_empty())
}

/// Whether an untracked/modified file belongs in a dataset commit.
///
/// Only dvc pointer files and the `.gitignore` files dvc maintains are staged.
pub fn is_commit_candidate(path: &str) -> bool {
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    name == ".gitignore" || (name.ends_with(DATA_SUFFIX) && name.len() > DATA_SUFFIX.len())
}

/// Next dataset version from the most recently created tag.
///
/// Tags are plain integers. A missing or non-numeric tag restarts at 1.
pub fn next_version(latest_tag: Option<&str>) -> u64 {
    latest_tag
        .and_then(|tag| tag.trim().parse::<u64>().ok())
        .map_or(1, |n| n.saturating_add(1))
}

/// Reject names that would escape the directory they are joined onto.
pub fn validate_path_component<'a>(
    kind: &'static str,
    value: &'a str,
) -> Result<&'a str, DomainError> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.contains('\0');
    if invalid {
        return Err(DomainError::InvalidName {
            kind,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is returned unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// How a dataset payload is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Zip archive behind a plain URL
    Http,
    /// git repository with a dvc remote
    Git,
}

impl std::str::FromStr for Protocol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HTTP" | "HTTPS" => Ok(Protocol::Http),
            "GIT" => Ok(Protocol::Git),
            _ => Err(DomainError::UnsupportedProtocol(s.to_string())),
        }
    }
}

/// Download location declared for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadOption {
    pub protocol: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl DownloadOption {
    pub fn protocol(&self) -> Result<Protocol, DomainError> {
        self.protocol.parse()
    }

    /// Declared URL, if non-empty.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// Dataset as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDescriptor {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub download_option: Option<DownloadOption>,
}

impl DatasetDescriptor {
    /// Local directory name for the dataset.
    pub fn directory_name(&self) -> Result<&str, DomainError> {
        validate_path_component("dataset slug", &self.slug)
    }
}
