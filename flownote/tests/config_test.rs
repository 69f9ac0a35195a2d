//! Integration tests for Settings layered loading
//!
//! Precedence: compiled defaults < config file < FLOWNOTE_* environment.
//! Every test passes an explicit config file so the user's global config
//! never leaks in.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use flownote::config::{Settings, DEFAULT_API_URL};

fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn config_file(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("flownote.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn given_empty_file_when_load_then_defaults_apply() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = config_file(&dir, "");

    // Act
    let settings = Settings::load_with_env(Some(&path), env(&[])).unwrap();

    // Assert
    assert_eq!(settings.api_url, DEFAULT_API_URL);
    assert_eq!(settings.api_token, None);
    assert_eq!(settings.main_branch, "master");
    assert_eq!(settings.remote, "origin");
}

#[test]
fn given_file_values_when_load_then_file_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = config_file(
        &dir,
        r#"
api_url = "http://localhost:8080/graphql"
main_branch = "main"
credentials_dir = "/srv/creds"
"#,
    );

    // Act
    let settings = Settings::load_with_env(Some(&path), env(&[])).unwrap();

    // Assert
    assert_eq!(settings.api_url, "http://localhost:8080/graphql");
    assert_eq!(settings.main_branch, "main");
    assert_eq!(settings.remote, "origin");
    assert_eq!(settings.credentials_dir, PathBuf::from("/srv/creds"));
}

#[test]
fn given_env_values_when_load_then_env_overrides_file() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = config_file(&dir, "api_url = \"http://from-file/graphql\"\n");

    // Act
    let settings = Settings::load_with_env(
        Some(&path),
        env(&[
            ("FLOWNOTE_API_URL", "http://from-env/graphql"),
            ("FLOWNOTE_API_TOKEN", "tok"),
        ]),
    )
    .unwrap();

    // Assert
    assert_eq!(settings.api_url, "http://from-env/graphql");
    assert_eq!(settings.api_token.as_deref(), Some("tok"));
}

#[test]
fn given_missing_explicit_file_when_load_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();

    // Act
    let result = Settings::load_with_env(Some(&dir.path().join("absent.toml")), env(&[]));

    // Assert
    assert!(result.is_err());
}

#[test]
fn given_token_when_render_then_redacted() {
    // Arrange
    let settings = Settings {
        api_token: Some("very-secret".to_string()),
        ..Settings::default()
    };

    // Act
    let rendered = settings.to_toml_redacted().unwrap();

    // Assert
    assert!(!rendered.contains("very-secret"));
    assert!(rendered.contains("api_token = \"********\""));
}
