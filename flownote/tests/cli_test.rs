//! CLI parsing and dispatch tests

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;
use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

use flownote::cli::args::{Cli, Commands, DatasourceCommands};
use flownote::cli::commands::execute_command;
use flownote::cli::output::pretty_json;
use flownote::cli::CliError;
use flownote::cli::parse_exit_code;
use flownote::config::Settings;
use flownote::exitcode;
use flownote::infrastructure::di::ServiceContainer;
use flownote::infrastructure::traits::RealFileSystem;
use flownote::util::testing::{init_test_setup, FakeTransport, RecordingRunner};

fn container(
    workdir: &Path,
    cmd: RecordingRunner,
    transport: FakeTransport,
) -> (Arc<RecordingRunner>, ServiceContainer) {
    init_test_setup();
    let cmd = Arc::new(cmd);
    let container = ServiceContainer::with_deps(
        Settings::default(),
        workdir.to_path_buf(),
        Arc::new(RealFileSystem),
        cmd.clone(),
        Arc::new(transport),
    );
    (cmd, container)
}

fn parse(argv: &[&str]) -> Cli {
    Cli::try_parse_from(argv).unwrap()
}

// ============================================================
// parsing
// ============================================================

#[test]
fn given_unknown_verb_when_parse_then_invalid_subcommand_usage() {
    // Act
    let err = Cli::try_parse_from(["flownote", "frobnicate"]).unwrap_err();

    // Assert
    assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    assert_eq!(parse_exit_code(&err), exitcode::USAGE);
}

#[rstest]
#[case(&["flownote", "--help"], exitcode::OK)]
#[case(&["flownote", "--version"], exitcode::OK)]
#[case(&["flownote", "commit"], exitcode::USAGE)]
#[case(&["flownote", "datasets", "pull"], exitcode::USAGE)]
#[case(&["flownote", "push", "--bogus"], exitcode::USAGE)]
fn given_argv_rejected_by_parser_when_parse_then_exit_code(
    #[case] argv: &[&str],
    #[case] expected: i32,
) {
    // Act
    let err = Cli::try_parse_from(argv).unwrap_err();

    // Assert
    assert_eq!(parse_exit_code(&err), expected);
}

#[test]
fn given_no_verb_when_parse_then_no_command() {
    // Act
    let cli = parse(&["flownote"]);

    // Assert
    assert!(cli.command.is_none());
}

#[test]
fn given_both_spellings_when_parse_connection_string_then_same_command() {
    // Act
    let snake = parse(&["flownote", "datasources", "connection_string", "ds1"]);
    let kebab = parse(&["flownote", "datasources", "connection-string", "ds1"]);

    // Assert
    for cli in [snake, kebab] {
        match cli.command {
            Some(Commands::Datasources {
                command: DatasourceCommands::ConnectionString { id },
            }) => assert_eq!(id, "ds1"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

#[test]
fn given_repeated_debug_flag_when_parse_then_counts_verbosity() {
    // Act
    let cli = parse(&["flownote", "-dd", "ls"]);

    // Assert
    assert_eq!(cli.debug, 2);
}

// ============================================================
// dispatch
// ============================================================

#[test]
fn given_failing_dvc_when_execute_add_then_exit_code_passes_through() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (cmd, container) = container(
        temp.path(),
        RecordingRunner::new().fail("dvc add", Some(3), ""),
        FakeTransport::new(),
    );
    let cli = parse(&["flownote", "add", "data/x.csv"]);

    // Act
    let err = execute_command(cli.command.as_ref().unwrap(), &container).unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), 3);
    assert_eq!(err.to_string(), "dvc add failed");
    assert_eq!(cmd.lines(), vec!["dvc add data/x.csv"]);
}

#[test]
fn given_push_verb_when_execute_then_runs_full_sequence() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (cmd, container) = container(
        temp.path(),
        RecordingRunner::new()
            .respond("git for-each-ref", "4\n")
            .respond("git rev-parse", "master\n"),
        FakeTransport::new(),
    );
    let cli = parse(&["flownote", "push", "weekly refresh", "--skip-merge"]);

    // Act
    execute_command(cli.command.as_ref().unwrap(), &container).unwrap();

    // Assert
    let lines = cmd.lines();
    assert!(lines.contains(&"git tag -a 5 -m weekly refresh".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("dvc push"));
}

#[test]
fn given_api_error_when_execute_datasets_pull_then_usage_exit_code() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (cmd, container) = container(
        temp.path(),
        RecordingRunner::new(),
        FakeTransport::new().reply(json!({ "errors": [{ "message": "unauthorized" }] })),
    );
    let cli = parse(&["flownote", "datasets", "pull", "d1"]);

    // Act
    let err = execute_command(cli.command.as_ref().unwrap(), &container).unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), exitcode::USAGE);
    assert_eq!(err.to_string(), "unauthorized");
    assert!(cmd.lines().is_empty());
}

#[test]
fn given_remote_data_verb_when_execute_then_configures_dvc_remote() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (cmd, container) = container(temp.path(), RecordingRunner::new(), FakeTransport::new());
    let cli = parse(&["flownote", "remote", "data", "s3://bucket/store"]);

    // Act
    execute_command(cli.command.as_ref().unwrap(), &container).unwrap();

    // Assert
    assert_eq!(
        cmd.lines(),
        vec![
            "dvc remote remove origin",
            "dvc remote add -d origin s3://bucket/store",
        ]
    );
}

// ============================================================
// output
// ============================================================

#[test]
fn given_serializable_value_when_pretty_json_then_indented() {
    // Act
    let rendered = pretty_json(&json!({ "id": "ds1" }), "datasource ds1").unwrap();

    // Assert
    assert_eq!(rendered, "{\n  \"id\": \"ds1\"\n}");
}

#[test]
fn given_unrenderable_value_when_pretty_json_then_local_failure() {
    // Arrange
    let value: BTreeMap<(i32, i32), i32> = BTreeMap::from([((1, 2), 3)]);

    // Act
    let err = CliError::from(pretty_json(&value, "datasource ds1").unwrap_err());

    // Assert
    assert_eq!(err.exit_code(), exitcode::FAILURE);
    assert!(err.to_string().contains("render datasource ds1"));
}
