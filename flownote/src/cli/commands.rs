//! Command handlers: one per verb, each a thin call into a service

use clap::CommandFactory;
use itertools::Itertools;
use tracing::instrument;

use crate::cli::args::{
    Cli, Commands, ConfigCommands, DatasetCommands, DatasourceCommands, NotebookCommands,
    RemoteCommands,
};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::global_config_path;
use crate::domain::RemoteKind;
use crate::infrastructure::di::ServiceContainer;

/// Print the top-level help text.
pub fn print_help() {
    let mut cmd = Cli::command();
    // stdout is gone when this fails; nothing left to report to
    let _ = cmd.print_help();
    println!();
}

/// Dispatch a parsed command.
pub fn execute_command(command: &Commands, container: &ServiceContainer) -> CliResult<()> {
    match command {
        Commands::Init => container.repository().init().map_err(CliError::from),
        Commands::Remote { command } => cmd_remote(command, container),
        Commands::Add { targets, zip } => {
            container.repository().add(targets, *zip)?;
            Ok(())
        }
        Commands::Remove { targets } => {
            container.repository().remove(targets)?;
            Ok(())
        }
        Commands::Clone { url, output_dir } => container
            .repository()
            .clone_repository(url, output_dir.as_deref())
            .map_err(CliError::from),
        Commands::Commit { message } => {
            container.repository().commit(message)?;
            Ok(())
        }
        Commands::Push {
            message,
            skip_merge,
        } => cmd_push(message.as_deref(), *skip_merge, container),
        Commands::Checkout { reference, unzip } => container
            .repository()
            .checkout(reference.as_deref(), *unzip)
            .map_err(CliError::from),
        Commands::Pull { unzip } => container.repository().pull(*unzip).map_err(CliError::from),
        Commands::Ls => cmd_ls(container),
        Commands::Version => container.repository().version().map_err(CliError::from),
        Commands::Versions => container.repository().versions().map_err(CliError::from),
        Commands::Datasets { command } => cmd_datasets(command, container),
        Commands::Notebook { command } => cmd_notebook(command, container),
        Commands::Datasources { command } => cmd_datasources(command, container),
        Commands::Config { command } => cmd_config(command, container),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "flownote", &mut std::io::stdout());
            Ok(())
        }
    }
}

#[instrument(skip(container))]
fn cmd_remote(command: &RemoteCommands, container: &ServiceContainer) -> CliResult<()> {
    let repository = container.repository();
    match command {
        RemoteCommands::Metadata { url } => repository.set_remote(RemoteKind::Metadata, url)?,
        RemoteCommands::Data { url } => repository.set_remote(RemoteKind::Data, url)?,
        RemoteCommands::List => repository.list_remotes()?,
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_push(message: Option<&str>, skip_merge: bool, container: &ServiceContainer) -> CliResult<()> {
    let version = container.repository().push(message, skip_merge)?;
    output::action("Pushed version", &version);
    Ok(())
}

fn cmd_ls(container: &ServiceContainer) -> CliResult<()> {
    for target in container.repository().list_tracked()? {
        output::info(&target);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_datasets(command: &DatasetCommands, container: &ServiceContainer) -> CliResult<()> {
    match command {
        DatasetCommands::Pull { ids } => {
            let directories = container.datasets().pull(ids)?;
            output::info(&directories.iter().map(|d| d.display()).join(","));
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_notebook(command: &NotebookCommands, container: &ServiceContainer) -> CliResult<()> {
    match command {
        NotebookCommands::Run {
            id,
            output_dir,
            upload,
        } => {
            let run = container
                .notebooks()
                .run(id, output_dir.as_deref(), *upload)?;
            if run.uploaded {
                output::success(&format!("uploaded {}", run.output.display()));
            } else {
                output::info(&run.output.display());
            }
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_datasources(command: &DatasourceCommands, container: &ServiceContainer) -> CliResult<()> {
    let datasources = container.datasources();
    match command {
        DatasourceCommands::Desc { id } => {
            let descriptor = datasources.describe(id)?;
            output::info(&output::pretty_json(&descriptor, &format!("datasource {id}"))?);
        }
        DatasourceCommands::ConnectionString { id } => {
            output::info(&datasources.connection_string(id)?);
        }
    }
    Ok(())
}

fn cmd_config(command: &ConfigCommands, container: &ServiceContainer) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml_redacted()?),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => {
                return Err(CliError::InvalidArgs(
                    "no config directory on this platform".into(),
                ))
            }
        },
    }
    Ok(())
}
