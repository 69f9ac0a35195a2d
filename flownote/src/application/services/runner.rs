//! External process runner
//!
//! Every git/dvc/jupyter call goes through here. A non-zero exit becomes
//! `ApplicationError::CommandFailed` with the caller's label and a clamped exit
//! code; the caller stops at the first failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult, ResultExt};
use crate::exitcode;
use crate::infrastructure::traits::{CommandRunner, ProcessCommand};

/// Shorthand for a `git` invocation.
pub fn git<I, S>(args: I) -> ProcessCommand
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ProcessCommand::new("git").args(args)
}

/// Shorthand for a `dvc` invocation.
pub fn dvc<I, S>(args: I) -> ProcessCommand
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ProcessCommand::new("dvc").args(args)
}

/// Runs external commands sequentially in a fixed working directory.
#[derive(Clone)]
pub struct ProcessRunner {
    cmd: Arc<dyn CommandRunner>,
    workdir: PathBuf,
}

impl ProcessRunner {
    pub fn new(cmd: Arc<dyn CommandRunner>, workdir: PathBuf) -> Self {
        Self { cmd, workdir }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Resolve the command's working directory against the runner's.
    fn prepare(&self, command: ProcessCommand) -> ProcessCommand {
        let cwd = match &command.cwd {
            Some(dir) => self.workdir.join(dir),
            None => self.workdir.clone(),
        };
        command.current_dir(cwd)
    }

    /// Run attached to the terminal; output goes straight to the user.
    pub fn run(&self, command: ProcessCommand, label: &str) -> ApplicationResult<()> {
        let command = self.prepare(command);
        debug!("run: {}", command);
        let code = self
            .cmd
            .run_interactive(&command)
            .with_context(|| format!("run {}", command.program))?;

        if code == Some(0) {
            return Ok(());
        }
        debug!("run: {} exited with {:?}", command, code);
        Err(ApplicationError::CommandFailed {
            label: label.to_string(),
            exit_code: exitcode::from_process(code),
        })
    }

    /// Run and return captured stdout.
    pub fn capture(&self, command: ProcessCommand, label: &str) -> ApplicationResult<String> {
        let command = self.prepare(command);
        debug!("capture: {}", command);
        let output = self
            .cmd
            .run(&command)
            .with_context(|| format!("run {}", command.program))?;

        if output.success() {
            return Ok(output.stdout);
        }
        debug!("capture: {} exited with {:?}", command, output.code);
        let stderr = output.stderr.trim();
        let label = if stderr.is_empty() {
            label.to_string()
        } else {
            format!("{label}: {stderr}")
        };
        Err(ApplicationError::CommandFailed {
            label,
            exit_code: exitcode::from_process(output.code),
        })
    }

    /// Run with output captured and failure ignored.
    pub fn run_tolerant(&self, command: ProcessCommand) {
        let command = self.prepare(command);
        debug!("run_tolerant: {}", command);
        match self.cmd.run(&command) {
            Ok(output) if !output.success() => {
                debug!("run_tolerant: {} exited with {:?}", command, output.code)
            }
            Ok(_) => {}
            Err(e) => warn!("run_tolerant: {} could not start: {}", command, e),
        }
    }
}
