//! Test support: logging setup and scripted I/O boundaries
//!
//! `RecordingRunner` and `FakeTransport` stand in for git/dvc/jupyter and the
//! remote API so service tests never leave the temp directory.

use std::collections::{HashMap, VecDeque};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::infrastructure::traits::{CommandOutput, CommandRunner, HttpTransport, ProcessCommand};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let noisy_modules = ["hyper", "reqwest", "rustls", "httpmock"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

// ============================================================
// COMMAND RUNNER
// ============================================================

/// Command runner that records every invocation and answers from a script.
///
/// A response is chosen by the first registered prefix the command line
/// (`program arg1 arg2 ...`) starts with; unscripted commands succeed with
/// empty output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<ProcessCommand>>,
    script: Mutex<Vec<(String, CommandOutput)>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with exit code 0 and `stdout`.
    pub fn respond(self, prefix: &str, stdout: &str) -> Self {
        self.script(
            prefix,
            CommandOutput {
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        )
    }

    /// Answer commands starting with `prefix` with a failure.
    pub fn fail(self, prefix: &str, code: Option<i32>, stderr: &str) -> Self {
        self.script(
            prefix,
            CommandOutput {
                code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        )
    }

    pub fn script(self, prefix: &str, output: CommandOutput) -> Self {
        self.script
            .lock()
            .expect("script lock")
            .push((prefix.to_string(), output));
        self
    }

    /// Every recorded invocation, in order.
    pub fn commands(&self) -> Vec<ProcessCommand> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Every recorded invocation rendered as a command line.
    pub fn lines(&self) -> Vec<String> {
        self.commands().iter().map(ToString::to_string).collect()
    }

    fn answer(&self, command: &ProcessCommand) -> CommandOutput {
        self.calls
            .lock()
            .expect("calls lock")
            .push(command.clone());
        let line = command.to_string();
        self.script
            .lock()
            .expect("script lock")
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput {
                code: Some(0),
                ..CommandOutput::default()
            })
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &ProcessCommand) -> io::Result<CommandOutput> {
        Ok(self.answer(command))
    }

    fn run_interactive(&self, command: &ProcessCommand) -> io::Result<Option<i32>> {
        Ok(self.answer(command).code)
    }
}

// ============================================================
// HTTP TRANSPORT
// ============================================================

/// A JSON request seen by `FakeTransport`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

/// HTTP transport answering from queued JSON responses and canned payloads.
#[derive(Debug, Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Value>>,
    payloads: Mutex<HashMap<String, Vec<u8>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    uploads: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next `post_json` response.
    pub fn reply(self, response: Value) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(response);
        self
    }

    /// Serve `bytes` for downloads of `url`.
    pub fn payload(self, url: &str, bytes: Vec<u8>) -> Self {
        self.payloads
            .lock()
            .expect("payloads lock")
            .insert(url.to_string(), bytes);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Uploads as `(url, source file)` pairs.
    pub fn uploads(&self) -> Vec<(String, PathBuf)> {
        self.uploads.lock().expect("uploads lock").clone()
    }
}

impl HttpTransport for FakeTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
    ) -> io::Result<Value> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(RecordedRequest {
                url: url.to_string(),
                headers: headers.to_vec(),
                body: body.clone(),
            });
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .ok_or_else(|| io::Error::other(format!("no scripted response for {url}")))
    }

    fn download(&self, url: &str, dest: &Path) -> io::Result<u64> {
        let bytes = self
            .payloads
            .lock()
            .expect("payloads lock")
            .get(url)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, url.to_string()))?;
        std::fs::write(dest, &bytes)?;
        Ok(bytes.len() as u64)
    }

    fn upload(&self, url: &str, src: &Path) -> io::Result<()> {
        self.uploads
            .lock()
            .expect("uploads lock")
            .push((url.to_string(), src.to_path_buf()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_scripted_prefix_when_running_then_first_match_answers() {
        let runner = RecordingRunner::new()
            .respond("git tag", "7\n")
            .fail("git", Some(3), "boom");

        let tagged = runner.run(&ProcessCommand::new("git").arg("tag")).unwrap();
        let other = runner
            .run_interactive(&ProcessCommand::new("git").arg("push"))
            .unwrap();
        let dvc = runner.run(&ProcessCommand::new("dvc").arg("push")).unwrap();

        assert_eq!(tagged.stdout, "7\n");
        assert_eq!(other, Some(3));
        assert!(dvc.success());
        assert_eq!(runner.lines(), vec!["git tag", "git push", "dvc push"]);
    }
}
