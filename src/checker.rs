use crate::config::CheckerConfig;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Everything a checker printed for one snippet.
///
/// The exit code is informational only: style checkers exit non-zero
/// whenever they report findings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckerOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Failure to run the checker at all.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("checker '{command}' not found")]
    NotFound { command: String },

    #[error("checker '{command}' could not be executed: {source}")]
    NotExecutable {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Failure talking to a checker that did start.
    #[error("I/O error while running checker '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("checker '{command}' timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u128 },
}

impl CheckerError {
    /// Whether no snippet anywhere can be checked after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NotExecutable { .. })
    }
}

/// A style checker that reads source text and reports on it.
///
/// [`CommandChecker`] is the real implementation; tests substitute fakes.
pub trait Checker: Send + Sync {
    fn check<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<CheckerOutput, CheckerError>>;
}

/// Runs an external checker process, feeding the snippet on stdin.
///
/// The command line is `<command> [isolated_flag] <args...>`.
#[derive(Debug, Clone)]
pub struct CommandChecker {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandChecker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    pub fn from_config(config: &CheckerConfig) -> Self {
        let mut args = Vec::with_capacity(config.args.len() + 1);
        if config.isolated {
            args.push(config.isolated_flag.clone());
        }
        args.extend(config.args.iter().cloned());

        Self {
            program: config.command.clone(),
            args,
            timeout: config
                .timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    async fn run(&self, source: &str) -> Result<CheckerOutput, CheckerError> {
        match self.timeout {
            None => self.run_to_completion(source).await,
            Some(timeout) => tokio::time::timeout(timeout, self.run_to_completion(source))
                .await
                .unwrap_or_else(|_| {
                    Err(CheckerError::Timeout {
                        command: self.program.clone(),
                        timeout_ms: timeout.as_millis(),
                    })
                }),
        }
    }

    async fn run_to_completion(&self, source: &str) -> Result<CheckerOutput, CheckerError> {
        log::trace!("Running {} {:?}", self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut stdin = child.stdin.take().ok_or_else(|| CheckerError::Io {
            command: self.program.clone(),
            source: io::Error::other("stdin was not captured"),
        })?;

        // Feed stdin while draining stdout/stderr so neither pipe can fill up.
        let feed = async move {
            stdin.write_all(source.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (fed, output) = futures::join!(feed, child.wait_with_output());

        match fed {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(self.io_error(e)),
            _ => {}
        }
        let output = output.map_err(|e| self.io_error(e))?;

        if !output.status.success() {
            log::debug!("{} exited with {}", self.program, output.status);
        }

        Ok(CheckerOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }

    /// Every spawn failure other than a missing binary is `NotExecutable`.
    fn spawn_error(&self, source: io::Error) -> CheckerError {
        let command = self.program.clone();
        match source.kind() {
            io::ErrorKind::NotFound => CheckerError::NotFound { command },
            _ => CheckerError::NotExecutable { command, source },
        }
    }

    fn io_error(&self, source: io::Error) -> CheckerError {
        CheckerError::Io {
            command: self.program.clone(),
            source,
        }
    }
}

impl Checker for CommandChecker {
    fn check<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<CheckerOutput, CheckerError>> {
        self.run(source).boxed()
    }
}
