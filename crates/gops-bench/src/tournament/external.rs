use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use gops_core::statement::{MovePredictor, PredictError};
use thiserror::Error;
use tracing::{Level, event};

use crate::config::ExternalConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Move model living in a separate process.
///
/// Each prediction spawns the configured command, writes the state statement
/// as one line on stdin and reads the move token from the first non-empty
/// line of stdout. A process still running after `timeout_ms` is killed.
#[derive(Debug, Clone)]
pub struct ProcessModel {
    name: String,
    options: ExternalConfig,
}

impl ProcessModel {
    pub fn new(name: impl Into<String>, options: ExternalConfig) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, statement: &str) -> Result<String, ExternalInvokeError> {
        let command = self.options.command.trim();
        if command.is_empty() {
            return Err(ExternalInvokeError::NoCommand);
        }

        let mut cmd = Command::new(command);
        if !self.options.args.is_empty() {
            cmd.args(&self.options.args);
        }
        if let Some(dir) = &self.options.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped());

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|err| ExternalInvokeError::Spawn(err.to_string()))?;

        let (Some(mut stdin), Some(mut stdout)) = (child.stdin.take(), child.stdout.take()) else {
            reap(&mut child);
            return Err(ExternalInvokeError::Io("child pipes unavailable".into()));
        };
        let written = stdin
            .write_all(statement.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"));
        drop(stdin);
        if let Err(err) = written {
            reap(&mut child);
            return Err(ExternalInvokeError::Io(err.to_string()));
        }

        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let limit = Duration::from_millis(self.options.timeout_ms);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if start.elapsed() >= limit => {
                    reap(&mut child);
                    event!(
                        target: "gops_bench::external",
                        Level::WARN,
                        model = %self.name,
                        timeout_ms = self.options.timeout_ms,
                        "external model exceeded timeout; killed"
                    );
                    return Err(ExternalInvokeError::Timeout(self.options.timeout_ms));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(err) => {
                    reap(&mut child);
                    return Err(ExternalInvokeError::Io(err.to_string()));
                }
            }
        };

        let output = reader
            .join()
            .map_err(|_| ExternalInvokeError::Io("stdout reader panicked".into()))?
            .map_err(|err| ExternalInvokeError::Io(err.to_string()))?;

        if !status.success() {
            return Err(ExternalInvokeError::Status(format!("exit status {status}")));
        }

        event!(
            target: "gops_bench::external",
            Level::DEBUG,
            model = %self.name,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "external model answered"
        );

        let stdout = String::from_utf8(output)
            .map_err(|err| ExternalInvokeError::Protocol(err.to_string()))?;
        stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ExternalInvokeError::Protocol("empty response".into()))
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl MovePredictor for ProcessModel {
    fn predict(&mut self, statement: &str) -> Result<String, PredictError> {
        self.invoke(statement).map_err(|err| {
            event!(
                target: "gops_bench::external",
                Level::WARN,
                model = %self.name,
                error = %err,
                "external model request failed"
            );
            err.into()
        })
    }
}

#[derive(Debug, Error)]
enum ExternalInvokeError {
    #[error("no command configured")]
    NoCommand,
    #[error("failed to spawn process: {0}")]
    Spawn(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("non-zero exit status: {0}")]
    Status(String),
    #[error("no answer within {0} ms")]
    Timeout(u64),
}

impl From<ExternalInvokeError> for PredictError {
    fn from(err: ExternalInvokeError) -> Self {
        match err {
            ExternalInvokeError::Protocol(message) => PredictError::Protocol(message),
            other => PredictError::Unavailable(other.to_string()),
        }
    }
}
