//! Probe command execution
//!
//! Checks describe their probes as shell snippets (`ps -ef | grep kubelet`,
//! `stat -c permissions=%a /etc/kubernetes/admin.conf`). A [`ProbeExecutor`]
//! turns such a snippet into its output; the rule engine never spawns
//! processes itself.

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, trace};

use crate::error::ProbeError;

/// Default shell used to run probes
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Runs probe commands and returns their output
pub trait ProbeExecutor: Send + Sync {
    /// Run one probe. An empty command yields an empty output.
    fn run(&self, command: &str) -> Result<String, ProbeError>;
}

/// Runs probes through a shell, feeding the script on stdin
#[derive(Debug, Clone)]
pub struct ShellProbe {
    shell: String,
}

impl ShellProbe {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellProbe {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl ProbeExecutor for ShellProbe {
    fn run(&self, command: &str) -> Result<String, ProbeError> {
        if command.trim().is_empty() {
            return Ok(String::new());
        }

        let spawn_error = |e: std::io::Error| ProbeError::Spawn {
            command: command.to_string(),
            message: e.to_string(),
        };

        let mut child = Command::new(&self.shell)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Feed the script while the output is drained, so neither pipe can fill up
        let stdin = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(command.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });
        let output = output.map_err(spawn_error)?;

        match written {
            Ok(Ok(())) => {}
            // The shell may exit before reading the whole script
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                debug!(command, "Shell exited before reading the whole probe");
            }
            Ok(Err(e)) => return Err(spawn_error(e)),
            Err(_) => {
                return Err(ProbeError::Spawn {
                    command: command.to_string(),
                    message: "stdin writer panicked".to_string(),
                })
            }
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        trace!(command, output = %combined, "Probe finished");

        if output.status.success() {
            Ok(combined)
        } else {
            debug!(command, code = ?output.status.code(), "Probe failed");
            Err(ProbeError::Failed {
                command: command.to_string(),
                output: combined,
                code: output.status.code(),
            })
        }
    }
}

/// Serves canned probe results, keyed by command text
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    results: HashMap<String, Result<String, ProbeError>>,
}

impl StaticProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with `output`
    pub fn with_output(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.results.insert(command.into(), Ok(output.into()));
        self
    }

    /// Answer `command` with a failed exit
    pub fn with_failure(
        mut self,
        command: impl Into<String>,
        output: impl Into<String>,
        code: i32,
    ) -> Self {
        let command = command.into();
        let err = ProbeError::Failed {
            command: command.clone(),
            output: output.into(),
            code: Some(code),
        };
        self.results.insert(command, Err(err));
        self
    }
}

impl ProbeExecutor for StaticProbe {
    fn run(&self, command: &str) -> Result<String, ProbeError> {
        if command.trim().is_empty() {
            return Ok(String::new());
        }
        match self.results.get(command) {
            Some(result) => result.clone(),
            None => Err(ProbeError::Failed {
                command: command.to_string(),
                output: String::new(),
                code: Some(127),
            }),
        }
    }
}
