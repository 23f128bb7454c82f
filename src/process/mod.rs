//! External command execution.
//!
//! Every tool this bot drives (certbot, nginx, systemctl, chown, chmod) is
//! invoked through [`CommandRunner`]. Invocations are synchronous: the
//! calling thread blocks until the child exits.

use std::fmt;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

pub mod fakes;

/// A program plus its argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the child was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Text worth logging when the command failed: stderr, or stdout if
    /// the tool wrote nothing to stderr.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }

    fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed ({status}): {diagnostic}")]
    NonZeroExit {
        command: String,
        status: String,
        diagnostic: String,
    },
}

impl ProcessError {
    pub fn diagnostic(&self) -> String {
        match self {
            ProcessError::Spawn { source, .. } => source.to_string(),
            ProcessError::NonZeroExit { diagnostic, .. } => diagnostic.clone(),
        }
    }
}

pub trait CommandRunner {
    /// Run the invocation to completion.
    ///
    /// Returns `Err` only when the process could not be started; a non-zero
    /// exit is reported through [`CommandOutput::code`].
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError>;

    /// Like [`run`](Self::run), but a non-zero exit becomes
    /// [`ProcessError::NonZeroExit`].
    fn run_checked(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        let output = self.run(invocation)?;
        if output.success() {
            Ok(output)
        } else {
            Err(ProcessError::NonZeroExit {
                command: invocation.to_string(),
                status: output.status_text(),
                diagnostic: output.diagnostic().to_string(),
            })
        }
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        (**self).run(invocation)
    }
}

/// Runs commands on the host with `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        debug!("Running: {}", invocation);

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|source| ProcessError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
