//! Scripted command runner for tests
//!
//! `ScriptedRunner` records every invocation and answers with canned
//! results chosen by command-line prefix. Commands without a matching rule
//! succeed with empty output.

use std::sync::Mutex;

use super::{CommandOutput, CommandRunner, Invocation, ProcessError};

#[derive(Debug, Clone)]
enum Scripted {
    Exit(CommandOutput),
    SpawnFailure(String),
}

#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<(String, Scripted)>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_rule(&self, prefix: &str, response: Scripted) {
        self.rules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((prefix.to_string(), response));
    }

    /// Commands starting with `prefix` exit 0 and print `stdout`
    pub fn respond(&self, prefix: &str, stdout: &str) {
        self.push_rule(
            prefix,
            Scripted::Exit(CommandOutput {
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
        );
    }

    /// Commands starting with `prefix` exit with `code` and print `stderr`
    pub fn fail(&self, prefix: &str, code: i32, stderr: &str) {
        self.push_rule(
            prefix,
            Scripted::Exit(CommandOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
        );
    }

    /// Commands starting with `prefix` cannot be started at all
    pub fn fail_to_spawn(&self, prefix: &str) {
        self.push_rule(prefix, Scripted::SpawnFailure(prefix.to_string()));
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    pub fn was_invoked(&self, prefix: &str) -> bool {
        self.command_lines().iter().any(|line| line.starts_with(prefix))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(invocation.clone());

        let line = invocation.to_string();
        let rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());

        // Later rules override earlier ones
        let matched = rules
            .iter()
            .rev()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, response)| response.clone());

        match matched {
            Some(Scripted::Exit(output)) => Ok(output),
            Some(Scripted::SpawnFailure(program)) => Err(ProcessError::Spawn {
                command: line,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{program}: command not found"),
                ),
            }),
            None => Ok(CommandOutput {
                code: Some(0),
                ..CommandOutput::default()
            }),
        }
    }
}
