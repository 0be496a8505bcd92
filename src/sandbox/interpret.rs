use serde::Serialize;
use serde_json::Value;

use super::client::SandboxError;
use super::hints::hints_for;
use super::wire::{ExecuteResponse, unwrap_envelope};

/// Classified result of one "Run".
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    CompileFailure {
        stderr: String,
        exit_code: Option<i64>,
    },
    RuntimeFailure {
        stdout: String,
        stderr: String,
        exit_code: Option<i64>,
        hints: Vec<String>,
    },
    Success {
        stdout: String,
    },
    TransportError {
        message: String,
    },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// One-line summary for the output panel.
    pub fn headline(&self) -> &'static str {
        match self {
            Self::CompileFailure { .. } => "Compilation failed",
            Self::RuntimeFailure { .. } => "Runtime error",
            Self::Success { .. } => "Finished",
            Self::TransportError { .. } => "Could not run the code",
        }
    }

    fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }
}

/// Turns a sandbox response into an [`ExecutionOutcome`].
///
/// The classification depends only on the response fields. The top-level
/// `success` flag is consulted only when neither stage is present.
pub fn interpret(response: Result<Value, SandboxError>) -> ExecutionOutcome {
    let value = match response {
        Ok(value) => unwrap_envelope(value),
        Err(e) => {
            log::warn!("Execution request failed: {e}");
            return ExecutionOutcome::transport(e.to_string());
        }
    };

    let parsed: ExecuteResponse = match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Execution response has an unexpected shape: {e}");
            return ExecutionOutcome::transport("The execution service returned an unexpected response.");
        }
    };

    if parsed.compile.is_none() && parsed.run.is_none() {
        let message = match (parsed.success, parsed.message) {
            (_, Some(message)) if !message.is_empty() => message,
            (Some(false), _) => "The execution service reported a failure.".to_string(),
            _ => "The execution service returned no output.".to_string(),
        };
        return ExecutionOutcome::transport(message);
    }

    if let Some(compile) = parsed.compile
        && (!compile.stderr.is_empty() || compile.failed())
    {
        // Some compilers report diagnostics on stdout
        let stderr = if compile.stderr.is_empty() {
            compile.stdout
        } else {
            compile.stderr
        };
        return ExecutionOutcome::CompileFailure {
            stderr,
            exit_code: compile.code,
        };
    }

    let Some(run) = parsed.run else {
        return ExecutionOutcome::transport("The execution service returned no run output.");
    };

    if !run.stderr.is_empty() {
        let hints = hints_for(&run.stderr);
        return ExecutionOutcome::RuntimeFailure {
            stdout: run.stdout,
            stderr: run.stderr,
            exit_code: run.code,
            hints,
        };
    }

    if run.failed() {
        return ExecutionOutcome::RuntimeFailure {
            stdout: run.stdout,
            stderr: run.stderr,
            exit_code: run.code,
            hints: Vec::new(),
        };
    }

    ExecutionOutcome::Success { stdout: run.stdout }
}
