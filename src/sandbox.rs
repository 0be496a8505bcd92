mod client;
mod hints;
mod interpret;
mod stdin_guard;
mod wire;

pub use client::{SandboxClient, SandboxError};
pub use hints::{EXCEPTION_HINTS, EXPECTED_MORE_INPUT, hints_for};
pub use interpret::{ExecutionOutcome, interpret};
pub use stdin_guard::{InputRequired, check_stdin};
pub use wire::{ExecuteRequest, ExecuteResponse, SourceFile, Stage, unwrap_envelope};

use crate::language::LanguageProfile;

/// Builds the request for a "Run", or short-circuits when the program would
/// starve for input.
pub fn prepare_run(
    language: &LanguageProfile,
    code: &str,
    stdin: &str,
) -> Result<ExecuteRequest, InputRequired> {
    check_stdin(code, language, stdin)?;
    Ok(ExecuteRequest::new(language, code, stdin))
}

/// Executes `request` remotely and classifies the response.
///
/// # Errors
///
/// Returns [`SandboxError::MissingCredential`] when the client must send a key
/// but has none. That is a deployment fault rather than a transient failure,
/// so it is not folded into the outcome.
pub async fn execute(
    client: &SandboxClient,
    request: &ExecuteRequest,
) -> Result<ExecutionOutcome, SandboxError> {
    match client.execute(request).await {
        Err(SandboxError::MissingCredential) => Err(SandboxError::MissingCredential),
        response => Ok(interpret(response)),
    }
}
