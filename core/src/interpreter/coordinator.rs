//! Execution coordinator
//!
//! Drives one request through rewrite → run → fallback → render:
//!
//! 1. Rewrite the script so its trailing expression is returned.
//! 2. Run the candidate in a fresh sandbox.
//! 3. If the candidate fails and differs from the original, run the original
//!    in a clean sandbox. Both attempts print into the same output sink, so
//!    nothing printed before a failure is lost.
//! 4. Render the first returned value, if any and not nil.
//!
//! Script failures never escape as Rust errors; they are reported in the
//! response's `error` field together with the output captured so far.

use super::output::OutputSink;
use super::rewriter::rewrite;
use super::sandbox::{Sandbox, SandboxOptions};
use super::serializer::render;
use super::values::Val;
use crate::types::{ExecutionRequest, ExecutionResponse};
use std::borrow::Cow;
use tracing::{debug, info};

/// Executes requests, each in its own sandbox.
///
/// Holds no per-request state, so one coordinator can serve any number of
/// requests, from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    options: SandboxOptions,
}

impl Coordinator {
    pub fn new(options: SandboxOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SandboxOptions {
        &self.options
    }

    /// Execute a request. Always produces a response.
    pub fn execute(&self, request: &ExecutionRequest) -> ExecutionResponse {
        info!(
            bytes = request.script.len(),
            variables = request.variables.len(),
            "executing script"
        );

        let sink = OutputSink::new();
        let candidate = rewrite(&request.script);
        let rewritten = matches!(candidate, Cow::Owned(_));

        let outcome = match self.attempt(&candidate, request, &sink) {
            Err(err) if rewritten => {
                debug!(error = %err, "inferred return failed, running original script");
                self.attempt(&request.script, request, &sink)
            }
            outcome => outcome,
        };

        respond(outcome, sink.snapshot())
    }

    /// Run `source` in a sandbox that lives only for this call, printing
    /// into the request's sink.
    fn attempt(
        &self,
        source: &str,
        request: &ExecutionRequest,
        sink: &OutputSink,
    ) -> mlua::Result<Val> {
        Sandbox::new(&self.options, &request.variables, sink.clone())
            .and_then(|sandbox| sandbox.run(source))
    }
}

fn respond(outcome: mlua::Result<Val>, logs: Vec<String>) -> ExecutionResponse {
    let mut response = ExecutionResponse {
        logs,
        ..ExecutionResponse::default()
    };

    match outcome {
        Ok(value) if !value.is_nil() => response.result = Some(render(&value)),
        Ok(_) => {}
        Err(err) => {
            debug!(error = %err, "script failed");
            response.error = Some(error_text(&err));
        }
    }

    response
}

/// The interpreter's own message, without mlua's error-kind prefix.
fn error_text(err: &mlua::Error) -> String {
    match err {
        mlua::Error::RuntimeError(message) => message.clone(),
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        mlua::Error::CallbackError { cause, .. } => error_text(cause),
        other => other.to_string(),
    }
}

/// Execute with default sandbox options.
pub fn execute(request: &ExecutionRequest) -> ExecutionResponse {
    Coordinator::default().execute(request)
}
