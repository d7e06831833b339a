//! Test helpers for interpreter tests

use crate::interpreter::execute;
use crate::types::{ExecutionRequest, ExecutionResponse};
use std::collections::HashMap;

/// Execute a script with no variables and default sandbox options.
pub fn run(script: &str) -> ExecutionResponse {
    execute(&ExecutionRequest::new(script))
}

/// Execute a script with the given variables.
pub fn run_with(script: &str, variables: HashMap<String, String>) -> ExecutionResponse {
    execute(&ExecutionRequest::new(script).with_variables(variables))
}

/// Assert success and return the rendered result.
pub fn result_of(response: &ExecutionResponse) -> &str {
    assert!(
        response.error.is_none(),
        "unexpected error: {:?}",
        response.error
    );
    response
        .result
        .as_deref()
        .unwrap_or_else(|| unreachable!("expected a result, got {:?}", response))
}

/// Assert failure and return the error message.
pub fn error_of(response: &ExecutionResponse) -> &str {
    assert!(response.result.is_none(), "unexpected result: {:?}", response.result);
    response
        .error
        .as_deref()
        .unwrap_or_else(|| unreachable!("expected an error, got {:?}", response))
}
