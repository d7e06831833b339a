use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A script to execute together with the string globals it can read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionRequest {
    pub script: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

impl ExecutionRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            variables: HashMap::new(),
        }
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }
}

/// Outcome of one execution.
///
/// Script failures are reported through `error`; the response itself is
/// always produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub logs: Vec<String>,

    /// Wall-clock time measured by the caller; the coordinator leaves it at 0.
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl ExecutionResponse {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
