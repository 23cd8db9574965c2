//! GraphQL request/response envelopes shared by the GraphQL-backed tools

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Clone)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: Value,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphQlError {
    /// Provider error code, if any (`extensions.code`).
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
    }
}

/// Join all error messages (with codes) into one line.
pub fn describe_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| match e.code() {
            Some(code) => format!("{} ({code})", e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl<T> GraphQlResponse<T> {
    /// Split into data or a joined error description.
    ///
    /// Errors win over partial data so callers never act on half a page.
    pub fn into_result(self) -> Result<T, String> {
        if !self.errors.is_empty() {
            return Err(describe_errors(&self.errors));
        }
        self.data
            .ok_or_else(|| "GraphQL response contained neither data nor errors".to_string())
    }
}
