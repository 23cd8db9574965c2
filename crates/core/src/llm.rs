//! Prompt assembly and validation of LLM-produced artifacts

use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LlmOutputError {
    #[error("Model returned an empty response")]
    Empty,

    #[error("Response is too short: {output_len} chars for {input_len} chars of input (minimum ratio {min_ratio})")]
    TooShort {
        output_len: usize,
        input_len: usize,
        min_ratio: f64,
    },

    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Response JSON must be an object")]
    NotAnObject,

    #[error("Response JSON is missing required field '{0}'")]
    MissingField(String),
}

/// Validation applied to a raw model response before it becomes an artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    /// Reject responses shorter than `input_len * min_length_ratio` characters.
    /// `0.0` disables the check.
    pub min_length_ratio: f64,
    /// When set, the response must be a JSON object containing these fields.
    pub required_json_fields: Option<Vec<String>>,
}

impl Default for Validation {
    fn default() -> Self {
        Self {
            min_length_ratio: 0.5,
            required_json_fields: None,
        }
    }
}

impl Validation {
    pub fn json(fields: &[&str]) -> Self {
        Self {
            min_length_ratio: 0.0,
            required_json_fields: Some(fields.iter().map(|f| f.to_string()).collect()),
        }
    }
}

/// Combine an instruction and the item content into a single prompt.
pub fn build_prompt(instruction: &str, content: &str) -> String {
    format!(
        "{}\n\n<input>\n{}\n</input>",
        instruction.trim(),
        content.trim_end()
    )
}

/// Remove a single Markdown code fence wrapping the whole response.
///
/// Models often answer with ```` ```lang ... ``` ```` even when told not to.
/// Text outside a leading fence is left alone.
pub fn strip_fence(response: &str) -> String {
    let trimmed = response.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    // Drop the info string (language tag) on the opening line.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        // One-line fence: ```body```. A lone opening line holds no body.
        None => {
            return rest
                .strip_suffix("```")
                .map(|inner| inner.trim().to_string())
                .unwrap_or_default()
        }
    };

    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);

    body.trim_matches('\n').to_string()
}

/// Validate a raw response against `validation`, returning the cleaned text.
pub fn validate_response(
    input: &str,
    response: &str,
    validation: &Validation,
) -> Result<String, LlmOutputError> {
    let cleaned = strip_fence(response);

    if cleaned.trim().is_empty() {
        return Err(LlmOutputError::Empty);
    }

    let input_len = input.trim().chars().count();
    let output_len = cleaned.chars().count();
    if validation.min_length_ratio > 0.0
        && (output_len as f64) < input_len as f64 * validation.min_length_ratio
    {
        return Err(LlmOutputError::TooShort {
            output_len,
            input_len,
            min_ratio: validation.min_length_ratio,
        });
    }

    if let Some(fields) = &validation.required_json_fields {
        let value: Value = serde_json::from_str(&cleaned)
            .map_err(|e| LlmOutputError::InvalidJson(e.to_string()))?;
        let object = value.as_object().ok_or(LlmOutputError::NotAnObject)?;
        if let Some(missing) = fields.iter().find(|f| !object.contains_key(f.as_str())) {
            return Err(LlmOutputError::MissingField(missing.clone()));
        }
    }

    Ok(cleaned)
}
