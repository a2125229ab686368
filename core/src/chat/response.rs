use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use super::error::LlmError;
use super::LlmRole;

// --- Completion Payload ---

/// Successful completion returned by a chat-completions endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TextCompletion {
    pub id: String,
    #[serde(default)]
    pub created: Option<u64>,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl TextCompletion {
    /// Text of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|choice| choice.message.content.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChoiceMessage {
    #[serde(default = "assistant_role")]
    pub role: LlmRole,
    #[serde(default)]
    pub content: String,
}

fn assistant_role() -> LlmRole {
    LlmRole::Assistant
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

// --- Upstream Error Payload ---

/// Error-shaped body, `{ "error": { "message", "type", "code"? } }`.
///
/// Upstream servers send this with any status code, including 200.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UpstreamError {
    #[serde(default)]
    pub error: UpstreamErrorDetail,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UpstreamErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
}

impl UpstreamError {
    /// Reads an error body leniently. Some servers send `error` as a bare
    /// string next to an `error_type` field; anything else unrecognized is
    /// surfaced verbatim as the message.
    fn from_value(body: Value) -> Self {
        match body.get("error") {
            Some(Value::Object(_)) => serde_json::from_value(body.clone()).unwrap_or_else(|_| Self::verbatim(&body)),
            Some(Value::String(message)) => Self {
                error: UpstreamErrorDetail {
                    message: message.clone(),
                    kind: body.get("error_type").and_then(Value::as_str).unwrap_or_default().to_string(),
                    code: None,
                },
            },
            _ => Self::verbatim(&body),
        }
    }

    fn verbatim(body: &Value) -> Self {
        Self {
            error: UpstreamErrorDetail {
                message: body.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }
}

// --- Classification ---

/// A parsed LLM response body.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmResponse {
    Completion(TextCompletion),
    Error(UpstreamError),
}

/// Classifies a JSON body by structure: an `id` field marks a completion,
/// anything else is treated as an error payload. The HTTP status plays no
/// part.
pub fn classify_response(body: Value) -> Result<LlmResponse, LlmError> {
    if body.get("id").is_some() {
        trace!("Response carries an id, parsing as completion.");
        let completion = serde_json::from_value(body).map_err(|e| LlmError::Parsing(Box::new(e)))?;
        Ok(LlmResponse::Completion(completion))
    } else {
        trace!("Response has no id, treating as error payload.");
        Ok(LlmResponse::Error(UpstreamError::from_value(body)))
    }
}
