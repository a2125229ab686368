use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::cancel::CancellationSignal;
use crate::options::PluginOptions;

pub mod error;
pub mod response;

pub use error::LlmError;
pub use response::{classify_response, Choice, ChoiceMessage, LlmResponse, TextCompletion, UpstreamError, Usage};

/// Sends a message sequence to the configured LLM endpoint.
///
/// Implementations perform exactly one request per call, fail with
/// [`LlmError::MissingModel`] before touching the network when no model is
/// configured, and return [`LlmError::Cancelled`] as soon as `signal` fires.
#[async_trait]
pub trait LlmConnection: Send + Sync {
    async fn send(
        &self,
        messages: &[LlmMessage],
        options: &PluginOptions,
        signal: &CancellationSignal,
    ) -> Result<LlmResponse, LlmError>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn system<T: Into<String>>(content: T) -> Self {
        Self {
            role: LlmRole::System,
            content: content.into(),
        }
    }
    pub fn user<T: Into<String>>(content: T) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

/// Returns the configured endpoint, or [`LlmError::MissingModel`] when it is
/// empty or blank.
pub fn require_model(options: &PluginOptions) -> Result<&str, LlmError> {
    let model = options.model.trim();
    if model.is_empty() {
        return Err(LlmError::MissingModel);
    }
    Ok(model)
}

/// Builds `{ messages, ...params }`.
///
/// Every parameter is passed through verbatim except `messages`, which would
/// otherwise replace the prompt.
pub fn build_request_body(messages: &[LlmMessage], params: &Map<String, Value>) -> Result<Value, LlmError> {
    let mut body = Map::with_capacity(params.len() + 1);
    for (key, value) in params {
        if key == "messages" {
            warn!("Ignoring 'messages' entry in generation parameters.");
            continue;
        }
        body.insert(key.clone(), value.clone());
    }
    let messages = serde_json::to_value(messages).map_err(|e| LlmError::Parsing(Box::new(e)))?;
    body.insert("messages".to_string(), messages);
    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn blank_model_is_rejected() {
        let mut options = PluginOptions::default();
        assert!(matches!(require_model(&options), Err(LlmError::MissingModel)));

        options.model = "   ".into();
        let err = require_model(&options).unwrap_err();
        assert!(err.to_string().contains("Missing LLM model"));
        assert!(err.to_string().contains("set it in the options panel"));

        options.model = " http://localhost:8080/v1/chat/completions ".into();
        assert_eq!(require_model(&options).unwrap(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn body_spreads_params_next_to_messages() {
        let mut params = Map::new();
        params.insert("temperature".into(), json!(0.7));
        params.insert("model".into(), json!("tgi"));
        params.insert("messages".into(), json!("should not win"));

        let body = build_request_body(&[LlmMessage::system("ctx"), LlmMessage::user("hi")], &params).unwrap();
        assert_eq!(
            body,
            json!({
                "temperature": 0.7,
                "model": "tgi",
                "messages": [
                    {"role": "system", "content": "ctx"},
                    {"role": "user", "content": "hi"}
                ]
            })
        );
    }
}
