use std::path::PathBuf;

use async_trait::async_trait;
use draftwise_core::cancel::CancellationSignal;
use draftwise_core::chat::{
    build_request_body, classify_response, require_model, LlmConnection, LlmError, LlmMessage, LlmResponse,
};
use draftwise_core::options::PluginOptions;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error, instrument, trace};
use url::Url;

use super::exchange_log::{ExchangeLog, RecordedExchange};

/// LLM connection speaking the chat-completions protocol over HTTP.
///
/// No request timeout is configured: local inference may legitimately take
/// minutes. Requests end on response, on error, or on cancellation.
#[derive(Clone, Debug)]
pub struct HttpLlmConnection {
    http_client: Client,
    exchange_log: Option<ExchangeLog>,
}

impl HttpLlmConnection {
    /// Creates a connection with a default HTTP client.
    pub fn new() -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| LlmError::Network(Box::new(e)))?;
        Ok(Self::with_client(http_client))
    }

    pub fn with_client(http_client: Client) -> Self {
        Self {
            http_client,
            exchange_log: None,
        }
    }

    /// Records every exchange as a JSON file in `dir`.
    #[must_use]
    pub fn exchange_log(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exchange_log = Some(ExchangeLog::new(dir));
        self
    }

    /// Performs the POST and classifies the answer. Not cancellation-aware;
    /// the caller races it against the signal.
    async fn exchange(
        &self,
        model: &str,
        url: &Url,
        body: &Value,
        token: Option<&SecretString>,
    ) -> Result<LlmResponse, LlmError> {
        let mut request = self
            .http_client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        trace!(request_body = %body, "Sending LLM request.");
        let response = request.send().await.map_err(|e| {
            error!(error = %e, "LLM request failed.");
            LlmError::Network(Box::new(e))
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(|e| LlmError::Network(Box::new(e)))?;
        debug!(%status, len = text.len(), "LLM response received.");

        if let Some(log) = &self.exchange_log {
            let exchange = RecordedExchange {
                url,
                body,
                authorized: token.is_some(),
                status,
                headers: &headers,
                response_text: &text,
            };
            log.record(&exchange).await;
        }

        if !status.is_success() {
            // The endpoint as configured, unnormalized.
            return Err(LlmError::Http {
                url: model.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        let value: Value = serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, body = %text, "LLM response is not JSON.");
            LlmError::Parsing(Box::new(e))
        })?;
        classify_response(value)
    }
}

fn cancelled(signal: &CancellationSignal) -> LlmError {
    LlmError::Cancelled {
        reason: signal.reason().unwrap_or_else(|| "Request cancelled".to_string()),
    }
}

#[async_trait]
impl LlmConnection for HttpLlmConnection {
    #[instrument(name = "http_llm_send", skip_all, fields(messages = messages.len()))]
    async fn send(
        &self,
        messages: &[LlmMessage],
        options: &PluginOptions,
        signal: &CancellationSignal,
    ) -> Result<LlmResponse, LlmError> {
        let model = require_model(options)?;
        let url = Url::parse(model).map_err(|e| LlmError::InvalidModelUrl {
            url: model.to_string(),
            reason: e.to_string(),
        })?;
        let body = build_request_body(messages, &options.params)?;
        let token = options.api_token().map(|token| SecretString::from(token.to_string()));

        if signal.is_cancelled() {
            return Err(cancelled(signal));
        }

        tokio::select! {
            biased;
            _ = signal.cancelled() => {
                debug!(%url, "LLM request cancelled.");
                Err(cancelled(signal))
            }
            result = self.exchange(model, &url, &body, token.as_ref()) => result,
        }
    }
}
