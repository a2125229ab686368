use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Local;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

pub const EXCHANGE_FILE_PREFIX: &str = "request-response-";

const MASKED: &str = "***";

const MAX_NAME_ATTEMPTS: usize = 1000;

/// Writes each LLM request/response pair to its own JSON file.
///
/// Recording is best effort: failures are logged and never reach the caller.
#[derive(Clone, Debug)]
pub struct ExchangeLog {
    dir: PathBuf,
}

pub(super) struct RecordedExchange<'a> {
    pub url: &'a Url,
    pub body: &'a Value,
    pub authorized: bool,
    pub status: StatusCode,
    pub headers: &'a HeaderMap,
    pub response_text: &'a str,
}

impl ExchangeLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub(super) async fn record(&self, exchange: &RecordedExchange<'_>) {
        let document = exchange_document(exchange);
        let text = match serde_json::to_string_pretty(&document) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Could not serialize LLM exchange.");
                return;
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(error = %e, dir = %self.dir.display(), "Could not create exchange log directory.");
            return;
        }
        let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
        match self.write_unique(&stamp, text.as_bytes()).await {
            Ok(path) => debug!(path = %path.display(), "LLM exchange recorded."),
            Err(e) => warn!(error = %e, dir = %self.dir.display(), "Could not write LLM exchange."),
        }
    }

    /// Writes to `<prefix><stamp>.json`, or `<prefix><stamp>-N.json` when
    /// earlier exchanges already took the name.
    async fn write_unique(&self, stamp: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = match attempt {
                0 => format!("{EXCHANGE_FILE_PREFIX}{stamp}.json"),
                n => format!("{EXCHANGE_FILE_PREFIX}{stamp}-{n}.json"),
            };
            let path = self.dir.join(file_name);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            };
            file.write_all(contents).await?;
            file.flush().await?;
            return Ok(path);
        }
        Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free exchange file name for {stamp}"),
        ))
    }
}

fn exchange_document(exchange: &RecordedExchange<'_>) -> Value {
    let mut request_headers = Map::new();
    request_headers.insert("Content-Type".into(), json!("application/json"));
    if exchange.authorized {
        request_headers.insert("Authorization".into(), json!(MASKED));
    }

    let response_headers: Map<String, Value> = exchange
        .headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or_default();
            (name.as_str().to_string(), json!(value))
        })
        .collect();

    // Non-JSON bodies are kept as text.
    let response_body = serde_json::from_str::<Value>(exchange.response_text)
        .unwrap_or_else(|_| Value::String(exchange.response_text.to_string()));

    json!({
        "request": {
            "url": exchange.url.path(),
            "method": "POST",
            "headers": request_headers,
            "body": exchange.body,
        },
        "response": {
            "status": exchange.status.as_u16(),
            "statusText": exchange.status.canonical_reason().unwrap_or_default(),
            "headers": response_headers,
            "body": response_body,
        },
    })
}
