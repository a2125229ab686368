use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use futures::future::try_join_all;
use regex::Regex;
use tracing::{debug, instrument};

use crate::host::{HostError, MailboxApi, MessagePart, MessageQuery};

/// Number of sent messages used as style examples.
pub const SENT_HISTORY_LIMIT: usize = 10;

// Constant pattern, checked by `angle_address_pattern_compiles`.
static ANGLE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^<>]+)>").expect("angle address pattern is valid"));

/// Address of the first recipient, from either `Name <addr>` or a bare
/// address.
pub fn first_recipient_address(recipients: &[String]) -> Option<String> {
    let recipient = recipients.first()?.trim();
    if recipient.is_empty() {
        return None;
    }
    let bracketed = ANGLE_ADDRESS
        .captures(recipient)
        .and_then(|captures| captures.get(1))
        .map(|address| address.as_str().to_string());
    Some(bracketed.unwrap_or_else(|| recipient.to_string()))
}

/// Text content of a MIME tree. Plain-text parts are preferred; HTML parts are
/// used only when no plain text is found anywhere in the tree.
pub fn content_from_parts(parts: &[MessagePart]) -> String {
    let plain = collect_parts(parts, "text/plain");
    if !plain.trim().is_empty() {
        return plain;
    }
    collect_parts(parts, "text/html")
}

fn collect_parts(parts: &[MessagePart], content_type: &str) -> String {
    parts
        .iter()
        .map(|part| {
            if part.content_type == content_type {
                part.body.clone().unwrap_or_default()
            } else {
                collect_parts(&part.parts, content_type)
            }
        })
        .collect()
}

/// Minimal HTML rendition of plain text for HTML-mode compose windows.
pub fn text_to_html(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace("\n\n", "</p><p>")
        .replace('\n', "<br>");
    format!("<p>{escaped}</p>")
}

// --- Sent-Mail History ---

/// Previously sent messages to a recipient, newest first, as plain text.
#[async_trait]
pub trait SentMessageSource: Send + Sync {
    async fn sent_messages(&self, recipient: &str) -> Result<Vec<String>, HostError>;
}

/// Reads history from the sent folder of the first account that has one.
pub struct MailboxHistory {
    mailbox: Arc<dyn MailboxApi>,
    limit: usize,
}

impl MailboxHistory {
    pub fn new(mailbox: Arc<dyn MailboxApi>) -> Self {
        Self {
            mailbox,
            limit: SENT_HISTORY_LIMIT,
        }
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl SentMessageSource for MailboxHistory {
    #[instrument(skip(self))]
    async fn sent_messages(&self, recipient: &str) -> Result<Vec<String>, HostError> {
        let accounts = self.mailbox.accounts().await?;
        let sent_folder = accounts
            .into_iter()
            .find_map(|account| account.folders.into_iter().find(|folder| folder.kind.as_deref() == Some("sent")));
        let Some(folder) = sent_folder else {
            debug!("No account with a sent folder.");
            return Ok(Vec::new());
        };

        let query = MessageQuery {
            recipients: recipient.to_string(),
            folder,
            from_me: true,
        };
        let mut headers = self.mailbox.query_messages(&query).await?;
        headers.sort_by(|a, b| b.date.cmp(&a.date));
        headers.truncate(self.limit);

        let messages = try_join_all(headers.iter().map(|header| self.mailbox.full_message(header.id))).await?;
        let contents: Vec<String> = messages
            .iter()
            .map(|message| content_from_parts(&message.parts))
            .filter(|content| !content.is_empty())
            .collect();
        debug!(count = contents.len(), "Collected sent messages.");
        Ok(contents)
    }
}

/// History source for hosts without mailbox access.
pub struct NoHistory;

#[async_trait]
impl SentMessageSource for NoHistory {
    async fn sent_messages(&self, _recipient: &str) -> Result<Vec<String>, HostError> {
        Ok(Vec::new())
    }
}
