//! Assembly of the message sequences sent to the LLM.
//!
//! All functions are pure. Signature and previous-conversation stripping use
//! literal first-occurrence replacement: if the signature text also appears
//! earlier in the body, that earlier occurrence is the one removed.

use thiserror::Error;

use crate::chat::LlmMessage;
use crate::options::PluginOptions;

/// Instruction used when the compose window has no usable text.
pub const DEFAULT_PROMPT: &str = "Schreib den Partnern, dass ich kündige, auf Deutsch.";

const HISTORY_PREAMBLE: &str = "\nFurthermore, here are some older messages to give you an idea of the style I'm writing in when talking to this person:\n";

const EMAIL_PROMPT_PREAMBLE: &str = "This is what the user wants to be the content of their email to be:\n";

const PREVIOUS_CONVERSATION_PREAMBLE: &str = "\nThis is the conversation the user is replying to. Keep its content in mind but do not include it in your suggestion:\n";

pub const SUBJECT_CONTEXT: &str = "You are an AI language model asked to write the subject line of an email.\n\
Reply with the subject line only, without quotes and without a \"Subject:\" prefix.\n";

const SUBJECT_PROMPT_PREAMBLE: &str = "Write a subject line for an email with the following content:\n";

pub const SUMMARY_CONTEXT: &str = "You are an AI language model asked to summarize an email conversation.\n\
Keep the summary concise and highlight any open points or questions that still need an answer.\n";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PromptError {
    #[error("No conversation found to summarize. Aborting.")]
    NothingToSummarize,
}

/// The parts of a compose window that feed a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftState {
    pub body: String,
    pub signature: Option<String>,
}

impl DraftState {
    pub fn new(body: impl Into<String>, signature: Option<String>) -> Self {
        Self {
            body: body.into(),
            signature,
        }
    }

    fn has_usable_text(&self) -> bool {
        !self.body.trim().is_empty()
    }

    /// Body with the first occurrence of the signature and then of the
    /// previous conversation removed, trimmed.
    fn cleaned_body(&self, previous_conversation: Option<&str>) -> String {
        let without_signature = match self.signature.as_deref() {
            Some(signature) if !signature.is_empty() => self.body.replacen(signature, "", 1),
            _ => self.body.clone(),
        };
        let without_previous = match previous_conversation {
            Some(previous) if !previous.is_empty() => without_signature.replacen(previous, "", 1),
            _ => without_signature,
        };
        without_previous.trim().to_string()
    }
}

fn history_block(history: &[String], options: &PluginOptions) -> String {
    if !options.include_recent_mails || history.is_empty() {
        return String::new();
    }
    let messages = history
        .iter()
        .enumerate()
        .map(|(index, text)| format!("Message {index}:\n{text}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{HISTORY_PREAMBLE}{messages}")
}

fn previous_conversation_block(previous_conversation: Option<&str>) -> String {
    match previous_conversation {
        Some(previous) if !previous.is_empty() => format!("{PREVIOUS_CONVERSATION_PREAMBLE}{previous}"),
        _ => String::new(),
    }
}

pub fn build_email_generation_context(history: &[String], options: &PluginOptions) -> LlmMessage {
    LlmMessage::system(format!("{}{}", options.llm_context, history_block(history, options)))
}

pub fn build_email_generation_prompt(draft: &DraftState, previous_conversation: Option<&str>) -> LlmMessage {
    if !draft.has_usable_text() {
        return LlmMessage::user(DEFAULT_PROMPT);
    }
    let content = format!(
        "{EMAIL_PROMPT_PREAMBLE}{}{}",
        draft.cleaned_body(previous_conversation),
        previous_conversation_block(previous_conversation)
    );
    LlmMessage::user(content.trim())
}

pub fn build_subject_generation_context(history: &[String], options: &PluginOptions) -> LlmMessage {
    LlmMessage::system(format!("{SUBJECT_CONTEXT}{}", history_block(history, options)))
}

pub fn build_subject_generation_prompt(draft: &DraftState, previous_conversation: Option<&str>) -> LlmMessage {
    let content = if draft.has_usable_text() {
        format!(
            "{SUBJECT_PROMPT_PREAMBLE}{}{}",
            draft.cleaned_body(previous_conversation),
            previous_conversation_block(previous_conversation)
        )
    } else {
        format!("{SUBJECT_PROMPT_PREAMBLE}{DEFAULT_PROMPT}")
    };
    LlmMessage::user(content.trim())
}

/// `[SYSTEM, USER]` messages asking for a summary of `previous_conversation`.
pub fn build_summary_prompt_and_context(previous_conversation: Option<&str>) -> Result<[LlmMessage; 2], PromptError> {
    let conversation = previous_conversation
        .map(str::trim)
        .filter(|conversation| !conversation.is_empty())
        .ok_or(PromptError::NothingToSummarize)?;
    Ok([LlmMessage::system(SUMMARY_CONTEXT), LlmMessage::user(conversation)])
}
