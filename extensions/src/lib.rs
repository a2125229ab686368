//! Concrete adapters for Draftwise.
//!
//! * [`llm::HttpLlmConnection`]: chat-completions client over `reqwest`.
//! * [`store::JsonFileStore`]: key-value storage persisted as one JSON file.

pub mod llm;
pub mod store;
