//! Core library for Draftwise.
//!
//! Holds the request lifecycle of the composer add-on: prompt assembly, the
//! LLM connection contract, per-tab request tracking with cancellation, the
//! original-conversation cache, UI synchronization and the action dispatcher.
//! Host capabilities (compose windows, menus, notifications, storage) are
//! consumed through the traits in [`host`] and [`storage`].

pub mod action;
pub mod cancel;
pub mod chat;
pub mod conversation;
pub mod host;
pub mod keep_alive;
pub mod mail;
pub mod notify;
pub mod options;
pub mod prompt;
pub mod request;
pub mod storage;
pub mod ui;
