#![allow(dead_code)]

use std::env;

use draftwise_core::options::PluginOptions;
use serde_json::{json, Map, Value};

// Reads a variable from the environment or `.env`, or announces the skip.
pub fn env_or_skip(var_name: &str, test_name: &str) -> Option<String> {
    dotenv::dotenv().ok();

    match env::var(var_name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => {
            println!("Skipping integration test {} - {} environment variable not set.", test_name, var_name);
            None
        }
    }
}

pub fn options_for(model: impl Into<String>, api_token: Option<&str>) -> PluginOptions {
    PluginOptions {
        model: model.into(),
        api_token: api_token.map(str::to_string),
        ..PluginOptions::default()
    }
}

pub fn params(entries: Value) -> Map<String, Value> {
    match entries {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn completion_body(text: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000u64,
        "model": "local-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}
