//! Booking endpoint response adapter.
//!
//! The endpoint wraps its result in a loose envelope. Two success markers
//! are equivalent:
//! - `{"status": "success", ...}`
//! - `{"message": {"message": "success", ...}, ...}`
//!
//! Message text may appear as:
//! - `message: "text"` or `error: "text"`
//! - `message: {"en": "...", "ar": "..."}` (optionally next to the nested marker)
//! - `message: {"message": "text"}` when that text is not the marker
//! - `message_en` / `message_ar` at the top level
//!
//! Everything downstream works with `EndpointReply` only.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::models::Locale;

const SUCCESS_MARKER: &str = "success";

/// Canonical endpoint verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointReply {
    pub accepted: bool,
    /// Endpoint-provided text, in the requested locale when available.
    pub message: Option<String>,
}

/// Interpret an HTTP status and raw body.
///
/// The markers alone decide acceptance; the status is only logged. A body
/// that is not JSON is a rejection without text.
pub fn interpret(status: u16, body: &str, locale: Locale) -> EndpointReply {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            debug!(status, "Booking endpoint replied with a non-JSON body");
            return EndpointReply {
                accepted: false,
                message: None,
            };
        }
    };

    let accepted = has_success_marker(&value);
    debug!(status, accepted, "Booking endpoint replied");
    EndpointReply {
        accepted,
        message: extract_message(&value, locale),
    }
}

pub fn has_success_marker(value: &Value) -> bool {
    let top_level = value.get("status").and_then(Value::as_str) == Some(SUCCESS_MARKER);
    let nested = value
        .get("message")
        .and_then(|m| m.get("message"))
        .and_then(Value::as_str)
        == Some(SUCCESS_MARKER);
    top_level || nested
}

fn extract_message(value: &Value, locale: Locale) -> Option<String> {
    let preferred = [locale, locale.other()];

    if let Some(message) = value.get("message") {
        match message {
            Value::String(text) => {
                if let Some(text) = usable(text) {
                    return Some(text);
                }
            }
            Value::Object(_) => {
                for l in preferred {
                    if let Some(text) = message.get(l.as_str()).and_then(Value::as_str).and_then(usable) {
                        return Some(text);
                    }
                }
                if let Some(text) = message.get("message").and_then(Value::as_str).and_then(usable) {
                    return Some(text);
                }
            }
            _ => {}
        }
    }

    for l in preferred {
        let key = format!("message_{}", l.as_str());
        if let Some(text) = value.get(&key).and_then(Value::as_str).and_then(usable) {
            return Some(text);
        }
    }

    value.get("error").and_then(Value::as_str).and_then(usable)
}

/// Non-blank text that is not just the success marker.
fn usable(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty() && text != SUCCESS_MARKER).then(|| text.to_string())
}
