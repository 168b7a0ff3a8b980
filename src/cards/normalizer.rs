//! Turns a raw model completion into analysis cards.
//!
//! Models are asked for a bare JSON array of `{title, description}` objects
//! but regularly wrap it in a markdown code fence. Anything that still is not
//! a non-empty array of objects after the fence markers are stripped becomes
//! a single fallback card carrying the raw text.

use serde_json::Value;
use tracing::debug;

use super::model::{Card, Run};
use crate::error::ParseError;

/// Title of the card synthesized when the completion cannot be parsed.
pub const FALLBACK_TITLE: &str = "Analysis";

const FENCE: &str = "```";

/// Normalize a completion into a non-empty run. Never fails.
pub fn normalize(raw_text: &str) -> Run {
    match parse_cards(strip_code_fence(raw_text)) {
        Ok(cards) => cards,
        Err(e) => {
            debug!(error = %e, "Model output is not a card array, using fallback card");
            vec![Card::new(FALLBACK_TITLE, raw_text.trim())]
        }
    }
}

/// Remove one opening fence (with optional language tag) and one closing fence.
///
/// Only the marker tokens at the edges are removed; prose around a fenced
/// block stays and makes the JSON parse fail.
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix(FENCE) {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
            .unwrap_or(rest.len());
        body = &rest[tag_len..];
    }

    if let Some(rest) = body.strip_suffix(FENCE) {
        body = rest;
    }

    body.trim()
}

fn parse_cards(text: &str) -> Result<Run, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::Array(items) => items,
        other => return Err(ParseError::NotAnArray(json_kind(&other))),
    };
    if items.is_empty() {
        return Err(ParseError::Empty);
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| Card::from_value(item).ok_or(ParseError::NotAnObject { index }))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
