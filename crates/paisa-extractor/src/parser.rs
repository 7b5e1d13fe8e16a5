//! Parse and repair model output into transaction candidates
//!
//! Models wrap JSON in markdown fences, chat around it, and truncate long
//! arrays mid-object. Recovery is a fixed, tagged pipeline of strategies
//! tried in order, first success wins; nothing is guessed beyond these:
//!
//! 1. direct structural parse of the fence-stripped text
//! 2. greedy `[...]` span match, then structural parse
//! 3. span between the first `[` and the last `]`
//! 4. reassemble all complete-looking transaction objects into a
//!    synthetic array (recovers whatever finished before truncation)
//! 5. truncate at the last complete closing brace and force-close the array

use crate::error::ExtractError;
use crate::types::RawTransaction;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

fn array_span_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // (?s) so the span crosses newlines; greedy, so this is the widest span
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"))
}

fn complete_object_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A single non-nested brace group carrying the three mandatory keys
    RE.get_or_init(|| {
        Regex::new(r#"\{[^{}]*"description"[^{}]*"amount"[^{}]*"type"[^{}]*\}"#)
            .expect("valid regex")
    })
}

/// Parse raw model output into transaction candidates
///
/// Candidates are not yet validated for required fields; that is the
/// materializer's job. Array elements that fail to deserialize at all
/// (wrong shapes, unknown enum members) are dropped here with a warning.
pub fn parse_response(raw: &str) -> Result<Vec<RawTransaction>, ExtractError> {
    let cleaned = strip_code_fences(raw);

    let value = recover_array(cleaned)?;

    let items = match value {
        Value::Array(items) => items,
        other => return Err(ExtractError::NotAnArray(json_type_name(&other).to_string())),
    };

    if items.is_empty() {
        return Err(ExtractError::EmptyResult);
    }

    let mut transactions = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<RawTransaction>(item) {
            Ok(txn) => transactions.push(txn),
            Err(e) => warn!(index = idx, error = %e, "Dropping unparseable transaction fragment"),
        }
    }

    if transactions.is_empty() {
        return Err(ExtractError::EmptyResult);
    }

    Ok(transactions)
}

/// Strip leading/trailing markdown code-fence markers if present
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the info string on the opening fence line (```json)
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };

    body.trim().strip_suffix("```").unwrap_or(body).trim()
}

/// Run the recovery strategies in order; first parsed value wins
fn recover_array(cleaned: &str) -> Result<Value, ExtractError> {
    let strategies: [(&str, fn(&str) -> Option<Value>); 5] = [
        ("direct", parse_direct),
        ("greedy-span", parse_greedy_span),
        ("bracket-span", parse_bracket_span),
        ("complete-objects", parse_complete_objects),
        ("force-close", parse_force_closed),
    ];

    for (name, strategy) in strategies {
        if let Some(value) = strategy(cleaned) {
            debug!(strategy = name, "Recovered JSON from model output");
            return Ok(value);
        }
    }

    let preview: String = cleaned.chars().take(120).collect();
    Err(ExtractError::UnparseableResponse(preview))
}

fn parse_direct(cleaned: &str) -> Option<Value> {
    serde_json::from_str(cleaned).ok()
}

fn parse_greedy_span(cleaned: &str) -> Option<Value> {
    let span = array_span_pattern().find(cleaned)?;
    serde_json::from_str(span.as_str()).ok()
}

fn parse_bracket_span(cleaned: &str) -> Option<Value> {
    let start = cleaned.find('[')?;
    let end = cleaned.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&cleaned[start..=end]).ok()
}

/// Collect substrings that look like complete transaction objects and
/// reassemble them into a synthetic array
fn parse_complete_objects(cleaned: &str) -> Option<Value> {
    let objects: Vec<&str> = complete_object_pattern()
        .find_iter(cleaned)
        .map(|m| m.as_str())
        .collect();

    if objects.is_empty() {
        return None;
    }

    let synthetic = format!("[{}]", objects.join(","));
    serde_json::from_str(&synthetic).ok()
}

/// Truncate at the last complete closing brace and force-close the array
fn parse_force_closed(cleaned: &str) -> Option<Value> {
    let start = cleaned.find('[')?;
    let last_brace = cleaned.rfind('}')?;
    if last_brace < start {
        return None;
    }

    let repaired = format!("{}]", &cleaned[start..=last_brace]);
    serde_json::from_str(&repaired).ok()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
