// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured-data extraction from free-text model output.
//!
//! Three tiers, first match wins:
//! 1. the whole (trimmed) text is a JSON object or array
//! 2. a fenced code block tagged `json` (or untagged) holds one
//! 3. the raw text wrapped as `{"text": raw}`
//!
//! Parsing never fails; the worst case is tier 3.

use serde_json::{json, Value};

use super::ResponseKind;

const FENCE: &str = "```";

pub fn parse_response(raw: &str) -> (Value, ResponseKind) {
    if let Some(value) = parse_structured(raw.trim()) {
        return (value, ResponseKind::Structured);
    }

    for (lang, body) in fenced_blocks(raw) {
        if !(lang.is_empty() || lang.eq_ignore_ascii_case("json")) {
            continue;
        }
        if let Some(value) = parse_structured(body.trim()) {
            return (value, ResponseKind::Structured);
        }
    }

    (json!({ "text": raw }), ResponseKind::Text)
}

fn parse_structured(text: &str) -> Option<Value> {
    if !(text.starts_with('{') || text.starts_with('[')) {
        return None;
    }
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(|value| value.is_object() || value.is_array())
}

/// `(info string, body)` for every closed fence, in order.
fn fenced_blocks(text: &str) -> Vec<(&str, &str)> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        let Some(close) = after_open.find(FENCE) else {
            break;
        };
        let block = &after_open[..close];
        let (lang, body) = match block.find('\n') {
            Some(newline) => (block[..newline].trim(), &block[newline + 1..]),
            // Single-line fence: ```json{...}``` or ```{...}```
            None => match block.strip_prefix("json") {
                Some(body) => ("json", body),
                None => ("", block),
            },
        };
        blocks.push((lang, body));
        rest = &after_open[close + FENCE.len()..];
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_text_json_is_structured() {
        let (value, kind) = parse_response("  {\"openness\": 72}\n");
        assert_eq!(kind, ResponseKind::Structured);
        assert_eq!(value, json!({"openness": 72}));

        let (value, kind) = parse_response("[1, 2]");
        assert_eq!(kind, ResponseKind::Structured);
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn json_fence_inside_prose_is_structured() {
        let raw = "Here is the analysis:\n```json\n{\"tone\": \"calm\"}\n```\nHope it helps.";
        let (value, kind) = parse_response(raw);
        assert_eq!(kind, ResponseKind::Structured);
        assert_eq!(value, json!({"tone": "calm"}));
    }

    #[test]
    fn first_parseable_fence_wins() {
        let raw = "```python\nprint('x')\n```\n```json\n{broken\n```\n```\n{\"ok\": true}\n```";
        let (value, kind) = parse_response(raw);
        assert_eq!(kind, ResponseKind::Structured);
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn single_line_fence_is_recognised() {
        let (value, _) = parse_response("result: ```json{\"a\": 1}```");
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn prose_falls_back_to_text() {
        let (value, kind) = parse_response("The user seems thoughtful.");
        assert_eq!(kind, ResponseKind::Text);
        assert_eq!(value, json!({"text": "The user seems thoughtful."}));
    }

    #[test]
    fn malformed_json_degrades_to_text() {
        let raw = "{\"unterminated\": ";
        let (value, kind) = parse_response(raw);
        assert_eq!(kind, ResponseKind::Text);
        assert_eq!(value["text"], raw);

        let (_, kind) = parse_response("```json\nnot json\n");
        assert_eq!(kind, ResponseKind::Text);
    }

    #[test]
    fn empty_text_is_wrapped() {
        assert_eq!(
            parse_response(""),
            (json!({"text": ""}), ResponseKind::Text)
        );
    }
}
