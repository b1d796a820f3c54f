// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;

/// Messages longer than this many characters are cut after escaping.
pub const MAX_MESSAGE_CHARS: usize = 10_000;

/// One round of the Balloon Analogue Risk Task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BartRound {
    #[serde(default)]
    pub pumps: u32,
    #[serde(default)]
    pub exploded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BartData {
    #[serde(default)]
    pub rounds: Vec<BartRound>,
}

/// What a caller hands to `ProfilePipeline::run`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileInput {
    pub messages: Vec<String>,
    #[serde(default)]
    pub bart: Option<BartData>,
}

impl ProfileInput {
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            bart: None,
        }
    }

    pub fn with_bart(mut self, bart: BartData) -> Self {
        self.bart = Some(bart);
        self
    }

    /// Drop blank messages, sanitise the rest, and require at least one.
    pub(crate) fn prepare(self) -> Result<PreparedInput, PipelineError> {
        let messages: Vec<String> = self
            .messages
            .iter()
            .filter(|m| !m.trim().is_empty())
            .map(|m| sanitize(m))
            .collect();

        if messages.is_empty() {
            return Err(PipelineError::InvalidInput(
                "at least one non-blank message is required".to_string(),
            ));
        }

        Ok(PreparedInput {
            messages,
            bart: self.bart,
        })
    }
}

/// Sanitised input, serialised into the dispatcher's initial input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PreparedInput {
    pub messages: Vec<String>,
    pub bart: Option<BartData>,
}

impl PreparedInput {
    pub fn transcript(&self) -> String {
        self.messages.join("\n")
    }

    /// The transcript cut to `max_chars` characters, for the smaller prompts.
    pub fn excerpt(&self, max_chars: usize) -> String {
        self.transcript().chars().take(max_chars).collect()
    }

    pub fn word_count(&self) -> usize {
        self.messages
            .iter()
            .map(|m| m.split_whitespace().count())
            .sum()
    }
}

/// HTML-escape `< > " '` and cap the length at [`MAX_MESSAGE_CHARS`].
pub fn sanitize(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    match escaped.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((cut, _)) => escaped[..cut].to_string(),
        None => escaped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            sanitize(r#"<b onclick="x">it's</b>"#),
            "&lt;b onclick=&quot;x&quot;&gt;it&#x27;s&lt;/b&gt;"
        );
    }

    #[test]
    fn truncates_after_escaping() {
        let long = "<".repeat(MAX_MESSAGE_CHARS);
        let cleaned = sanitize(&long);
        assert_eq!(cleaned.chars().count(), MAX_MESSAGE_CHARS);
        assert!(cleaned.starts_with("&lt;"));

        let multibyte = "ç".repeat(MAX_MESSAGE_CHARS + 5);
        assert_eq!(sanitize(&multibyte).chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn blank_messages_are_dropped() {
        let prepared = ProfileInput::new(["  ", "hello", ""]).prepare().unwrap();
        assert_eq!(prepared.messages, vec!["hello".to_string()]);
    }

    #[test]
    fn rejects_input_without_text() {
        let err = ProfileInput::new(["   ", "\n"]).prepare().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(ProfileInput::default().prepare().is_err());
    }

    #[test]
    fn transcript_helpers() {
        let prepared = ProfileInput::new(["one two", "three"]).prepare().unwrap();
        assert_eq!(prepared.transcript(), "one two\nthree");
        assert_eq!(prepared.excerpt(3), "one");
        assert_eq!(prepared.word_count(), 3);
    }
}
