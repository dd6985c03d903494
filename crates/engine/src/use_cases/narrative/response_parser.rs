//! Generation response parser.
//!
//! The service is asked for `{"text", "mid_term_summary"?, "commands"?}` but
//! models wrap it in prose, fence it, or leak special tokens around it. The
//! parser walks a ladder of extraction strategies and never fails:
//!
//! 1. The whole (cleaned) string as JSON
//! 2. The first fenced code block
//! 3. The first `{` to the last `}`; prose before the brace becomes the
//!    narrative when the object carries none
//! 4. The raw string as narrative with no commands

use regex_lite::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tianji_shared::{GenerationEnvelope, WireCommand};

use crate::infrastructure::ports::RawResponse;

/// Which rung of the ladder produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Envelope,
    Fenced,
    Embedded,
    /// No JSON was attempted; the whole reply is narrative
    PlainText,
    /// JSON was present but unreadable; degraded to narrative only
    Malformed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub text: String,
    pub summary: Option<String>,
    pub commands: Vec<WireCommand>,
    pub format: ResponseFormat,
}

static FENCED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*\n?(.*?)```").expect("valid regex"));

// Model special tokens: <|...|>, [INST], [/INST], <<SYS>>, <</SYS>>
static SPECIAL_TOKENS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\|[^|>]+\|>|\[/?INST\]|<</?SYS>>").expect("valid regex"));

// gpt-oss style: analysis channel first, the real reply after the final marker
static FINAL_CONTENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\|channel\|>final<\|message\|>(.*)$").expect("valid regex"));

/// Remove model-specific special tokens that leak through from the service.
pub fn strip_special_tokens(raw: &str) -> String {
    if let Some(content) = FINAL_CONTENT_RE.captures(raw).and_then(|caps| caps.get(1)) {
        return SPECIAL_TOKENS_RE.replace_all(content.as_str().trim(), "").to_string();
    }
    SPECIAL_TOKENS_RE.replace_all(raw, "").to_string()
}

pub fn parse_response(raw: &RawResponse) -> ParsedResponse {
    match raw {
        RawResponse::Text(text) => parse_text(text),
        RawResponse::Structured(value) => parse_structured(value),
    }
}

/// Parse a free-text reply.
pub fn parse_text(raw: &str) -> ParsedResponse {
    let cleaned = strip_special_tokens(raw);
    let trimmed = cleaned.trim();

    if let Some(parsed) = envelope_from_json(trimmed, "", ResponseFormat::Envelope) {
        return parsed;
    }

    if let Some(caps) = FENCED_RE.captures(trimmed) {
        if let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) {
            let prose = trimmed[..whole.start()].trim();
            if let Some(parsed) = envelope_from_json(body.as_str().trim(), prose, ResponseFormat::Fenced) {
                return parsed;
            }
        }
    }

    let brace = trimmed.find('{');
    if let (Some(start), Some(end)) = (brace, trimmed.rfind('}')) {
        if start < end {
            let prose = trimmed[..start].trim();
            if let Some(parsed) = envelope_from_json(&trimmed[start..=end], prose, ResponseFormat::Embedded) {
                return parsed;
            }
        }
    }

    let format = if brace.is_some() {
        tracing::warn!(len = trimmed.len(), "Malformed generation response, using raw text as narrative");
        ResponseFormat::Malformed
    } else {
        ResponseFormat::PlainText
    };
    ParsedResponse {
        text: trimmed.to_string(),
        summary: None,
        commands: Vec::new(),
        format,
    }
}

/// Parse a reply the host already decoded. A `text` field that itself holds
/// an envelope is unwrapped; the outer fields win where both are present.
fn parse_structured(value: &Value) -> ParsedResponse {
    let Some(outer) = GenerationEnvelope::from_record(value).filter(GenerationEnvelope::is_meaningful) else {
        return match value {
            Value::String(text) => parse_text(text),
            other => parse_text(&other.to_string()),
        };
    };

    let outer_commands = outer.commands.as_deref().map(collect_commands);
    let outer_text = outer.text.unwrap_or_default();
    let inner = parse_text(&outer_text);

    if matches!(inner.format, ResponseFormat::PlainText | ResponseFormat::Malformed) {
        return ParsedResponse {
            text: strip_special_tokens(&outer_text).trim().to_string(),
            summary: outer.mid_term_summary,
            commands: outer_commands.unwrap_or_default(),
            format: ResponseFormat::Envelope,
        };
    }

    ParsedResponse {
        text: inner.text,
        summary: outer.mid_term_summary.or(inner.summary),
        commands: outer_commands.unwrap_or(inner.commands),
        format: ResponseFormat::Envelope,
    }
}

fn envelope_from_json(candidate: &str, prose: &str, format: ResponseFormat) -> Option<ParsedResponse> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    let envelope = GenerationEnvelope::from_record(&value).filter(GenerationEnvelope::is_meaningful)?;

    let text = match envelope.text {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => prose.to_string(),
    };
    Some(ParsedResponse {
        text,
        summary: envelope.mid_term_summary.filter(|s| !s.trim().is_empty()),
        commands: envelope.commands.as_deref().map(collect_commands).unwrap_or_default(),
        format,
    })
}

fn collect_commands(raw: &[Value]) -> Vec<WireCommand> {
    let commands: Vec<WireCommand> = raw.iter().filter_map(WireCommand::from_value).collect();
    if commands.len() < raw.len() {
        tracing::debug!(
            discarded = raw.len() - commands.len(),
            "Discarded command entries without a string action and key"
        );
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_string_envelope() {
        let parsed = parse_text(
            r#"{"text": "The wind stirs.", "mid_term_summary": "Arrived", "commands": [{"action": "add", "key": "gameTime.minute", "value": 30}]}"#,
        );
        assert_eq!(parsed.format, ResponseFormat::Envelope);
        assert_eq!(parsed.text, "The wind stirs.");
        assert_eq!(parsed.summary.as_deref(), Some("Arrived"));
        assert_eq!(parsed.commands.len(), 1);
    }

    #[test]
    fn fenced_block_with_language_tag() {
        let raw = "Here you go:\n```json\n{\"text\": \"Snow falls.\", \"commands\": []}\n```\nEnjoy.";
        let parsed = parse_text(raw);
        assert_eq!(parsed.format, ResponseFormat::Fenced);
        assert_eq!(parsed.text, "Snow falls.");
    }

    #[test]
    fn prose_before_the_brace_becomes_the_narrative() {
        let raw = r#"You bow to the elder. {"commands": [{"action": "set", "key": "player.name", "value": "Lin"}]}"#;
        let parsed = parse_text(raw);
        assert_eq!(parsed.format, ResponseFormat::Embedded);
        assert_eq!(parsed.text, "You bow to the elder.");
        assert_eq!(parsed.commands[0].key, "player.name");
    }

    #[test]
    fn malformed_json_degrades_to_raw_text() {
        let raw = r#"Some chatter { "text": "hi", "commands": [}"#;
        let parsed = parse_text(raw);
        assert_eq!(parsed.format, ResponseFormat::Malformed);
        assert_eq!(parsed.text, raw);
        assert!(parsed.commands.is_empty());
    }

    #[test]
    fn entries_without_action_or_key_are_dropped() {
        let parsed = parse_text(
            r#"{"text": "ok", "commands": [{"action": "set", "value": 1}, {"key": "a"}, {"action": "delete", "key": "b"}, 7]}"#,
        );
        assert_eq!(parsed.commands.len(), 1);
        assert_eq!(parsed.commands[0].key, "b");
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let parsed = parse_text(r#"{"text": "ok", "mid_term_memory": "m", "tavern_commands": [{"action": "delete", "key": "x"}]}"#);
        assert_eq!(parsed.summary.as_deref(), Some("m"));
        assert_eq!(parsed.commands.len(), 1);
    }

    #[test]
    fn special_tokens_are_stripped() {
        let raw = "<|channel|>analysis<|message|>thinking<|end|><|start|>assistant<|channel|>final<|message|>{\"text\": \"Done.\"}";
        let parsed = parse_text(raw);
        assert_eq!(parsed.text, "Done.");
        assert_eq!(strip_special_tokens("[INST]hello[/INST]"), "hello");
    }

    #[test]
    fn plain_prose_is_narrative() {
        let parsed = parse_text("  The night is quiet.  ");
        assert_eq!(parsed.format, ResponseFormat::PlainText);
        assert_eq!(parsed.text, "The night is quiet.");
    }

    #[test]
    fn structured_response_with_embedded_envelope_is_unwrapped() {
        let raw = RawResponse::Structured(json!({
            "text": "```json\n{\"text\": \"Inner story\", \"mid_term_summary\": \"s\", \"commands\": [{\"action\": \"delete\", \"key\": \"x\"}]}\n```"
        }));
        let parsed = parse_response(&raw);
        assert_eq!(parsed.text, "Inner story");
        assert_eq!(parsed.summary.as_deref(), Some("s"));
        assert_eq!(parsed.commands.len(), 1);
    }

    #[test]
    fn structured_response_is_taken_as_is() {
        let raw = RawResponse::Structured(json!({
            "text": "Plain story", "commands": [{"action": "delete", "key": "x"}]
        }));
        let parsed = parse_response(&raw);
        assert_eq!(parsed.text, "Plain story");
        assert_eq!(parsed.commands.len(), 1);
    }
}
