//! Progressive parsing of the streamed turn object.
//!
//! The story call streams one JSON object token by token. At any point
//! the accumulated text is usually *truncated* JSON — an unclosed string
//! or brace away from valid. [`complete_truncated_json`] closes unclosed
//! delimiters and trims dangling keys so the prefix parses, and
//! [`SnapshotParser`] runs it after every chunk, yielding a fresh
//! [`TurnSnapshot`] whenever the parseable prefix changed.

use serde_json::Value;

use crate::turn::TurnSnapshot;

/// Strip a surrounding markdown code fence, if present.
///
/// Providers in JSON mode normally emit bare JSON, but a fenced
/// ```` ```json ```` block still shows up often enough to handle.
fn strip_code_fence(input: &str) -> &str {
    let trimmed = input.trim_start();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return input;
    };
    // Skip the optional language tag on the fence line.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim_end()
}

/// Close unclosed delimiters in a truncated JSON string.
///
/// Handles unclosed strings, objects, and arrays (nested arbitrarily),
/// plus the mess left right at a truncation point: a trailing comma, a
/// dangling `"key":` with no value, or an orphan `"key"` with no colon.
///
/// Returns `None` when the input does not look like JSON at all or the
/// repaired text still fails to parse.
///
/// # Example
///
/// ```
/// use storyteller::parser::complete_truncated_json;
///
/// let completed = complete_truncated_json(r#"{"description": "Aho"#).unwrap();
/// let v: serde_json::Value = serde_json::from_str(&completed).unwrap();
/// assert_eq!(v["description"], "Aho");
/// ```
pub fn complete_truncated_json(input: &str) -> Option<String> {
    let trimmed = strip_code_fence(input).trim();
    if trimmed.is_empty() {
        return None;
    }
    if serde_json::from_str::<Value>(trimmed).is_ok() {
        return Some(trimmed.to_string());
    }
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        return None;
    }

    // Walk the text tracking string/escape state and the stack of
    // delimiters still waiting for their closer.
    let mut repaired = String::with_capacity(trimmed.len() + 8);
    let mut pending: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in trimmed.chars() {
        repaired.push(ch);
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => pending.push('}'),
            '[' if !in_string => pending.push(']'),
            '}' | ']' if !in_string => {
                if pending.last() == Some(&ch) {
                    pending.pop();
                }
            }
            _ => {}
        }
    }

    if in_string {
        repaired.push('"');
    }

    // The truncation point may leave a trailing comma or a key with no
    // value; strip those until the tail is closable.
    loop {
        let tail = repaired.trim_end();
        if let Some(stripped) = tail.strip_suffix(',') {
            repaired = stripped.to_string();
        } else if let Some(before_colon) = tail.strip_suffix(':') {
            match drop_trailing_key(before_colon.trim_end()) {
                Some(shorter) => repaired = shorter,
                None => break,
            }
        } else {
            break;
        }
    }

    // An orphan key — `{"a": 1, "b"` — parses as nothing useful either.
    if pending.last() == Some(&'}') {
        let tail = repaired.trim_end();
        if tail.ends_with('"') && !tail.ends_with("\\\"") {
            if let Some(shorter) = drop_trailing_key(tail) {
                if shorter.trim_end().ends_with(',') || shorter.trim_end().ends_with('{') {
                    repaired = shorter.trim_end().trim_end_matches(',').to_string();
                }
            }
        }
    }

    while let Some(closer) = pending.pop() {
        repaired.push(closer);
    }

    if serde_json::from_str::<Value>(&repaired).is_ok() {
        Some(repaired)
    } else {
        None
    }
}

/// Remove a trailing quoted key from `text`, returning what precedes it.
fn drop_trailing_key(text: &str) -> Option<String> {
    let without_close = text.strip_suffix('"')?;
    let open = without_close.rfind('"')?;
    Some(text[..open].to_string())
}

/// Accumulates streamed text and yields replacement snapshots.
///
/// Every successful parse produces a complete [`TurnSnapshot`] built
/// from scratch; the previous snapshot is never patched field by field,
/// so a consumer can swap its copy atomically.
#[derive(Debug, Default)]
pub struct SnapshotParser {
    buffer: String,
    last: Option<TurnSnapshot>,
}

impl SnapshotParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of streamed text. Returns a new snapshot when the
    /// parseable prefix changed, `None` when nothing new could be parsed.
    pub fn push(&mut self, chunk: &str) -> Option<TurnSnapshot> {
        self.buffer.push_str(chunk);
        let completed = complete_truncated_json(&self.buffer)?;
        let value: Value = serde_json::from_str(&completed).ok()?;
        let snapshot = TurnSnapshot::from_value(&value);
        if self.last.as_ref() == Some(&snapshot) {
            return None;
        }
        self.last = Some(snapshot.clone());
        Some(snapshot)
    }

    /// The full accumulated text, as received.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// The most recent snapshot, if any chunk has parsed.
    pub fn last_snapshot(&self) -> Option<&TurnSnapshot> {
        self.last.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_closes_unclosed_string() {
        let result = complete_truncated_json(r#"{"description": "Ahoy, sail"#).unwrap();
        let v: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(v["description"], "Ahoy, sail");
    }

    #[test]
    fn test_complete_closes_nested_array() {
        let result =
            complete_truncated_json(r#"{"suggestedActions": ["Board the ship", "Flee inl"#).unwrap();
        let v: Value = serde_json::from_str(&result).unwrap();
        let actions = v["suggestedActions"].as_array().unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1], "Flee inl");
    }

    #[test]
    fn test_complete_drops_trailing_comma() {
        let result = complete_truncated_json(r#"{"description": "Ahoy","#).unwrap();
        let v: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(v["description"], "Ahoy");
    }

    #[test]
    fn test_complete_drops_dangling_key() {
        let result = complete_truncated_json(r#"{"description": "Ahoy", "imagePrompt":"#).unwrap();
        let v: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(v["description"], "Ahoy");
        assert!(v.get("imagePrompt").is_none());
    }

    #[test]
    fn test_complete_drops_orphan_key() {
        let result = complete_truncated_json(r#"{"description": "Ahoy", "imagePrompt"#).unwrap();
        let v: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(v["description"], "Ahoy");
    }

    #[test]
    fn test_complete_passes_valid_json_through() {
        let input = r#"{"description": "done"}"#;
        assert_eq!(complete_truncated_json(input).unwrap(), input);
    }

    #[test]
    fn test_complete_rejects_non_json() {
        assert!(complete_truncated_json("Once upon a time").is_none());
        assert!(complete_truncated_json("").is_none());
    }

    #[test]
    fn test_complete_strips_code_fence() {
        let input = "```json\n{\"description\": \"Ahoy\"}\n```";
        let result = complete_truncated_json(input).unwrap();
        let v: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(v["description"], "Ahoy");
    }

    #[test]
    fn test_complete_handles_escaped_quote_in_string() {
        let result = complete_truncated_json(r#"{"description": "He said \"halt"#).unwrap();
        let v: Value = serde_json::from_str(&result).unwrap();
        assert_eq!(v["description"], "He said \"halt");
    }

    #[test]
    fn test_parser_yields_growing_snapshots() {
        let mut parser = SnapshotParser::new();

        let first = parser.push(r#"{"description": "Ahoy"#).unwrap();
        assert_eq!(first.description.as_deref(), Some("Ahoy"));

        let second = parser
            .push(r#", sailor!", "suggestedActions": ["Board the ship"#)
            .unwrap();
        assert_eq!(second.description.as_deref(), Some("Ahoy, sailor!"));
        assert_eq!(second.suggested_actions, vec!["Board the ship"]);
    }

    #[test]
    fn test_parser_suppresses_unchanged_snapshots() {
        let mut parser = SnapshotParser::new();
        assert!(parser.push(r#"{"description": "Ahoy""#).is_some());
        // Whitespace extends the buffer without changing the parse.
        assert!(parser.push("  ").is_none());
    }

    #[test]
    fn test_parser_returns_none_before_json_starts() {
        let mut parser = SnapshotParser::new();
        assert!(parser.push("").is_none());
        assert!(parser.push("   ").is_none());
    }

    #[test]
    fn test_parser_snapshot_is_replacement_not_merge() {
        let mut parser = SnapshotParser::new();
        parser.push(r#"{"description": "Ahoy, sailor! A storm brews.", "suggestedActions": ["Boa"#);
        let terminal = parser
            .push(r#"rd the ship", "Flee inland"], "imagePrompt": "pirate ship, storm, pixel art"}"#)
            .unwrap();
        assert!(terminal.is_complete());
        assert_eq!(terminal.suggested_actions, vec!["Board the ship", "Flee inland"]);
        assert_eq!(
            terminal.image_prompt.as_deref(),
            Some("pirate ship, storm, pixel art")
        );
    }

    #[test]
    fn test_parser_keeps_raw_buffer() {
        let mut parser = SnapshotParser::new();
        parser.push("{\"description\"");
        parser.push(": \"Ahoy\"}");
        assert_eq!(parser.buffer(), "{\"description\": \"Ahoy\"}");
    }
}
