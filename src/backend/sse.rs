//! SSE (Server-Sent Events) stream decoder.
//!
//! The hosted story endpoint streams `data: {...}` events. This decoder
//! handles line buffering across TCP chunk boundaries, CRLF endings,
//! comment keep-alives, and `event:` metadata lines.

use serde_json::Value;

/// Buffered SSE decoder yielding one JSON payload per `data:` line.
///
/// # Example
///
/// ```
/// use storyteller::backend::sse::SseDecoder;
///
/// let mut decoder = SseDecoder::new();
/// let values = decoder.decode(b"data: {\"candidates\":[]}\r\n\r\n");
/// assert_eq!(values.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    /// Create a new empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return any complete JSON payloads.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut values = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(value) = Self::parse_line(&line) {
                values.push(value);
            }
        }
        values
    }

    /// Flush any trailing data not terminated by a newline.
    pub fn flush(&mut self) -> Vec<Value> {
        let remaining = std::mem::take(&mut self.buffer);
        remaining.lines().filter_map(Self::parse_line).collect()
    }

    fn parse_line(line: &str) -> Option<Value> {
        let line = line.trim_end_matches(['\r', '\n']).trim();
        // Empty lines separate events; `:` lines are keep-alive comments;
        // `event:` / `id:` lines carry no payload.
        if line.is_empty() || line.starts_with(':') || !line.starts_with("data:") {
            return None;
        }
        let data = line["data:".len()..].trim();
        serde_json::from_str(data).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_single_event() {
        let mut decoder = SseDecoder::new();
        let values = decoder.decode(b"data: {\"candidates\":[{\"index\":0}]}\n\n");
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["candidates"][0]["index"], 0);
    }

    #[test]
    fn test_decodes_crlf_events() {
        let mut decoder = SseDecoder::new();
        let values = decoder.decode(b"data: {\"a\":1}\r\n\r\ndata: {\"a\":2}\r\n\r\n");
        assert_eq!(values.len(), 2);
        assert_eq!(values[1]["a"], 2);
    }

    #[test]
    fn test_buffers_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.decode(b"data: {\"text\":\"Aho").is_empty());
        let values = decoder.decode(b"y\"}\n\n");
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["text"], "Ahoy");
    }

    #[test]
    fn test_ignores_comments_and_event_lines() {
        let mut decoder = SseDecoder::new();
        let values = decoder.decode(b": keep-alive\nevent: message\ndata: {\"x\":1}\n\n");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_ignores_malformed_data_lines() {
        let mut decoder = SseDecoder::new();
        let values = decoder.decode(b"data: not json\ndata: {\"ok\":true}\n");
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["ok"], true);
    }

    #[test]
    fn test_flush_recovers_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.decode(b"data: {\"done\":true}").is_empty());
        let values = decoder.flush();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["done"], true);
    }

    #[test]
    fn test_flush_empty_buffer() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.flush().is_empty());
    }
}
