//! Incremental Server-Sent Events line splitting.

/// Accumulates raw bytes and yields complete `data:` payloads.
///
/// Lines are decoded only once complete, so a multi-byte character split
/// across network chunks survives.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and return every `data:` payload completed by them.
    ///
    /// Blank lines, comments and non-data fields are skipped.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line[..line_end]);

            if let Some(data) = data_payload(line.trim_end_matches('\r')) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Payload of a trailing line that never got its newline.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(String::from_utf8_lossy(&line).trim_end_matches('\r'))
    }
}

fn data_payload(line: &str) -> Option<String> {
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    line.strip_prefix("data:")
        .map(|data| data.trim().to_string())
        .filter(|data| !data.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_complete_lines() {
        let mut buf = SseLineBuffer::new();
        let out = buf.push(b"data: {\"a\":1}\n\ndata: {\"b\":2}\r\n\r\n");
        assert_eq!(out, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn holds_partial_lines_across_pushes() {
        let mut buf = SseLineBuffer::new();
        assert!(buf.push(b"data: {\"te").is_empty());
        let out = buf.push(b"xt\":\"hi\"}\n");
        assert_eq!(out, vec![r#"{"text":"hi"}"#]);
    }

    #[test]
    fn skips_comments_and_other_fields() {
        let mut buf = SseLineBuffer::new();
        let out = buf.push(b": keepalive\nevent: message\nid: 3\ndata: x\n");
        assert_eq!(out, vec!["x"]);
    }

    #[test]
    fn multibyte_character_split_across_pushes() {
        let mut buf = SseLineBuffer::new();
        let bytes = "data: café\n".as_bytes();
        let split = bytes.len() - 2; // inside the two-byte 'é'
        assert!(buf.push(&bytes[..split]).is_empty());
        assert_eq!(buf.push(&bytes[split..]), vec!["café"]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut buf = SseLineBuffer::new();
        assert!(buf.push(b"data: tail").is_empty());
        assert_eq!(buf.finish().as_deref(), Some("tail"));
        assert!(buf.finish().is_none());
    }
}
