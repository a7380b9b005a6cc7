//! Decoder for the `event:` / `data:` record protocol.
//!
//! A stream is a sequence of records separated by a blank line. Each record is
//! exactly two lines:
//!
//! ```text
//! event: message_chunk
//! data: {"id":"1","thread_id":"t","role":"assistant","content":"Hi"}
//! ```
//!
//! Malformed records are dropped and logged; they never stop decoding. A
//! trailing record that is not terminated by a blank line is never delivered.

use tracing::{debug, warn};

use crate::errors::DecodeError;

/// One decoded record, before its payload is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Value of the `event:` line.
    pub event: String,
    /// Raw value of the `data:` line (JSON text).
    pub data: String,
}

/// Incremental decoder fed with raw chunks as they arrive.
///
/// Chunk boundaries may fall anywhere, including inside a UTF-8 sequence or
/// between the `\r` and `\n` of a CRLF pair.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    /// Start of the first undelivered record in `buf`.
    start: usize,
    /// No record terminator begins before this index.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every record completed by it, in order.
    ///
    /// Each byte is scanned once; the buffer is compacted once per call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.append_normalized(chunk);

        let mut frames = Vec::new();
        while let Some(idx) = find_record_end(&self.buf, self.scanned) {
            match parse_record(&self.buf[self.start..idx]) {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "dropping malformed record"),
            }
            self.start = idx + 2;
            self.scanned = self.start;
        }
        self.scanned = self.buf.len().saturating_sub(1).max(self.start);

        self.buf.drain(..self.start);
        self.scanned -= self.start;
        self.start = 0;
        frames
    }

    /// Number of buffered bytes not yet terminated by a blank line.
    pub fn pending_len(&self) -> usize {
        self.buf.len() - self.start
    }

    /// Ends decoding. Any unterminated remainder is discarded.
    pub fn finish(self) {
        let rest = &self.buf[self.start..];
        if rest.iter().any(|b| !b.is_ascii_whitespace()) {
            debug!(bytes = rest.len(), "discarding unterminated trailing record");
        }
    }

    /// Appends `chunk`, folding CRLF pairs into LF. A `\r` left at the end of
    /// the previous chunk is folded when this chunk opens with `\n`.
    fn append_normalized(&mut self, chunk: &[u8]) {
        if chunk.first() == Some(&b'\n') && self.buf.last() == Some(&b'\r') {
            self.buf.pop();
            self.scanned = self.scanned.min(self.buf.len().saturating_sub(1)).max(self.start);
        }
        self.buf.reserve(chunk.len());
        let mut bytes = chunk.iter().copied().peekable();
        while let Some(b) = bytes.next() {
            if b == b'\r' && bytes.peek() == Some(&b'\n') {
                continue;
            }
            self.buf.push(b);
        }
    }
}

/// Decodes a complete buffer into frames.
///
/// Equivalent to pushing the whole buffer into a fresh [`FrameDecoder`] and
/// finishing it.
pub fn decode_frames(buffer: &str) -> Vec<Frame> {
    let mut decoder = FrameDecoder::new();
    let frames = decoder.push(buffer.as_bytes());
    decoder.finish();
    frames
}

fn find_record_end(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(2)
        .position(|w| w == b"\n\n")
        .map(|pos| from + pos)
}

fn parse_record(bytes: &[u8]) -> Result<Option<Frame>, DecodeError> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\n');
    if text.is_empty() {
        return Ok(None);
    }

    let mut lines = text.split('\n');
    let event = lines
        .next()
        .and_then(|line| field_value(line, "event:"))
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| DecodeError::MissingEventLine {
            record: text.to_string(),
        })?;
    let data = lines
        .next()
        .and_then(|line| field_value(line, "data:"))
        .ok_or_else(|| DecodeError::MissingDataLine {
            event: event.to_string(),
        })?;

    Ok(Some(Frame {
        event: event.trim().to_string(),
        data: data.to_string(),
    }))
}

fn field_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(prefix)?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}
