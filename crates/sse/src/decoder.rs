//! Line-oriented SSE decoder with explicit buffering.
//!
//! Chunks may split lines and multi-byte characters at any byte offset.
//! Incomplete UTF-8 sequences are held back until the next chunk; the
//! trailing partial line stays buffered until a terminator arrives or the
//! stream is finished.

use std::collections::VecDeque;

/// Prefix marking a payload line. Exactly one space after the colon.
pub const DATA_PREFIX: &str = "data: ";

/// One complete protocol line, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseLine {
    raw: String,
}

/// A `data: ` payload extracted from one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub data: String,
}

impl SseLine {
    fn new(raw: String) -> Self {
        Self { raw }
    }

    /// The line as received.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Payload after the `data: ` prefix, if this is a data line.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.raw.strip_prefix(DATA_PREFIX)
    }

    /// Lines starting with `:` are transport comments (keep-alives).
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.raw.starts_with(':')
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.raw.is_empty()
    }

    /// Convert into an event if this is a data line.
    #[must_use]
    pub fn into_event(self) -> Option<SseEvent> {
        let mut raw = self.raw;
        if raw.starts_with(DATA_PREFIX) {
            raw.drain(..DATA_PREFIX.len());
            Some(SseEvent { data: raw })
        } else {
            None
        }
    }
}

/// Incremental SSE line decoder.
///
/// Feed raw chunks with [`feed`](Self::feed), call [`finish`](Self::finish)
/// once the transport signals completion, and pull complete lines with
/// [`next_line`](Self::next_line) or [`drain`](Self::drain). Lines come out
/// strictly in arrival order. One decoder serves exactly one stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a newline.
    buffer: String,
    ready: VecDeque<SseLine>,
    finished: bool,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of bytes.
    ///
    /// Chunks fed after [`finish`](Self::finish) are ignored.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.finished {
            return;
        }
        self.decode_utf8(chunk);
        self.split_lines();
    }

    /// Mark end of stream. Leftover bytes of an incomplete character are
    /// replaced with U+FFFD; a non-empty residual buffer becomes the final
    /// line as is. A lone trailing `\r` is not a terminator and is kept.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if !self.pending.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending).into_owned();
            self.buffer.push_str(&tail);
            self.pending.clear();
        }
        if !self.buffer.is_empty() {
            let last = std::mem::take(&mut self.buffer);
            self.ready.push_back(SseLine::new(last));
        }
    }

    /// Whether [`finish`](Self::finish) has been called.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pop the next complete line.
    pub fn next_line(&mut self) -> Option<SseLine> {
        self.ready.pop_front()
    }

    /// Drain every complete line decoded so far.
    pub fn drain(&mut self) -> impl Iterator<Item = SseLine> + '_ {
        self.ready.drain(..)
    }

    /// Drain every complete line, keeping only `data: ` payloads.
    pub fn drain_events(&mut self) -> impl Iterator<Item = SseEvent> + '_ {
        self.drain().filter_map(SseLine::into_event)
    }

    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        let mut start = 0;
        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    start = self.pending.len();
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    let valid = std::str::from_utf8(&self.pending[start..valid_end])
                        .unwrap_or_default();
                    self.buffer.push_str(valid);
                    match e.error_len() {
                        Some(bad) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + bad;
                        }
                        // Sequence cut off by the chunk boundary; wait for more.
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
    }

    fn split_lines(&mut self) {
        let mut consumed = 0;
        while let Some(pos) = self.buffer[consumed..].find('\n') {
            let end = consumed + pos;
            let line = &self.buffer[consumed..end];
            let line = line.strip_suffix('\r').unwrap_or(line).to_string();
            self.ready.push_back(SseLine::new(line));
            consumed = end + 1;
        }
        self.buffer.drain(..consumed);
    }
}
