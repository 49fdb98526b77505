//! Decoded input buffer shared by the tokenizers.

use super::span::Span;

/// Decoded character input with a sliding window.
///
/// Text is appended at the back; the consumed prefix is released with
/// [`Input::compact`]. Positions handed out by the tokenizer are absolute
/// stream offsets: `base()` is the offset of the first buffered byte.
///
/// Invariant: the buffer is never modified in front of `base()`, so a span
/// whose start is `>= base()` resolves to the same text for as long as it is
/// buffered.
#[derive(Debug)]
pub struct Input {
    id: u64,
    base: usize,
    buffer: String,
}

impl Input {
    pub fn new() -> Self {
        static NEXT_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
        let id = NEXT_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Self {
            id,
            base: 0,
            buffer: String::new(),
        }
    }

    /// Append decoded text to the input buffer.
    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Absolute offset of the first buffered byte.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Absolute offset one past the last buffered byte.
    pub fn end(&self) -> usize {
        self.base + self.buffer.len()
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Buffered text from absolute offset `from` to the end.
    pub fn tail(&self, from: usize) -> &str {
        let start = from.saturating_sub(self.base).min(self.buffer.len());
        &self.buffer[start..]
    }

    /// Buffered text for an absolute range, if it is still buffered and on
    /// character boundaries.
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        if start < self.base || start > end {
            return None;
        }
        self.buffer.get(start - self.base..end - self.base)
    }

    pub fn resolve(&self, span: Span) -> Option<&str> {
        self.slice(span.start, span.end)
    }

    /// Opaque identity for this input buffer instance.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Drop buffered text before absolute offset `keep_from`.
    pub fn compact(&mut self, keep_from: usize) {
        let cut = keep_from.saturating_sub(self.base).min(self.buffer.len());
        if cut == 0 {
            return;
        }
        debug_assert!(
            self.buffer.is_char_boundary(cut),
            "compaction point must be on a UTF-8 boundary"
        );
        if !self.buffer.is_char_boundary(cut) {
            return;
        }
        self.buffer.drain(..cut);
        self.base += cut;
    }

    /// Forget all buffered text and restart offsets at zero.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.base = 0;
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}
