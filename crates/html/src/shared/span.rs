//! Span types used by tokens.

/// Byte range into the decoded input stream.
///
/// Offsets are absolute stream positions, not indices into the current
/// buffer, so a span stays meaningful after `Input::compact`. A span can only
/// be resolved while its bytes are still buffered, which holds for the
/// lifetime of the `TokenBatch` that carried it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must be <= end");
        Self { start, end }
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// Alias for text spans (used by tokenizer output).
pub type TextSpan = Span;
