//! Per-conversion parse context (shared resources).

use super::{AtomTable, Counters, ParseError, ParseErrorCode};

/// Upper bound on stored parse errors; later errors are only counted.
pub const MAX_RECORDED_ERRORS: usize = 1024;

/// Context shared by the tokenizer and the normalizer of one conversion.
///
/// Owns conversion-lifetime resources: the atom table, counters, and the
/// recorded recoverable errors.
#[derive(Debug, Default)]
pub struct DocumentParseContext {
    pub atoms: AtomTable,
    pub counters: Counters,
    pub errors: Vec<ParseError>,
}

impl DocumentParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_error(&mut self, code: ParseErrorCode, position: usize) {
        self.counters.parse_errors = self.counters.parse_errors.saturating_add(1);
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push(ParseError { code, position });
        }
    }

    /// Clear per-document state. Interned atoms survive so that ids cached by
    /// the normalizer stay valid.
    pub fn reset(&mut self) {
        self.counters = Counters::default();
        self.errors.clear();
    }
}
