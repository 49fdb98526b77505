//! Token emission and text run accumulation.

use crate::shared::{Input, TextSpan, TextValue, Token};
use crate::tokenizer::{HtmlTokenizer, PendingText};

impl HtmlTokenizer {
    pub(super) fn emit_token(&mut self, token: Token) {
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "html.tokenizer", "emit token: {token:?}");
        self.tokens.push(token);
        self.stats.tokens_emitted = self.stats.tokens_emitted.saturating_add(1);
    }

    /// Emit a non-text token, flushing the text that precedes it first.
    pub(super) fn emit_markup_token(&mut self, input: &Input, token: Token) {
        self.flush_text(input);
        self.emit_token(token);
    }

    pub(super) fn flush_text(&mut self, input: &Input) {
        let Some(text) = self.text.take() else {
            return;
        };
        let value = match text.owned {
            Some(owned) if owned.is_empty() => return,
            Some(owned) => TextValue::Owned(owned),
            None if text.start == text.end => return,
            None => {
                debug_assert!(input.slice(text.start, text.end).is_some());
                TextValue::Span(TextSpan::new(text.start, text.end))
            }
        };
        self.emit_token(Token::Text { text: value });
    }

    /// Append `[start, end)` of the input to the pending text run.
    pub(super) fn append_text_span(&mut self, input: &Input, start: usize, end: usize) {
        if start == end {
            return;
        }
        match self.text.as_mut() {
            None => {
                self.text = Some(PendingText {
                    start,
                    end,
                    owned: None,
                });
            }
            Some(text) => {
                let piece = input.slice(start, end).unwrap_or_default();
                match text.owned.as_mut() {
                    Some(owned) => owned.push_str(piece),
                    None if text.end == start => {}
                    None => {
                        let mut owned = input
                            .slice(text.start, text.end)
                            .unwrap_or_default()
                            .to_string();
                        owned.push_str(piece);
                        text.owned = Some(owned);
                    }
                }
                text.end = end;
            }
        }
        self.flush_text_at_limit(input);
    }

    /// Append decoded text (from a character reference) to the pending run.
    pub(super) fn append_text_owned(&mut self, input: &Input, piece: &str) {
        let cursor = self.cursor;
        let text = self.text.get_or_insert(PendingText {
            start: cursor,
            end: cursor,
            owned: None,
        });
        if text.owned.is_none() {
            let prefix = input.slice(text.start, text.end).unwrap_or_default();
            text.owned = Some(prefix.to_string());
        }
        if let Some(owned) = text.owned.as_mut() {
            owned.push_str(piece);
        }
        self.flush_text_at_limit(input);
    }

    /// Consume text up to the next byte in `stops` or the text run limit.
    pub(super) fn consume_text_run(&mut self, input: &Input, stops: &[u8]) {
        let tail = input.tail(self.cursor);
        let bytes = tail.as_bytes();
        let found = match *stops {
            [] => None,
            [a] => memchr::memchr(a, bytes),
            [a, b] => memchr::memchr2(a, b, bytes),
            [a, b, c, ..] => memchr::memchr3(a, b, c, bytes),
        }
        .unwrap_or(bytes.len());

        let used = self.text.as_ref().map_or(0, PendingText::len);
        let room = self.config.max_restart_offset.saturating_sub(used);
        let mut take = found.min(room);
        while !tail.is_char_boundary(take) {
            take -= 1;
        }
        if take == 0 && found > 0 {
            // A multi-byte character straddles the limit; take it whole.
            take = tail.chars().next().map_or(0, char::len_utf8);
        }
        let start = self.cursor;
        self.cursor += take;
        self.append_text_span(input, start, self.cursor);
    }

    fn flush_text_at_limit(&mut self, input: &Input) {
        let full = self
            .text
            .as_ref()
            .is_some_and(|text| text.len() >= self.config.max_restart_offset);
        if full {
            self.flush_text(input);
        }
    }
}
