//! Tokenizer input helpers.

use crate::shared::Input;
use crate::tokenizer::HtmlTokenizer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MatchResult {
    Matched,
    NeedMoreInput,
    NoMatch,
}

impl HtmlTokenizer {
    pub(super) fn has_unconsumed_input(&self, input: &Input) -> bool {
        self.cursor < input.end()
    }

    pub(super) fn peek(&self, input: &Input) -> Option<char> {
        input.tail(self.cursor).chars().next()
    }

    /// Consume one character, counting it against the open markup budget.
    pub(super) fn consume(&mut self, input: &Input) -> Option<char> {
        let ch = self.peek(input)?;
        self.cursor += ch.len_utf8();
        if let Some(markup) = self.markup.as_mut() {
            markup.chars += 1;
        }
        Some(ch)
    }

    /// Consume characters while `pred` holds. Inside markup at most one
    /// character past `max_tag_size` is consumed, which is enough for the
    /// caller to detect the overflow. Returns the number of characters taken.
    pub(super) fn consume_while(&mut self, input: &Input, pred: impl Fn(char) -> bool) -> usize {
        let room = match self.markup {
            Some(markup) => (self.config.max_tag_size + 1).saturating_sub(markup.chars),
            None => usize::MAX,
        };
        let tail = input.tail(self.cursor);
        let mut bytes = 0usize;
        let mut count = 0usize;
        for ch in tail.chars() {
            if count == room || !pred(ch) {
                break;
            }
            bytes += ch.len_utf8();
            count += 1;
        }
        self.cursor += bytes;
        if let Some(markup) = self.markup.as_mut() {
            markup.chars += count;
        }
        count
    }

    /// Check whether the buffered input at the cursor starts with `seq`.
    ///
    /// A partial match at the end of the buffer asks for more input, unless
    /// the stream has ended, in which case it cannot match anymore.
    pub(super) fn match_ascii_prefix(&self, input: &Input, seq: &[u8], ignore_case: bool) -> MatchResult {
        let tail = input.tail(self.cursor).as_bytes();
        let n = tail.len().min(seq.len());
        let same = if ignore_case {
            tail[..n].eq_ignore_ascii_case(&seq[..n])
        } else {
            tail[..n] == seq[..n]
        };
        if !same {
            MatchResult::NoMatch
        } else if n == seq.len() {
            MatchResult::Matched
        } else if self.end_of_stream {
            MatchResult::NoMatch
        } else {
            MatchResult::NeedMoreInput
        }
    }

    /// Consume an ASCII sequence previously confirmed by `match_ascii_prefix`.
    pub(super) fn consume_ascii(&mut self, len: usize) {
        self.cursor += len;
        if let Some(markup) = self.markup.as_mut() {
            markup.chars += len;
        }
    }

    /// Match `</name` followed by a tag-name delimiter, case-insensitively.
    pub(super) fn match_raw_end_tag(&self, input: &Input, name: &str) -> MatchResult {
        let tail = input.tail(self.cursor).as_bytes();
        let name = name.as_bytes();
        let want = 2 + name.len() + 1;
        let n = tail.len().min(want);
        for (i, &b) in tail[..n].iter().enumerate() {
            let ok = match i {
                0 => b == b'<',
                1 => b == b'/',
                i if i < 2 + name.len() => b.eq_ignore_ascii_case(&name[i - 2]),
                _ => b.is_ascii_whitespace() || b == b'/' || b == b'>',
            };
            if !ok {
                return MatchResult::NoMatch;
            }
        }
        if n == want {
            MatchResult::Matched
        } else if self.end_of_stream {
            MatchResult::NoMatch
        } else {
            MatchResult::NeedMoreInput
        }
    }
}
