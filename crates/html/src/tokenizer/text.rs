//! Tokenizer for plain text input.
//!
//! Every character is content: the output is a sequence of `Text` tokens cut
//! at the same fixed run length as the HTML tokenizer, followed by `Eof`.

use crate::shared::{DocumentParseContext, Input, TextSpan, TextValue, Token};
use crate::tokenizer::{TokenBatch, TokenizeResult, TokenizerConfig};

pub struct TextTokenizer {
    config: TokenizerConfig,
    cursor: usize,
    run_start: Option<usize>,
    tokens: Vec<Token>,
    input_id: Option<u64>,
    end_of_stream: bool,
    eof_emitted: bool,
}

impl TextTokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            config,
            cursor: 0,
            run_start: None,
            tokens: Vec::new(),
            input_id: None,
            end_of_stream: false,
            eof_emitted: false,
        }
    }

    pub fn push_input(
        &mut self,
        input: &mut Input,
        _ctx: &mut DocumentParseContext,
    ) -> TokenizeResult {
        assert!(
            !self.end_of_stream,
            "TextTokenizer::push_input called after finish()"
        );
        self.bind_input(input);
        if self.tokens.is_empty() {
            let floor = self.run_start.unwrap_or(self.cursor);
            if floor.saturating_sub(input.base()) >= self.config.max_restart_offset {
                input.compact(floor);
            }
        }

        let before = self.cursor;
        let tail = input.tail(self.cursor);
        let limit = self.config.max_restart_offset.max(1);
        let mut offset = 0usize;
        while offset < tail.len() {
            let start = *self.run_start.get_or_insert(self.cursor + offset);
            let used = self.cursor + offset - start;
            let mut take = (limit - used).min(tail.len() - offset);
            while !tail.is_char_boundary(offset + take) {
                take -= 1;
            }
            if take == 0 {
                take = tail[offset..].chars().next().map_or(0, char::len_utf8);
            }
            offset += take;
            if self.cursor + offset - start >= limit {
                self.flush_run(self.cursor + offset);
            }
        }
        self.cursor += offset;

        if self.cursor != before {
            TokenizeResult::Progress
        } else {
            TokenizeResult::NeedMoreInput
        }
    }

    pub fn push_str(
        &mut self,
        input: &mut Input,
        text: &str,
        ctx: &mut DocumentParseContext,
    ) -> TokenizeResult {
        input.push_str(text);
        self.push_input(input, ctx)
    }

    pub fn finish(&mut self, input: &Input) -> TokenizeResult {
        self.bind_input(input);
        self.end_of_stream = true;
        if self.eof_emitted {
            return TokenizeResult::EmittedEof;
        }
        self.flush_run(self.cursor);
        if self.config.emit_eof {
            self.tokens.push(Token::Eof);
        }
        self.eof_emitted = true;
        TokenizeResult::EmittedEof
    }

    pub fn next_batch<'t>(&mut self, input: &'t mut Input) -> TokenBatch<'t> {
        assert!(
            self.input_id.is_none() || self.input_id == Some(input.id()),
            "next_batch input must match the last push_input input"
        );
        TokenBatch::new(std::mem::take(&mut self.tokens), input)
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.run_start = None;
        self.tokens.clear();
        self.input_id = None;
        self.end_of_stream = false;
        self.eof_emitted = false;
    }

    fn bind_input(&mut self, input: &Input) {
        if let Some(id) = self.input_id {
            assert_eq!(id, input.id(), "tokenizer is bound to a single Input instance");
        } else {
            self.input_id = Some(input.id());
            self.cursor = input.base();
        }
    }

    fn flush_run(&mut self, end: usize) {
        if let Some(start) = self.run_start.take()
            && start < end
        {
            self.tokens.push(Token::Text {
                text: TextValue::Span(TextSpan::new(start, end)),
            });
        }
    }
}
