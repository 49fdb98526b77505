//! Streaming HTML tokenizer.
//!
//! This is a streaming tokenizer: it consumes decoded `Input` and emits tokens in
//! batches. The tokenizer is an explicit state machine and is resumable at any
//! chunk boundary.
//!
//! Invariants:
//! - Chunk-equivalence: feeding input in one chunk or many chunks yields the same
//!   resolved token sequence. Text runs are cut at fixed offsets
//!   (`max_restart_offset`) and at markup, never at buffer boundaries.
//! - Input ownership: a tokenizer instance is bound to one `Input` instance
//!   (`Input::id`) until `reset`.
//! - Bounded retention: the consumed input prefix is released once it grows
//!   past `max_restart_offset`, except for bytes an unfinished token still
//!   refers to. Markup is bounded by `max_tag_size`.
//! - Span validity: token spans are only valid for the lifetime of the
//!   `TokenBatch` that resolved them, and must be resolved through the batch
//!   resolver.

use crate::entities::{CharRef, decode_entities, match_char_ref};
use crate::shared::{
    Attribute, AttributeValue, DocumentParseContext, Input, ParseErrorCode, TextSpan, TextValue,
    Token,
};
use input::MatchResult;
use states::TokenizerState;

mod emit;
mod input;
mod states;
mod text;
mod token_fmt;

pub use text::TextTokenizer;
pub use token_fmt::{TokenFmt, TokenFmtError};

pub const DEFAULT_MAX_TAG_SIZE: usize = 32_768;
pub const DEFAULT_MAX_ATTRIBUTES_PER_TAG: usize = 64;
pub const DEFAULT_MAX_RESTART_OFFSET: usize = 4096;

/// Configuration for the tokenizer.
#[derive(Clone, Debug)]
pub struct TokenizerConfig {
    /// Emit an `EOF` token from `finish()`.
    pub emit_eof: bool,
    /// Longest markup construct, in characters from `<` to `>`, still treated
    /// as markup. Longer tags are emitted as text.
    pub max_tag_size: usize,
    /// Distinct attributes kept per start tag; the rest are dropped.
    pub max_attributes_per_tag: usize,
    /// Byte length at which text runs are cut, and the amount of consumed
    /// input retained before the buffer is compacted.
    pub max_restart_offset: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            emit_eof: true,
            max_tag_size: DEFAULT_MAX_TAG_SIZE,
            max_attributes_per_tag: DEFAULT_MAX_ATTRIBUTES_PER_TAG,
            max_restart_offset: DEFAULT_MAX_RESTART_OFFSET,
        }
    }
}

/// Streaming tokenizer result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenizeResult {
    /// Progress was made and at least one token may be available.
    Progress,
    /// More input is required to continue.
    NeedMoreInput,
    /// EOF has been emitted and no further input will be consumed.
    EmittedEof,
}

/// Minimal tokenizer instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub steps: u64,
    pub state_transitions: u64,
    pub tokens_emitted: u64,
    pub budget_exhaustions: u64,
    pub compactions: u64,
}

/// Resolve text spans into `&str` for the current batch epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextResolveError {
    InvalidSpan { span: TextSpan },
}

pub trait TextResolver {
    fn resolve_span(&self, span: TextSpan) -> Result<&str, TextResolveError>;
}

/// Token batch bound to a single epoch.
///
/// Invariant: spans inside tokens are only valid for as long as this `TokenBatch`
/// exists (the batch holds an exclusive borrow of the decoded `Input`).
pub struct TokenBatch<'t> {
    tokens: Vec<Token>,
    input: &'t mut Input,
}

impl<'t> TokenBatch<'t> {
    pub(crate) fn new(tokens: Vec<Token>, input: &'t mut Input) -> Self {
        Self { tokens, input }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Take the tokens out of the batch. Their spans stay resolvable only
    /// until the next `push_input`, which may compact the buffer.
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn resolver(&self) -> impl TextResolver + '_ {
        InputResolver {
            input: &*self.input,
        }
    }
}

/// Open markup construct, from its `<` to the current cursor.
#[derive(Clone, Copy, Debug)]
struct Markup {
    start: usize,
    chars: usize,
    return_state: TokenizerState,
}

#[derive(Debug)]
struct TagBuilder {
    is_end: bool,
    name_start: usize,
    name_end: usize,
    attrs: Vec<AttrBuilder>,
    self_closing: bool,
}

#[derive(Debug)]
struct AttrBuilder {
    name_start: usize,
    name_end: usize,
    value: Option<(usize, usize)>,
}

#[derive(Debug)]
struct CommentBuilder {
    start: usize,
    /// Retained prefix once the comment outgrew `max_tag_size`.
    truncated: Option<String>,
}

/// Text accumulated since the last emitted token.
#[derive(Debug)]
struct PendingText {
    start: usize,
    end: usize,
    /// Set once the run stops being a single contiguous input span.
    owned: Option<String>,
}

impl PendingText {
    fn len(&self) -> usize {
        match &self.owned {
            Some(text) => text.len(),
            None => self.end - self.start,
        }
    }
}

/// HTML tokenizer.
pub struct HtmlTokenizer {
    config: TokenizerConfig,
    state: TokenizerState,
    cursor: usize,
    tokens: Vec<Token>,
    text: Option<PendingText>,
    markup: Option<Markup>,
    tag: Option<TagBuilder>,
    comment: Option<CommentBuilder>,
    doctype_start: Option<usize>,
    /// Element whose end tag closes the current raw text section.
    raw_end_tag: Option<Box<str>>,
    input_id: Option<u64>,
    end_of_stream: bool,
    eof_emitted: bool,
    stats: TokenizerStats,
}

impl HtmlTokenizer {
    pub fn new(config: TokenizerConfig, _ctx: &mut DocumentParseContext) -> Self {
        Self {
            config,
            state: TokenizerState::Data,
            cursor: 0,
            tokens: Vec::new(),
            text: None,
            markup: None,
            tag: None,
            comment: None,
            doctype_start: None,
            raw_end_tag: None,
            input_id: None,
            end_of_stream: false,
            eof_emitted: false,
            stats: TokenizerStats::default(),
        }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Consume decoded input and advance the tokenizer.
    ///
    /// The tokenizer processes available input until it needs more input.
    /// Token spans refer to the decoded input buffer, which may be compacted
    /// here when no undrained tokens reference it.
    pub fn push_input(
        &mut self,
        input: &mut Input,
        ctx: &mut DocumentParseContext,
    ) -> TokenizeResult {
        assert!(
            !self.end_of_stream,
            "HtmlTokenizer::push_input called after finish(); this violates end-of-stream contract"
        );
        self.bind_input(input);
        self.maybe_compact(input);

        let initial_token_count = self.tokens.len();
        let initial_cursor = self.cursor;
        let initial_state_transitions = self.stats.state_transitions;
        let mut remaining_budget = MAX_STEPS_PER_PUMP;

        while remaining_budget > 0 {
            remaining_budget -= 1;
            self.stats.steps = self.stats.steps.saturating_add(1);
            match self.step(input, ctx) {
                Step::Progress => {}
                Step::NeedMoreInput => break,
            }
        }

        if remaining_budget == 0 {
            self.stats.budget_exhaustions = self.stats.budget_exhaustions.saturating_add(1);
            #[cfg(any(test, feature = "debug-stats"))]
            log::trace!(
                target: "html.tokenizer",
                "step budget exhausted in push_input: state={:?} cursor={} tokens={} (initial: cursor={} tokens={})",
                self.state,
                self.cursor,
                self.tokens.len(),
                initial_cursor,
                initial_token_count
            );
            let no_observable_progress = self.cursor == initial_cursor
                && self.tokens.len() == initial_token_count
                && self.stats.state_transitions == initial_state_transitions;
            assert!(
                !no_observable_progress,
                "tokenizer step budget exhausted without observable progress: state={:?} cursor={}",
                self.state,
                self.cursor
            );
        }

        let observable_progress = self.cursor != initial_cursor
            || self.tokens.len() != initial_token_count
            || self.stats.state_transitions != initial_state_transitions;

        if observable_progress {
            TokenizeResult::Progress
        } else {
            TokenizeResult::NeedMoreInput
        }
    }

    /// Adapter: append UTF-8 text to `input` and advance the tokenizer.
    pub fn push_str(
        &mut self,
        input: &mut Input,
        text: &str,
        ctx: &mut DocumentParseContext,
    ) -> TokenizeResult {
        input.push_str(text);
        self.push_input(input, ctx)
    }

    /// Mark end-of-stream, tokenize whatever is still buffered, close open
    /// constructs and emit EOF.
    ///
    /// At end of stream an unterminated tag is dropped, unless it stopped
    /// inside a quoted attribute value that contains `>`, in which case the
    /// value is closed there and tokenization resumes after it. Unterminated
    /// comments and doctypes are emitted with what was read.
    ///
    /// After `finish()`, no further input may be pushed. Calling it again
    /// is a no-op.
    pub fn finish(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> TokenizeResult {
        self.bind_input(input);
        self.end_of_stream = true;
        if self.eof_emitted {
            return TokenizeResult::EmittedEof;
        }

        loop {
            let before = (self.cursor, self.state, self.tokens.len());
            match self.step(input, ctx) {
                Step::Progress => {
                    if before == (self.cursor, self.state, self.tokens.len()) {
                        debug_assert!(false, "finish step made no progress in {:?}", self.state);
                        break;
                    }
                }
                Step::NeedMoreInput => {
                    if !self.close_at_eof(input, ctx) {
                        break;
                    }
                }
            }
        }

        self.flush_text(input);
        if self.config.emit_eof {
            self.emit_token(Token::Eof);
        }
        self.eof_emitted = true;
        TokenizeResult::EmittedEof
    }

    /// Drain the current batch of tokens and return a resolver bound to this epoch.
    ///
    /// Spans are valid for the lifetime of the returned `TokenBatch` (which holds
    /// an exclusive borrow of `Input`).
    pub fn next_batch<'t>(&mut self, input: &'t mut Input) -> TokenBatch<'t> {
        assert!(
            self.input_id.is_none() || self.input_id == Some(input.id()),
            "next_batch input must match the last push_input input"
        );
        let tokens = std::mem::take(&mut self.tokens);
        TokenBatch::new(tokens, input)
    }

    /// Return a copy of current instrumentation counters.
    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    /// Return to the initial state and release the `Input` binding.
    pub fn reset(&mut self) {
        self.state = TokenizerState::Data;
        self.cursor = 0;
        self.tokens.clear();
        self.text = None;
        self.markup = None;
        self.tag = None;
        self.comment = None;
        self.doctype_start = None;
        self.raw_end_tag = None;
        self.input_id = None;
        self.end_of_stream = false;
        self.eof_emitted = false;
        self.stats = TokenizerStats::default();
    }

    fn bind_input(&mut self, input: &Input) {
        if let Some(id) = self.input_id {
            assert_eq!(id, input.id(), "tokenizer is bound to a single Input instance");
        } else {
            self.input_id = Some(input.id());
            self.cursor = input.base();
        }
    }

    /// Lowest absolute offset an unfinished token may still refer to.
    fn restart_floor(&self) -> usize {
        let mut floor = self.cursor;
        if let Some(text) = &self.text
            && text.owned.is_none()
        {
            floor = floor.min(text.start);
        }
        if let Some(markup) = &self.markup {
            floor = floor.min(markup.start);
        }
        floor
    }

    fn maybe_compact(&mut self, input: &mut Input) {
        if !self.tokens.is_empty() {
            return;
        }
        let floor = self.restart_floor();
        if floor.saturating_sub(input.base()) < self.config.max_restart_offset {
            return;
        }
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "html.tokenizer",
            "compacting input: base={} floor={} end={}",
            input.base(),
            floor,
            input.end()
        );
        input.compact(floor);
        self.stats.compactions = self.stats.compactions.saturating_add(1);
    }

    fn transition_to(&mut self, next: TokenizerState) {
        if self.state == next {
            return;
        }
        #[cfg(any(test, feature = "debug-stats"))]
        {
            log::trace!(
                target: "html.tokenizer",
                "state {:?} -> {:?} @{}",
                self.state,
                next,
                self.cursor
            );
        }
        self.state = next;
        self.stats.state_transitions = self.stats.state_transitions.saturating_add(1);
    }

    fn step(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Step {
        debug_assert!(
            self.cursor >= input.base() && self.cursor <= input.end(),
            "cursor {} outside buffered input {}..{}",
            self.cursor,
            input.base(),
            input.end()
        );
        #[cfg(feature = "parser_invariants")]
        self.check_invariants();

        match self.state {
            TokenizerState::Data => self.step_data(input, ctx),
            TokenizerState::RcData => self.step_raw(input, ctx, true),
            TokenizerState::RawText => self.step_raw(input, ctx, false),
            TokenizerState::PlainText => self.step_plaintext(input),
            TokenizerState::TagOpen => self.step_tag_open(input),
            TokenizerState::EndTagOpen => self.step_end_tag_open(input),
            TokenizerState::TagName => self.step_tag_name(input, ctx),
            TokenizerState::BeforeAttributeName => self.step_before_attribute_name(input, ctx),
            TokenizerState::AttributeName => self.step_attribute_name(input, ctx),
            TokenizerState::AfterAttributeName => self.step_after_attribute_name(input, ctx),
            TokenizerState::BeforeAttributeValue => self.step_before_attribute_value(input, ctx),
            TokenizerState::AttributeValueDoubleQuoted => {
                self.step_attribute_value_quoted(input, ctx, '"')
            }
            TokenizerState::AttributeValueSingleQuoted => {
                self.step_attribute_value_quoted(input, ctx, '\'')
            }
            TokenizerState::AttributeValueUnquoted => {
                self.step_attribute_value_unquoted(input, ctx)
            }
            TokenizerState::AfterAttributeValueQuoted => {
                self.step_after_attribute_value_quoted(input, ctx)
            }
            TokenizerState::SelfClosingStartTag => self.step_self_closing_start_tag(input, ctx),
            TokenizerState::MarkupDeclarationOpen => self.step_markup_declaration_open(input),
            TokenizerState::Comment => self.step_comment(input, ctx),
            TokenizerState::BogusComment => self.step_bogus_comment(input),
            TokenizerState::Doctype => self.step_doctype(input, ctx),
        }
    }

    #[cfg(feature = "parser_invariants")]
    fn check_invariants(&self) {
        assert_eq!(
            self.tag.is_some(),
            self.state.is_tag(),
            "tag builder must exist exactly in tag states (state={:?})",
            self.state
        );
        if self.state.is_text() {
            assert!(self.markup.is_none(), "no markup may be open in {:?}", self.state);
        }
        if let Some(text) = &self.text {
            assert!(text.start <= text.end && text.end <= self.cursor);
        }
    }

    fn step_data(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Step {
        let Some(ch) = self.peek(input) else {
            return Step::NeedMoreInput;
        };
        match ch {
            '<' => {
                self.begin_markup(TokenizerState::Data);
                let _ = self.consume(input);
                self.transition_to(TokenizerState::TagOpen);
            }
            '&' => return self.step_char_ref(input, ctx),
            _ => self.consume_text_run(input, b"<&"),
        }
        Step::Progress
    }

    /// Raw text sections end only at the end tag of the element that opened
    /// them; any other `<` is text.
    fn step_raw(&mut self, input: &Input, ctx: &mut DocumentParseContext, rcdata: bool) -> Step {
        let Some(ch) = self.peek(input) else {
            return Step::NeedMoreInput;
        };
        if ch == '<' {
            let name = self.raw_end_tag.as_deref().unwrap_or_default();
            match self.match_raw_end_tag(input, name) {
                MatchResult::Matched => {
                    self.begin_markup(self.state);
                    self.consume_ascii(2);
                    self.tag = Some(TagBuilder::new(true, self.cursor));
                    self.transition_to(TokenizerState::TagName);
                }
                MatchResult::NeedMoreInput => return Step::NeedMoreInput,
                MatchResult::NoMatch => {
                    self.append_text_span(input, self.cursor, self.cursor + 1);
                    self.cursor += 1;
                }
            }
            return Step::Progress;
        }
        if rcdata && ch == '&' {
            return self.step_char_ref(input, ctx);
        }
        let stops: &[u8] = if rcdata { b"<&" } else { b"<" };
        self.consume_text_run(input, stops);
        Step::Progress
    }

    fn step_plaintext(&mut self, input: &Input) -> Step {
        if !self.has_unconsumed_input(input) {
            return Step::NeedMoreInput;
        }
        self.consume_text_run(input, b"");
        Step::Progress
    }

    fn step_char_ref(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Step {
        match match_char_ref(input.tail(self.cursor), self.end_of_stream, false) {
            CharRef::Incomplete => Step::NeedMoreInput,
            CharRef::NotAReference => {
                self.append_text_span(input, self.cursor, self.cursor + 1);
                self.cursor += 1;
                Step::Progress
            }
            CharRef::Decoded {
                consumed,
                ch,
                malformed,
            } => {
                if malformed {
                    ctx.record_error(ParseErrorCode::InvalidCharacterReference, self.cursor);
                }
                let mut buf = [0u8; 4];
                self.append_text_owned(input, ch.encode_utf8(&mut buf));
                self.cursor += consumed;
                Step::Progress
            }
        }
    }

    fn step_tag_open(&mut self, input: &Input) -> Step {
        let Some(ch) = self.peek(input) else {
            return Step::NeedMoreInput;
        };
        match ch {
            '!' => {
                let _ = self.consume(input);
                self.transition_to(TokenizerState::MarkupDeclarationOpen);
            }
            '/' => {
                let _ = self.consume(input);
                self.transition_to(TokenizerState::EndTagOpen);
            }
            '?' => self.begin_comment(TokenizerState::BogusComment),
            c if c.is_ascii_alphabetic() => {
                self.tag = Some(TagBuilder::new(false, self.cursor));
                self.transition_to(TokenizerState::TagName);
            }
            // Not a tag opener: the `<` is text and the current character is
            // reprocessed in Data.
            _ => self.markup_to_text(input),
        }
        Step::Progress
    }

    fn step_end_tag_open(&mut self, input: &Input) -> Step {
        let Some(ch) = self.peek(input) else {
            return Step::NeedMoreInput;
        };
        match ch {
            c if c.is_ascii_alphabetic() => {
                self.tag = Some(TagBuilder::new(true, self.cursor));
                self.transition_to(TokenizerState::TagName);
            }
            '>' => {
                // `</>` is dropped.
                let _ = self.consume(input);
                self.markup = None;
                self.transition_to(TokenizerState::Data);
            }
            _ => self.begin_comment(TokenizerState::BogusComment),
        }
        Step::Progress
    }

    fn step_tag_name(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Step {
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let consumed = self.consume_while(input, |ch| !is_tag_name_stop(ch));
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let Some(ch) = self.peek(input) else {
            return if consumed > 0 {
                Step::Progress
            } else {
                Step::NeedMoreInput
            };
        };
        if let Some(tag) = self.tag.as_mut() {
            tag.name_end = self.cursor;
        }
        let _ = self.consume(input);
        match ch {
            '>' => self.finish_tag(input, ctx),
            '/' => self.transition_to(TokenizerState::SelfClosingStartTag),
            _ => self.transition_to(TokenizerState::BeforeAttributeName),
        }
        Step::Progress
    }

    fn step_before_attribute_name(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Step {
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let skipped = self.consume_while(input, is_html_whitespace);
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let Some(ch) = self.peek(input) else {
            return if skipped > 0 {
                Step::Progress
            } else {
                Step::NeedMoreInput
            };
        };
        match ch {
            '/' => {
                let _ = self.consume(input);
                self.transition_to(TokenizerState::SelfClosingStartTag);
            }
            '>' => {
                let _ = self.consume(input);
                self.finish_tag(input, ctx);
            }
            _ => {
                self.begin_attribute();
                if ch == '=' {
                    // A leading `=` is part of the attribute name.
                    let _ = self.consume(input);
                }
                self.transition_to(TokenizerState::AttributeName);
            }
        }
        Step::Progress
    }

    fn step_attribute_name(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Step {
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let consumed = self.consume_while(input, |ch| {
            !(is_html_whitespace(ch) || ch == '/' || ch == '>' || ch == '=')
        });
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let Some(ch) = self.peek(input) else {
            return if consumed > 0 {
                Step::Progress
            } else {
                Step::NeedMoreInput
            };
        };
        let cursor = self.cursor;
        if let Some(attr) = self.current_attribute() {
            attr.name_end = cursor;
        }
        let _ = self.consume(input);
        match ch {
            '/' => self.transition_to(TokenizerState::SelfClosingStartTag),
            '>' => self.finish_tag(input, ctx),
            '=' => self.transition_to(TokenizerState::BeforeAttributeValue),
            _ => self.transition_to(TokenizerState::AfterAttributeName),
        }
        Step::Progress
    }

    fn step_after_attribute_name(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Step {
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let skipped = self.consume_while(input, is_html_whitespace);
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let Some(ch) = self.peek(input) else {
            return if skipped > 0 {
                Step::Progress
            } else {
                Step::NeedMoreInput
            };
        };
        match ch {
            '/' => {
                let _ = self.consume(input);
                self.transition_to(TokenizerState::SelfClosingStartTag);
            }
            '=' => {
                let _ = self.consume(input);
                self.transition_to(TokenizerState::BeforeAttributeValue);
            }
            '>' => {
                let _ = self.consume(input);
                self.finish_tag(input, ctx);
            }
            _ => {
                self.begin_attribute();
                self.transition_to(TokenizerState::AttributeName);
            }
        }
        Step::Progress
    }

    fn step_before_attribute_value(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Step {
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let skipped = self.consume_while(input, is_html_whitespace);
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let Some(ch) = self.peek(input) else {
            return if skipped > 0 {
                Step::Progress
            } else {
                Step::NeedMoreInput
            };
        };
        match ch {
            '"' | '\'' => {
                let _ = self.consume(input);
                self.begin_attribute_value();
                self.transition_to(if ch == '"' {
                    TokenizerState::AttributeValueDoubleQuoted
                } else {
                    TokenizerState::AttributeValueSingleQuoted
                });
            }
            '>' => {
                // `name=>`: the attribute has an empty value.
                self.begin_attribute_value();
                let _ = self.consume(input);
                self.finish_tag(input, ctx);
            }
            _ => {
                self.begin_attribute_value();
                self.transition_to(TokenizerState::AttributeValueUnquoted);
            }
        }
        Step::Progress
    }

    fn step_attribute_value_quoted(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
        quote: char,
    ) -> Step {
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let consumed = self.consume_while(input, |ch| ch != quote);
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        if self.peek(input).is_none() {
            return if consumed > 0 {
                Step::Progress
            } else {
                Step::NeedMoreInput
            };
        }
        self.end_attribute_value();
        let _ = self.consume(input);
        self.transition_to(TokenizerState::AfterAttributeValueQuoted);
        Step::Progress
    }

    fn step_attribute_value_unquoted(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Step {
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let consumed = self.consume_while(input, |ch| !(is_html_whitespace(ch) || ch == '>'));
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let Some(ch) = self.peek(input) else {
            return if consumed > 0 {
                Step::Progress
            } else {
                Step::NeedMoreInput
            };
        };
        self.end_attribute_value();
        let _ = self.consume(input);
        if ch == '>' {
            self.finish_tag(input, ctx);
        } else {
            self.transition_to(TokenizerState::BeforeAttributeName);
        }
        Step::Progress
    }

    fn step_after_attribute_value_quoted(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Step {
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let Some(ch) = self.peek(input) else {
            return Step::NeedMoreInput;
        };
        match ch {
            '/' => {
                let _ = self.consume(input);
                self.transition_to(TokenizerState::SelfClosingStartTag);
            }
            '>' => {
                let _ = self.consume(input);
                self.finish_tag(input, ctx);
            }
            c if is_html_whitespace(c) => {
                let _ = self.consume(input);
                self.transition_to(TokenizerState::BeforeAttributeName);
            }
            // Missing whitespace between attributes.
            _ => self.transition_to(TokenizerState::BeforeAttributeName),
        }
        Step::Progress
    }

    fn step_self_closing_start_tag(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
    ) -> Step {
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let Some(ch) = self.peek(input) else {
            return Step::NeedMoreInput;
        };
        if ch == '>' {
            let _ = self.consume(input);
            if let Some(tag) = self.tag.as_mut() {
                tag.self_closing = true;
            }
            self.finish_tag(input, ctx);
        } else {
            self.transition_to(TokenizerState::BeforeAttributeName);
        }
        Step::Progress
    }

    fn step_markup_declaration_open(&mut self, input: &Input) -> Step {
        if !self.has_unconsumed_input(input) {
            return Step::NeedMoreInput;
        }
        // We enter this state after consuming "<!", so cursor is at declaration body.
        match self.match_ascii_prefix(input, b"--", false) {
            MatchResult::Matched => {
                self.consume_ascii(2);
                self.begin_comment(TokenizerState::Comment);
                return Step::Progress;
            }
            MatchResult::NeedMoreInput => return Step::NeedMoreInput,
            MatchResult::NoMatch => {}
        }
        match self.match_ascii_prefix(input, b"DOCTYPE", true) {
            MatchResult::Matched => {
                self.consume_ascii(7);
                self.doctype_start = Some(self.cursor);
                self.transition_to(TokenizerState::Doctype);
                return Step::Progress;
            }
            MatchResult::NeedMoreInput => return Step::NeedMoreInput,
            MatchResult::NoMatch => {}
        }
        // `<![CDATA[`, `<!x`, ...: everything up to `>` is a bogus comment.
        self.begin_comment(TokenizerState::BogusComment);
        Step::Progress
    }

    fn step_comment(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Step {
        let Some(start) = self.comment.as_ref().map(|c| c.start) else {
            self.transition_to(TokenizerState::Data);
            return Step::Progress;
        };
        if self.cursor == start {
            // `<!-->` and `<!--->` are empty comments.
            for abrupt in [&b">"[..], &b"->"[..]] {
                match self.match_ascii_prefix(input, abrupt, false) {
                    MatchResult::Matched => {
                        ctx.record_error(ParseErrorCode::Other, self.cursor);
                        self.consume_ascii(abrupt.len());
                        self.emit_comment(input, start);
                        return Step::Progress;
                    }
                    MatchResult::NeedMoreInput => return Step::NeedMoreInput,
                    MatchResult::NoMatch => {}
                }
            }
        }
        let tail = input.tail(self.cursor).as_bytes();
        let Some(dash) = memchr::memchr(b'-', tail) else {
            self.cursor += tail.len();
            self.retain_comment_prefix(input);
            return Step::NeedMoreInput;
        };
        self.cursor += dash;
        self.retain_comment_prefix(input);
        for close in [&b"-->"[..], &b"--!>"[..]] {
            match self.match_ascii_prefix(input, close, false) {
                MatchResult::Matched => {
                    let end = self.cursor;
                    self.consume_ascii(close.len());
                    self.emit_comment(input, end);
                    return Step::Progress;
                }
                MatchResult::NeedMoreInput => return Step::NeedMoreInput,
                MatchResult::NoMatch => {}
            }
        }
        self.cursor += 1;
        Step::Progress
    }

    fn step_bogus_comment(&mut self, input: &Input) -> Step {
        let tail = input.tail(self.cursor).as_bytes();
        match memchr::memchr(b'>', tail) {
            Some(pos) => {
                self.cursor += pos;
                self.retain_comment_prefix(input);
                let end = self.cursor;
                self.cursor += 1;
                self.emit_comment(input, end);
                Step::Progress
            }
            None => {
                self.cursor += tail.len();
                self.retain_comment_prefix(input);
                Step::NeedMoreInput
            }
        }
    }

    fn step_doctype(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> Step {
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        let consumed = self.consume_while(input, |ch| ch != '>');
        if self.abort_if_oversized(input, ctx) {
            return Step::Progress;
        }
        if self.peek(input).is_none() {
            return if consumed > 0 {
                Step::Progress
            } else {
                Step::NeedMoreInput
            };
        }
        let end = self.cursor;
        let _ = self.consume(input);
        self.emit_doctype(input, ctx, end);
        Step::Progress
    }

    /// Resolve the current state once the stream has ended and no more input
    /// is buffered. Returns `false` when there is nothing left to close.
    fn close_at_eof(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> bool {
        match self.state {
            state if state.is_text() => false,
            TokenizerState::TagOpen | TokenizerState::EndTagOpen => {
                self.markup_to_text(input);
                true
            }
            TokenizerState::MarkupDeclarationOpen => {
                ctx.record_error(ParseErrorCode::UnexpectedEof, self.cursor);
                self.begin_comment(TokenizerState::BogusComment);
                true
            }
            TokenizerState::Comment | TokenizerState::BogusComment => {
                ctx.record_error(ParseErrorCode::UnexpectedEof, self.cursor);
                self.emit_comment(input, self.cursor);
                true
            }
            TokenizerState::Doctype => {
                ctx.record_error(ParseErrorCode::UnexpectedEof, self.cursor);
                self.emit_doctype(input, ctx, self.cursor);
                true
            }
            _ => {
                debug_assert!(self.state.is_tag(), "unexpected state {:?}", self.state);
                ctx.record_error(ParseErrorCode::UnexpectedEof, self.cursor);
                if matches!(
                    self.state,
                    TokenizerState::AttributeValueDoubleQuoted
                        | TokenizerState::AttributeValueSingleQuoted
                ) && self.recover_unterminated_quote(input, ctx)
                {
                    return true;
                }
                let return_state = self.markup.map_or(TokenizerState::Data, |m| m.return_state);
                self.tag = None;
                self.markup = None;
                self.transition_to(return_state);
                true
            }
        }
    }

    /// Close an attribute value that ran to end of stream at its first `>`,
    /// emit the tag, and resume tokenizing after it.
    fn recover_unterminated_quote(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> bool {
        let Some((value_start, _)) = self
            .tag
            .as_ref()
            .and_then(|tag| tag.attrs.last())
            .and_then(|attr| attr.value)
        else {
            return false;
        };
        let Some(pos) = memchr::memchr(b'>', input.tail(value_start).as_bytes()) else {
            return false;
        };
        let value_end = value_start + pos;
        if let Some(attr) = self.current_attribute() {
            attr.value = Some((value_start, value_end));
        }
        self.cursor = value_end + 1;
        if let Some(markup) = self.markup.as_mut() {
            markup.chars = input
                .slice(markup.start, value_end + 1)
                .map_or(0, |s| s.chars().count());
        }
        self.finish_tag(input, ctx);
        true
    }

    fn begin_markup(&mut self, return_state: TokenizerState) {
        debug_assert!(self.markup.is_none(), "markup constructs do not nest");
        self.markup = Some(Markup {
            start: self.cursor,
            chars: 0,
            return_state,
        });
    }

    /// The `<` that opened the current markup is text after all.
    fn markup_to_text(&mut self, input: &Input) {
        let Some(markup) = self.markup.take() else {
            self.transition_to(TokenizerState::Data);
            return;
        };
        self.tag = None;
        self.append_text_span(input, markup.start, self.cursor);
        self.transition_to(markup.return_state);
    }

    /// Turn markup that outgrew `max_tag_size` into text. Returns whether it
    /// did.
    fn abort_if_oversized(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> bool {
        let Some(markup) = self.markup else {
            return false;
        };
        if markup.chars <= self.config.max_tag_size {
            return false;
        }
        ctx.record_error(ParseErrorCode::TagTooLong, markup.start);
        ctx.counters.tags_too_long = ctx.counters.tags_too_long.saturating_add(1);
        log::debug!(
            target: "html.tokenizer",
            "markup at {} exceeds {} chars; emitting it as text",
            markup.start,
            self.config.max_tag_size
        );
        self.doctype_start = None;
        self.markup_to_text(input);
        true
    }

    fn begin_comment(&mut self, state: TokenizerState) {
        self.comment = Some(CommentBuilder {
            start: self.cursor,
            truncated: None,
        });
        self.transition_to(state);
    }

    /// Once a comment outgrows `max_tag_size` bytes only its first
    /// `max_tag_size` bytes are kept; the rest is scanned and dropped.
    fn retain_comment_prefix(&mut self, input: &Input) {
        let limit = self.config.max_tag_size;
        let cursor = self.cursor;
        let Some(comment) = self.comment.as_mut() else {
            return;
        };
        if comment.truncated.is_some() || cursor - comment.start <= limit {
            return;
        }
        let tail = input.tail(comment.start);
        let mut cut = limit.min(tail.len());
        while !tail.is_char_boundary(cut) {
            cut -= 1;
        }
        comment.truncated = Some(tail[..cut].to_string());
        if let Some(markup) = self.markup.as_mut() {
            // The retained prefix is owned now; release the buffered bytes.
            markup.start = cursor;
        }
    }

    fn begin_attribute(&mut self) {
        let cursor = self.cursor;
        if let Some(tag) = self.tag.as_mut() {
            tag.attrs.push(AttrBuilder {
                name_start: cursor,
                name_end: cursor,
                value: None,
            });
        }
    }

    fn current_attribute(&mut self) -> Option<&mut AttrBuilder> {
        self.tag.as_mut().and_then(|tag| tag.attrs.last_mut())
    }

    fn begin_attribute_value(&mut self) {
        let cursor = self.cursor;
        if let Some(attr) = self.current_attribute() {
            attr.value = Some((cursor, cursor));
        }
    }

    fn end_attribute_value(&mut self) {
        let cursor = self.cursor;
        if let Some(attr) = self.current_attribute()
            && let Some((start, _)) = attr.value
        {
            attr.value = Some((start, cursor));
        }
    }

    fn finish_tag(&mut self, input: &Input, ctx: &mut DocumentParseContext) {
        if self.abort_if_oversized(input, ctx) {
            return;
        }
        self.markup = None;
        let Some(tag) = self.tag.take() else {
            self.transition_to(TokenizerState::Data);
            return;
        };
        let name = input
            .slice(tag.name_start, tag.name_end)
            .filter(|name| !name.is_empty())
            .map(|name| ctx.atoms.intern_ascii_folded(name));
        let name = match name {
            Some(Ok(name)) => name,
            Some(Err(err)) => {
                log::warn!(target: "html.tokenizer", "dropping tag: atom table exhausted ({err:?})");
                self.transition_to(TokenizerState::Data);
                return;
            }
            None => {
                self.transition_to(TokenizerState::Data);
                return;
            }
        };

        if tag.is_end {
            self.raw_end_tag = None;
            self.emit_markup_token(input, Token::EndTag { name });
            self.transition_to(TokenizerState::Data);
            return;
        }

        let attrs = self.build_attributes(input, ctx, &tag.attrs);
        let tag_name = ctx.atoms.resolve(name).unwrap_or_default();
        let self_closing = tag.self_closing || is_html_void_tag(tag_name);
        let next = match tag_name {
            "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
                TokenizerState::RawText
            }
            "title" | "textarea" => TokenizerState::RcData,
            "plaintext" => TokenizerState::PlainText,
            _ => TokenizerState::Data,
        };
        if matches!(next, TokenizerState::RawText | TokenizerState::RcData) {
            self.raw_end_tag = Some(Box::from(tag_name));
        }
        self.emit_markup_token(
            input,
            Token::StartTag {
                name,
                attrs,
                self_closing,
            },
        );
        self.transition_to(next);
    }

    /// Intern names, decode values, apply last-wins for duplicates and the
    /// per-tag attribute cap.
    fn build_attributes(
        &mut self,
        input: &Input,
        ctx: &mut DocumentParseContext,
        raw: &[AttrBuilder],
    ) -> Vec<Attribute> {
        let cap = self.config.max_attributes_per_tag;
        let mut attrs: Vec<Attribute> = Vec::with_capacity(raw.len().min(cap));
        let mut dropped = 0usize;
        for attr in raw {
            let Some(raw_name) = input.slice(attr.name_start, attr.name_end) else {
                continue;
            };
            if raw_name.is_empty() {
                continue;
            }
            let Ok(name) = ctx.atoms.intern_ascii_folded(raw_name) else {
                dropped += 1;
                continue;
            };
            let value = attr.value.and_then(|(start, end)| {
                let text = input.slice(start, end)?;
                Some(if text.contains('&') {
                    AttributeValue::Owned(decode_entities(text, true).into_owned())
                } else {
                    AttributeValue::Span(TextSpan::new(start, end))
                })
            });
            if let Some(existing) = attrs.iter_mut().find(|a| a.name == name) {
                ctx.record_error(ParseErrorCode::DuplicateAttribute, attr.name_start);
                existing.value = value;
                continue;
            }
            if attrs.len() == cap {
                dropped += 1;
                continue;
            }
            attrs.push(Attribute { name, value });
        }
        if dropped > 0 {
            ctx.record_error(ParseErrorCode::TooManyAttributes, self.cursor);
            ctx.counters.attributes_dropped =
                ctx.counters.attributes_dropped.saturating_add(dropped as u64);
            log::debug!(
                target: "html.tokenizer",
                "dropped {dropped} attributes beyond the limit of {cap}"
            );
        }
        attrs
    }

    fn emit_comment(&mut self, input: &Input, end: usize) {
        self.markup = None;
        let Some(comment) = self.comment.take() else {
            self.transition_to(TokenizerState::Data);
            return;
        };
        let text = match comment.truncated {
            Some(prefix) => TextValue::Owned(prefix),
            None => TextValue::Span(TextSpan::new(comment.start, end.max(comment.start))),
        };
        self.emit_markup_token(input, Token::Comment { text });
        self.transition_to(TokenizerState::Data);
    }

    fn emit_doctype(&mut self, input: &Input, ctx: &mut DocumentParseContext, end: usize) {
        self.markup = None;
        let Some(start) = self.doctype_start.take() else {
            self.transition_to(TokenizerState::Data);
            return;
        };
        let payload = input.slice(start, end).unwrap_or_default();
        let (name, public_id, system_id) = parse_doctype(payload);
        let name = name.and_then(|name| ctx.atoms.intern_ascii_folded(name).ok());
        self.emit_markup_token(
            input,
            Token::Doctype {
                name,
                public_id,
                system_id,
            },
        );
        self.transition_to(TokenizerState::Data);
    }
}

fn is_html_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

fn is_tag_name_stop(ch: char) -> bool {
    ch == '>' || ch == '/' || is_html_whitespace(ch)
}

pub(crate) fn is_html_void_tag(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "basefont"
            | "bgsound"
            | "br"
            | "col"
            | "embed"
            | "frame"
            | "hr"
            | "image"
            | "img"
            | "input"
            | "isindex"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "spacer"
            | "track"
            | "wbr"
    )
}

/// Split a doctype payload (`html PUBLIC "..." "..."`) into its parts.
fn parse_doctype(payload: &str) -> (Option<&str>, Option<String>, Option<String>) {
    let rest = payload.trim_start_matches(is_html_whitespace);
    let name_len = rest.find(is_html_whitespace).unwrap_or(rest.len());
    let (name, rest) = rest.split_at(name_len);
    let name = (!name.is_empty()).then_some(name);
    let rest = rest.trim_start_matches(is_html_whitespace);

    let keyword = rest.get(..6).unwrap_or_default();
    if keyword.eq_ignore_ascii_case("PUBLIC") {
        let (public_id, rest) = take_quoted(&rest[6..]);
        let (system_id, _) = take_quoted(rest);
        (name, public_id, system_id)
    } else if keyword.eq_ignore_ascii_case("SYSTEM") {
        let (system_id, _) = take_quoted(&rest[6..]);
        (name, None, system_id)
    } else {
        (name, None, None)
    }
}

fn take_quoted(s: &str) -> (Option<String>, &str) {
    let s = s.trim_start_matches(is_html_whitespace);
    let Some(quote) = s.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return (None, s);
    };
    let body = &s[1..];
    match body.find(quote) {
        Some(end) => (Some(body[..end].to_string()), &body[end + 1..]),
        None => (Some(body.to_string()), ""),
    }
}

impl TagBuilder {
    fn new(is_end: bool, name_start: usize) -> Self {
        Self {
            is_end,
            name_start,
            name_end: name_start,
            attrs: Vec::new(),
            self_closing: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Progress,
    NeedMoreInput,
}

const MAX_STEPS_PER_PUMP: usize = 16_384;

pub(crate) struct InputResolver<'t> {
    pub(crate) input: &'t Input,
}

impl<'t> TextResolver for InputResolver<'t> {
    fn resolve_span(&self, span: TextSpan) -> Result<&str, TextResolveError> {
        self.input
            .resolve(span)
            .ok_or(TextResolveError::InvalidSpan { span })
    }
}

#[cfg(test)]
mod tests;
