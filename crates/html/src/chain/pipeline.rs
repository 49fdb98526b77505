//! Source -> tokenizer -> normalizer -> writer -> sink.

use crate::chain::guard::ProgressGuard;
use crate::chain::sink::OutputSink;
use crate::chain::source::{CharSource, SourceRead};
use crate::chain::{Producer, Reusable};
use crate::converter::{ConverterConfig, InputFormat, OutputFormat};
use crate::error::ConvertError;
use crate::normalizer::Normalizer;
use crate::shared::{Counters, DocumentParseContext, Input, ParseError};
use crate::tokenizer::{HtmlTokenizer, TextTokenizer, TokenBatch, TokenizeResult};
use crate::writer::{HtmlWriter, OutputWriter, TextWriter};

enum Tokenizer {
    Html(HtmlTokenizer),
    Text(TextTokenizer),
}

impl Tokenizer {
    fn push_input(&mut self, input: &mut Input, ctx: &mut DocumentParseContext) -> TokenizeResult {
        match self {
            Tokenizer::Html(tokenizer) => tokenizer.push_input(input, ctx),
            Tokenizer::Text(tokenizer) => tokenizer.push_input(input, ctx),
        }
    }

    fn finish(&mut self, input: &Input, ctx: &mut DocumentParseContext) -> TokenizeResult {
        match self {
            Tokenizer::Html(tokenizer) => tokenizer.finish(input, ctx),
            Tokenizer::Text(tokenizer) => tokenizer.finish(input),
        }
    }

    fn next_batch<'t>(&mut self, input: &'t mut Input) -> TokenBatch<'t> {
        match self {
            Tokenizer::Html(tokenizer) => tokenizer.next_batch(input),
            Tokenizer::Text(tokenizer) => tokenizer.next_batch(input),
        }
    }
}

impl Reusable for Tokenizer {
    fn reset(&mut self) {
        match self {
            Tokenizer::Html(tokenizer) => tokenizer.reset(),
            Tokenizer::Text(tokenizer) => tokenizer.reset(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Reading,
    /// Input ended; the writer still holds output.
    Draining,
    Done,
}

/// One conversion: a character source pumped through the tokenizer,
/// normalizer and writer into an output sink.
///
/// Every `run` moves at most one buffer of data. A fatal error poisons the
/// pipeline; later calls fail with `Poisoned`.
pub struct Pipeline<S, K> {
    source: S,
    sink: K,
    input: Input,
    ctx: DocumentParseContext,
    tokenizer: Tokenizer,
    normalizer: Normalizer,
    writer: OutputWriter,
    guard: ProgressGuard,
    buffer_size: usize,
    chunk: String,
    phase: Phase,
    failed: bool,
}

impl<S: CharSource, K: OutputSink> Pipeline<S, K> {
    pub fn new(config: &ConverterConfig, source: S, sink: K) -> Result<Self, ConvertError> {
        config.validate()?;
        let mut ctx = DocumentParseContext::new();
        let tokenizer = match config.input_format {
            InputFormat::Html => {
                Tokenizer::Html(HtmlTokenizer::new(config.tokenizer.clone(), &mut ctx))
            }
            InputFormat::Text => Tokenizer::Text(TextTokenizer::new(config.tokenizer.clone())),
        };
        let normalizer = Normalizer::new(config.normalizer.clone(), &mut ctx);
        let writer = match config.output_format {
            OutputFormat::Html => {
                let mut html = config.html.clone();
                html.encoding = config.output_encoding;
                html.text_layout = config.input_format == InputFormat::Text;
                OutputWriter::Html(HtmlWriter::new(html)?)
            }
            OutputFormat::Text => {
                let mut text = config.text.clone();
                text.html_layout = config.input_format == InputFormat::Html;
                OutputWriter::Text(TextWriter::new(text))
            }
        };
        let buffer_size = config.chain.buffer_size;
        Ok(Self {
            source,
            sink,
            input: Input::new(),
            ctx,
            tokenizer,
            normalizer,
            writer,
            guard: ProgressGuard::for_buffer_size(buffer_size),
            buffer_size,
            chunk: String::with_capacity(buffer_size),
            phase: Phase::Reading,
            failed: false,
        })
    }

    pub fn counters(&self) -> &Counters {
        &self.ctx.counters
    }

    /// Recoverable markup errors seen so far.
    pub fn errors(&self) -> &[ParseError] {
        &self.ctx.errors
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// One `run` checked against the progress guard.
    pub fn pump(&mut self) -> Result<bool, ConvertError> {
        let progress = self.run()?;
        let checked = self.guard.check(progress);
        self.poison_on_err(checked)?;
        Ok(progress)
    }

    /// Pump until the whole input is converted and the sink finished.
    pub fn run_to_end(&mut self) -> Result<(), ConvertError> {
        while !self.is_done() {
            self.pump()?;
        }
        Ok(())
    }

    fn poison_on_err<T>(&mut self, result: Result<T, ConvertError>) -> Result<T, ConvertError> {
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn step(&mut self) -> Result<bool, ConvertError> {
        self.chunk.clear();
        if self.writer.drain_into(&mut self.chunk, self.buffer_size) > 0 {
            self.ctx.counters.chars_out += self.chunk.chars().count() as u64;
            self.sink.write_chars(&self.chunk)?;
            return Ok(true);
        }
        match self.phase {
            Phase::Reading => self.read_step(),
            Phase::Draining => {
                self.sink.finish()?;
                self.phase = Phase::Done;
                #[cfg(any(test, feature = "debug-stats"))]
                log::trace!(
                    target: "html.chain",
                    "conversion done: {} chars in, {} chars out",
                    self.ctx.counters.chars_in,
                    self.ctx.counters.chars_out
                );
                Ok(true)
            }
            Phase::Done => Ok(false),
        }
    }

    fn read_step(&mut self) -> Result<bool, ConvertError> {
        match self.source.read_chars(&mut self.chunk, self.buffer_size)? {
            SourceRead::Data(len) => {
                self.ctx.counters.chars_in += self.chunk.chars().count() as u64;
                self.input.push_str(&self.chunk);
                let tokenized = self.tokenizer.push_input(&mut self.input, &mut self.ctx);
                self.normalize_batch()?;
                Ok(len > 0 || tokenized == TokenizeResult::Progress)
            }
            SourceRead::Pending => {
                // The tokenizer may still hold input from an exhausted step budget.
                let tokenized = self.tokenizer.push_input(&mut self.input, &mut self.ctx);
                self.normalize_batch()?;
                Ok(tokenized == TokenizeResult::Progress)
            }
            SourceRead::Eof => {
                self.tokenizer.finish(&self.input, &mut self.ctx);
                self.normalize_batch()?;
                self.ctx.counters.max_nesting_depth = self.normalizer.max_depth() as u64;
                self.phase = Phase::Draining;
                Ok(true)
            }
        }
    }

    fn normalize_batch(&mut self) -> Result<(), ConvertError> {
        let batch = self.tokenizer.next_batch(&mut self.input);
        if batch.is_empty() {
            return Ok(());
        }
        self.ctx.counters.tokens_emitted += batch.tokens().len() as u64;
        self.normalizer
            .process_batch(&batch, &mut self.ctx, &mut self.writer)
    }
}

impl<S: CharSource, K: OutputSink + Reusable> Pipeline<S, K> {
    /// Start over on a new source with the same configuration.
    pub fn reuse(&mut self, source: S) {
        self.source = source;
        let stages: [&mut dyn Reusable; 5] = [
            &mut self.sink,
            &mut self.tokenizer,
            &mut self.normalizer,
            &mut self.writer,
            &mut self.guard,
        ];
        for stage in stages {
            stage.reset();
        }
        self.input.reset();
        self.ctx.reset();
        self.chunk.clear();
        self.phase = Phase::Reading;
        self.failed = false;
    }
}

impl<S: CharSource, K: OutputSink> Producer for Pipeline<S, K> {
    fn run(&mut self) -> Result<bool, ConvertError> {
        if self.failed {
            return Err(ConvertError::Poisoned);
        }
        let result = self.step();
        self.poison_on_err(result)
    }

    fn flush(&mut self) -> Result<bool, ConvertError> {
        if self.run()? {
            return Ok(false);
        }
        let flushed = self.sink.flush();
        self.poison_on_err(flushed)?;
        Ok(true)
    }
}
