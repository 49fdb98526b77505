//! Cooperative producer/consumer chain.
//!
//! A [`Pipeline`] owns every stage of one conversion and moves data through
//! them in bounded steps. Callers drive it from either end:
//! - pull: [`ConverterReader`] implements `io::Read` and pumps until output
//!   bytes are available;
//! - push: [`ConverterWriter`] implements `io::Write` and pumps every chunk
//!   written into it through to an inner writer.
//!
//! Nothing blocks inside the chain. A step that cannot move data reports no
//! progress, and the [`ProgressGuard`] turns a long run of those into
//! `ConvertError::TooManyIterations`.

mod guard;
mod pipeline;
mod reader;
mod sink;
mod source;
mod writer;

pub use guard::{BASE_LOOPS_WITHOUT_PROGRESS, ProgressGuard};
pub use pipeline::Pipeline;
pub use reader::ConverterReader;
pub use sink::{ByteSink, OutputSink, StringSink, WriteSink};
pub use source::{ByteSource, CharSource, PushSource, SourceRead, StrSource, Utf16Source};
pub use writer::ConverterWriter;

use crate::error::ConvertError;
use crate::normalizer::Normalizer;
use crate::writer::OutputWriter;

pub const DEFAULT_BUFFER_SIZE: usize = 4096;
pub const MAX_BUFFER_SIZE: usize = 1 << 20;

/// A stage that can be stepped by a drive loop.
pub trait Producer {
    /// Do one bounded unit of work. Returns whether any data moved.
    fn run(&mut self) -> Result<bool, ConvertError>;

    /// Push buffered data downstream. Returns `true` once nothing is left;
    /// `false` means call again.
    fn flush(&mut self) -> Result<bool, ConvertError>;
}

/// A stage that can start over on new input with its configuration intact.
pub trait Reusable {
    fn reset(&mut self);
}

impl Reusable for Normalizer {
    fn reset(&mut self) {
        Normalizer::reset(self);
    }
}

impl Reusable for OutputWriter {
    fn reset(&mut self) {
        OutputWriter::reset(self);
    }
}

impl Reusable for ProgressGuard {
    fn reset(&mut self) {
        ProgressGuard::reset(self);
    }
}

#[derive(Clone, Debug)]
pub struct ChainConfig {
    /// Largest amount of text moved per step, in bytes.
    pub buffer_size: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ChainConfig {
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !(1..=MAX_BUFFER_SIZE).contains(&self.buffer_size) {
            return Err(ConvertError::InvalidConfiguration(format!(
                "buffer size {} is outside 1..={MAX_BUFFER_SIZE}",
                self.buffer_size
            )));
        }
        Ok(())
    }
}
