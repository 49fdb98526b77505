//! Streaming HTML and text conversion with safe-list sanitization.
//!
//! Data flows one way through a [`chain::Pipeline`]:
//! character source -> tokenizer -> normalizer -> writer -> output sink.
//! [`Converter`] holds the configuration and hands out conversions over
//! strings, readers and writers; the `sanitize_*` functions cover the
//! common case of safe-listing a whole document or a fragment.

pub mod chain;
pub mod converter;
pub mod error;
pub mod normalizer;
pub mod props;
pub mod shared;
pub mod tokenizer;
pub mod writer;

mod entities;

use std::io::{Read, Write};

pub use crate::chain::{ChainConfig, ConverterReader, ConverterWriter, Pipeline};
pub use crate::converter::{Converter, ConverterConfig, InputFormat, OutputFormat};
pub use crate::error::ConvertError;
pub use crate::normalizer::{
    FRAGMENT_CLOSE, FRAGMENT_OPEN, Injection, InjectionFormat, NormalizerConfig, SafeList,
};
pub use crate::shared::{Counters, ParseError, ParseErrorCode};
pub use crate::tokenizer::{HtmlTokenizer, TextTokenizer, TokenFmt, TokenizerConfig};
pub use crate::writer::{HtmlWriterConfig, TextWriterConfig};

use crate::chain::{ByteSource, StringSink};

fn sanitizer(fragment: bool) -> Result<Converter, ConvertError> {
    let mut converter = Converter::new();
    converter.set_filter_html(true)?.set_fragment(fragment)?;
    Ok(converter)
}

/// Remove the `div` wrapper the normalizer puts around fragment output.
///
/// Output that does not start with the wrapper is returned unchanged. The
/// closing half is missing when a `plaintext` element ran to the end.
pub fn strip_fragment_wrapper(mut html: String) -> String {
    if !html.starts_with(FRAGMENT_OPEN) {
        return html;
    }
    if html.len() >= FRAGMENT_OPEN.len() + FRAGMENT_CLOSE.len() && html.ends_with(FRAGMENT_CLOSE)
    {
        html.truncate(html.len() - FRAGMENT_CLOSE.len());
    }
    html.drain(..FRAGMENT_OPEN.len());
    html
}

/// Sanitize a whole document. Empty input gives an empty string.
pub fn sanitize_document(html: &str) -> Result<String, ConvertError> {
    if html.is_empty() {
        return Ok(String::new());
    }
    sanitizer(false)?.convert_str(html)
}

/// Sanitize a fragment: the result carries no `html`/`body` structure and
/// no wrapper element.
///
/// ```
/// let clean = html::sanitize_fragment("<p onclick=\"x()\">hi</p>").unwrap();
/// assert_eq!(clean, "<p>hi</p>");
/// ```
pub fn sanitize_fragment(html: &str) -> Result<String, ConvertError> {
    if html.is_empty() {
        return Ok(String::new());
    }
    sanitizer(true)?
        .convert_str(html)
        .map(strip_fragment_wrapper)
}

fn sanitize_stream<R: Read, W: Write>(
    input: R,
    mut output: W,
    fragment: bool,
) -> Result<(), ConvertError> {
    let converter = sanitizer(fragment)?;
    let source = ByteSource::new(input, converter.config().decoder_config())?;
    let mut pipeline = Pipeline::new(converter.config(), source, StringSink::new())?;
    pipeline.run_to_end()?;
    let mut html = pipeline.into_sink().take();
    if fragment {
        html = strip_fragment_wrapper(html);
    }
    output.write_all(html.as_bytes())?;
    output.flush()?;
    Ok(())
}

/// [`sanitize_document`] over a byte stream. Output is UTF-8.
pub fn sanitize_document_to<R: Read, W: Write>(input: R, output: W) -> Result<(), ConvertError> {
    sanitize_stream(input, output, false)
}

/// [`sanitize_fragment`] over a byte stream. Output is UTF-8.
pub fn sanitize_fragment_to<R: Read, W: Write>(input: R, output: W) -> Result<(), ConvertError> {
    sanitize_stream(input, output, true)
}
