//! Configured entry point for conversions.
//!
//! A `Converter` holds one configuration and hands out conversions over
//! strings, readers and writers. The configuration is locked by the first
//! conversion; setters fail with `ConfigurationLocked` afterwards.

use std::io::{Read, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use charset::{DecoderConfig, Encoding, UTF_8};

use crate::chain::{
    ByteSink, ByteSource, ChainConfig, ConverterReader, ConverterWriter, Pipeline, PushSource,
    StrSource, StringSink, Utf16Source, WriteSink,
};
use crate::error::ConvertError;
use crate::normalizer::{Injection, NormalizerConfig, SafeList};
use crate::shared::Counters;
use crate::tokenizer::TokenizerConfig;
use crate::writer::{HtmlWriterConfig, TextWriterConfig};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputFormat {
    #[default]
    Html,
    Text,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Html,
    Text,
}

/// Every setting of one conversion.
#[derive(Clone, Debug)]
pub struct ConverterConfig {
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    /// Declared input encoding for byte input. Required even when detection
    /// is enabled.
    pub input_encoding: Option<&'static Encoding>,
    pub detect_encoding_from_bom: bool,
    pub detect_encoding_from_meta: bool,
    pub output_encoding: &'static Encoding,
    pub output_bom: bool,
    pub tokenizer: TokenizerConfig,
    pub normalizer: NormalizerConfig,
    pub html: HtmlWriterConfig,
    pub text: TextWriterConfig,
    pub chain: ChainConfig,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            input_format: InputFormat::Html,
            output_format: OutputFormat::Html,
            input_encoding: Some(UTF_8),
            detect_encoding_from_bom: true,
            detect_encoding_from_meta: true,
            output_encoding: UTF_8,
            output_bom: false,
            tokenizer: TokenizerConfig::default(),
            normalizer: NormalizerConfig::default(),
            html: HtmlWriterConfig::default(),
            text: TextWriterConfig::default(),
            chain: ChainConfig::default(),
        }
    }
}

impl ConverterConfig {
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.tokenizer.max_tag_size == 0 {
            return Err(ConvertError::InvalidConfiguration(
                "max_tag_size must be at least 1".to_string(),
            ));
        }
        if self.tokenizer.max_restart_offset == 0 {
            return Err(ConvertError::InvalidConfiguration(
                "max_restart_offset must be at least 1".to_string(),
            ));
        }
        if self.text.wrap && self.text.width == 0 {
            return Err(ConvertError::InvalidConfiguration(
                "wrap width must be at least 1".to_string(),
            ));
        }
        self.normalizer.validate()?;
        self.chain.validate()
    }

    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            encoding: self.input_encoding,
            detect_bom: self.detect_encoding_from_bom,
            detect_meta: self.detect_encoding_from_meta && self.input_format == InputFormat::Html,
        }
    }
}

#[derive(Debug)]
pub struct Converter {
    config: ConverterConfig,
    locked: AtomicBool,
    last_counters: Mutex<Counters>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    pub fn new() -> Self {
        Self::with_config(ConverterConfig::default())
    }

    pub fn with_config(config: ConverterConfig) -> Self {
        Self {
            config,
            locked: AtomicBool::new(false),
            last_counters: Mutex::new(Counters::default()),
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    fn configure(
        &mut self,
        apply: impl FnOnce(&mut ConverterConfig),
    ) -> Result<&mut Self, ConvertError> {
        if self.is_locked() {
            return Err(ConvertError::ConfigurationLocked);
        }
        apply(&mut self.config);
        Ok(self)
    }

    pub fn set_input_format(&mut self, format: InputFormat) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.input_format = format)
    }

    pub fn set_output_format(&mut self, format: OutputFormat) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.output_format = format)
    }

    pub fn set_input_encoding(
        &mut self,
        encoding: Option<&'static Encoding>,
    ) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.input_encoding = encoding)
    }

    pub fn set_detect_encoding_from_bom(&mut self, detect: bool) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.detect_encoding_from_bom = detect)
    }

    pub fn set_detect_encoding_from_meta(
        &mut self,
        detect: bool,
    ) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.detect_encoding_from_meta = detect)
    }

    pub fn set_output_encoding(
        &mut self,
        encoding: &'static Encoding,
    ) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.output_encoding = encoding)
    }

    pub fn set_filter_html(&mut self, filter: bool) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.normalizer.filter = filter)
    }

    pub fn set_fragment(&mut self, fragment: bool) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.normalizer.fragment = fragment)
    }

    pub fn set_safe_list(&mut self, safe_list: SafeList) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.normalizer.safe_list = safe_list)
    }

    pub fn set_max_tag_size(&mut self, size: usize) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.tokenizer.max_tag_size = size)
    }

    pub fn set_max_attributes_per_tag(&mut self, count: usize) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.tokenizer.max_attributes_per_tag = count)
    }

    pub fn set_max_nesting_depth(&mut self, depth: usize) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.normalizer.max_nesting_depth = depth)
    }

    pub fn set_header(&mut self, header: Option<Injection>) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.normalizer.header = header)
    }

    pub fn set_footer(&mut self, footer: Option<Injection>) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.normalizer.footer = footer)
    }

    pub fn set_wrap(&mut self, width: Option<usize>) -> Result<&mut Self, ConvertError> {
        self.configure(|config| match width {
            Some(width) => {
                config.text.wrap = true;
                config.text.width = width;
            }
            None => config.text.wrap = false,
        })
    }

    /// Keep trailing spaces, tabs and non-breaking spaces in text output.
    pub fn set_preserve_space(&mut self, preserve: bool) -> Result<&mut Self, ConvertError> {
        self.configure(|config| {
            config.text.preserve_trailing_spaces = preserve;
            config.text.preserve_tabs = preserve;
            config.text.preserve_nbsp = preserve;
        })
    }

    pub fn set_buffer_size(&mut self, size: usize) -> Result<&mut Self, ConvertError> {
        self.configure(|config| config.chain.buffer_size = size)
    }

    /// Counters of the last completed `convert_str` or `convert` call.
    pub fn counters(&self) -> Counters {
        match self.last_counters.lock() {
            Ok(counters) => counters.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn lock(&self) -> Result<(), ConvertError> {
        if !self.is_locked() {
            self.config.validate()?;
            self.locked.store(true, Ordering::Release);
        }
        Ok(())
    }

    fn record(&self, counters: &Counters) {
        match self.last_counters.lock() {
            Ok(mut last) => *last = counters.clone(),
            Err(poisoned) => *poisoned.into_inner() = counters.clone(),
        }
    }

    pub fn convert_str(&self, input: &str) -> Result<String, ConvertError> {
        self.lock()?;
        let mut pipeline = Pipeline::new(&self.config, StrSource::new(input), StringSink::new())?;
        pipeline.run_to_end()?;
        self.record(pipeline.counters());
        Ok(pipeline.into_sink().take())
    }

    /// Convert UTF-16 code units, as handed over by UTF-16 string APIs.
    /// Unpaired surrogates become U+FFFD.
    pub fn convert_utf16(&self, input: &[u16]) -> Result<String, ConvertError> {
        self.lock()?;
        let mut pipeline = Pipeline::new(&self.config, Utf16Source::new(input), StringSink::new())?;
        pipeline.run_to_end()?;
        self.record(pipeline.counters());
        Ok(pipeline.into_sink().take())
    }

    /// Convert a byte stream into a byte stream.
    pub fn convert<R: Read, W: Write>(&self, input: R, output: W) -> Result<(), ConvertError> {
        self.lock()?;
        let source = ByteSource::new(input, self.config.decoder_config())?;
        let sink = WriteSink::new(output, self.config.output_encoding, self.config.output_bom)?;
        let mut pipeline = Pipeline::new(&self.config, source, sink)?;
        pipeline.run_to_end()?;
        self.record(pipeline.counters());
        Ok(())
    }

    /// Pull-mode conversion of a byte stream.
    pub fn reader<R: Read>(&self, input: R) -> Result<ConverterReader<ByteSource<R>>, ConvertError> {
        self.lock()?;
        let source = ByteSource::new(input, self.config.decoder_config())?;
        let sink = ByteSink::new(self.config.output_encoding, self.config.output_bom)?;
        Ok(ConverterReader::new(Pipeline::new(&self.config, source, sink)?))
    }

    /// Pull-mode conversion of a string.
    pub fn str_reader<'a>(
        &self,
        input: &'a str,
    ) -> Result<ConverterReader<StrSource<'a>>, ConvertError> {
        self.lock()?;
        let sink = ByteSink::new(self.config.output_encoding, self.config.output_bom)?;
        Ok(ConverterReader::new(Pipeline::new(
            &self.config,
            StrSource::new(input),
            sink,
        )?))
    }

    /// Push-mode conversion into `output`.
    pub fn writer<W: Write>(&self, output: W) -> Result<ConverterWriter<W>, ConvertError> {
        self.lock()?;
        let source = PushSource::new(self.config.decoder_config())?;
        let sink = WriteSink::new(output, self.config.output_encoding, self.config.output_bom)?;
        Ok(ConverterWriter::new(Pipeline::new(&self.config, source, sink)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charset::WINDOWS_1252;

    #[test]
    fn configuration_locks_on_first_use() {
        let mut converter = Converter::new();
        converter
            .set_fragment(true)
            .and_then(|c| c.set_max_nesting_depth(16))
            .expect("configure");
        assert_eq!(converter.convert_str("<b>x").expect("convert"), "<div><b>x</b></div>\r\n");
        assert!(converter.is_locked());
        assert!(matches!(
            converter.set_filter_html(false),
            Err(ConvertError::ConfigurationLocked)
        ));
    }

    #[test]
    fn byte_input_requires_an_encoding() {
        let mut converter = Converter::new();
        converter.set_input_encoding(None).expect("configure");
        assert!(matches!(
            converter.convert(&b"x"[..], Vec::new()),
            Err(ConvertError::MissingInputEncoding)
        ));
    }

    #[test]
    fn invalid_configuration_is_rejected_before_converting() {
        let mut converter = Converter::new();
        converter.set_max_nesting_depth(0).expect("configure");
        assert!(matches!(
            converter.convert_str("x"),
            Err(ConvertError::InvalidConfiguration(_))
        ));
        assert!(!converter.is_locked());
    }

    #[test]
    fn meta_charset_selects_the_input_encoding() {
        let mut converter = Converter::new();
        converter
            .set_fragment(true)
            .and_then(|c| c.set_output_encoding(WINDOWS_1252))
            .expect("configure");
        let input: &[u8] = b"<meta charset=\"windows-1252\"><p>caf\xE9 \xA9";
        let mut out = Vec::new();
        converter.convert(input, &mut out).expect("convert");
        assert_eq!(out, b"<div><p>caf\xE9 \xA9</p></div>\r\n");
        assert_eq!(converter.counters().chars_in, 38);
    }
}
