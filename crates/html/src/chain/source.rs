//! Character sources feeding the tokenizer.
//!
//! A source appends decoded text to the pipeline's input on request. Sources
//! never block on their own: a push source with nothing queued reports
//! `Pending` and the drive loop returns to its caller.

use std::io::Read;

use charset::{DecoderConfig, Detection, StreamDecoder, Utf16Decoder};

use crate::error::ConvertError;
use crate::writer::drain_prefix;

/// Outcome of one `read_chars` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceRead {
    /// This many bytes of text were appended.
    Data(usize),
    /// Nothing available right now; more may arrive later.
    Pending,
    /// The source is exhausted.
    Eof,
}

pub trait CharSource {
    /// Append roughly `max` bytes of text to `out`.
    fn read_chars(&mut self, out: &mut String, max: usize) -> Result<SourceRead, ConvertError>;
}

/// In-memory string.
#[derive(Clone, Debug)]
pub struct StrSource<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> StrSource<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl CharSource for StrSource<'_> {
    fn read_chars(&mut self, out: &mut String, max: usize) -> Result<SourceRead, ConvertError> {
        let rest = &self.text[self.pos..];
        if rest.is_empty() {
            return Ok(SourceRead::Eof);
        }
        let mut take = max.min(rest.len());
        while !rest.is_char_boundary(take) {
            take -= 1;
        }
        if take == 0 {
            take = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        out.push_str(&rest[..take]);
        self.pos += take;
        Ok(SourceRead::Data(take))
    }
}

/// Byte stream decoded with BOM and `<meta>` sniffing.
pub struct ByteSource<R> {
    reader: R,
    decoder: StreamDecoder,
    declared: Option<&'static charset::Encoding>,
    buf: Vec<u8>,
    decoded: String,
    logged_detection: bool,
    eof: bool,
}

impl<R: Read> ByteSource<R> {
    pub fn new(reader: R, config: DecoderConfig) -> Result<Self, ConvertError> {
        if config.encoding.is_none() {
            return Err(ConvertError::MissingInputEncoding);
        }
        Ok(Self {
            reader,
            decoder: StreamDecoder::new(config)?,
            declared: config.encoding,
            buf: Vec::new(),
            decoded: String::new(),
            logged_detection: false,
            eof: false,
        })
    }

    /// Encoding in use once sniffing has finished.
    pub fn encoding(&self) -> Option<&'static charset::Encoding> {
        self.decoder.encoding()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn log_detection(&mut self) {
        if self.logged_detection {
            return;
        }
        let (Some(encoding), Some(detection)) = (self.decoder.encoding(), self.decoder.detection())
        else {
            return;
        };
        self.logged_detection = true;
        if detection != Detection::Declared && Some(encoding) != self.declared {
            log::debug!(
                target: "html.chain",
                "input encoding switched from {} to {} ({:?})",
                self.declared.map_or("none", |declared| declared.name()),
                encoding.name(),
                detection
            );
        }
    }
}

impl<R: Read> CharSource for ByteSource<R> {
    fn read_chars(&mut self, out: &mut String, max: usize) -> Result<SourceRead, ConvertError> {
        while self.decoded.is_empty() && !self.eof {
            self.buf.resize(max.max(1), 0);
            let read = match self.reader.read(&mut self.buf) {
                Ok(read) => read,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            if read == 0 {
                self.decoder.finish(&mut self.decoded);
                self.eof = true;
            } else {
                self.decoder.push(&self.buf[..read], &mut self.decoded);
            }
            self.log_detection();
        }
        if self.decoded.is_empty() {
            return Ok(SourceRead::Eof);
        }
        Ok(SourceRead::Data(drain_prefix(&mut self.decoded, out, max)))
    }
}

/// Queue filled by a push-mode caller.
pub struct PushSource {
    decoder: StreamDecoder,
    decoded: String,
    closed: bool,
}

impl PushSource {
    pub fn new(config: DecoderConfig) -> Result<Self, ConvertError> {
        if config.encoding.is_none() {
            return Err(ConvertError::MissingInputEncoding);
        }
        Ok(Self {
            decoder: StreamDecoder::new(config)?,
            decoded: String::new(),
            closed: false,
        })
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        debug_assert!(!self.closed, "push after close");
        self.decoder.push(bytes, &mut self.decoded);
    }

    pub fn push_str(&mut self, text: &str) {
        debug_assert!(!self.closed, "push after close");
        self.decoded.push_str(text);
    }

    /// No more input will be pushed.
    pub fn close(&mut self) {
        if !self.closed {
            self.decoder.finish(&mut self.decoded);
            self.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn has_pending(&self) -> bool {
        !self.decoded.is_empty()
    }
}

impl CharSource for PushSource {
    fn read_chars(&mut self, out: &mut String, max: usize) -> Result<SourceRead, ConvertError> {
        if !self.decoded.is_empty() {
            return Ok(SourceRead::Data(drain_prefix(&mut self.decoded, out, max)));
        }
        if self.closed {
            Ok(SourceRead::Eof)
        } else {
            Ok(SourceRead::Pending)
        }
    }
}

/// UTF-16 code units; unpaired surrogates become U+FFFD.
pub struct Utf16Source<'a> {
    units: &'a [u16],
    pos: usize,
    decoder: Utf16Decoder,
    finished: bool,
}

impl<'a> Utf16Source<'a> {
    pub fn new(units: &'a [u16]) -> Self {
        Self {
            units,
            pos: 0,
            decoder: Utf16Decoder::new(),
            finished: false,
        }
    }
}

impl CharSource for Utf16Source<'_> {
    fn read_chars(&mut self, out: &mut String, max: usize) -> Result<SourceRead, ConvertError> {
        let before = out.len();
        if self.pos < self.units.len() {
            let end = self.units.len().min(self.pos + max.max(1));
            self.decoder.push(&self.units[self.pos..end], out);
            self.pos = end;
        } else if !self.finished {
            self.decoder.finish(out);
            self.finished = true;
        } else {
            return Ok(SourceRead::Eof);
        }
        Ok(SourceRead::Data(out.len() - before))
    }
}
