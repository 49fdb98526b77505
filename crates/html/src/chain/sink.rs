//! Output sinks at the end of the chain.

use std::io::Write;

use charset::{Encoding, StreamEncoder};

use crate::chain::Reusable;
use crate::error::ConvertError;

pub trait OutputSink {
    fn write_chars(&mut self, text: &str) -> Result<(), ConvertError>;

    /// Push buffered output downstream without ending it.
    fn flush(&mut self) -> Result<(), ConvertError> {
        Ok(())
    }

    /// End of output: flush encoder state.
    fn finish(&mut self) -> Result<(), ConvertError>;
}

/// Collects output as a `String`.
#[derive(Clone, Debug, Default)]
pub struct StringSink {
    out: String,
}

impl StringSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.out)
    }
}

impl OutputSink for StringSink {
    fn write_chars(&mut self, text: &str) -> Result<(), ConvertError> {
        self.out.push_str(text);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ConvertError> {
        Ok(())
    }
}

impl Reusable for StringSink {
    fn reset(&mut self) {
        self.out.clear();
    }
}

/// Encodes output into an in-memory byte buffer that a reader drains.
pub struct ByteSink {
    encoder: StreamEncoder,
    buf: Vec<u8>,
    pos: usize,
}

impl ByteSink {
    pub fn new(encoding: &'static Encoding, emit_bom: bool) -> Result<Self, ConvertError> {
        Ok(Self {
            encoder: StreamEncoder::new(encoding, emit_bom)?,
            buf: Vec::new(),
            pos: 0,
        })
    }

    /// Encoded bytes not yet read.
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Copy pending bytes into `dst`, returning how many were copied.
    pub fn read_into(&mut self, dst: &mut [u8]) -> usize {
        let pending = &self.buf[self.pos..];
        let n = pending.len().min(dst.len());
        dst[..n].copy_from_slice(&pending[..n]);
        self.pos += n;
        if self.pos == self.buf.len() {
            self.buf.clear();
            self.pos = 0;
        }
        n
    }
}

impl OutputSink for ByteSink {
    fn write_chars(&mut self, text: &str) -> Result<(), ConvertError> {
        self.encoder.encode(text, &mut self.buf);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ConvertError> {
        self.encoder.finish(&mut self.buf);
        Ok(())
    }
}

impl Reusable for ByteSink {
    fn reset(&mut self) {
        self.encoder.reset();
        self.buf.clear();
        self.pos = 0;
    }
}

/// Encodes output straight into an `io::Write`. Not reusable: the writer
/// belongs to one conversion.
pub struct WriteSink<W> {
    writer: W,
    encoder: StreamEncoder,
    scratch: Vec<u8>,
}

impl<W: Write> WriteSink<W> {
    pub fn new(writer: W, encoding: &'static Encoding, emit_bom: bool) -> Result<Self, ConvertError> {
        Ok(Self {
            writer,
            encoder: StreamEncoder::new(encoding, emit_bom)?,
            scratch: Vec::new(),
        })
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for WriteSink<W> {
    fn write_chars(&mut self, text: &str) -> Result<(), ConvertError> {
        self.scratch.clear();
        self.encoder.encode(text, &mut self.scratch);
        self.writer.write_all(&self.scratch)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ConvertError> {
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ConvertError> {
        self.scratch.clear();
        self.encoder.finish(&mut self.scratch);
        self.writer.write_all(&self.scratch)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charset::{UTF_16LE, WINDOWS_1252};

    #[test]
    fn byte_sink_reads_out_in_pieces() {
        let mut sink = ByteSink::new(WINDOWS_1252, false).expect("sink");
        sink.write_chars("caf\u{e9}").expect("write");
        let mut buf = [0u8; 3];
        assert_eq!(sink.read_into(&mut buf), 3);
        assert_eq!(&buf, b"caf");
        assert_eq!(sink.read_into(&mut buf), 1);
        assert_eq!(buf[0], 0xE9);
        assert!(sink.pending().is_empty());
    }

    #[test]
    fn write_sink_encodes_with_bom() {
        let mut sink = WriteSink::new(Vec::new(), UTF_16LE, true).expect("sink");
        sink.write_chars("a").expect("write");
        sink.finish().expect("finish");
        assert_eq!(sink.into_inner(), vec![0xFF, 0xFE, b'a', 0]);
    }
}
