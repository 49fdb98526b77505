//! Streaming character-to-byte encoder for the output side.

use std::collections::HashMap;

use encoding_rs::{Encoder, EncoderResult, Encoding, REPLACEMENT, UTF_16BE, UTF_16LE, UTF_8};

use crate::error::CharsetError;

enum Kind {
    Utf8,
    Utf16 { big_endian: bool },
    Legacy(Encoder),
}

/// Encodes text into the configured output encoding.
///
/// Callers that must not lose characters check [`StreamEncoder::can_encode`]
/// first and escape what the encoding cannot represent.
pub struct StreamEncoder {
    encoding: &'static Encoding,
    kind: Kind,
    probe: Option<Encoder>,
    representable: HashMap<char, bool>,
    emit_bom: bool,
    wrote_any: bool,
}

impl StreamEncoder {
    pub fn new(encoding: &'static Encoding, emit_bom: bool) -> Result<Self, CharsetError> {
        if encoding == REPLACEMENT {
            return Err(CharsetError::UnsupportedOutput(encoding.name()));
        }
        let (kind, probe) = if encoding == UTF_8 {
            (Kind::Utf8, None)
        } else if encoding == UTF_16BE || encoding == UTF_16LE {
            (
                Kind::Utf16 {
                    big_endian: encoding == UTF_16BE,
                },
                None,
            )
        } else {
            (
                Kind::Legacy(encoding.new_encoder()),
                Some(encoding.new_encoder()),
            )
        };
        Ok(Self {
            encoding,
            kind,
            probe,
            representable: HashMap::new(),
            emit_bom,
            wrote_any: false,
        })
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Whether `ch` survives a round trip through the output encoding.
    pub fn can_encode(&mut self, ch: char) -> bool {
        if ch.is_ascii() {
            return true;
        }
        let Some(probe) = self.probe.as_mut() else {
            return true;
        };
        if let Some(&known) = self.representable.get(&ch) {
            return known;
        }
        let mut utf8 = [0u8; 4];
        let mut scratch = [0u8; 16];
        let (result, _, _) = probe.encode_from_utf8_without_replacement(
            ch.encode_utf8(&mut utf8),
            &mut scratch,
            false,
        );
        let ok = matches!(result, EncoderResult::InputEmpty);
        if !ok {
            *probe = self.encoding.new_encoder();
        }
        self.representable.insert(ch, ok);
        ok
    }

    /// Append the encoded form of `text` to `out`.
    pub fn encode(&mut self, text: &str, out: &mut Vec<u8>) {
        self.write_bom(out);
        match &mut self.kind {
            Kind::Utf8 => out.extend_from_slice(text.as_bytes()),
            Kind::Utf16 { big_endian } => {
                let big_endian = *big_endian;
                for unit in text.encode_utf16() {
                    let bytes = if big_endian {
                        unit.to_be_bytes()
                    } else {
                        unit.to_le_bytes()
                    };
                    out.extend_from_slice(&bytes);
                }
            }
            Kind::Legacy(encoder) => encode_legacy(encoder, text, out, false),
        }
    }

    /// Flush encoder state, e.g. a pending ISO-2022-JP shift sequence.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        if let Kind::Legacy(encoder) = &mut self.kind {
            encode_legacy(encoder, "", out, true);
        }
    }

    pub fn reset(&mut self) {
        if let Kind::Legacy(encoder) = &mut self.kind {
            *encoder = self.encoding.new_encoder();
        }
        self.wrote_any = false;
    }

    fn write_bom(&mut self, out: &mut Vec<u8>) {
        if self.wrote_any {
            return;
        }
        self.wrote_any = true;
        if !self.emit_bom {
            return;
        }
        match self.kind {
            Kind::Utf8 => out.extend_from_slice(&[0xEF, 0xBB, 0xBF]),
            Kind::Utf16 { big_endian: true } => out.extend_from_slice(&[0xFE, 0xFF]),
            Kind::Utf16 { big_endian: false } => out.extend_from_slice(&[0xFF, 0xFE]),
            Kind::Legacy(_) => {}
        }
    }
}

fn encode_legacy(encoder: &mut Encoder, mut text: &str, out: &mut Vec<u8>, last: bool) {
    loop {
        let needed = encoder
            .max_buffer_length_from_utf8_if_no_unmappables(text.len())
            .unwrap_or(text.len().saturating_mul(4).saturating_add(16));
        let start = out.len();
        out.resize(start + needed, 0);
        let (result, read, written, _) = encoder.encode_from_utf8(text, &mut out[start..], last);
        out.truncate(start + written);
        text = &text[read..];
        match result {
            encoding_rs::CoderResult::InputEmpty => break,
            encoding_rs::CoderResult::OutputFull => continue,
        }
    }
}
