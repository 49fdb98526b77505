//! Streaming byte decoder with encoding sniffing.
//!
//! The decoder starts in a sniffing phase: it holds back bytes until a byte
//! order mark is ruled in or out and, when `<meta>` detection is enabled,
//! until `MAX_PRESCAN_LENGTH` bytes (or end of input) are available. The
//! encoding is then locked for the rest of the stream.

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8};

use crate::error::CharsetError;
use crate::sniff::{BomSniff, MAX_PRESCAN_LENGTH, prescan_meta_charset, sniff_bom};
use crate::utf8::Utf8Decoder;

#[derive(Clone, Copy, Debug)]
pub struct DecoderConfig {
    /// Declared encoding, used when detection is disabled or finds nothing.
    pub encoding: Option<&'static Encoding>,
    pub detect_bom: bool,
    pub detect_meta: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            encoding: Some(UTF_8),
            detect_bom: true,
            detect_meta: false,
        }
    }
}

/// How the locked encoding was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detection {
    ByteOrderMark,
    MetaTag,
    Declared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeResult {
    /// Characters were appended to the output.
    Progress,
    /// Bytes were buffered but nothing could be decoded yet.
    NeedMoreInput,
}

enum Engine {
    Utf8(Utf8Decoder),
    Legacy(Decoder),
}

pub struct StreamDecoder {
    config: DecoderConfig,
    held: Vec<u8>,
    engine: Option<Engine>,
    locked: Option<(&'static Encoding, Detection)>,
}

impl StreamDecoder {
    /// Fails with `MissingEncoding` when no declared encoding is configured;
    /// detection may override the declaration but never replaces it.
    pub fn new(config: DecoderConfig) -> Result<Self, CharsetError> {
        if config.encoding.is_none() {
            return Err(CharsetError::MissingEncoding);
        }
        Ok(Self {
            config,
            held: Vec::new(),
            engine: None,
            locked: None,
        })
    }

    pub fn encoding(&self) -> Option<&'static Encoding> {
        self.locked.map(|(encoding, _)| encoding)
    }

    pub fn detection(&self) -> Option<Detection> {
        self.locked.map(|(_, detection)| detection)
    }

    pub fn push(&mut self, bytes: &[u8], out: &mut String) -> DecodeResult {
        let before = out.len();
        if self.engine.is_none() {
            self.held.extend_from_slice(bytes);
            if !self.try_lock(false) {
                return DecodeResult::NeedMoreInput;
            }
            let held = std::mem::take(&mut self.held);
            self.decode(&held, out, false);
        } else {
            self.decode(bytes, out, false);
        }
        if out.len() > before {
            DecodeResult::Progress
        } else {
            DecodeResult::NeedMoreInput
        }
    }

    /// Decode anything still held back. Must be called once at end of input.
    pub fn finish(&mut self, out: &mut String) {
        if self.engine.is_none() {
            self.try_lock(true);
            let held = std::mem::take(&mut self.held);
            self.decode(&held, out, true);
            return;
        }
        self.decode(&[], out, true);
    }

    /// Return to the sniffing phase for a new stream with the same config.
    pub fn reset(&mut self) {
        self.held.clear();
        self.engine = None;
        self.locked = None;
    }

    fn try_lock(&mut self, at_end: bool) -> bool {
        let mut skip = 0usize;
        let mut choice = None;
        if self.config.detect_bom {
            match sniff_bom(&self.held) {
                BomSniff::Found { encoding, len } => {
                    skip = len;
                    choice = Some((encoding, Detection::ByteOrderMark));
                }
                BomSniff::NeedMoreInput if !at_end => return false,
                BomSniff::NeedMoreInput | BomSniff::NotFound => {}
            }
        }
        if choice.is_none() && self.config.detect_meta {
            if self.held.len() < MAX_PRESCAN_LENGTH && !at_end {
                return false;
            }
            if let Some(encoding) = prescan_meta_charset(&self.held) {
                choice = Some((encoding, Detection::MetaTag));
            }
        }
        let (encoding, detection) = match choice {
            Some(choice) => choice,
            None => match self.config.encoding {
                Some(encoding) => (encoding, Detection::Declared),
                None => (UTF_8, Detection::Declared),
            },
        };
        if detection != Detection::Declared && Some(encoding) != self.config.encoding {
            log::debug!(
                target: "charset.sniff",
                "input encoding switched to {} ({detection:?})",
                encoding.name()
            );
        }
        self.held.drain(..skip);
        self.engine = Some(if encoding == UTF_8 {
            Engine::Utf8(Utf8Decoder::new())
        } else {
            Engine::Legacy(encoding.new_decoder_without_bom_handling())
        });
        self.locked = Some((encoding, detection));
        true
    }

    fn decode(&mut self, mut bytes: &[u8], out: &mut String, last: bool) {
        match self.engine.as_mut() {
            Some(Engine::Utf8(decoder)) => {
                decoder.push(bytes, out);
                if last {
                    decoder.finish(out);
                }
            }
            Some(Engine::Legacy(decoder)) => loop {
                let needed = decoder
                    .max_utf8_buffer_length(bytes.len())
                    .unwrap_or(bytes.len().saturating_mul(3).saturating_add(16));
                out.reserve(needed);
                let (result, read, _) = decoder.decode_to_string(bytes, out, last);
                bytes = &bytes[read..];
                match result {
                    CoderResult::InputEmpty => break,
                    CoderResult::OutputFull => continue,
                }
            },
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_16LE, WINDOWS_1252};

    fn decode_chunks(config: DecoderConfig, chunks: &[&[u8]]) -> (String, StreamDecoder) {
        let mut decoder = StreamDecoder::new(config).expect("decoder config");
        let mut out = String::new();
        for chunk in chunks {
            let _ = decoder.push(chunk, &mut out);
        }
        decoder.finish(&mut out);
        (out, decoder)
    }

    #[test]
    fn missing_declared_encoding_is_rejected() {
        let config = DecoderConfig {
            encoding: None,
            ..DecoderConfig::default()
        };
        assert!(matches!(
            StreamDecoder::new(config),
            Err(CharsetError::MissingEncoding)
        ));
    }

    #[test]
    fn bom_split_across_chunks_is_stripped() {
        let (out, decoder) = decode_chunks(
            DecoderConfig::default(),
            &[&[0xEF], &[0xBB], &[0xBF, b'h', b'i']],
        );
        assert_eq!(out, "hi");
        assert_eq!(decoder.detection(), Some(Detection::ByteOrderMark));
    }

    #[test]
    fn utf16_bom_overrides_declared_encoding() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("<p>\u{e9}</p>".encode_utf16().flat_map(|u| u.to_le_bytes()));
        let (out, decoder) = decode_chunks(DecoderConfig::default(), &[&bytes[..3], &bytes[3..]]);
        assert_eq!(out, "<p>\u{e9}</p>");
        assert_eq!(decoder.encoding(), Some(UTF_16LE));
    }

    #[test]
    fn meta_detection_waits_for_end_of_short_input() {
        let config = DecoderConfig {
            encoding: Some(UTF_8),
            detect_bom: true,
            detect_meta: true,
        };
        let mut decoder = StreamDecoder::new(config).expect("decoder config");
        let mut out = String::new();
        let doc = b"<meta charset=windows-1252><p>caf\xE9</p>";
        assert_eq!(decoder.push(doc, &mut out), DecodeResult::NeedMoreInput);
        assert!(out.is_empty());
        decoder.finish(&mut out);
        assert_eq!(out, "<meta charset=windows-1252><p>caf\u{e9}</p>");
        assert_eq!(decoder.encoding(), Some(WINDOWS_1252));
        assert_eq!(decoder.detection(), Some(Detection::MetaTag));
    }

    #[test]
    fn declared_encoding_is_used_without_detection() {
        let config = DecoderConfig {
            encoding: Some(WINDOWS_1252),
            detect_bom: false,
            detect_meta: false,
        };
        let (out, decoder) = decode_chunks(config, &[b"\x93quoted\x94"]);
        assert_eq!(out, "\u{201C}quoted\u{201D}");
        assert_eq!(decoder.detection(), Some(Detection::Declared));
    }

    #[test]
    fn reset_returns_to_sniffing() {
        let mut decoder = StreamDecoder::new(DecoderConfig::default()).expect("decoder config");
        let mut out = String::new();
        let _ = decoder.push(&[0xEF, 0xBB, 0xBF, b'a'], &mut out);
        decoder.finish(&mut out);
        decoder.reset();
        assert_eq!(decoder.encoding(), None);
        let _ = decoder.push(b"b", &mut out);
        decoder.finish(&mut out);
        assert_eq!(out, "ab");
    }
}
