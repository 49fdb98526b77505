//! Character encoding plumbing for the conversion pipeline.
//!
//! - `sniff`: byte order mark detection and `<meta>` charset prescan.
//! - `decoder`: streaming bytes -> `String` decoding with optional sniffing.
//! - `encoder`: streaming `&str` -> bytes encoding with representability probes.
//! - `utf8` / `utf16`: chunk-boundary-safe decoders used by the adapters.

pub mod decoder;
pub mod encoder;
mod error;
pub mod sniff;
pub mod utf16;
pub mod utf8;

pub use decoder::{DecodeResult, DecoderConfig, Detection, StreamDecoder};
pub use encoder::StreamEncoder;
pub use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
pub use error::CharsetError;
pub use utf16::Utf16Decoder;

/// Resolve a WHATWG encoding label (`"utf-8"`, `"latin1"`, `"shift_jis"`, ...).
pub fn lookup(label: &str) -> Result<&'static Encoding, CharsetError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| CharsetError::UnknownLabel(label.to_string()))
}
