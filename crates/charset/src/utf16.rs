//! Surrogate-pair-safe decoding of UTF-16 code unit streams.
//!
//! A high surrogate at the end of a chunk is held back until the next chunk
//! arrives. Unpaired surrogates decode to U+FFFD.

const REPLACEMENT: char = '\u{FFFD}';

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Streaming UTF-16 decoder over already-split code units.
#[derive(Clone, Copy, Debug, Default)]
pub struct Utf16Decoder {
    pending_high: Option<u16>,
}

impl Utf16Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        self.pending_high.is_some()
    }

    pub fn push(&mut self, units: &[u16], out: &mut String) {
        for &unit in units {
            if let Some(high) = self.pending_high.take() {
                if is_low_surrogate(unit) {
                    let scalar =
                        0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
                    out.push(char::from_u32(scalar).unwrap_or(REPLACEMENT));
                    continue;
                }
                out.push(REPLACEMENT);
            }
            if is_high_surrogate(unit) {
                self.pending_high = Some(unit);
            } else if is_low_surrogate(unit) {
                out.push(REPLACEMENT);
            } else {
                out.push(char::from_u32(u32::from(unit)).unwrap_or(REPLACEMENT));
            }
        }
    }

    pub fn finish(&mut self, out: &mut String) {
        if self.pending_high.take().is_some() {
            out.push(REPLACEMENT);
        }
    }

    pub fn reset(&mut self) {
        self.pending_high = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_split_across_chunks_decodes_once() {
        let units: Vec<u16> = "a\u{1F600}b".encode_utf16().collect();
        assert_eq!(units.len(), 4);
        let mut decoder = Utf16Decoder::new();
        let mut out = String::new();
        decoder.push(&units[..2], &mut out);
        assert_eq!(out, "a");
        assert!(decoder.has_pending());
        decoder.push(&units[2..], &mut out);
        assert_eq!(out, "a\u{1F600}b");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn unpaired_surrogates_are_replaced() {
        let mut decoder = Utf16Decoder::new();
        let mut out = String::new();
        decoder.push(&[0xDC00, 0x0041, 0xD800, 0x0042], &mut out);
        assert_eq!(out, "\u{FFFD}A\u{FFFD}B");
        decoder.push(&[0xD83D], &mut out);
        decoder.finish(&mut out);
        assert_eq!(out, "\u{FFFD}A\u{FFFD}B\u{FFFD}");
    }
}
