//! Incremental UTF-8 decoding for streaming byte sources.
//!
//! Multi-byte sequences split across chunks are carried over to the next
//! call. Invalid sequences decode to U+FFFD and decoding continues, so every
//! call makes forward progress.

/// Chunk-boundary-safe UTF-8 decoder.
///
/// Invariant: `carry` only ever holds an incomplete sequence prefix, so it is
/// at most 3 bytes long.
#[derive(Clone, Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes held back waiting for the rest of a sequence.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Decode `bytes`, appending complete characters to `out`.
    pub fn push(&mut self, bytes: &[u8], out: &mut String) {
        if bytes.is_empty() {
            return;
        }
        let mut remaining = bytes;

        // Complete the carried prefix with at most 3 bytes from this chunk,
        // then decode the rest in place.
        while !self.carry.is_empty() && !remaining.is_empty() {
            let expected = sequence_len(self.carry[0]);
            if expected == 0 {
                out.push('\u{FFFD}');
                self.carry.clear();
                break;
            }
            let needed = expected.saturating_sub(self.carry.len());
            if needed == 0 {
                let held = std::mem::take(&mut self.carry);
                decode_into(out, &mut self.carry, &held);
                continue;
            }
            if remaining.len() < needed {
                self.carry.extend_from_slice(remaining);
                return;
            }
            let mut scratch = [0u8; 8];
            let held = self.carry.len();
            scratch[..held].copy_from_slice(&self.carry);
            scratch[held..held + needed].copy_from_slice(&remaining[..needed]);
            self.carry.clear();
            decode_into(out, &mut self.carry, &scratch[..held + needed]);
            remaining = &remaining[needed..];
        }

        if !remaining.is_empty() {
            decode_into(out, &mut self.carry, remaining);
        }
    }

    /// Flush a dangling partial sequence as U+FFFD so the stream is never
    /// silently truncated.
    pub fn finish(&mut self, out: &mut String) {
        if self.carry.is_empty() {
            return;
        }
        out.push_str(&String::from_utf8_lossy(&self.carry));
        self.carry.clear();
    }

    pub fn reset(&mut self) {
        self.carry.clear();
    }
}

fn sequence_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn decode_into(out: &mut String, carry: &mut Vec<u8>, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                out.push_str(s);
                break;
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                let (valid, rest) = bytes.split_at(valid_up_to);
                if let Ok(s) = std::str::from_utf8(valid) {
                    out.push_str(s);
                }
                match e.error_len() {
                    Some(len) => {
                        out.push('\u{FFFD}');
                        bytes = &rest[len..];
                    }
                    None => {
                        carry.extend_from_slice(rest);
                        break;
                    }
                }
            }
        }
    }
}
