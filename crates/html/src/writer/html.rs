//! Serializes normalized events as HTML.
//!
//! Text and attribute values are escaped so that the output tokenizes back
//! into the same events. Characters the output encoding cannot represent
//! fall back to a Latin-1 entity name when one exists and to a hexadecimal
//! character reference otherwise.

use charset::{Encoding, StreamEncoder, UTF_8};

use crate::entities::latin1_entity_name;
use crate::error::ConvertError;
use crate::normalizer::{DoctypeEvent, NormalizerSink, TagEvent, TagOrigin};

#[derive(Clone, Debug)]
pub struct HtmlWriterConfig {
    /// Encoding the output will be written in; decides entity fallback.
    pub encoding: &'static Encoding,
    /// Escape every non-ASCII character.
    pub ascii_only: bool,
    /// Input is plain text: line breaks become `<br>` and space runs keep
    /// their width with `&nbsp;`.
    pub text_layout: bool,
}

impl Default for HtmlWriterConfig {
    fn default() -> Self {
        Self {
            encoding: UTF_8,
            ascii_only: false,
            text_layout: false,
        }
    }
}

/// Elements whose content is written without escaping.
fn is_raw_text_element(name: &str) -> bool {
    matches!(
        name,
        "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript"
    )
}

pub struct HtmlWriter {
    config: HtmlWriterConfig,
    out: String,
    probe: StreamEncoder,
    raw_depth: usize,
    /// After `<plaintext>` everything is text to the tokenizer: later markup
    /// is not written and content goes out unescaped.
    plaintext: bool,
    /// Text layout: a `\r` was just turned into a break.
    pending_cr: bool,
    /// Text layout: the previous character was a space or a line start.
    after_space: bool,
    wrote_any: bool,
}

impl HtmlWriter {
    pub fn new(config: HtmlWriterConfig) -> Result<Self, ConvertError> {
        let probe = StreamEncoder::new(config.encoding, false)?;
        Ok(Self {
            config,
            out: String::new(),
            probe,
            raw_depth: 0,
            plaintext: false,
            pending_cr: false,
            after_space: true,
            wrote_any: false,
        })
    }

    pub fn config(&self) -> &HtmlWriterConfig {
        &self.config
    }

    /// Serialized output not yet taken.
    pub fn output(&self) -> &str {
        &self.out
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    /// Move at most `max` bytes of pending output into `dst`, cut on a
    /// character boundary.
    pub fn drain_into(&mut self, dst: &mut String, max: usize) -> usize {
        drain_prefix(&mut self.out, dst, max)
    }

    pub fn reset(&mut self) {
        self.out.clear();
        self.probe.reset();
        self.raw_depth = 0;
        self.plaintext = false;
        self.pending_cr = false;
        self.after_space = true;
        self.wrote_any = false;
    }

    fn push_escaped(&mut self, text: &str, in_attribute: bool) {
        let needs_escape = |b: u8| {
            matches!(b, b'&' | b'<' | b'>') || (in_attribute && b == b'"') || b >= 0x80
        };
        let Some(first) = text.bytes().position(needs_escape) else {
            self.out.push_str(text);
            return;
        };
        self.out.push_str(&text[..first]);
        for ch in text[first..].chars() {
            match ch {
                '&' => self.out.push_str("&amp;"),
                '<' => self.out.push_str("&lt;"),
                '>' => self.out.push_str("&gt;"),
                '"' if in_attribute => self.out.push_str("&quot;"),
                '\u{A0}' => self.out.push_str("&nbsp;"),
                ch if ch.is_ascii() => self.out.push(ch),
                ch => self.push_non_ascii(ch),
            }
        }
    }

    fn push_non_ascii(&mut self, ch: char) {
        if !self.config.ascii_only && self.probe.can_encode(ch) {
            self.out.push(ch);
        } else if let Some(name) = latin1_entity_name(ch) {
            self.out.push('&');
            self.out.push_str(name);
            self.out.push(';');
        } else {
            self.out.push_str(&format!("&#x{:X};", ch as u32));
        }
    }

    /// Plain text input: breaks become `<br>`, the second space of a run and
    /// a space at line start become `&nbsp;`.
    fn push_text_layout(&mut self, text: &str) {
        for ch in text.chars() {
            match ch {
                '\r' => {
                    self.out.push_str("<br>\r\n");
                    self.pending_cr = true;
                    self.after_space = true;
                    continue;
                }
                '\n' if self.pending_cr => {}
                '\n' => {
                    self.out.push_str("<br>\r\n");
                    self.after_space = true;
                }
                ' ' if self.after_space => self.out.push_str("&nbsp;"),
                ' ' => {
                    self.out.push(' ');
                    self.after_space = true;
                }
                '\t' => {
                    self.out.push_str("&nbsp;&nbsp;&nbsp; ");
                    self.after_space = true;
                }
                ch => {
                    let mut buf = [0u8; 4];
                    self.push_escaped(ch.encode_utf8(&mut buf), false);
                    self.after_space = false;
                }
            }
            self.pending_cr = false;
        }
    }
}

impl NormalizerSink for HtmlWriter {
    fn start_tag(&mut self, tag: &TagEvent<'_>) {
        if self.plaintext {
            return;
        }
        self.wrote_any = true;
        self.out.push('<');
        self.out.push_str(tag.name);
        for attr in tag.attrs {
            self.out.push(' ');
            self.out.push_str(attr.name);
            if let Some(value) = attr.value {
                self.out.push_str("=\"");
                self.push_escaped(value, true);
                self.out.push('"');
            }
        }
        self.out.push('>');
        if tag.name == "plaintext" {
            self.plaintext = true;
        } else if !tag.self_closing && is_raw_text_element(tag.name) {
            self.raw_depth += 1;
        }
    }

    fn end_tag(&mut self, name: &str, _origin: TagOrigin) {
        if self.plaintext {
            return;
        }
        if self.raw_depth > 0 && is_raw_text_element(name) {
            self.raw_depth -= 1;
        }
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    fn text(&mut self, text: &str) {
        self.wrote_any = true;
        if self.raw_depth > 0 || self.plaintext {
            self.out.push_str(text);
        } else if self.config.text_layout {
            self.push_text_layout(text);
        } else {
            self.push_escaped(text, false);
        }
    }

    fn comment(&mut self, text: &str) {
        if self.plaintext {
            return;
        }
        self.wrote_any = true;
        self.out.push_str("<!--");
        self.out.push_str(&sanitize_comment(text));
        self.out.push_str("-->");
    }

    fn doctype(&mut self, doctype: &DoctypeEvent<'_>) {
        if self.plaintext {
            return;
        }
        self.wrote_any = true;
        self.out.push_str("<!DOCTYPE ");
        self.out.push_str(doctype.name.unwrap_or("html"));
        match (doctype.public_id, doctype.system_id) {
            (Some(public), system) => {
                self.out.push_str(" PUBLIC \"");
                self.out.push_str(&public.replace('"', ""));
                self.out.push('"');
                if let Some(system) = system {
                    self.out.push_str(" \"");
                    self.out.push_str(&system.replace('"', ""));
                    self.out.push('"');
                }
            }
            (None, Some(system)) => {
                self.out.push_str(" SYSTEM \"");
                self.out.push_str(&system.replace('"', ""));
                self.out.push('"');
            }
            (None, None) => {}
        }
        self.out.push_str(">\r\n");
    }

    fn end_of_document(&mut self) {
        if self.wrote_any && !self.plaintext {
            self.out.push_str("\r\n");
        }
    }
}

/// Comment text that cannot end the comment early or merge with `-->`.
fn sanitize_comment(text: &str) -> String {
    let mut out = text.replace("--", "- -");
    while out.contains("--") {
        out = out.replace("--", "- -");
    }
    if out.starts_with('>') || out.starts_with("->") {
        out.insert(0, ' ');
    }
    if out.ends_with('-') {
        out.push(' ');
    }
    out
}

/// Move a prefix of at most `max` bytes of `src` into `dst`, cut on a char
/// boundary. Always moves at least one character when `src` is non-empty
/// and `max > 0`.
pub(crate) fn drain_prefix(src: &mut String, dst: &mut String, max: usize) -> usize {
    if src.is_empty() || max == 0 {
        return 0;
    }
    if src.len() <= max {
        dst.push_str(src);
        let moved = src.len();
        src.clear();
        return moved;
    }
    let mut cut = max;
    while !src.is_char_boundary(cut) {
        cut -= 1;
    }
    if cut == 0 {
        cut = src.chars().next().map_or(src.len(), char::len_utf8);
    }
    dst.push_str(&src[..cut]);
    src.drain(..cut);
    cut
}
