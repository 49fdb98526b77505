//! Plain text output.
//!
//! Lines are wrapped at spaces once they exceed the configured width,
//! counted in characters. A word longer than the width is never split; the
//! line breaks at the first space after it instead. With `flowed` set the
//! output follows RFC 3676 `format=flowed`: soft breaks keep one trailing
//! space, hard breaks have none, and lines that would be misread are
//! space-stuffed. The signature separator `-- ` always keeps its space.
//!
//! In HTML layout mode the event stream is rendered the way a mail client
//! shows HTML as text: whitespace collapses, block elements start new lines,
//! paragraphs are separated by a blank line, list items get bullets and
//! `blockquote` adds a `>` quoting level.

use crate::normalizer::{NormalizerSink, TagEvent, TagOrigin};

pub const DEFAULT_WRAP_WIDTH: usize = 72;

#[derive(Clone, Debug)]
pub struct TextWriterConfig {
    pub wrap: bool,
    /// Maximum line length in characters, quoting prefix included.
    pub width: usize,
    pub flowed: bool,
    /// Quoting levels applied to every line.
    pub quote_level: usize,
    pub preserve_trailing_spaces: bool,
    pub preserve_tabs: bool,
    pub preserve_nbsp: bool,
    /// Render tags (HTML input) instead of copying text literally.
    pub html_layout: bool,
}

impl Default for TextWriterConfig {
    fn default() -> Self {
        Self {
            wrap: true,
            width: DEFAULT_WRAP_WIDTH,
            flowed: false,
            quote_level: 0,
            preserve_trailing_spaces: false,
            preserve_tabs: false,
            preserve_nbsp: false,
            html_layout: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PendingBreak {
    None,
    Line,
    Paragraph,
}

#[derive(Clone, Copy, Debug)]
enum ListState {
    Unordered,
    Ordered(u32),
}

#[derive(Clone, Copy, Debug)]
struct BreakPoint {
    byte: usize,
    chars: usize,
}

pub struct TextWriter {
    config: TextWriterConfig,
    out: String,
    line: String,
    line_chars: usize,
    /// Characters up to and including the last non-space.
    visible_chars: usize,
    /// Position just after the last space on the line.
    break_at: Option<BreakPoint>,
    pending_cr: bool,
    lines_written: usize,
    last_line_blank: bool,
    // HTML layout state.
    pending: PendingBreak,
    pending_space: bool,
    quote_depth: usize,
    pre_depth: usize,
    skip_depth: usize,
    lists: Vec<ListState>,
    cells_in_row: usize,
}

impl TextWriter {
    pub fn new(config: TextWriterConfig) -> Self {
        Self {
            config,
            out: String::new(),
            line: String::new(),
            line_chars: 0,
            visible_chars: 0,
            break_at: None,
            pending_cr: false,
            lines_written: 0,
            last_line_blank: false,
            pending: PendingBreak::None,
            pending_space: false,
            quote_depth: 0,
            pre_depth: 0,
            skip_depth: 0,
            lists: Vec::new(),
            cells_in_row: 0,
        }
    }

    pub fn config(&self) -> &TextWriterConfig {
        &self.config
    }

    /// Completed lines not yet taken.
    pub fn output(&self) -> &str {
        &self.out
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    pub fn drain_into(&mut self, dst: &mut String, max: usize) -> usize {
        super::html::drain_prefix(&mut self.out, dst, max)
    }

    pub fn reset(&mut self) {
        let config = self.config.clone();
        *self = Self::new(config);
    }

    fn quote_prefix_len(&self) -> usize {
        match self.config.quote_level + self.quote_depth {
            0 => 0,
            levels => levels + 1,
        }
    }

    fn wrap_width(&self) -> usize {
        self.config
            .width
            .saturating_sub(self.quote_prefix_len())
            .max(1)
    }

    fn push_char(&mut self, ch: char) {
        self.line.push(ch);
        self.line_chars += 1;
        if ch == ' ' {
            if self.visible_chars > 0 {
                self.break_at = Some(BreakPoint {
                    byte: self.line.len(),
                    chars: self.line_chars,
                });
            }
        } else {
            self.visible_chars = self.line_chars;
        }
        if !self.config.wrap || self.visible_chars <= self.wrap_width() {
            return;
        }
        if let Some(point) = self.break_at {
            self.wrap_at(point);
        }
    }

    /// Soft-break the line after `point`, carrying the rest over.
    fn wrap_at(&mut self, point: BreakPoint) {
        let rest = self.line.split_off(point.byte);
        let rest_chars = self.line_chars - point.chars;
        self.emit_line(true);
        self.line = rest;
        self.line_chars = rest_chars;
        self.visible_chars = rest_chars;
        self.break_at = None;
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "html.writer", "soft wrap at {} chars", point.chars);
    }

    fn push_mapped(&mut self, ch: char) {
        match ch {
            '\t' if !self.config.preserve_tabs => self.push_char(' '),
            '\u{A0}' if !self.config.preserve_nbsp => self.push_char(' '),
            ch => self.push_char(ch),
        }
    }

    fn emit_line(&mut self, soft: bool) {
        let mut line = std::mem::take(&mut self.line);
        let signature = line == "-- ";
        if !signature {
            let trimmed = line.trim_end_matches(' ').len();
            if soft && self.config.flowed {
                line.truncate(trimmed);
                line.push(' ');
            } else if self.config.flowed || !self.config.preserve_trailing_spaces {
                line.truncate(trimmed);
            }
        }
        let levels = self.config.quote_level + self.quote_depth;
        for _ in 0..levels {
            self.out.push('>');
        }
        if levels > 0 {
            self.out.push(' ');
        } else if self.config.flowed
            && (line.starts_with(' ') || line.starts_with('>') || line.starts_with("From "))
        {
            self.out.push(' ');
        }
        self.out.push_str(&line);
        self.out.push_str("\r\n");
        self.lines_written += 1;
        self.last_line_blank = line.is_empty();

        line.clear();
        self.line = line;
        self.line_chars = 0;
        self.visible_chars = 0;
        self.break_at = None;
    }

    fn hard_break(&mut self) {
        self.emit_line(false);
    }

    fn finish_line(&mut self) {
        if self.line_chars > 0 {
            self.hard_break();
        }
    }

    fn write_literal(&mut self, text: &str) {
        for ch in text.chars() {
            match ch {
                '\r' => {
                    self.hard_break();
                    self.pending_cr = true;
                    continue;
                }
                '\n' if self.pending_cr => {}
                '\n' => self.hard_break(),
                ch => self.push_mapped(ch),
            }
            self.pending_cr = false;
        }
    }

    fn request(&mut self, level: PendingBreak) {
        self.pending = self.pending.max(level);
        self.pending_space = false;
    }

    /// Apply a requested block break before new content.
    fn apply_pending(&mut self) {
        let pending = std::mem::replace(&mut self.pending, PendingBreak::None);
        if pending == PendingBreak::None {
            return;
        }
        self.finish_line();
        if pending == PendingBreak::Paragraph && self.lines_written > 0 && !self.last_line_blank {
            self.hard_break();
        }
    }

    fn write_collapsed(&mut self, text: &str) {
        for ch in text.chars() {
            if matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{C}') {
                self.pending_space = true;
                continue;
            }
            self.apply_pending();
            if std::mem::take(&mut self.pending_space) && self.line_chars > 0 {
                self.push_char(' ');
            }
            self.push_mapped(ch);
        }
    }

    fn write_list_marker(&mut self) {
        self.request(PendingBreak::Line);
        self.apply_pending();
        let indent = self.lists.len().saturating_sub(1) * 2;
        for _ in 0..indent {
            self.push_char(' ');
        }
        let marker = match self.lists.last_mut() {
            Some(ListState::Ordered(next)) => {
                let marker = format!("{next}. ");
                *next += 1;
                marker
            }
            Some(ListState::Unordered) | None => "* ".to_string(),
        };
        for ch in marker.chars() {
            self.push_char(ch);
        }
    }

    fn start_block(&mut self, name: &str) {
        match name {
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "table" | "address" | "center"
            | "fieldset" | "figure" | "dl" | "listing" | "xmp" => {
                self.request(PendingBreak::Paragraph)
            }
            "div" | "tr" | "caption" | "dt" | "section" | "article" | "header" | "footer"
            | "nav" | "main" | "aside" | "form" | "thead" | "tbody" | "tfoot" => {
                self.request(PendingBreak::Line)
            }
            _ => {}
        }
    }
}

impl NormalizerSink for TextWriter {
    fn start_tag(&mut self, tag: &TagEvent<'_>) {
        if !self.config.html_layout {
            return;
        }
        match tag.name {
            "script" | "style" | "title" | "noscript" | "template" => self.skip_depth += 1,
            _ if self.skip_depth > 0 => {}
            "br" => {
                self.apply_pending();
                self.pending_space = false;
                self.hard_break();
            }
            "hr" => {
                self.request(PendingBreak::Paragraph);
                self.apply_pending();
                for _ in 0..self.wrap_width() {
                    self.push_char('-');
                }
                self.request(PendingBreak::Paragraph);
            }
            "img" => {
                let alt = tag
                    .attrs
                    .iter()
                    .find(|attr| attr.name == "alt")
                    .and_then(|attr| attr.value);
                if let Some(alt) = alt {
                    self.write_collapsed(alt);
                }
            }
            "blockquote" => {
                self.apply_pending();
                self.finish_line();
                self.quote_depth += 1;
                self.request(PendingBreak::Paragraph);
            }
            "pre" => {
                self.request(PendingBreak::Paragraph);
                self.pre_depth += 1;
            }
            "ul" | "dir" | "menu" | "ol" => {
                let state = if tag.name == "ol" {
                    let start = tag
                        .attrs
                        .iter()
                        .find(|attr| attr.name == "start")
                        .and_then(|attr| attr.value)
                        .and_then(|value| value.trim().parse().ok())
                        .unwrap_or(1);
                    ListState::Ordered(start)
                } else {
                    ListState::Unordered
                };
                let level = if self.lists.is_empty() {
                    PendingBreak::Paragraph
                } else {
                    PendingBreak::Line
                };
                self.lists.push(state);
                self.request(level);
            }
            "li" => self.write_list_marker(),
            "dd" => {
                self.request(PendingBreak::Line);
                self.apply_pending();
                for _ in 0..4 {
                    self.push_char(' ');
                }
            }
            "tr" => {
                self.cells_in_row = 0;
                self.request(PendingBreak::Line);
            }
            "td" | "th" => {
                if self.cells_in_row > 0 {
                    self.apply_pending();
                    self.pending_space = false;
                    self.push_mapped('\t');
                }
                self.cells_in_row += 1;
            }
            name => self.start_block(name),
        }
    }

    fn end_tag(&mut self, name: &str, _origin: TagOrigin) {
        if !self.config.html_layout {
            return;
        }
        match name {
            "script" | "style" | "title" | "noscript" | "template" => {
                self.skip_depth = self.skip_depth.saturating_sub(1)
            }
            _ if self.skip_depth > 0 => {}
            "blockquote" => {
                self.pending = PendingBreak::None;
                self.finish_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.request(PendingBreak::Paragraph);
            }
            "pre" => {
                self.pre_depth = self.pre_depth.saturating_sub(1);
                self.request(PendingBreak::Paragraph);
            }
            "ul" | "dir" | "menu" | "ol" => {
                self.lists.pop();
                let level = if self.lists.is_empty() {
                    PendingBreak::Paragraph
                } else {
                    PendingBreak::Line
                };
                self.request(level);
            }
            "li" | "dd" | "tr" => self.request(PendingBreak::Line),
            name => self.start_block(name),
        }
    }

    fn text(&mut self, text: &str) {
        if !self.config.html_layout {
            self.write_literal(text);
        } else if self.skip_depth > 0 {
        } else if self.pre_depth > 0 {
            self.apply_pending();
            self.write_literal(text);
        } else {
            self.write_collapsed(text);
        }
    }

    fn end_of_document(&mut self) {
        self.pending = PendingBreak::None;
        self.finish_line();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(config: TextWriterConfig, chunks: &[&str]) -> String {
        let mut writer = TextWriter::new(config);
        for chunk in chunks {
            writer.text(chunk);
        }
        writer.end_of_document();
        writer.take_output()
    }

    fn narrow(width: usize) -> TextWriterConfig {
        TextWriterConfig {
            width,
            ..TextWriterConfig::default()
        }
    }

    fn tag(writer: &mut TextWriter, name: &str) {
        writer.start_tag(&TagEvent {
            name,
            attrs: &[],
            self_closing: false,
            origin: TagOrigin::Source,
        });
    }

    fn end(writer: &mut TextWriter, name: &str) {
        writer.end_tag(name, TagOrigin::Source);
    }

    #[test]
    fn wraps_at_the_last_space_before_the_width() {
        assert_eq!(
            literal(narrow(10), &["the quick brown fox jumps"]),
            "the quick\r\nbrown fox\r\njumps\r\n"
        );
    }

    #[test]
    fn long_words_are_never_split() {
        assert_eq!(
            literal(narrow(5), &["a abcdefghij b"]),
            "a\r\nabcdefghij\r\nb\r\n"
        );
    }

    #[test]
    fn width_is_counted_in_characters() {
        assert_eq!(
            literal(narrow(5), &["\u{e9}\u{e9} \u{e9}"]),
            "\u{e9}\u{e9} \u{e9}\r\n"
        );
        assert_eq!(
            literal(narrow(5), &["\u{e9}\u{e9}\u{e9}\u{e9} \u{e9}\u{e9}"]),
            "\u{e9}\u{e9}\u{e9}\u{e9}\r\n\u{e9}\u{e9}\r\n"
        );
    }

    #[test]
    fn wrapping_is_independent_of_chunking() {
        let text = "one two three four five six seven";
        let whole = literal(narrow(9), &[text]);
        let split: Vec<&str> = text.split_inclusive(|_| true).collect();
        assert_eq!(literal(narrow(9), &split), whole);
    }

    #[test]
    fn line_breaks_are_normalized_across_chunks() {
        let config = TextWriterConfig {
            wrap: false,
            ..TextWriterConfig::default()
        };
        assert_eq!(literal(config, &["a\r", "\nb\nc\r"]), "a\r\nb\r\nc\r\n");
    }

    #[test]
    fn flowed_output_marks_soft_breaks() {
        let config = TextWriterConfig {
            flowed: true,
            ..narrow(10)
        };
        assert_eq!(
            literal(config, &["the quick brown\nFrom here  \n-- \nme"]),
            "the quick \r\nbrown\r\n From here\r\n-- \r\nme\r\n"
        );
    }

    #[test]
    fn trailing_spaces_tabs_and_nbsp_follow_flags() {
        let plain = TextWriterConfig {
            wrap: false,
            ..TextWriterConfig::default()
        };
        assert_eq!(literal(plain.clone(), &["a\t\u{A0}b  \n"]), "a  b\r\n");
        let preserving = TextWriterConfig {
            preserve_trailing_spaces: true,
            preserve_tabs: true,
            preserve_nbsp: true,
            ..plain
        };
        assert_eq!(
            literal(preserving, &["a\t\u{A0}b  \n"]),
            "a\t\u{A0}b  \r\n"
        );
    }

    #[test]
    fn quote_level_prefixes_every_line() {
        let config = TextWriterConfig {
            quote_level: 2,
            ..narrow(10)
        };
        assert_eq!(literal(config, &["one two three"]), ">> one two\r\n>> three\r\n");
    }

    #[test]
    fn html_layout_separates_blocks() {
        let mut writer = TextWriter::new(TextWriterConfig {
            html_layout: true,
            ..TextWriterConfig::default()
        });
        tag(&mut writer, "p");
        writer.text("  Hello\n   world ");
        end(&mut writer, "p");
        tag(&mut writer, "p");
        writer.text("second");
        tag(&mut writer, "br");
        writer.text("line");
        end(&mut writer, "p");
        tag(&mut writer, "script");
        writer.text("ignored()");
        end(&mut writer, "script");
        writer.end_of_document();
        assert_eq!(writer.output(), "Hello world\r\n\r\nsecond\r\nline\r\n");
    }

    #[test]
    fn html_layout_lists_and_quotes() {
        let mut writer = TextWriter::new(TextWriterConfig {
            html_layout: true,
            ..TextWriterConfig::default()
        });
        tag(&mut writer, "ol");
        tag(&mut writer, "li");
        writer.text("first");
        end(&mut writer, "li");
        tag(&mut writer, "li");
        writer.text("second");
        tag(&mut writer, "ul");
        tag(&mut writer, "li");
        writer.text("nested");
        end(&mut writer, "li");
        end(&mut writer, "ul");
        end(&mut writer, "li");
        end(&mut writer, "ol");
        tag(&mut writer, "blockquote");
        writer.text("quoted");
        end(&mut writer, "blockquote");
        writer.text("after");
        writer.end_of_document();
        assert_eq!(
            writer.output(),
            "1. first\r\n2. second\r\n  * nested\r\n\r\n> quoted\r\n\r\nafter\r\n"
        );
    }

    #[test]
    fn html_layout_keeps_preformatted_text() {
        let mut writer = TextWriter::new(TextWriterConfig {
            html_layout: true,
            wrap: false,
            ..TextWriterConfig::default()
        });
        writer.text("intro");
        tag(&mut writer, "pre");
        writer.text("a  b\nc");
        end(&mut writer, "pre");
        writer.end_of_document();
        assert_eq!(writer.output(), "intro\r\n\r\na  b\r\nc\r\n");
    }
}
