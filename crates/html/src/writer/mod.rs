//! Output writers driven by the normalizer.

mod html;
mod text;

pub(crate) use html::drain_prefix;
pub use html::{HtmlWriter, HtmlWriterConfig};
pub use text::{DEFAULT_WRAP_WIDTH, TextWriter, TextWriterConfig};

use crate::normalizer::{DoctypeEvent, NormalizerSink, TagEvent, TagOrigin};

/// Either output writer, selected by the requested output format.
pub enum OutputWriter {
    Html(HtmlWriter),
    Text(TextWriter),
}

impl OutputWriter {
    /// Serialized output not yet drained.
    pub fn pending(&self) -> &str {
        match self {
            OutputWriter::Html(writer) => writer.output(),
            OutputWriter::Text(writer) => writer.output(),
        }
    }

    pub fn drain_into(&mut self, dst: &mut String, max: usize) -> usize {
        match self {
            OutputWriter::Html(writer) => writer.drain_into(dst, max),
            OutputWriter::Text(writer) => writer.drain_into(dst, max),
        }
    }

    pub fn take_output(&mut self) -> String {
        match self {
            OutputWriter::Html(writer) => writer.take_output(),
            OutputWriter::Text(writer) => writer.take_output(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            OutputWriter::Html(writer) => writer.reset(),
            OutputWriter::Text(writer) => writer.reset(),
        }
    }

    fn sink(&mut self) -> &mut dyn NormalizerSink {
        match self {
            OutputWriter::Html(writer) => writer,
            OutputWriter::Text(writer) => writer,
        }
    }
}

impl NormalizerSink for OutputWriter {
    fn start_tag(&mut self, tag: &TagEvent<'_>) {
        self.sink().start_tag(tag);
    }

    fn end_tag(&mut self, name: &str, origin: TagOrigin) {
        self.sink().end_tag(name, origin);
    }

    fn text(&mut self, text: &str) {
        self.sink().text(text);
    }

    fn comment(&mut self, text: &str) {
        self.sink().comment(text);
    }

    fn doctype(&mut self, doctype: &DoctypeEvent<'_>) {
        self.sink().doctype(doctype);
    }

    fn end_of_document(&mut self) {
        self.sink().end_of_document();
    }
}
