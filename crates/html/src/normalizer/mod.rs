//! Normalizing parser and safe-list filter.
//!
//! Consumes tokenizer batches and drives a [`NormalizerSink`] with a
//! balanced event stream:
//! - every start tag that is not void is matched by exactly one end tag;
//! - end tags with no open element in scope are dropped;
//! - elements left open by a misnested end tag are closed (origin
//!   `Implied`) and formatting elements whose properties are lost are
//!   reopened (origin `Reopened`);
//! - the document is wrapped in `html`/`body`, or in a `div` for fragments
//!   (origin `Structural`).
//!
//! With filtering enabled only safe-listed tags and attributes reach the
//! sink. Content-dropping elements lose their subtree; other removed
//! elements keep their content. Exceeding `max_nesting_depth` open elements
//! is fatal.

use std::rc::Rc;

use crate::error::ConvertError;
use crate::shared::{
    AtomId, Attribute, AttributeValue, DocumentParseContext, Input, TextValue, Token,
};
use crate::tokenizer::{HtmlTokenizer, TextResolver, TokenBatch, TokenizerConfig};

use elements::{ElementCache, ElementInfo, ElementKind, element_properties};
use safelist::{CompiledSafeList, TagPolicy, is_event_handler};
use stack::{ElementStack, Frame, OwnedAttribute, ScopeKind};

mod elements;
mod safelist;
mod stack;
mod url;

pub use safelist::SafeList;
pub use url::{DEFAULT_URL_SCHEMES, URL_ATTRIBUTES, is_safe_url};

pub const DEFAULT_MAX_NESTING_DEPTH: usize = 4096;

/// Formatting elements reopened after a single misnested end tag, at most.
pub const MAX_REOPENED_PER_END_TAG: usize = 8;

/// Atom of synthetic structure frames; they are never matched by atom.
const STRUCTURAL_ATOM: AtomId = AtomId(u32::MAX);

/// Opening tag of the fragment wrapper as written by `HtmlWriter`.
pub const FRAGMENT_OPEN: &str = "<div>";
/// Closing tag of the fragment wrapper plus the final line break.
pub const FRAGMENT_CLOSE: &str = "</div>\r\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectionFormat {
    /// Inserted as text.
    Text,
    /// Tokenized and normalized like the document itself.
    Html,
}

/// Header or footer content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Injection {
    pub content: String,
    pub format: InjectionFormat,
}

impl Injection {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            format: InjectionFormat::Text,
        }
    }

    pub fn html(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            format: InjectionFormat::Html,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NormalizerConfig {
    /// Enforce the safe-list. Without it the normalizer only re-balances.
    pub filter: bool,
    /// Wrap output in a `div` instead of `html`/`body`.
    pub fragment: bool,
    pub max_nesting_depth: usize,
    pub safe_list: SafeList,
    /// Inserted at the start of the body.
    pub header: Option<Injection>,
    /// Inserted at the end of the body, after open elements are closed.
    pub footer: Option<Injection>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            filter: true,
            fragment: false,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            safe_list: SafeList::default(),
            header: None,
            footer: None,
        }
    }
}

impl NormalizerConfig {
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.max_nesting_depth == 0 {
            return Err(ConvertError::InvalidConfiguration(
                "max_nesting_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Why a tag event was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagOrigin {
    /// Present in the input.
    Source,
    /// Synthesized to close an element left open.
    Implied,
    /// A formatting element reopened after a misnested end tag.
    Reopened,
    /// Document or fragment wrapper.
    Structural,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttrEvent<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagEvent<'a> {
    pub name: &'a str,
    pub attrs: &'a [AttrEvent<'a>],
    /// Void element: no end tag follows.
    pub self_closing: bool,
    pub origin: TagOrigin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoctypeEvent<'a> {
    pub name: Option<&'a str>,
    pub public_id: Option<&'a str>,
    pub system_id: Option<&'a str>,
}

/// Consumer of the normalized event stream.
pub trait NormalizerSink {
    fn start_tag(&mut self, tag: &TagEvent<'_>);

    fn end_tag(&mut self, name: &str, origin: TagOrigin);

    fn text(&mut self, text: &str);

    fn comment(&mut self, _text: &str) {}

    fn doctype(&mut self, _doctype: &DoctypeEvent<'_>) {}

    fn end_of_document(&mut self) {}
}

/// Owned copy of one sink event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormalizedEvent {
    Start {
        name: String,
        attrs: Vec<(String, Option<String>)>,
        self_closing: bool,
        origin: TagOrigin,
    },
    End {
        name: String,
        origin: TagOrigin,
    },
    Text(String),
    Comment(String),
    Doctype {
        name: Option<String>,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    EndOfDocument,
}

/// Sink that records events into a Vec.
impl NormalizerSink for Vec<NormalizedEvent> {
    fn start_tag(&mut self, tag: &TagEvent<'_>) {
        self.push(NormalizedEvent::Start {
            name: tag.name.to_string(),
            attrs: tag
                .attrs
                .iter()
                .map(|attr| (attr.name.to_string(), attr.value.map(str::to_string)))
                .collect(),
            self_closing: tag.self_closing,
            origin: tag.origin,
        });
    }

    fn end_tag(&mut self, name: &str, origin: TagOrigin) {
        self.push(NormalizedEvent::End {
            name: name.to_string(),
            origin,
        });
    }

    fn text(&mut self, text: &str) {
        match self.last_mut() {
            Some(NormalizedEvent::Text(last)) => last.push_str(text),
            _ => self.push(NormalizedEvent::Text(text.to_string())),
        }
    }

    fn comment(&mut self, text: &str) {
        self.push(NormalizedEvent::Comment(text.to_string()));
    }

    fn doctype(&mut self, doctype: &DoctypeEvent<'_>) {
        self.push(NormalizedEvent::Doctype {
            name: doctype.name.map(str::to_string),
            public_id: doctype.public_id.map(str::to_string),
            system_id: doctype.system_id.map(str::to_string),
        });
    }

    fn end_of_document(&mut self) {
        self.push(NormalizedEvent::EndOfDocument);
    }
}

/// Subtree being skipped, with the nesting depth of same-named elements.
#[derive(Clone, Copy, Debug)]
struct Dropping {
    atom: AtomId,
    depth: usize,
}

pub struct Normalizer {
    config: NormalizerConfig,
    safe_list: CompiledSafeList,
    elements: ElementCache,
    /// String table behind `FontFace` property handles.
    strings: crate::shared::AtomTable,
    stack: ElementStack,
    dropping: Option<Dropping>,
    structure_open: bool,
    after_body: bool,
    saw_input: bool,
    doctype_written: bool,
    finished: bool,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig, ctx: &mut DocumentParseContext) -> Self {
        let safe_list = config.safe_list.compile(&mut ctx.atoms);
        Self {
            config,
            safe_list,
            elements: ElementCache::default(),
            strings: crate::shared::AtomTable::new(),
            stack: ElementStack::default(),
            dropping: None,
            structure_open: false,
            after_body: false,
            saw_input: false,
            doctype_written: false,
            finished: false,
        }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Deepest content nesting seen since the last reset.
    pub fn max_depth(&self) -> usize {
        self.stack.max_depth()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Normalize every token of `batch`.
    pub fn process_batch(
        &mut self,
        batch: &TokenBatch<'_>,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Result<(), ConvertError> {
        let resolver = batch.resolver();
        for token in batch.iter() {
            self.process_token(token, &resolver, ctx, sink)?;
        }
        Ok(())
    }

    pub fn process_token(
        &mut self,
        token: &Token,
        resolver: &dyn TextResolver,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Result<(), ConvertError> {
        assert!(
            !self.finished,
            "Normalizer::process_token called after the document was finished"
        );
        if !self.safe_list.is_compiled_for(&ctx.atoms) {
            self.safe_list = self.config.safe_list.compile(&mut ctx.atoms);
            self.elements.clear();
        }
        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => self.start_tag(*name, attrs, *self_closing, resolver, ctx, sink),
            Token::EndTag { name } => self.end_tag(*name, ctx, sink),
            Token::Text { text } => {
                let text = resolve_text(text, resolver)?;
                self.text(text, ctx, sink)
            }
            Token::Comment { text } => {
                let text = resolve_text(text, resolver)?;
                self.comment(text, ctx, sink)
            }
            Token::Doctype {
                name,
                public_id,
                system_id,
            } => {
                self.saw_input = true;
                if self.config.filter
                    || self.config.fragment
                    || self.structure_open
                    || self.doctype_written
                {
                    return Ok(());
                }
                self.doctype_written = true;
                let name = name.and_then(|name| ctx.atoms.resolve(name));
                sink.doctype(&DoctypeEvent {
                    name,
                    public_id: public_id.as_deref(),
                    system_id: system_id.as_deref(),
                });
                Ok(())
            }
            Token::Eof => self.finish(ctx, sink),
        }
    }

    /// Close everything still open, add the footer and end the document.
    /// Input that produced no tokens at all produces no output. Calling it
    /// again is a no-op.
    pub fn finish(
        &mut self,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Result<(), ConvertError> {
        if self.finished {
            return Ok(());
        }
        self.dropping = None;
        if self.structure_open || self.saw_input {
            self.open_structure(ctx, sink)?;
            self.close_to(self.stack.structural_len(), ctx, sink);
            if let Some(footer) = self.config.footer.clone() {
                self.inject(&footer, ctx, sink)?;
            }
            while let Some(frame) = self.stack.pop() {
                sink.end_tag(&frame.name, TagOrigin::Structural);
            }
        }
        self.finished = true;
        sink.end_of_document();
        Ok(())
    }

    /// Forget the current document; configuration and caches are kept.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.dropping = None;
        self.structure_open = false;
        self.after_body = false;
        self.saw_input = false;
        self.doctype_written = false;
        self.finished = false;
    }

    fn start_tag(
        &mut self,
        atom: AtomId,
        attrs: &[Attribute],
        self_closing: bool,
        resolver: &dyn TextResolver,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Result<(), ConvertError> {
        self.saw_input = true;
        if let Some(dropping) = self.dropping.as_mut() {
            if dropping.atom == atom && !self_closing {
                dropping.depth += 1;
            }
            return Ok(());
        }
        let Some(entry) = self.elements.get(atom, &ctx.atoms) else {
            return Ok(());
        };
        let (name, info) = (Rc::clone(&entry.name), entry.info);
        if info.kind == ElementKind::Document {
            return Ok(());
        }
        if !self.passes_filter(atom, &name, info, self_closing, ctx) {
            return Ok(());
        }

        self.open_structure(ctx, sink)?;
        let reopen = self.close_implied(info, ctx, sink);
        let attrs = self.output_attributes(atom, attrs, resolver, ctx)?;
        self.open_element(atom, name, info, attrs, TagOrigin::Source, sink)?;
        if !info.is_table_part() {
            self.reopen(reopen, ctx, sink)?;
        }
        Ok(())
    }

    /// Apply the tag safe-list. Enters dropping mode for content-dropping
    /// elements and returns whether the tag itself is kept.
    fn passes_filter(
        &mut self,
        atom: AtomId,
        name: &str,
        info: ElementInfo,
        self_closing: bool,
        ctx: &mut DocumentParseContext,
    ) -> bool {
        if !self.config.filter {
            return true;
        }
        match self.safe_list.tag_policy(atom) {
            TagPolicy::Allow => true,
            TagPolicy::Remove => {
                ctx.counters.elements_filtered += 1;
                false
            }
            TagPolicy::DropContent => {
                ctx.counters.elements_filtered += 1;
                let foreign_self_closed = self_closing && matches!(name, "svg" | "math");
                if !info.is_void() && !foreign_self_closed {
                    self.dropping = Some(Dropping { atom, depth: 1 });
                }
                false
            }
        }
    }

    fn end_tag(
        &mut self,
        atom: AtomId,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Result<(), ConvertError> {
        self.saw_input = true;
        if let Some(dropping) = self.dropping.as_mut() {
            if dropping.atom == atom {
                dropping.depth -= 1;
                if dropping.depth == 0 {
                    self.dropping = None;
                }
            }
            return Ok(());
        }
        let Some(entry) = self.elements.get(atom, &ctx.atoms) else {
            return Ok(());
        };
        let (name, info) = (Rc::clone(&entry.name), entry.info);
        match info.kind {
            ElementKind::Document => {
                if self.structure_open && &*name != "head" {
                    self.after_body = true;
                }
                return Ok(());
            }
            // `</br>` is read as `<br>`.
            ElementKind::LineBreak => {
                if !self.passes_filter(atom, &name, info, true, ctx) {
                    return Ok(());
                }
                self.open_structure(ctx, sink)?;
                return self.open_element(
                    atom,
                    name,
                    info,
                    Vec::new(),
                    TagOrigin::Source,
                    sink,
                );
            }
            _ => {}
        }
        if info.is_void() || (self.config.filter && self.safe_list.tag_policy(atom) != TagPolicy::Allow)
        {
            return Ok(());
        }

        let index = if info.kind == ElementKind::Heading {
            self.stack
                .find_in_scope(ScopeKind::InScope, |f| f.info.kind == ElementKind::Heading)
        } else {
            self.stack
                .find_in_scope(ScopeKind::for_end_tag(info.kind), |f| f.atom == atom)
        };
        let Some(index) = index else {
            ctx.counters.end_tags_ignored += 1;
            log::trace!(target: "html.normalizer", "ignoring unmatched end tag </{name}>");
            return Ok(());
        };
        let reopen = self.close_through(index, TagOrigin::Source, ctx, sink);
        self.reopen(reopen, ctx, sink)
    }

    fn text(
        &mut self,
        text: &str,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Result<(), ConvertError> {
        if text.is_empty() {
            return Ok(());
        }
        self.saw_input = true;
        if self.dropping.is_some() {
            return Ok(());
        }
        let blank = text.chars().all(is_html_whitespace);
        if blank && !self.config.fragment && (!self.structure_open || self.after_body) {
            return Ok(());
        }
        if !blank {
            self.after_body = false;
        }
        self.open_structure(ctx, sink)?;
        sink.text(text);
        Ok(())
    }

    fn comment(
        &mut self,
        text: &str,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Result<(), ConvertError> {
        self.saw_input = true;
        if self.dropping.is_some() || self.config.filter {
            return Ok(());
        }
        self.open_structure(ctx, sink)?;
        sink.comment(text);
        Ok(())
    }

    /// Emit the wrapper and the header before the first content.
    fn open_structure(
        &mut self,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Result<(), ConvertError> {
        if self.structure_open {
            return Ok(());
        }
        self.structure_open = true;
        let names: &[&str] = if self.config.fragment {
            &["div"]
        } else {
            &["html", "body"]
        };
        for name in names {
            sink.start_tag(&TagEvent {
                name,
                attrs: &[],
                self_closing: false,
                origin: TagOrigin::Structural,
            });
            self.stack.push(Frame {
                atom: STRUCTURAL_ATOM,
                name: Rc::from(*name),
                info: ElementInfo::classify(name),
                structural: true,
                own: Default::default(),
                effective: Default::default(),
                attrs: Vec::new(),
            });
        }
        if let Some(header) = self.config.header.clone() {
            self.inject(&header, ctx, sink)?;
        }
        Ok(())
    }

    fn inject(
        &mut self,
        injection: &Injection,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Result<(), ConvertError> {
        match injection.format {
            InjectionFormat::Text => {
                if !injection.content.is_empty() {
                    sink.text(&injection.content);
                }
            }
            InjectionFormat::Html => {
                let floor = self.stack.len();
                let mut input = Input::new();
                input.push_str(&injection.content);
                let config = TokenizerConfig {
                    emit_eof: false,
                    ..TokenizerConfig::default()
                };
                let mut tokenizer = HtmlTokenizer::new(config, ctx);
                tokenizer.finish(&input, ctx);
                let batch = tokenizer.next_batch(&mut input);
                let resolver = batch.resolver();
                for token in batch.iter() {
                    self.process_token(token, &resolver, ctx, sink)?;
                }
                self.dropping = None;
                self.close_to(floor, ctx, sink);
            }
        }
        Ok(())
    }

    /// Close the elements a start tag of `info` implies, returning the
    /// formatting elements to reopen inside it.
    fn close_implied(
        &mut self,
        info: ElementInfo,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Vec<Frame> {
        let mut reopen = Vec::new();
        if info.closes_paragraph()
            && let Some(index) = self
                .stack
                .find_in_scope(ScopeKind::Button, |f| f.info.kind == ElementKind::Paragraph)
        {
            reopen.extend(self.close_through(index, TagOrigin::Implied, ctx, sink));
        }

        let top_kind = self.stack.current().filter(|f| !f.structural).map(|f| f.info.kind);
        let index = match info.kind {
            ElementKind::ListItem => self
                .stack
                .find_in_scope(ScopeKind::ListItem, |f| f.info.kind == ElementKind::ListItem),
            ElementKind::DefinitionItem => self.stack.find_in_scope(ScopeKind::ListItem, |f| {
                f.info.kind == ElementKind::DefinitionItem
            }),
            ElementKind::Row => self
                .stack
                .find_in_scope(ScopeKind::Table, |f| f.info.kind == ElementKind::Row),
            ElementKind::Cell => self
                .stack
                .find_in_scope(ScopeKind::Table, |f| f.info.kind == ElementKind::Cell),
            ElementKind::TableSection => self
                .stack
                .find_in_scope(ScopeKind::Table, |f| f.info.kind == ElementKind::TableSection),
            ElementKind::Anchor | ElementKind::Button | ElementKind::NoBr => self
                .stack
                .find_in_scope(ScopeKind::InScope, |f| f.info.kind == info.kind),
            ElementKind::Heading | ElementKind::Option if top_kind == Some(info.kind) => {
                Some(self.stack.len() - 1)
            }
            ElementKind::OptGroup => {
                if top_kind == Some(ElementKind::Option) {
                    self.close_through(self.stack.len() - 1, TagOrigin::Implied, ctx, sink);
                }
                let top_kind = self.stack.current().filter(|f| !f.structural).map(|f| f.info.kind);
                (top_kind == Some(ElementKind::OptGroup)).then(|| self.stack.len() - 1)
            }
            _ => None,
        };
        if let Some(index) = index {
            reopen.extend(self.close_through(index, TagOrigin::Implied, ctx, sink));
        }
        reopen
    }

    /// Pop frames down to and including `index`. Frames above it close as
    /// `Implied`; the frame at `index` closes with `origin`. Returns the
    /// formatting elements above the target that are candidates for
    /// reopening, bottom first, cut at the first scope marker.
    fn close_through(
        &mut self,
        index: usize,
        origin: TagOrigin,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Vec<Frame> {
        let mut popped = Vec::new();
        while self.stack.len() > index + 1 {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            sink.end_tag(&frame.name, TagOrigin::Implied);
            ctx.counters.elements_auto_closed += 1;
            popped.push(frame);
        }
        let Some(target) = self.stack.pop() else {
            return Vec::new();
        };
        sink.end_tag(&target.name, origin);
        if origin == TagOrigin::Implied {
            ctx.counters.elements_auto_closed += 1;
        }
        if target.info.is_scope() {
            return Vec::new();
        }
        popped.reverse();
        popped
            .into_iter()
            .take_while(|frame| !frame.info.is_scope())
            .filter(|frame| frame.info.is_formatting())
            .collect()
    }

    /// Close every frame above `floor` as `Implied`.
    fn close_to(
        &mut self,
        floor: usize,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) {
        while self.stack.len() > floor {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            sink.end_tag(&frame.name, TagOrigin::Implied);
            ctx.counters.elements_auto_closed += 1;
        }
    }

    fn reopen(
        &mut self,
        candidates: Vec<Frame>,
        ctx: &mut DocumentParseContext,
        sink: &mut dyn NormalizerSink,
    ) -> Result<(), ConvertError> {
        let mut reopened = 0;
        for frame in candidates {
            if reopened == MAX_REOPENED_PER_END_TAG {
                break;
            }
            if frame.own.is_effective_in(&self.stack.effective()) {
                continue;
            }
            self.open_element(
                frame.atom,
                frame.name,
                frame.info,
                frame.attrs,
                TagOrigin::Reopened,
                sink,
            )?;
            ctx.counters.elements_reopened += 1;
            reopened += 1;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn open_element(
        &mut self,
        atom: AtomId,
        name: Rc<str>,
        info: ElementInfo,
        attrs: Vec<OwnedAttribute>,
        origin: TagOrigin,
        sink: &mut dyn NormalizerSink,
    ) -> Result<(), ConvertError> {
        let void = info.is_void();
        if !void && self.stack.content_depth() >= self.config.max_nesting_depth {
            let depth = self.stack.content_depth() + 1;
            let limit = self.config.max_nesting_depth;
            log::warn!(
                target: "html.normalizer",
                "document too complex: <{name}> would nest {depth} elements deep (limit {limit})"
            );
            return Err(ConvertError::DocumentTooComplex { depth, limit });
        }

        let events: Vec<AttrEvent<'_>> = attrs
            .iter()
            .map(|(name, value)| AttrEvent {
                name,
                value: value.as_deref(),
            })
            .collect();
        sink.start_tag(&TagEvent {
            name: &name,
            attrs: &events,
            self_closing: void,
            origin,
        });
        if void {
            return Ok(());
        }

        let own = element_properties(&name, &attrs, &mut self.strings);
        let effective = self.stack.effective().merge(&own);
        let attrs = if info.is_formatting() { attrs } else { Vec::new() };
        self.stack.push(Frame {
            atom,
            name,
            info,
            structural: false,
            own,
            effective,
            attrs,
        });
        #[cfg(feature = "parser_invariants")]
        self.check_invariants();
        Ok(())
    }

    /// Resolve and filter the attributes of an accepted start tag.
    fn output_attributes(
        &self,
        tag: AtomId,
        attrs: &[Attribute],
        resolver: &dyn TextResolver,
        ctx: &mut DocumentParseContext,
    ) -> Result<Vec<OwnedAttribute>, ConvertError> {
        let mut out = Vec::with_capacity(attrs.len());
        for attr in attrs {
            let Some(name) = ctx.atoms.resolve(attr.name) else {
                continue;
            };
            let value = match &attr.value {
                None => None,
                Some(AttributeValue::Span(span)) => Some(resolver.resolve_span(*span)?),
                Some(AttributeValue::Owned(value)) => Some(value.as_str()),
            };
            if self.config.filter && !self.attribute_passes(tag, attr.name, name, value) {
                ctx.counters.attributes_filtered += 1;
                continue;
            }
            out.push((Box::from(name), value.map(Box::from)));
        }
        Ok(out)
    }

    fn attribute_passes(&self, tag: AtomId, atom: AtomId, name: &str, value: Option<&str>) -> bool {
        if is_event_handler(name) || !self.safe_list.is_attribute_allowed(tag, atom) {
            return false;
        }
        match value {
            Some(value) if self.safe_list.is_url_attribute(atom) => {
                is_safe_url(value, self.safe_list.url_schemes())
            }
            _ => true,
        }
    }

    #[cfg(feature = "parser_invariants")]
    fn check_invariants(&self) {
        assert!(
            self.stack.content_depth() <= self.config.max_nesting_depth,
            "nesting depth above the configured limit"
        );
        let frames = self.stack.frames();
        for pair in frames.windows(2) {
            assert!(
                pair[0].structural || !pair[1].structural,
                "structural frame above content"
            );
            if !pair[1].structural {
                assert_eq!(
                    pair[1].effective,
                    pair[0].effective.merge(&pair[1].own),
                    "effective properties out of sync"
                );
            }
        }
        assert!(
            frames.iter().all(|f| f.structural || !f.info.is_void()),
            "void element on the stack"
        );
    }
}

fn resolve_text<'a>(
    text: &'a TextValue,
    resolver: &'a dyn TextResolver,
) -> Result<&'a str, ConvertError> {
    match text {
        TextValue::Span(span) => Ok(resolver.resolve_span(*span)?),
        TextValue::Owned(text) => Ok(text.as_str()),
    }
}

fn is_html_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

#[cfg(test)]
mod tests;
