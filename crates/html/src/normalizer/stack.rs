//! Stack of open elements.

use std::rc::Rc;

use crate::normalizer::elements::{ElementInfo, ElementKind};
use crate::props::PropertySet;
use crate::shared::AtomId;

/// Owned attribute kept on a frame so the element can be reopened.
pub(crate) type OwnedAttribute = (Box<str>, Option<Box<str>>);

/// Entry in the stack of open elements.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub(crate) atom: AtomId,
    pub(crate) name: Rc<str>,
    pub(crate) info: ElementInfo,
    /// Synthetic `html`/`body` or fragment wrapper. Never matched by an end
    /// tag and a boundary for every scope.
    pub(crate) structural: bool,
    /// Properties this element sets on its own.
    pub(crate) own: PropertySet,
    /// Properties in effect inside this element.
    pub(crate) effective: PropertySet,
    /// Output attributes; only retained for formatting elements.
    pub(crate) attrs: Vec<OwnedAttribute>,
}

/// Scope flavor for end tag and implied end tag searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    /// HTML "in scope" baseline.
    InScope,
    /// HTML "in button scope".
    Button,
    /// HTML "in list-item scope".
    ListItem,
    /// HTML "in table scope".
    Table,
}

impl ScopeKind {
    /// Scope used when closing an element of `kind`.
    pub(crate) fn for_end_tag(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Paragraph => ScopeKind::Button,
            ElementKind::ListItem => ScopeKind::ListItem,
            ElementKind::Table
            | ElementKind::TableSection
            | ElementKind::Row
            | ElementKind::Cell => ScopeKind::Table,
            _ => ScopeKind::InScope,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ElementStack {
    frames: Vec<Frame>,
    structural: usize,
    max_depth: usize,
}

impl ElementStack {
    pub(crate) fn clear(&mut self) {
        self.frames.clear();
        self.structural = 0;
        self.max_depth = 0;
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        debug_assert!(
            !frame.structural || self.frames.len() == self.structural,
            "structural frames must stay below content frames"
        );
        if frame.structural {
            self.structural += 1;
        }
        self.frames.push(frame);
        self.max_depth = self.max_depth.max(self.content_depth());
    }

    pub(crate) fn pop(&mut self) -> Option<Frame> {
        let frame = self.frames.pop()?;
        if frame.structural {
            self.structural -= 1;
        }
        Some(frame)
    }

    pub(crate) fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    /// Number of open non-structural elements.
    pub(crate) fn content_depth(&self) -> usize {
        self.frames.len() - self.structural
    }

    pub(crate) fn structural_len(&self) -> usize {
        self.structural
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Properties in effect at the top of the stack.
    pub(crate) fn effective(&self) -> PropertySet {
        self.frames
            .last()
            .map(|frame| frame.effective)
            .unwrap_or_default()
    }

    #[cfg(feature = "parser_invariants")]
    pub(crate) fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Index of the topmost frame matching `pred` that is visible in the
    /// requested scope.
    pub(crate) fn find_in_scope(
        &self,
        kind: ScopeKind,
        mut pred: impl FnMut(&Frame) -> bool,
    ) -> Option<usize> {
        for index in (0..self.frames.len()).rev() {
            let frame = &self.frames[index];
            if frame.structural {
                return None;
            }
            if pred(frame) {
                return Some(index);
            }
            if is_scope_boundary(frame, kind) {
                return None;
            }
        }
        None
    }
}

fn is_scope_boundary(frame: &Frame, kind: ScopeKind) -> bool {
    match kind {
        ScopeKind::InScope => frame.info.is_scope(),
        ScopeKind::Button => {
            is_scope_boundary(frame, ScopeKind::InScope) || frame.info.kind == ElementKind::Button
        }
        ScopeKind::ListItem => {
            is_scope_boundary(frame, ScopeKind::InScope)
                || frame.info.kind == ElementKind::List
        }
        ScopeKind::Table => frame.info.is_table_scope(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: u32, name: &str) -> Frame {
        Frame {
            atom: AtomId(id),
            name: Rc::from(name),
            info: ElementInfo::classify(name),
            structural: false,
            own: PropertySet::new(),
            effective: PropertySet::new(),
            attrs: Vec::new(),
        }
    }

    fn structural(id: u32, name: &str) -> Frame {
        Frame {
            structural: true,
            ..frame(id, name)
        }
    }

    #[test]
    fn push_pop_tracks_content_depth() {
        let mut stack = ElementStack::default();
        stack.push(structural(0, "html"));
        stack.push(structural(1, "body"));
        stack.push(frame(2, "div"));
        stack.push(frame(3, "span"));
        assert_eq!(stack.content_depth(), 2);
        assert_eq!(stack.structural_len(), 2);
        assert_eq!(stack.current().map(|f| f.atom), Some(AtomId(3)));
        assert_eq!(stack.pop().map(|f| f.atom), Some(AtomId(3)));
        assert_eq!(stack.max_depth(), 2);
        stack.pop();
        stack.pop();
        assert_eq!(stack.structural_len(), 1);
    }

    #[test]
    fn scope_boundaries_follow_scope_kind() {
        let mut stack = ElementStack::default();
        stack.push(structural(0, "body"));
        stack.push(frame(1, "p"));
        assert!(stack.find_in_scope(ScopeKind::Button, |f| f.atom == AtomId(1)).is_some());

        stack.push(frame(2, "button"));
        assert!(stack.find_in_scope(ScopeKind::Button, |f| f.atom == AtomId(1)).is_none());
        assert!(stack.find_in_scope(ScopeKind::InScope, |f| f.atom == AtomId(1)).is_some());

        stack.push(frame(3, "table"));
        assert!(stack.find_in_scope(ScopeKind::InScope, |f| f.atom == AtomId(1)).is_none());
    }

    #[test]
    fn list_item_scope_stops_at_lists() {
        let mut stack = ElementStack::default();
        stack.push(frame(1, "li"));
        stack.push(frame(2, "div"));
        assert_eq!(stack.find_in_scope(ScopeKind::ListItem, |f| &*f.name == "li"), Some(0));
        stack.push(frame(3, "ul"));
        assert_eq!(stack.find_in_scope(ScopeKind::ListItem, |f| &*f.name == "li"), None);
    }

    #[test]
    fn structural_frames_are_never_matched() {
        let mut stack = ElementStack::default();
        stack.push(structural(0, "div"));
        stack.push(frame(1, "b"));
        assert_eq!(stack.find_in_scope(ScopeKind::InScope, |f| &*f.name == "div"), None);
        assert_eq!(stack.find_in_scope(ScopeKind::Table, |f| &*f.name == "b"), Some(1));
    }
}
