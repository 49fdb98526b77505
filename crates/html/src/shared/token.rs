//! Token model shared by the tokenizers and the normalizer.

use super::{AtomId, TextSpan};

/// Attribute with interned name and optional value.
///
/// Determinism contract:
/// - Attributes on a `StartTag` are stored in encounter order.
/// - A repeated attribute name keeps the position of its first occurrence
///   and the value of its last ("last-wins").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: AtomId,
    pub value: Option<AttributeValue>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeValue {
    /// Borrowed span into the decoded input buffer.
    Span(TextSpan),
    /// Owned value (after character reference decoding).
    Owned(String),
}

/// Text payload for text and comment tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextValue {
    /// Borrowed span into the decoded input buffer.
    Span(TextSpan),
    /// Owned value (after decoding, truncation, or synthesis).
    Owned(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Doctype {
        /// Name atomized with ASCII folding.
        name: Option<AtomId>,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    StartTag {
        name: AtomId,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: AtomId,
    },
    Comment {
        text: TextValue,
    },
    /// Text in source order. Payload storage (`Span` vs `Owned`) is an
    /// implementation detail; resolved content is identical across chunkings.
    Text {
        text: TextValue,
    },
    Eof,
}
