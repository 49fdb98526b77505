//! Recoverable markup errors.
//!
//! These never abort a conversion; they are recorded in the
//! `DocumentParseContext` for diagnostics and counted in `Counters`.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorCode {
    UnexpectedEof,
    InvalidCharacterReference,
    /// A tag grew past `max_tag_size` and was emitted as text.
    TagTooLong,
    /// Attributes beyond `max_attributes_per_tag` were dropped.
    TooManyAttributes,
    DuplicateAttribute,
    /// A comment grew past `max_tag_size` and was truncated.
    CommentTooLong,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub code: ParseErrorCode,
    /// Absolute offset into the decoded input stream.
    pub position: usize,
}
