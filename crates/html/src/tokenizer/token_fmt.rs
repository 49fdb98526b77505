//! Line-per-token rendering for snapshots and `scrub --dump-tokens`.
//!
//! Attributes are listed in tokenizer encounter order, text is quoted with
//! control characters escaped, so the output is stable across chunkings.

use std::fmt::Write;

use crate::shared::{AtomId, AtomTable, AttributeValue, TextSpan, TextValue, Token};
use crate::tokenizer::{TextResolveError, TextResolver};

#[derive(Debug, thiserror::Error)]
pub enum TokenFmtError {
    #[error("unknown atom id: {0:?}")]
    UnknownAtomId(AtomId),
    #[error("invalid span: {}..{}", .0.start, .0.end)]
    InvalidSpan(TextSpan),
}

impl From<TextResolveError> for TokenFmtError {
    fn from(err: TextResolveError) -> Self {
        match err {
            TextResolveError::InvalidSpan { span } => TokenFmtError::InvalidSpan(span),
        }
    }
}

/// Renders tokens of one batch against the atom table they were interned in.
pub struct TokenFmt<'a> {
    atoms: &'a AtomTable,
    resolver: &'a dyn TextResolver,
}

impl<'a> TokenFmt<'a> {
    pub fn new(atoms: &'a AtomTable, resolver: &'a dyn TextResolver) -> Self {
        Self { atoms, resolver }
    }

    pub fn format_token(&self, token: &Token) -> Result<String, TokenFmtError> {
        let mut out = String::new();
        self.write_token(&mut out, token)?;
        Ok(out)
    }

    pub fn write_token(&self, out: &mut String, token: &Token) -> Result<(), TokenFmtError> {
        match token {
            Token::Doctype {
                name,
                public_id,
                system_id,
            } => {
                out.push_str("DOCTYPE");
                if let Some(name) = name {
                    out.push(' ');
                    out.push_str(self.atom(*name)?);
                }
                if let Some(id) = public_id {
                    out.push_str(" public=");
                    push_quoted(out, id);
                }
                if let Some(id) = system_id {
                    out.push_str(" system=");
                    push_quoted(out, id);
                }
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                out.push_str("START ");
                out.push_str(self.atom(*name)?);
                for attr in attrs {
                    out.push(' ');
                    out.push_str(self.atom(attr.name)?);
                    if let Some(value) = &attr.value {
                        out.push('=');
                        push_quoted(out, self.attr_value(value)?);
                    }
                }
                if *self_closing {
                    out.push_str(" /");
                }
            }
            Token::EndTag { name } => {
                out.push_str("END ");
                out.push_str(self.atom(*name)?);
            }
            Token::Comment { text } => {
                out.push_str("COMMENT ");
                push_quoted(out, self.text(text)?);
            }
            Token::Text { text } => {
                out.push_str("TEXT ");
                push_quoted(out, self.text(text)?);
            }
            Token::Eof => out.push_str("EOF"),
        }
        Ok(())
    }

    fn atom(&self, id: AtomId) -> Result<&'a str, TokenFmtError> {
        self.atoms.resolve(id).ok_or(TokenFmtError::UnknownAtomId(id))
    }

    pub fn attr_value<'v>(&'v self, value: &'v AttributeValue) -> Result<&'v str, TokenFmtError> {
        match value {
            AttributeValue::Span(span) => Ok(self.resolver.resolve_span(*span)?),
            AttributeValue::Owned(text) => Ok(text),
        }
    }

    pub fn text<'v>(&'v self, value: &'v TextValue) -> Result<&'v str, TokenFmtError> {
        match value {
            TextValue::Span(span) => Ok(self.resolver.resolve_span(*span)?),
            TextValue::Owned(text) => Ok(text),
        }
    }
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:04X}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
