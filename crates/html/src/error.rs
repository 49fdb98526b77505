//! Fatal conversion errors.
//!
//! Recoverable markup problems never surface here; they are recorded as
//! `ParseError`s in the `DocumentParseContext`.

use charset::CharsetError;
use thiserror::Error;

use crate::tokenizer::TextResolveError;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The progress guard tripped: the chain looped without moving data.
    #[error("conversion made no progress for {loops} iterations")]
    TooManyIterations { loops: usize },
    #[error("input document too complex: nesting depth {depth} exceeds the limit of {limit}")]
    DocumentTooComplex { depth: usize, limit: usize },
    #[error("an input encoding is required")]
    MissingInputEncoding,
    #[error("the converter stream has been closed")]
    ObjectDisposed,
    #[error("invalid buffer range: offset {offset} + length {len} exceeds {buffer_len}")]
    InvalidRange {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },
    #[error("configuration cannot change after the first conversion")]
    ConfigurationLocked,
    /// A previous call failed; the stream's state is no longer consistent.
    #[error("the converter stream failed earlier and cannot be used")]
    Poisoned,
    /// A token span was resolved after its batch was released.
    #[error("token text at {start}..{end} is no longer buffered")]
    UnresolvedSpan { start: usize, end: usize },
    #[error("write after flush")]
    WriteAfterFlush,
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error(transparent)]
    Charset(#[from] CharsetError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Usage errors raised by the `Read`/`Write` adapters themselves.
    fn io_kind(&self) -> std::io::ErrorKind {
        match self {
            ConvertError::InvalidRange { .. } | ConvertError::InvalidConfiguration(_) => {
                std::io::ErrorKind::InvalidInput
            }
            ConvertError::ObjectDisposed
            | ConvertError::Poisoned
            | ConvertError::WriteAfterFlush
            | ConvertError::ConfigurationLocked => std::io::ErrorKind::Unsupported,
            ConvertError::Charset(_) | ConvertError::MissingInputEncoding => {
                std::io::ErrorKind::InvalidData
            }
            ConvertError::TooManyIterations { .. }
            | ConvertError::DocumentTooComplex { .. }
            | ConvertError::UnresolvedSpan { .. } => {
                std::io::ErrorKind::Other
            }
            ConvertError::Io(err) => err.kind(),
        }
    }
}

impl From<TextResolveError> for ConvertError {
    fn from(err: TextResolveError) -> Self {
        let TextResolveError::InvalidSpan { span } = err;
        ConvertError::UnresolvedSpan {
            start: span.start,
            end: span.end,
        }
    }
}

impl From<ConvertError> for std::io::Error {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::Io(err) => err,
            other => std::io::Error::new(other.io_kind(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_pass_through_unwrapped() {
        let inner = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let io: std::io::Error = ConvertError::Io(inner).into();
        assert_eq!(io.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn fatal_errors_keep_their_message() {
        let io: std::io::Error = ConvertError::DocumentTooComplex {
            depth: 5,
            limit: 4,
        }
        .into();
        assert_eq!(io.kind(), std::io::ErrorKind::Other);
        assert!(io.to_string().contains("too complex"));
        let inner = io.into_inner().expect("wrapped error");
        assert!(inner.downcast_ref::<ConvertError>().is_some());
    }
}
