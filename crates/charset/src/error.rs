//! Errors raised while configuring decoders and encoders.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CharsetError {
    #[error("unknown character encoding label `{0}`")]
    UnknownLabel(String),
    #[error("input encoding is required when it cannot be detected")]
    MissingEncoding,
    #[error("encoding `{0}` cannot be used for output")]
    UnsupportedOutput(&'static str),
}
