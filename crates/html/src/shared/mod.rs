//! Shared types for the conversion path.

mod atom;
mod context;
mod counters;
mod error;
mod input;
mod span;
mod token;

pub use atom::{AtomError, AtomId, AtomTable};
pub use context::{DocumentParseContext, MAX_RECORDED_ERRORS};
pub use counters::Counters;
pub use error::{ParseError, ParseErrorCode};
pub use input::Input;
pub use span::{Span, TextSpan};
pub use token::{Attribute, AttributeValue, TextValue, Token};
