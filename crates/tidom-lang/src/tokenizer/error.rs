use thiserror::Error;

use crate::range::Range;

#[derive(Error, Debug, PartialEq)]
pub enum TokenizeError {
    #[error("Malformed markup: {message}")]
    Malformed { message: String, range: Range },
    #[error("Unterminated raw text element `<{name}>`")]
    UnterminatedRawText { name: String, range: Range },
}

impl TokenizeError {
    pub fn range(&self) -> Range {
        match self {
            TokenizeError::Malformed { range, .. } => *range,
            TokenizeError::UnterminatedRawText { range, .. } => *range,
        }
    }
}
