//! Diagnostics produced while lexing and parsing.
//!
//! Two tiers exist. [`SyntaxError`] is a recoverable diagnostic attached to a
//! [`Parse`](crate::Parse): the tree is still complete and lossless, with the
//! offending span wrapped in an `ERROR` node. [`ParseError`] aborts the parse
//! and no tree is produced.

use rowan::TextRange;
use thiserror::Error;

/// Category of a recoverable diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    /// A delimiter the lexer could not complete, kept as plain text.
    LexError,
    /// An opening delimiter or paired tag never closed.
    UnterminatedTag,
    /// A closing tag with no corresponding open.
    UnmatchedClose,
    /// A closing tag whose keyword or bound variable differs from the open.
    MismatchedClose,
    /// Tokens inside a tag that do not form a valid expression.
    MalformedExpression,
}

impl std::fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyntaxErrorKind::LexError => "lex error",
            SyntaxErrorKind::UnterminatedTag => "unterminated tag",
            SyntaxErrorKind::UnmatchedClose => "unmatched close",
            SyntaxErrorKind::MismatchedClose => "mismatched close",
            SyntaxErrorKind::MalformedExpression => "malformed expression",
        };
        f.write_str(name)
    }
}

/// A recoverable diagnostic with the source range it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message} at {range:?}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            kind,
            message: message.into(),
            range,
        }
    }
}

/// Fatal parse failure. No tree is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("nesting exceeds the recursion limit of {limit} at byte {offset}")]
    RecursionLimit { limit: usize, offset: usize },

    #[error("parser made no progress at byte {offset}")]
    UnresolvedAmbiguity { offset: usize },
}
