//! # Parser Events
//!
//! The grammar never touches Rowan directly. It records a flat list of
//! events, and the [`Sink`](super::sink::Sink) replays them over the full
//! token list to build the green tree.
//!
//! For `{{ title }}` the grammar records:
//!
//! ```text
//! Start(ANTLERS_TAG)
//!   Token(L_DCURLY)
//!   Start(DIRECTIVE)
//!     Start(VARIABLE)
//!       Token(IDENT)
//!     Finish
//!   Finish
//!   Token(R_DCURLY)
//! Finish
//! ```
//!
//! The whitespace around `title` is absent: trivia is not significant to the
//! grammar and the Sink puts it back between events.
//!
//! ## One Token, Several Lexemes
//!
//! The lexer splits `*recursive` into `*` and `recursive`, and `-5` into `-`
//! and `5`. The grammar glues such joint runs back together with a single
//! `Token` event whose `n_raw_tokens` covers all of them, so the tree holds
//! one `RECURSIVE_KW` or one `NUMBER`.
//!
//! ## Wrapping After the Fact
//!
//! Whether a paired tag is closed is only known once its body has been
//! parsed. An unclosed `{{ if }}` is then wrapped in an `ERROR` node by
//! pointing the `IF_STATEMENT` start at a later `Start(ERROR)` through
//! `forward_parent`. The Sink follows the chain and opens the outermost node
//! first.

use crate::syntax_kind::SyntaxKind;

/// A step in building the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Open a node. `forward_parent` points at the `Start` of a node that
    /// must wrap this one.
    Start {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },

    /// Append `n_raw_tokens` raw tokens as one token of `kind`.
    ///
    /// `kind` differs from the lexer's when an identifier turns out to be a
    /// keyword (`if`, `and`, `true`).
    Token { kind: SyntaxKind, n_raw_tokens: u8 },

    /// Close the innermost open node.
    Finish,

    /// Reserved by [`Parser::start`](super::Parser::start) and either turned
    /// into a `Start` or left for the Sink to skip.
    Placeholder,
}

impl Event {
    pub fn start(kind: SyntaxKind) -> Self {
        Event::Start {
            kind,
            forward_parent: None,
        }
    }

    pub fn token(kind: SyntaxKind) -> Self {
        Event::Token {
            kind,
            n_raw_tokens: 1,
        }
    }
}
