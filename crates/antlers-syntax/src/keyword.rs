//! Reserved structural keywords.
//!
//! Whether `collection` starts a loop or names a variable cannot be decided by
//! the lexer: it depends on what follows. The parser asks a
//! [`KeywordClassifier`] at every tag opening (and after the `/` of a close
//! tag), handing it a [`Lookahead`] over the significant tokens from that
//! point. The verdict gates every specialized loop and conditional form.
//!
//! [`StandardKeywords`] is the default rule set: `if` and `unless` need
//! whitespace after them, `collection`, `nav`, `taxonomy` and `form` need a
//! `:` directly after them or a parameter list, and `entries` must stand alone
//! as a word.

use crate::lexer::Token;
use crate::syntax_kind::SyntaxKind;

/// A reserved structural keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Collection,
    Nav,
    Taxonomy,
    Form,
    Entries,
    If,
    Unless,
}

impl Keyword {
    pub const ALL: [Keyword; 7] = [
        Keyword::Collection,
        Keyword::Nav,
        Keyword::Taxonomy,
        Keyword::Form,
        Keyword::Entries,
        Keyword::If,
        Keyword::Unless,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Collection => "collection",
            Keyword::Nav => "nav",
            Keyword::Taxonomy => "taxonomy",
            Keyword::Form => "form",
            Keyword::Entries => "entries",
            Keyword::If => "if",
            Keyword::Unless => "unless",
        }
    }

    pub fn from_name(name: &str) -> Option<Keyword> {
        Keyword::ALL.into_iter().find(|k| k.as_str() == name)
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Read-only view of the significant tokens at a tag position.
///
/// Trivia is invisible through this view, but whether two tokens touch can
/// still be asked through [`Lookahead::is_joint`] and
/// [`Lookahead::followed_by_whitespace`].
#[derive(Debug, Clone, Copy)]
pub struct Lookahead<'a> {
    tokens: &'a [Token<'a>],
    /// Indices into `tokens` of the significant tokens, starting at the
    /// position being classified.
    significant: &'a [usize],
}

impl<'a> Lookahead<'a> {
    pub(crate) fn new(tokens: &'a [Token<'a>], significant: &'a [usize]) -> Self {
        Self {
            tokens,
            significant,
        }
    }

    /// Kind of the nth significant token, or EOF.
    pub fn kind(&self, n: usize) -> SyntaxKind {
        self.raw_index(n)
            .map(|i| self.tokens[i].kind)
            .unwrap_or(SyntaxKind::EOF)
    }

    /// Text of the nth significant token, or empty.
    pub fn text(&self, n: usize) -> &'a str {
        self.raw_index(n).map(|i| self.tokens[i].text).unwrap_or("")
    }

    /// True if the nth significant token directly follows the one before it.
    pub fn is_joint(&self, n: usize) -> bool {
        match (n.checked_sub(1).and_then(|p| self.raw_index(p)), self.raw_index(n)) {
            (Some(prev), Some(cur)) => cur == prev + 1,
            _ => false,
        }
    }

    /// True if the nth significant token is directly followed by whitespace.
    pub fn followed_by_whitespace(&self, n: usize) -> bool {
        self.raw_index(n)
            .and_then(|i| self.tokens.get(i + 1))
            .is_some_and(|t| t.kind == SyntaxKind::WHITESPACE)
    }

    fn raw_index(&self, n: usize) -> Option<usize> {
        self.significant.get(n).copied()
    }
}

/// Decides whether the tokens at a tag position start a reserved keyword.
///
/// Implementations must be pure: the same lookahead always yields the same
/// verdict.
pub trait KeywordClassifier: Send + Sync {
    fn classify(&self, la: &Lookahead<'_>) -> Option<Keyword>;
}

/// The default keyword rules, with optional per-keyword opt-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardKeywords {
    disabled: u8,
}

impl StandardKeywords {
    pub const fn new() -> Self {
        Self { disabled: 0 }
    }

    /// Returns a classifier that treats `keyword` as a plain identifier.
    pub fn without(self, keyword: Keyword) -> Self {
        Self {
            disabled: self.disabled | keyword.bit(),
        }
    }

    pub fn is_enabled(&self, keyword: Keyword) -> bool {
        self.disabled & keyword.bit() == 0
    }
}

impl KeywordClassifier for StandardKeywords {
    fn classify(&self, la: &Lookahead<'_>) -> Option<Keyword> {
        if la.kind(0) != SyntaxKind::IDENT {
            return None;
        }
        let keyword = Keyword::from_name(la.text(0))?;
        if !self.is_enabled(keyword) {
            return None;
        }

        let accepted = match keyword {
            Keyword::If | Keyword::Unless => la.followed_by_whitespace(0),
            Keyword::Collection | Keyword::Nav | Keyword::Taxonomy | Keyword::Form => {
                (la.kind(1) == SyntaxKind::COLON && la.is_joint(1)) || starts_param(la, 1)
            }
            // The lexer already took every identifier character into the
            // token, so the word always ends here.
            Keyword::Entries => true,
        };
        accepted.then_some(keyword)
    }
}

/// `name=` or `:name=` at `n`, the unbound loop form.
fn starts_param(la: &Lookahead<'_>, n: usize) -> bool {
    match la.kind(n) {
        SyntaxKind::IDENT => la.kind(n + 1) == SyntaxKind::EQ,
        SyntaxKind::COLON => {
            la.kind(n + 1) == SyntaxKind::IDENT
                && la.is_joint(n + 1)
                && la.kind(n + 2) == SyntaxKind::EQ
        }
        _ => false,
    }
}
