//! # Lexer - Tokenizing Antlers Templates
//!
//! This module provides the first stage of parsing: breaking source text into
//! tokens using the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! The most important property of this lexer is that **every byte in the input
//! appears in exactly one token**. We never skip or discard characters. This
//! is what makes round-tripping possible:
//!
//! ```
//! use antlers_syntax::lexer::lex;
//!
//! let input = "Hello {{ name | upper }}!";
//! let tokens = lex(input);
//!
//! // Concatenating all token texts gives back the original
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Two Modes
//!
//! A template is mostly literal text with `{{ ... }}` islands of tag syntax.
//! The two regions have nothing in common lexically, so there are two Logos
//! enums and the driver [morphs] between them:
//!
//! - [`TextToken`] recognises text runs, `@` escapes, and the delimiters that
//!   start a comment, raw block, echo block or tag.
//! - [`TagToken`] recognises identifiers, literals and operators. The driver
//!   tracks `{`/`}` nesting so that the `}` closing an interpolated parameter
//!   is never mistaken for half of the closing `}}`.
//!
//! Comments and raw/echo blocks are captured whole, up to the first exact
//! closing delimiter, so nothing inside them is ever re-lexed.
//!
//! ## Degrading to Text
//!
//! A delimiter that is never closed (`{{` with no later `}}`, `{{#` with no
//! `#}}`, ...) is not an error token: it becomes plain `TEXT` and a
//! [`SyntaxErrorKind::LexError`] is recorded. Inside a tag, characters no rule
//! matches become `ERROR_TOKEN` for the parser to wrap.
//!
//! ## Public API
//!
//! - [`lex`] - Tokenize input, returning `Vec<Token>`
//! - [`lex_with_spans`] - Tokenize with byte offset spans
//! - [`tokenize`] - Tokens plus the lexical diagnostics
//! - [`Token`] - A token with its kind and text slice
//!
//! [morphs]: logos::Lexer::morph

use std::ops::Range;

use logos::{Lexer, Logos};
use rowan::{TextRange, TextSize};

use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::syntax_kind::SyntaxKind;

/// A delimiter that ends a region opened in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    Comment,
    DashComment,
    Raw,
    Echo,
    Tag,
}

impl Closer {
    const COUNT: usize = 5;

    fn text(self) -> &'static str {
        match self {
            Closer::Comment => "#}}",
            Closer::DashComment => "--}}",
            Closer::Raw => "?}}",
            Closer::Echo => "$}}",
            Closer::Tag => "}}",
        }
    }
}

/// Lexer extras remembering, per closing delimiter, the last search: where it
/// started and the first match at or after that point.
///
/// A later search starting between the two reuses the answer, so a document
/// full of unclosed `{{#` is scanned once instead of once per opener.
#[derive(Debug, Clone, Default)]
pub struct CloserCache {
    searches: [Option<(usize, Option<usize>)>; Closer::COUNT],
}

impl CloserCache {
    /// Byte offset of the first `closer` at or after `from`.
    fn find(&mut self, source: &str, from: usize, closer: Closer) -> Option<usize> {
        let slot = &mut self.searches[closer as usize];
        if let Some((start, hit)) = *slot
            && start <= from
            && hit.is_none_or(|at| at >= from)
        {
            return hit;
        }

        let hit = source
            .get(from..)
            .and_then(|rest| rest.find(closer.text()))
            .map(|idx| from + idx);
        *slot = Some((from, hit));
        hit
    }
}

/// Offset of the first `closer` after the current token.
fn next_closer<'s, T>(lex: &mut Lexer<'s, T>, closer: Closer) -> Option<usize>
where
    T: Logos<'s, Source = str, Extras = CloserCache>,
{
    let source = lex.source();
    let from = lex.span().end;
    lex.extras.find(source, from, closer)
}

/// Bumps the lexer past the first `closer`, failing the token if there is
/// none.
fn skip_past<'s, T>(lex: &mut Lexer<'s, T>, closer: Closer) -> bool
where
    T: Logos<'s, Source = str, Extras = CloserCache>,
{
    let from = lex.span().end;
    match next_closer(lex, closer) {
        Some(at) => {
            lex.bump(at + closer.text().len() - from);
            true
        }
        None => false,
    }
}

/// Tokens outside of tags.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(extras = CloserCache)]
pub enum TextToken {
    /// `{{# ... #}}` or `{{!-- ... --}}`
    #[token("{{#", |lex| skip_past(lex, Closer::Comment))]
    #[token("{{!--", |lex| skip_past(lex, Closer::DashComment))]
    Comment,

    /// `{{? ... ?}}`
    #[token("{{?", |lex| skip_past(lex, Closer::Raw))]
    RawCode,

    /// `{{$ ... $}}`
    #[token("{{$", |lex| skip_past(lex, Closer::Echo))]
    EchoCode,

    /// `{{` opening a tag, only when a `}}` follows somewhere
    #[token("{{", |lex| next_closer(lex, Closer::Tag).is_some())]
    TagOpen,

    /// `@` escape, runs until the next `{`
    #[regex(r"@[^{]*")]
    Ignore,

    /// A lone `{` that starts nothing
    #[token("{")]
    Brace,

    /// Literal text
    #[regex(r"[^{@]+")]
    Text,
}

impl TextToken {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            TextToken::Comment => SyntaxKind::COMMENT,
            TextToken::RawCode => SyntaxKind::RAW_CODE,
            TextToken::EchoCode => SyntaxKind::ECHO_CODE,
            TextToken::TagOpen => SyntaxKind::L_DCURLY,
            TextToken::Ignore => SyntaxKind::IGNORE,
            TextToken::Brace | TextToken::Text => SyntaxKind::TEXT,
        }
    }
}

/// Tokens between `{{` and `}}`.
///
/// Word operators (`and`, `or`, `bwa`, ...) and literals like `true` lex as
/// plain identifiers; the parser decides from position whether they are
/// keywords.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(extras = CloserCache)]
pub enum TagToken {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    /// Comment nested inside a tag
    #[token("{{#", |lex| skip_past(lex, Closer::Comment))]
    #[token("{{!--", |lex| skip_past(lex, Closer::DashComment))]
    Comment,

    /// `{{` before the current tag was closed
    #[token("{{")]
    LDCurly,

    #[token("{")]
    LCurly,

    /// Single `}`; the driver decides whether it closes the tag
    #[token("}")]
    RCurly,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // Scientific, hexadecimal, octal, float, integer. Underscores separate
    // digits but never lead or trail.
    #[regex(r"(?:[0-9](?:[0-9_]*[0-9])?(?:\.[0-9](?:[0-9_]*[0-9])?)?|\.[0-9](?:[0-9_]*[0-9])?)[eE][+-]?[0-9](?:[0-9_]*[0-9])?")]
    #[regex(r"0[xX][0-9a-fA-F](?:[0-9a-fA-F_]*[0-9a-fA-F])?")]
    #[regex(r"0[0-7](?:[0-7_]*[0-7])?")]
    #[regex(r"[0-9](?:[0-9_]*[0-9])?\.[0-9](?:[0-9_]*[0-9])?")]
    #[regex(r"\.[0-9](?:[0-9_]*[0-9])?")]
    #[regex(r"[0-9](?:[0-9_]*[0-9])?")]
    Number,

    #[regex(r#""([^"\\]|\\.|\\\n)*""#)]
    #[regex(r#"'([^'\\]|\\.|\\\n)*'"#)]
    String,

    #[token("**")]
    Star2,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("===")]
    Eq3,
    #[token("!==")]
    Neq2,
    #[token("==")]
    Eq2,
    #[token("!=")]
    Neq,
    #[token("<>")]
    LtGt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&&")]
    Amp2,
    #[token("||")]
    Pipe2,
    #[token("|")]
    Pipe,
    #[token("??")]
    Question2,
    #[token("?=")]
    QuestionEq,
    #[token("?")]
    Question,
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("!")]
    Bang,
    #[token("=>")]
    FatArrow,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
}

impl TagToken {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            TagToken::Whitespace => SyntaxKind::WHITESPACE,
            TagToken::Comment => SyntaxKind::TAG_COMMENT,
            TagToken::LDCurly => SyntaxKind::L_DCURLY,
            TagToken::LCurly => SyntaxKind::L_CURLY,
            TagToken::RCurly => SyntaxKind::R_CURLY,
            TagToken::Ident => SyntaxKind::IDENT,
            TagToken::Number => SyntaxKind::NUMBER,
            TagToken::String => SyntaxKind::STRING,
            TagToken::Star2 => SyntaxKind::STAR2,
            TagToken::Star => SyntaxKind::STAR,
            TagToken::Slash => SyntaxKind::SLASH,
            TagToken::Percent => SyntaxKind::PERCENT,
            TagToken::Plus => SyntaxKind::PLUS,
            TagToken::Minus => SyntaxKind::MINUS,
            TagToken::Eq3 => SyntaxKind::EQ3,
            TagToken::Neq2 => SyntaxKind::NEQ2,
            TagToken::Eq2 => SyntaxKind::EQ2,
            TagToken::Neq => SyntaxKind::NEQ,
            TagToken::LtGt => SyntaxKind::LT_GT,
            TagToken::LtEq => SyntaxKind::LT_EQ,
            TagToken::GtEq => SyntaxKind::GT_EQ,
            TagToken::Lt => SyntaxKind::LT,
            TagToken::Gt => SyntaxKind::GT,
            TagToken::Amp2 => SyntaxKind::AMP2,
            TagToken::Pipe2 => SyntaxKind::PIPE2,
            TagToken::Pipe => SyntaxKind::PIPE,
            TagToken::Question2 => SyntaxKind::QUESTION2,
            TagToken::QuestionEq => SyntaxKind::QUESTION_EQ,
            TagToken::Question => SyntaxKind::QUESTION,
            TagToken::Eq => SyntaxKind::EQ,
            TagToken::PlusEq => SyntaxKind::PLUS_EQ,
            TagToken::MinusEq => SyntaxKind::MINUS_EQ,
            TagToken::StarEq => SyntaxKind::STAR_EQ,
            TagToken::SlashEq => SyntaxKind::SLASH_EQ,
            TagToken::PercentEq => SyntaxKind::PERCENT_EQ,
            TagToken::Bang => SyntaxKind::BANG,
            TagToken::FatArrow => SyntaxKind::FAT_ARROW,
            TagToken::Colon => SyntaxKind::COLON,
            TagToken::Dot => SyntaxKind::DOT,
            TagToken::Comma => SyntaxKind::COMMA,
            TagToken::Semicolon => SyntaxKind::SEMICOLON,
            TagToken::LParen => SyntaxKind::L_PAREN,
            TagToken::RParen => SyntaxKind::R_PAREN,
            TagToken::LBrack => SyntaxKind::L_BRACK,
            TagToken::RBrack => SyntaxKind::R_BRACK,
        }
    }
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
}

/// Output of [`tokenize`]: the full token stream and any lexical diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexed<'a> {
    pub tokens: Vec<Token<'a>>,
    pub errors: Vec<SyntaxError>,
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    tokenize(input).tokens
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, Range<usize>)> {
    let mut offset = 0;
    lex(input)
        .into_iter()
        .map(|token| {
            let span = offset..offset + token.text.len();
            offset = span.end;
            (token, span)
        })
        .collect()
}

/// Lex the input, collecting a diagnostic for every delimiter that had to be
/// downgraded to text.
pub fn tokenize(input: &str) -> Lexed<'_> {
    let mut lexed = Lexed {
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    let mut mode = Mode::Text(TextToken::lexer(input));

    loop {
        mode = match mode {
            Mode::Text(mut lexer) => match lexer.next() {
                None => break,
                Some(Ok(TextToken::TagOpen)) => {
                    lexed.push(SyntaxKind::L_DCURLY, lexer.slice());
                    Mode::Tag(lexer.morph(), 0)
                }
                Some(Ok(token)) => {
                    lexed.push(token.to_syntax_kind(), lexer.slice());
                    Mode::Text(lexer)
                }
                Some(Err(())) => {
                    let text = lexer.slice();
                    lexed.errors.push(unclosed_delimiter(text, lexer.span()));
                    lexed.push(SyntaxKind::TEXT, text);
                    Mode::Text(lexer)
                }
            },
            Mode::Tag(mut lexer, depth) => match lexer.next() {
                None => break,
                Some(Ok(TagToken::RCurly)) if depth > 0 => {
                    lexed.push(SyntaxKind::R_CURLY, lexer.slice());
                    Mode::Tag(lexer, depth - 1)
                }
                Some(Ok(TagToken::RCurly)) if lexer.remainder().starts_with('}') => {
                    lexer.bump(1);
                    lexed.push(SyntaxKind::R_DCURLY, lexer.slice());
                    Mode::Text(lexer.morph())
                }
                Some(Ok(TagToken::LCurly)) => {
                    lexed.push(SyntaxKind::L_CURLY, lexer.slice());
                    Mode::Tag(lexer, depth + 1)
                }
                Some(Ok(TagToken::LDCurly)) => {
                    lexed.push(SyntaxKind::L_DCURLY, lexer.slice());
                    Mode::Tag(lexer, 0)
                }
                Some(Ok(token)) => {
                    lexed.push(token.to_syntax_kind(), lexer.slice());
                    Mode::Tag(lexer, depth)
                }
                Some(Err(())) => {
                    lexed.push(SyntaxKind::ERROR_TOKEN, lexer.slice());
                    Mode::Tag(lexer, depth)
                }
            },
        };
    }

    lexed
}

enum Mode<'s> {
    Text(Lexer<'s, TextToken>),
    /// Tag lexer plus the number of open `{` interpolation braces
    Tag(Lexer<'s, TagToken>, usize),
}

impl<'a> Lexed<'a> {
    fn push(&mut self, kind: SyntaxKind, text: &'a str) {
        self.tokens.push(Token { kind, text });
    }
}

fn unclosed_delimiter(text: &str, span: Range<usize>) -> SyntaxError {
    let message = if text.starts_with("{{#") {
        "comment is never closed by `#}}`"
    } else if text.starts_with("{{!--") {
        "comment is never closed by `--}}`"
    } else if text.starts_with("{{?") {
        "raw block is never closed by `?}}`"
    } else if text.starts_with("{{$") {
        "echo block is never closed by `$}}`"
    } else if text.starts_with("{{") {
        "tag is never closed by `}}`"
    } else {
        "unrecognized input"
    };
    let range = TextRange::new(
        TextSize::from(span.start as u32),
        TextSize::from(span.end as u32),
    );
    SyntaxError::new(SyntaxErrorKind::LexError, message, range)
}
