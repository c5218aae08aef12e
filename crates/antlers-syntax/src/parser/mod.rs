//! # Parser - Event-Based Tree Construction
//!
//! This module implements the core parsing logic, transforming a token stream
//! into a syntax tree using the **event-based** architecture from rust-analyzer.
//!
//! ## Why Event-Based Parsing?
//!
//! Traditional recursive descent parsers build the tree directly during parsing.
//! This has problems:
//!
//! 1. **Backtracking is expensive** when you've already built tree nodes
//! 2. **Error recovery is tricky** when partially-built nodes exist
//! 3. **Wrapping after the fact** (binary operators, unterminated tags) needs
//!    the parent to appear before a child that was already emitted
//!
//! Instead, we emit a flat list of **events** ([`Event`]) that describe the
//! tree structure. The [`Sink`] then builds the actual Rowan tree from events.
//!
//! ## Trivia
//!
//! Whitespace and in-tag comments never reach the grammar. The parser walks a
//! list of indices of the *significant* tokens only, so `p.nth(1)` skips any
//! trivia in between. When adjacency matters (`a:b` is a path, `a :b=` is a
//! parameter) the grammar asks [`Parser::is_joint`]. The sink puts the trivia
//! back into the tree, which keeps it lossless.
//!
//! ## The Marker System
//!
//! When you call `parser.start()`, you get a [`Marker`]. This marker **must**
//! be either:
//!
//! - Completed with `marker.complete(parser, KIND)` → emits Start+Finish
//! - Abandoned with `marker.abandon(parser)` → removes the placeholder
//!
//! If you drop a marker without doing either, **the program panics**. This
//! prevents accidentally leaving the tree in an inconsistent state.
//!
//! ```ignore
//! let m = parser.start();           // Get a marker
//! parser.bump();                    // Consume some tokens
//! m.complete(parser, SyntaxKind::DIRECTIVE);  // MUST complete or abandon
//! ```
//!
//! ## Forward Parent Links
//!
//! Sometimes we need to wrap an already-parsed node in a new parent (binary
//! expressions, modifiers, a paired tag that turned out to be unterminated).
//! The `CompletedMarker::precede()` method handles this by creating a
//! **forward parent link** that the Sink resolves when building the tree.
//!
//! ## Bounded Nesting
//!
//! Tag bodies and expressions recurse. Every level calls [`Parser::enter`];
//! past [`ParseOptions::max_depth`] the parser records a fatal
//! [`ParseError::RecursionLimit`], reports end of input from then on so every
//! rule unwinds, and [`parse`] returns the error instead of a tree.
//!
//! ## Public API
//!
//! The main entry point is [`parse`]:
//!
//! ```
//! use antlers_syntax::parse;
//!
//! let parse = parse("{{ title }}").unwrap();
//! assert!(parse.errors().is_empty());
//! println!("{:#?}", parse.syntax());
//! ```

pub mod event;
pub mod sink;

mod grammar;

use std::fmt;

use rowan::{GreenNode, TextRange, TextSize};

use crate::ast::Document;
use crate::error::{ParseError, SyntaxError, SyntaxErrorKind};
use crate::keyword::{Keyword, KeywordClassifier, Lookahead, StandardKeywords};
use crate::lexer::{Token, tokenize};
use crate::syntax_kind::{SyntaxKind, SyntaxNode};
use event::Event;
use grammar::OpenTag;
use sink::Sink;

/// Nesting limit used by [`parse`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

static STANDARD_KEYWORDS: StandardKeywords = StandardKeywords::new();

/// Knobs for [`parse_with`].
#[derive(Clone, Copy)]
pub struct ParseOptions<'a> {
    /// Deepest nesting of tag bodies and sub-expressions before the parse
    /// aborts with [`ParseError::RecursionLimit`].
    pub max_depth: usize,
    /// Oracle deciding which identifiers are reserved keywords.
    pub keywords: &'a dyn KeywordClassifier,
}

impl Default for ParseOptions<'static> {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            keywords: &STANDARD_KEYWORDS,
        }
    }
}

impl fmt::Debug for ParseOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

/// The result of a successful parse: an immutable green tree plus every
/// recoverable diagnostic, ordered by position.
///
/// `Parse` is `Send + Sync`, so trees can be produced and consumed on any
/// thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<SyntaxError>,
}

impl Parse {
    /// A cursor over the tree.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Typed view of the root node.
    pub fn document(&self) -> Document {
        Document::from_root(self.syntax())
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// True when the input produced no diagnostics.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Indented dump of the tree, one line per node or token.
    pub fn debug_tree(&self) -> String {
        crate::debug_tree(&self.syntax())
    }
}

/// The parser state machine.
///
/// Holds the token stream, current position, and accumulated events.
/// Grammar functions receive `&mut Parser` and use its methods to:
///
/// - Inspect tokens: `current()`, `nth()`, `at()`, `at_end()`, `is_joint()`
/// - Consume tokens: `bump()`, `bump_remap()`, `bump_n()`, `eat()`
/// - Build structure: `start()` → `Marker` → `complete()`/`abandon()`
/// - Report problems: `error()`, `error_here()`
pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    /// Indices into `tokens` of every non-trivia token
    significant: Vec<usize>,
    /// Start offset of every raw token, plus the end of input
    offsets: Vec<TextSize>,
    pos: usize,
    events: Vec<Event>,
    errors: Vec<SyntaxError>,
    /// Paired tags whose bodies are being parsed, innermost last
    open_tags: Vec<OpenTag>,
    keywords: &'t dyn KeywordClassifier,
    depth: usize,
    max_depth: usize,
    fatal: Option<ParseError>,
}

impl<'t, 'input> Parser<'t, 'input> {
    /// Create a new parser from a slice of tokens.
    pub fn new(tokens: &'t [Token<'input>], options: &ParseOptions<'t>) -> Self {
        let significant = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.kind.is_trivia())
            .map(|(i, _)| i)
            .collect();

        let mut offsets = Vec::with_capacity(tokens.len() + 1);
        let mut offset = TextSize::from(0);
        for token in tokens {
            offsets.push(offset);
            offset += TextSize::of(token.text);
        }
        offsets.push(offset);

        Self {
            tokens,
            significant,
            offsets,
            pos: 0,
            events: Vec::new(),
            errors: Vec::new(),
            open_tags: Vec::new(),
            keywords: options.keywords,
            depth: 0,
            max_depth: options.max_depth,
            fatal: None,
        }
    }

    /// Parse the tokens and return the tree, or the fatal error that aborted
    /// parsing. `lex_errors` are merged into the diagnostics.
    pub fn parse(mut self, lex_errors: Vec<SyntaxError>) -> Result<Parse, ParseError> {
        grammar::root(&mut self);

        if let Some(fatal) = self.fatal {
            log::debug!("parse aborted: {fatal}");
            return Err(fatal);
        }

        let mut errors = lex_errors;
        errors.append(&mut self.errors);
        errors.sort_by_key(|e| e.range.start());

        let green = Sink::new(self.tokens, self.events).finish();
        Ok(Parse { green, errors })
    }

    /// Start a new node and return a marker.
    pub fn start(&mut self) -> Marker {
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    /// Current token kind, or EOF if past end.
    pub fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Look ahead n significant tokens.
    ///
    /// Once a fatal error is recorded every lookahead reports EOF.
    pub fn nth(&self, n: usize) -> SyntaxKind {
        if self.fatal.is_some() {
            return SyntaxKind::EOF;
        }
        self.raw_index(n)
            .map(|i| self.tokens[i].kind)
            .unwrap_or(SyntaxKind::EOF)
    }

    /// Text of the nth significant token, or empty past the end.
    pub fn nth_text(&self, n: usize) -> &'input str {
        self.raw_index(n).map(|i| self.tokens[i].text).unwrap_or("")
    }

    /// Get the text of the current token.
    pub fn current_text(&self) -> &'input str {
        self.nth_text(0)
    }

    /// True if the nth token directly follows the token before it, with no
    /// trivia in between.
    pub fn is_joint(&self, n: usize) -> bool {
        let Some(prev) = (self.pos + n)
            .checked_sub(1)
            .and_then(|i| self.significant.get(i))
        else {
            return false;
        };
        self.raw_index(n).is_some_and(|cur| cur == prev + 1)
    }

    /// Check if at end of input.
    pub fn at_end(&self) -> bool {
        self.current() == SyntaxKind::EOF
    }

    /// Check if current token is of given kind.
    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// Check if the current token is an identifier spelled `text`.
    pub fn at_ident(&self, text: &str) -> bool {
        self.at(SyntaxKind::IDENT) && self.current_text() == text
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token unconditionally.
    pub fn bump(&mut self) {
        let kind = self.current();
        self.bump_remap(kind);
    }

    /// Consume the current token, storing it in the tree as `kind`.
    pub fn bump_remap(&mut self, kind: SyntaxKind) {
        if !self.at_end() {
            self.events.push(Event::token(kind));
            self.pos += 1;
        }
    }

    /// Consume n tokens as a single composite token.
    ///
    /// The tokens should be joint; any trivia between them is folded into the
    /// composite.
    pub fn bump_n(&mut self, n: usize, kind: SyntaxKind) {
        if n == 0 || self.at_end() || self.pos + n > self.significant.len() {
            return;
        }
        let first = self.significant[self.pos];
        let last = self.significant[self.pos + n - 1];
        self.events.push(Event::Token {
            kind,
            n_raw_tokens: (last - first + 1) as u8,
        });
        self.pos += n;
    }

    /// Keyword verdict for the tokens starting n positions ahead.
    pub fn keyword_at(&self, n: usize) -> Option<Keyword> {
        if self.fatal.is_some() {
            return None;
        }
        let start = (self.pos + n).min(self.significant.len());
        let la = Lookahead::new(self.tokens, &self.significant[start..]);
        self.keywords.classify(&la)
    }

    /// Byte offset where the current token starts (end of input past EOF).
    pub fn offset(&self) -> TextSize {
        self.offset_of(self.pos)
    }

    /// Byte offset where the previously consumed token ends.
    pub fn prev_end(&self) -> TextSize {
        match self.pos.checked_sub(1) {
            Some(prev) => {
                let raw = self.significant[prev];
                self.offsets[raw + 1]
            }
            None => TextSize::from(0),
        }
    }

    /// Number of significant tokens consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Text of the significant tokens consumed since `position`, without
    /// trivia.
    pub fn text_since(&self, position: usize) -> String {
        self.significant[position.min(self.pos)..self.pos]
            .iter()
            .map(|&i| self.tokens[i].text)
            .collect()
    }

    /// Record a recoverable diagnostic.
    pub fn error(&mut self, kind: SyntaxErrorKind, message: impl Into<String>, range: TextRange) {
        let error = SyntaxError::new(kind, message, range);
        log::trace!("{error}");
        self.errors.push(error);
    }

    /// Record a diagnostic covering the current token.
    pub fn error_here(&mut self, kind: SyntaxErrorKind, message: impl Into<String>) {
        let start = self.offset();
        let end = match self.raw_index(0) {
            Some(raw) if !self.at_end() => self.offsets[raw + 1],
            _ => start,
        };
        self.error(kind, message, TextRange::new(start, end));
    }

    /// Enter one level of nesting. Returns false, and aborts the parse, when
    /// the limit is exceeded.
    pub fn enter(&mut self) -> bool {
        self.depth += 1;
        if self.depth > self.max_depth && self.fatal.is_none() {
            self.fatal = Some(ParseError::RecursionLimit {
                limit: self.max_depth,
                offset: u32::from(self.offset()) as usize,
            });
        }
        self.fatal.is_none()
    }

    /// Leave a level entered with [`Parser::enter`].
    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Abort the parse: a rule failed to consume anything at a point where
    /// it must.
    pub fn stalled(&mut self) {
        if self.fatal.is_none() {
            self.fatal = Some(ParseError::UnresolvedAmbiguity {
                offset: u32::from(self.offset()) as usize,
            });
        }
    }

    fn raw_index(&self, n: usize) -> Option<usize> {
        self.significant.get(self.pos + n).copied()
    }

    fn offset_of(&self, pos: usize) -> TextSize {
        match self.significant.get(pos) {
            Some(&raw) => self.offsets[raw],
            None => self.offsets[self.offsets.len() - 1],
        }
    }
}

/// A marker for a node being constructed.
///
/// This is the heart of the type-safe tree building system. When you call
/// `parser.start()`, a `Placeholder` event is pushed and you get a `Marker`
/// pointing to it.
///
/// ## The Must-Use Contract
///
/// The `#[must_use]` attribute and the `Drop` impl together enforce that
/// every marker is either:
///
/// - **Completed** via `marker.complete(parser, KIND)` - converts the
///   placeholder to a `Start` event and pushes a `Finish` event
/// - **Abandoned** via `marker.abandon(parser)` - removes the placeholder
///   (only works if nothing was pushed after it)
///
/// If you drop a marker without doing either, **the program panics**. This
/// catches bugs at runtime rather than producing corrupt trees.
///
/// ## Example
///
/// ```ignore
/// fn text_span(p: &mut Parser) {
///     let m = p.start();  // Reserve a spot for the node
///
///     while p.at(SyntaxKind::TEXT) {
///         p.bump();
///     }
///
///     m.complete(p, SyntaxKind::TEXT_SPAN);  // Finalize the node
/// }
/// ```
#[must_use = "Markers must be completed or abandoned, dropping them is a bug"]
pub struct Marker {
    /// Position in the events vector where our Placeholder lives
    pos: usize,
    /// Tracks whether complete() or abandon() was called
    completed: bool,
}

impl Marker {
    /// Complete this marker, creating a node of the given kind.
    ///
    /// This:
    /// 1. Replaces the `Placeholder` at our position with `Start { kind, ... }`
    /// 2. Pushes a `Finish` event
    /// 3. Returns a `CompletedMarker` for potential `precede()` calls
    pub fn complete(mut self, p: &mut Parser<'_, '_>, kind: SyntaxKind) -> CompletedMarker {
        self.completed = true;
        let event_at_pos = &mut p.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::start(kind);
        p.events.push(Event::Finish);
        CompletedMarker { pos: self.pos }
    }

    /// Abandon this marker without creating a node.
    ///
    /// Use this when you speculatively started a node but decided not to
    /// create it (e.g., the input didn't match what you expected).
    ///
    /// **Note**: This only removes the placeholder if it's the last event.
    /// If other events were pushed after `start()`, the placeholder becomes
    /// inert and is ignored by the Sink.
    pub fn abandon(mut self, p: &mut Parser<'_, '_>) {
        self.completed = true;
        if self.pos == p.events.len() - 1 {
            match p.events.pop() {
                Some(Event::Placeholder) => {}
                _ => unreachable!(),
            }
        }
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be either completed or abandoned");
        }
    }
}

/// A marker for a node that has been completed.
///
/// The only thing you can do with a `CompletedMarker` is call `precede()`
/// to wrap the completed node in a new parent.
///
/// ## The Precede Pattern
///
/// ```ignore
/// // We parsed "a" as an expression
/// let lhs = atom(p);  // Returns CompletedMarker
///
/// // Oh, there's a "+" - this is actually a binary expression!
/// if p.at(SyntaxKind::PLUS) {
///     let m = lhs.precede(p);  // Start a new node BEFORE "a"
///     p.bump();  // consume "+"
///     atom(p);  // parse "b"
///     m.complete(p, SyntaxKind::BINARY_EXPR);
/// }
/// // Result: BINARY_EXPR containing [a, "+", b]
/// ```
///
/// This works by setting a `forward_parent` link that the Sink resolves.
#[derive(Debug, Clone, Copy)]
pub struct CompletedMarker {
    /// Position of the Start event for this completed node
    pos: usize,
}

impl CompletedMarker {
    /// Create a new parent node that will contain this node.
    ///
    /// Returns a new `Marker` that, when completed, will become the parent
    /// of the node at `self.pos`.
    pub fn precede(self, p: &mut Parser<'_, '_>) -> Marker {
        let new_pos = p.events.len();
        p.events.push(Event::Placeholder);

        // Update the original Start event to point to this new parent
        if let Event::Start { forward_parent, .. } = &mut p.events[self.pos] {
            *forward_parent = Some(new_pos);
        }

        Marker {
            pos: new_pos,
            completed: false,
        }
    }
}

/// Parse an Antlers template with the default options.
pub fn parse(source: &str) -> Result<Parse, ParseError> {
    parse_with(source, &ParseOptions::default())
}

/// Parse an Antlers template.
///
/// Malformed input never fails: it yields a tree with `ERROR` nodes and
/// diagnostics. Only a fatal [`ParseError`] aborts.
pub fn parse_with(source: &str, options: &ParseOptions<'_>) -> Result<Parse, ParseError> {
    let lexed = tokenize(source);
    log::trace!("lexed {} tokens", lexed.tokens.len());
    let parser = Parser::new(&lexed.tokens, options);
    parser.parse(lexed.errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_empty_input() {
        let parse = parse("").unwrap();
        let tree = parse.syntax();
        assert_eq!(tree.kind(), SyntaxKind::ROOT);
        assert_eq!(tree.children().count(), 0);
        assert!(parse.ok());
    }

    #[test]
    fn parse_preserves_all_text() {
        let input = "Hello, {{ name }}!";
        let tree = parse(input).unwrap().syntax();
        assert_eq!(tree.text(), input);
    }

    #[test]
    fn parse_plain_text() {
        let tree = parse("Hello").unwrap().syntax();

        assert_eq!(tree.kind(), SyntaxKind::ROOT);
        let span = tree.children().next().unwrap();
        assert_eq!(span.kind(), SyntaxKind::TEXT_SPAN);
    }

    #[test]
    fn marker_must_be_completed() {
        let result = std::panic::catch_unwind(|| {
            let tokens = lex("test");
            let options = ParseOptions::default();
            let mut parser = Parser::new(&tokens, &options);
            let _marker = parser.start();
            // Marker dropped without completion - should panic
        });
        assert!(result.is_err());
    }

    #[test]
    fn marker_can_be_abandoned() {
        let tokens = lex("test");
        let options = ParseOptions::default();
        let mut parser = Parser::new(&tokens, &options);
        let marker = parser.start();
        marker.abandon(&mut parser);
        // Should not panic
    }

    #[test]
    fn lookahead_skips_trivia() {
        let tokens = lex("{{ a:b  c }}");
        let options = ParseOptions::default();
        let parser = Parser::new(&tokens, &options);
        assert_eq!(parser.nth(0), SyntaxKind::L_DCURLY);
        assert_eq!(parser.nth(1), SyntaxKind::IDENT);
        assert_eq!(parser.nth(2), SyntaxKind::COLON);
        assert_eq!(parser.nth_text(4), "c");
        assert!(!parser.is_joint(1));
        assert!(parser.is_joint(2));
        assert!(parser.is_joint(3));
        assert!(!parser.is_joint(4));
        assert_eq!(parser.nth(6), SyntaxKind::EOF);
    }

    #[test]
    fn offsets_track_trivia() {
        let tokens = lex("ab{{  x }}");
        let options = ParseOptions::default();
        let mut parser = Parser::new(&tokens, &options);
        let m = parser.start();
        parser.bump();
        parser.bump();
        assert_eq!(parser.offset(), TextSize::from(6));
        assert_eq!(parser.prev_end(), TextSize::from(4));
        assert_eq!(parser.text_since(0), "ab{{");
        m.abandon(&mut parser);
    }

    #[test]
    fn recursion_limit_reports_eof() {
        let tokens = lex("{{ x }}");
        let options = ParseOptions {
            max_depth: 1,
            ..ParseOptions::default()
        };
        let mut parser = Parser::new(&tokens, &options);
        assert!(parser.enter());
        assert!(!parser.enter());
        assert!(parser.at_end());
        assert_eq!(parser.nth(1), SyntaxKind::EOF);
    }

    #[test]
    fn parse_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Parse>();
        assert_send_sync::<ParseError>();
    }
}
