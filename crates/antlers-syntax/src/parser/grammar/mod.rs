//! # Grammar Rules
//!
//! This module contains the grammar rules that drive parsing. Each function
//! takes a `&mut Parser` and uses its methods to:
//!
//! 1. Inspect the current token (`p.current()`, `p.at()`, `p.nth()`)
//! 2. Consume tokens (`p.bump()`, `p.eat()`, `p.bump_remap()`)
//! 3. Build tree structure (`p.start()` → marker → `complete()`/`abandon()`)
//!
//! ## Module Structure
//!
//! - [`resolve`] - Bounded-lookahead decisions: which shape a tag has, where a
//!   body ends, how a close tag relates to the open one
//! - [`tags`] - Every tag shape (conditionals, loops, lifecycle tags, the
//!   generic tag)
//! - [`expressions`] - Precedence climbing, variables, modifiers
//! - [`params`] - Bindings, parameter lists and their values
//!
//! ## Error Recovery
//!
//! Grammar functions are lenient and always produce a tree:
//!
//! - Leftover tokens inside a tag are wrapped in an ERROR node up to `}}`
//! - A paired tag that is never closed is wrapped in an ERROR node
//! - A close tag without an open becomes an ERROR node
//!
//! Each of these also records a diagnostic. The only hard stop is the
//! nesting limit enforced through [`Parser::enter`].

mod expressions;
mod params;
mod resolve;
mod tags;

use rowan::TextRange;

use crate::error::SyntaxErrorKind;
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

pub(crate) use resolve::OpenTag;

/// Parse the root document.
///
/// This is the entry point for parsing. It creates a ROOT node containing
/// all top-level nodes in the document.
pub fn root(p: &mut Parser<'_, '_>) {
    let m = p.start();

    while !p.at_end() {
        node_or_stall(p);
    }

    m.complete(p, SyntaxKind::ROOT);
}

/// Parse the nodes between an open tag and whatever ends its body.
fn body(p: &mut Parser<'_, '_>) {
    let m = p.start();

    if p.enter() {
        while !p.at_end() && resolve::body_boundary(p).is_none() {
            node_or_stall(p);
        }
    }
    p.exit();

    m.complete(p, SyntaxKind::BODY);
}

fn node_or_stall(p: &mut Parser<'_, '_>) {
    let before = p.position();
    node(p);
    if p.position() == before && !p.at_end() {
        p.stalled();
    }
}

/// Parse one top-level node.
fn node(p: &mut Parser<'_, '_>) {
    match p.current() {
        SyntaxKind::TEXT | SyntaxKind::IGNORE => text_span(p),
        SyntaxKind::COMMENT => single(p, SyntaxKind::ANTLERS_COMMENT),
        SyntaxKind::RAW_CODE => single(p, SyntaxKind::RAW_BLOCK),
        SyntaxKind::ECHO_CODE => single(p, SyntaxKind::ECHO_BLOCK),
        SyntaxKind::L_DCURLY => tags::tag(p),
        _ => {
            p.error_here(SyntaxErrorKind::MalformedExpression, "unexpected token");
            single(p, SyntaxKind::ERROR);
        }
    }
}

fn text_span(p: &mut Parser<'_, '_>) {
    let m = p.start();
    while p.at(SyntaxKind::TEXT) || p.at(SyntaxKind::IGNORE) {
        p.bump();
    }
    m.complete(p, SyntaxKind::TEXT_SPAN);
}

fn single(p: &mut Parser<'_, '_>, kind: SyntaxKind) {
    let m = p.start();
    p.bump();
    m.complete(p, kind);
}

/// True where a tag's content must stop.
fn at_tag_end(p: &Parser<'_, '_>) -> bool {
    matches!(
        p.current(),
        SyntaxKind::R_DCURLY | SyntaxKind::L_DCURLY | SyntaxKind::EOF
    )
}

/// Consume `kind` or report that `what` was expected.
fn expect(p: &mut Parser<'_, '_>, kind: SyntaxKind, what: &str) -> bool {
    if p.eat(kind) {
        return true;
    }
    p.error_here(
        SyntaxErrorKind::MalformedExpression,
        format!("expected {what}"),
    );
    false
}

/// Wrap anything left before `}}` in an ERROR node, then consume `}}`.
fn finish_tag(p: &mut Parser<'_, '_>) {
    if !at_tag_end(p) {
        let start = p.offset();
        let m = p.start();
        while !at_tag_end(p) {
            p.bump();
        }
        m.complete(p, SyntaxKind::ERROR);
        p.error(
            SyntaxErrorKind::MalformedExpression,
            "unexpected tokens in tag",
            TextRange::new(start, p.prev_end()),
        );
    }

    if !p.eat(SyntaxKind::R_DCURLY) {
        p.error_here(SyntaxErrorKind::UnterminatedTag, "expected `}}`");
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SyntaxErrorKind;
    use crate::parser::parse;
    use crate::syntax_kind::SyntaxKind;
    use pretty_assertions::assert_eq;

    fn top_level(input: &str) -> Vec<SyntaxKind> {
        let parse = parse(input).unwrap();
        parse.syntax().children().map(|n| n.kind()).collect()
    }

    #[test]
    fn parse_mixed_document() {
        let input = "<h1>{{ title }}</h1>{{# note #}}{{? $x = 1 ?}}{{$ $x $}}";
        assert_eq!(
            top_level(input),
            vec![
                SyntaxKind::TEXT_SPAN,
                SyntaxKind::ANTLERS_TAG,
                SyntaxKind::TEXT_SPAN,
                SyntaxKind::ANTLERS_COMMENT,
                SyntaxKind::RAW_BLOCK,
                SyntaxKind::ECHO_BLOCK,
            ]
        );
    }

    #[test]
    fn text_and_ignore_runs_share_a_span() {
        let parse = parse("mail me@example.com { now").unwrap();
        let spans: Vec<_> = parse.syntax().children().collect();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind(), SyntaxKind::TEXT_SPAN);
    }

    #[test]
    fn comment_is_one_node() {
        let input = "{{# {{ if x }} #}}";
        let parse = parse(input).unwrap();
        assert_eq!(top_level(input), vec![SyntaxKind::ANTLERS_COMMENT]);
        assert!(parse.ok());
    }

    #[test]
    fn junk_in_tag_is_wrapped() {
        let input = "{{ title ) ( }}";
        let parse = parse(input).unwrap();
        let tag = parse.syntax().first_child().unwrap();
        assert_eq!(tag.kind(), SyntaxKind::ANTLERS_TAG);
        assert!(tag.children().any(|n| n.kind() == SyntaxKind::ERROR));
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(
            parse.errors()[0].kind,
            SyntaxErrorKind::MalformedExpression
        );
        assert_eq!(parse.syntax().text(), input);
    }

    #[test]
    fn tag_cut_short_by_another_tag() {
        let input = "{{ a {{ b }}";
        let parse = parse(input).unwrap();
        assert_eq!(
            top_level(input),
            vec![SyntaxKind::ANTLERS_TAG, SyntaxKind::ANTLERS_TAG]
        );
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].kind, SyntaxErrorKind::UnterminatedTag);
        assert_eq!(parse.syntax().text(), input);
    }
}
