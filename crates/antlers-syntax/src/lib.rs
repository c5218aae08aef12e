//! # antlers-syntax
//!
//! A lossless syntax tree for Antlers templates (HTML interleaved with
//! `{{ ... }}` tags) using [Rowan] + [Logos], following the [rust-analyzer]
//! architecture model.
//!
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! ## What is a Lossless CST?
//!
//! Unlike an Abstract Syntax Tree (AST) which discards formatting details, a
//! Concrete Syntax Tree (CST) preserves **every byte** of the original source:
//! the HTML around the tags, whitespace inside them, comments, even the
//! tokens of a tag that failed to parse. This enables:
//!
//! - **Accurate error reporting**: Span information maps exactly to source positions
//! - **Editor tooling**: Highlighting and folding work on half-typed templates
//! - **Formatting**: Print the tree back out and get the input unchanged
//!
//! ## Architecture Overview
//!
//! The parsing pipeline has three stages:
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Rowan Tree
//!               (Logos)          (Grammar)        (GreenNodeBuilder)
//! ```
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! The lexer uses [Logos] in two modes: one for the text between tags, one
//! for the inside of a tag. Every character becomes part of some token.
//!
//! ```text
//! "<b>{{ name }}</b>" → [TEXT, L_DCURLY, WHITESPACE, IDENT, WHITESPACE, R_DCURLY, TEXT]
//! ```
//!
//! ### 2. Parser ([`parser`] module)
//!
//! The parser consumes the significant tokens and emits **events** (Start,
//! Token, Finish). Which identifiers are structural keywords is decided by a
//! pluggable [`KeywordClassifier`].
//!
//! ```text
//! Tokens → Events: [Start(ANTLERS_TAG), Token(L_DCURLY), Start(DIRECTIVE),
//!                   Start(VARIABLE), Token(IDENT), Finish, Finish,
//!                   Token(R_DCURLY), Finish]
//! ```
//!
//! ### 3. Sink ([`parser::sink`] module)
//!
//! The sink consumes events, weaves the trivia back in, and builds a Rowan
//! green tree using `GreenNodeBuilder`. The resulting tree is immutable and
//! can be cheaply cloned and shared across threads.
//!
//! ## Module Structure
//!
//! ```text
//! antlers-syntax/
//! ├── lib.rs           # This file - public API and integration tests
//! ├── syntax_kind.rs   # SyntaxKind enum (tokens + nodes) and Rowan integration
//! ├── lexer.rs         # Two-mode Logos tokenizer
//! ├── keyword.rs       # Keyword classifier contract and the standard rules
//! ├── error.rs         # Recoverable and fatal diagnostics
//! ├── ast.rs           # Typed views over the tree
//! └── parser/
//!     ├── mod.rs       # Parser struct, Marker system, public parse() function
//!     ├── event.rs     # Event enum (Start, Token, Finish, Placeholder)
//!     ├── sink.rs      # Converts events to Rowan GreenNode
//!     └── grammar/
//!         ├── mod.rs         # Document and body loops, tag-level recovery
//!         ├── resolve.rs     # Lookahead decisions: tag shapes, close matching
//!         ├── tags.rs        # Conditionals, loops, lifecycle and generic tags
//!         ├── expressions.rs # Operator precedence, variables, modifiers
//!         └── params.rs      # Bindings and parameter lists
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use antlers_syntax::{parse, SyntaxKind};
//!
//! let parse = parse("<h1>{{ title | upper }}</h1>").unwrap();
//! let tree = parse.syntax();
//!
//! // The tree preserves all text
//! assert_eq!(tree.text().to_string(), "<h1>{{ title | upper }}</h1>");
//!
//! // Navigate the tree structure
//! assert_eq!(tree.kind(), SyntaxKind::ROOT);
//! let tag = tree.children().nth(1).unwrap();
//! assert_eq!(tag.kind(), SyntaxKind::ANTLERS_TAG);
//! assert!(parse.ok());
//! ```
//!
//! ## Errors
//!
//! Malformed templates still produce a complete tree: the broken span is
//! wrapped in an `ERROR` node and a [`SyntaxError`] is recorded. Only
//! nesting deeper than [`ParseOptions::max_depth`] aborts, with a
//! [`ParseError`].

pub mod ast;
pub mod error;
pub mod keyword;
pub mod lexer;
pub mod parser;
pub mod syntax_kind;

pub use error::{ParseError, SyntaxError, SyntaxErrorKind};
pub use keyword::{Keyword, KeywordClassifier, Lookahead, StandardKeywords};
pub use parser::{DEFAULT_MAX_DEPTH, Parse, ParseOptions, parse, parse_with};
pub use syntax_kind::{AntlersLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

/// Format a syntax tree as an indented list of nodes and tokens with their
/// ranges, one per line.
pub fn debug_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    write_tree(&mut out, node, 0);
    out
}

fn write_tree(out: &mut String, node: &SyntaxNode, indent: usize) {
    let prefix = "  ".repeat(indent);
    out.push_str(&format!(
        "{}{:?}@{:?}\n",
        prefix,
        node.kind(),
        node.text_range()
    ));

    for child in node.children_with_tokens() {
        match child {
            rowan::NodeOrToken::Node(n) => write_tree(out, &n, indent + 1),
            rowan::NodeOrToken::Token(t) => {
                let text = t.text().replace('\n', "\\n");
                out.push_str(&format!(
                    "{}  {:?}@{:?} {:?}\n",
                    prefix,
                    t.kind(),
                    t.text_range(),
                    text
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNode;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    /// Parse a fixture from tests/fixtures/ and check it is lossless and
    /// clean. Called by generated test functions (see build.rs).
    fn fixture_test(name: &str) {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(format!("{name}.antlers.html"));
        let input = std::fs::read_to_string(&path).unwrap();

        let parse = parse(&input).unwrap();
        assert_eq!(parse.syntax().text().to_string(), input);
        assert!(
            parse.ok(),
            "{name}: {:#?}\n{}",
            parse.errors(),
            parse.debug_tree()
        );
    }

    // Generated by build.rs - one test per fixture
    include!(concat!(env!("OUT_DIR"), "/fixture_tests.rs"));

    /// Kinds and token texts without ranges, so trees from different
    /// offsets can be compared.
    fn shape(node: &SyntaxNode) -> String {
        let mut out = format!("{:?}(", node.kind());
        for child in node.children_with_tokens() {
            match child {
                rowan::NodeOrToken::Node(n) => out.push_str(&shape(&n)),
                rowan::NodeOrToken::Token(t) => out.push_str(&format!("{:?}", t.text())),
            }
        }
        out.push(')');
        out
    }

    #[test]
    fn snapshot_directive() {
        let parse = parse("{{ title }}").unwrap();
        assert_snapshot!(parse.debug_tree(), @r#"
        ROOT@0..11
          ANTLERS_TAG@0..11
            L_DCURLY@0..2 "{{"
            WHITESPACE@2..3 " "
            DIRECTIVE@3..8
              VARIABLE@3..8
                IDENT@3..8 "title"
            WHITESPACE@8..9 " "
            R_DCURLY@9..11 "}}"
        "#);
    }

    #[test]
    fn snapshot_unterminated_if() {
        let parse = parse("{{ if x }}y").unwrap();
        assert_snapshot!(parse.debug_tree(), @r#"
        ROOT@0..11
          ERROR@0..11
            IF_STATEMENT@0..11
              IF_BRANCH@0..11
                OPEN_TAG@0..10
                  L_DCURLY@0..2 "{{"
                  WHITESPACE@2..3 " "
                  KEYWORD@3..5 "if"
                  WHITESPACE@5..6 " "
                  VARIABLE@6..7
                    IDENT@6..7 "x"
                  WHITESPACE@7..8 " "
                  R_DCURLY@8..10 "}}"
                BODY@10..11
                  TEXT_SPAN@10..11
                    TEXT@10..11 "y"
        "#);
    }

    #[test]
    fn body_matches_standalone_parse() {
        let bodies = [
            "<li>{{ title }}</li>",
            "{{ if a }}x{{ /if }} and {{ b | upper }}",
            "{{# note #}}{{ partial:card }}",
            "",
        ];

        for body in bodies {
            let input = format!("{{{{ collection:blog }}}}{body}{{{{ /collection:blog }}}}");
            let parse = parse(&input).unwrap();
            assert!(parse.ok(), "{input}: {:?}", parse.errors());

            let tags: Vec<_> = parse.syntax().children().collect();
            assert_eq!(tags.len(), 1, "{input}");
            let nested = tags[0]
                .children()
                .find(|n| n.kind() == SyntaxKind::BODY)
                .unwrap();

            let standalone = super::parse(body).unwrap().syntax();
            let nested: Vec<_> = nested.children().map(|n| shape(&n)).collect();
            let standalone: Vec<_> = standalone.children().map(|n| shape(&n)).collect();
            assert_eq!(nested, standalone, "{input}");
        }
    }

    #[test]
    fn mismatched_close_yields_no_single_pair() {
        let parse = parse("{{ if x }}a{{ /unless }}").unwrap();
        let kinds: Vec<_> = parse.errors().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![SyntaxErrorKind::MismatchedClose]);
        let pairs = parse.syntax().children().filter(|n| {
            n.kind() == SyntaxKind::IF_STATEMENT
                && n.children().any(|c| c.kind() == SyntaxKind::CLOSE_TAG)
        });
        assert_eq!(pairs.count(), 0);

        let parse = super::parse("{{ collection:blog }}a{{ /collection:news }}").unwrap();
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].kind, SyntaxErrorKind::MismatchedClose);
        let loops = parse.syntax().children().filter(|n| {
            n.kind() == SyntaxKind::COLLECTION_LOOP
                && n.children().any(|c| c.kind() == SyntaxKind::CLOSE_TAG)
        });
        assert_eq!(loops.count(), 0);
    }

    #[test]
    fn if_elseif_else_scenario() {
        let parse =
            parse(r#"{{ if one == "two" }}A{{ elseif one == "three" }}B{{ else }}C{{ /if }}"#)
                .unwrap();
        assert!(parse.ok(), "{:?}", parse.errors());
        let tag = parse.document().tags().next().unwrap();
        let stmt = tag.as_if().unwrap();
        assert_eq!(stmt.branches().count(), 2);
        assert!(stmt.else_branch().is_some());
    }

    #[test]
    fn collection_scenario() {
        let parse = parse(r#"{{ collection:blog limit="3" }}{{ title }}{{ /collection:blog }}"#)
            .unwrap();
        assert!(parse.ok(), "{:?}", parse.errors());
        let tag = parse.document().tags().next().unwrap();
        assert_eq!(tag.kind(), ast::TagKind::Collection);
        assert_eq!(tag.binding().unwrap().path(), "blog");

        let params: Vec<_> = tag.params().collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].syntax().text().to_string(), r#"limit="3""#);

        let body: Vec<_> = tag.body().unwrap().nodes().collect();
        assert_eq!(body.len(), 1);
        let ast::Node::Tag(inner) = &body[0] else {
            panic!("expected a tag in the body");
        };
        let directive = inner.as_antlers().unwrap().directive().unwrap();
        assert_eq!(directive.variable().unwrap().path(), "title");
    }

    #[test]
    fn unterminated_if_spans_to_end() {
        let input = "{{ if x }}\n<p>never closed</p>\n";
        let parse = parse(input).unwrap();
        assert_eq!(parse.errors().len(), 1);
        let error = &parse.errors()[0];
        assert_eq!(error.kind, SyntaxErrorKind::UnterminatedTag);
        assert_eq!(u32::from(error.range.start()), 0);
        assert_eq!(usize::from(error.range.end()), input.len());
    }

    fn expression(input: &str) -> ast::Expr {
        let parse = parse(input).unwrap();
        assert!(parse.ok(), "{input}: {:?}", parse.errors());
        let tag = parse.document().tags().next().unwrap();
        tag.as_antlers().unwrap().expression().unwrap()
    }

    #[test]
    fn multiplication_binds_tighter() {
        let ast::Expr::Binary(add) = expression("{{ 1 + 2 * 3 }}") else {
            panic!("expected a binary expression");
        };
        assert_eq!(add.op(), Some(ast::BinaryOp::Add));
        assert!(matches!(add.rhs(), Some(ast::Expr::Binary(_))));
    }

    #[test]
    fn modifier_chain_in_order() {
        let ast::Expr::Modified(modified) = expression("{{ title | upper | truncate:20 }}") else {
            panic!("expected a modified expression");
        };
        assert_eq!(modified.base().unwrap().syntax().text(), "title");

        let modifiers: Vec<_> = modified.modifiers().collect();
        let names: Vec<_> = modifiers.iter().filter_map(|m| m.name()).collect();
        assert_eq!(names, vec!["upper", "truncate"]);
        assert_eq!(modifiers[0].args().len(), 0);
        assert_eq!(modifiers[1].args().len(), 1);
    }

    #[test]
    fn comment_is_not_relexed() {
        let parse = parse("{{# {{ if x }} #}}").unwrap();
        let kinds: Vec<_> = parse.syntax().children().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![SyntaxKind::ANTLERS_COMMENT]);
    }

    #[test]
    fn deep_nesting_hits_recursion_limit() {
        let tags = "{{ if x }}".repeat(DEFAULT_MAX_DEPTH + 10);
        assert!(matches!(
            parse(&tags),
            Err(ParseError::RecursionLimit { limit, .. }) if limit == DEFAULT_MAX_DEPTH
        ));

        let parens = format!("{{{{ {}1{} }}}}", "(".repeat(1000), ")".repeat(1000));
        assert!(matches!(
            parse(&parens),
            Err(ParseError::RecursionLimit { .. })
        ));
    }

    #[test]
    fn custom_depth_limit() {
        let options = ParseOptions {
            max_depth: 2,
            ..ParseOptions::default()
        };
        assert!(parse_with("{{ (1) }}", &options).is_ok());
        assert!(parse_with("{{ (((1))) }}", &options).is_err());
    }

    #[test]
    fn custom_classifier_turns_keywords_off() {
        struct NoKeywords;

        impl KeywordClassifier for NoKeywords {
            fn classify(&self, _: &Lookahead<'_>) -> Option<Keyword> {
                None
            }
        }

        let options = ParseOptions {
            keywords: &NoKeywords,
            ..ParseOptions::default()
        };
        let parse = parse_with("{{ collection:blog }}x{{ /collection:blog }}", &options).unwrap();
        assert!(parse.ok(), "{:?}", parse.errors());
        let kinds: Vec<_> = parse.syntax().children().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::ANTLERS_TAG,
                SyntaxKind::TEXT_SPAN,
                SyntaxKind::ANTLERS_TAG
            ]
        );
    }

    #[test]
    fn parses_in_parallel() {
        let input = "{{ collection:blog }}{{ if a }}{{ title | upper }}{{ /if }}{{ /collection:blog }}";
        let expected = parse(input).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| parse(input))).collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap(), expected);
            }
        });
    }

    #[test]
    fn roundtrip_preserves_text() {
        let inputs = [
            "",
            "plain text",
            "{{ title }}",
            "{{ if }}",
            "{{ /if }}",
            "{{ a + }}",
            "{{ collection:blog }}",
            "{{ }} }} {{",
            "{{# unclosed",
            "{{ 'unterminated }}",
            "{{ a ~ b }}",
            "{{ x | }}",
            "@{{ escaped }}",
            "{{ partial:card :x={ y } }}",
            "{{ if a }}{{ else }}{{ else }}{{ /if }}",
            "{{ switch( }}",
            "{{ *recursive }}",
        ];

        for input in inputs {
            let parse = parse(input).unwrap();
            assert_eq!(
                parse.syntax().text().to_string(),
                input,
                "Roundtrip failed for: {:?}",
                input
            );
        }
    }
}
