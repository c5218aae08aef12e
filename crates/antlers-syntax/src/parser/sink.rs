//! Sink for converting parser events into a Rowan green tree.
//!
//! The parser only saw significant tokens, so the sink walks the full token
//! list alongside the events and re-inserts trivia: before every token, and
//! before every node except the root. Trivia that precedes a node therefore
//! belongs to the node's parent, and trailing trivia lands in the root.

use rowan::{GreenNode, GreenNodeBuilder};

use crate::lexer::Token;
use crate::parser::event::Event;
use crate::syntax_kind::SyntaxKind;

/// Converts parser events and tokens into a Rowan syntax tree.
pub struct Sink<'t, 'input> {
    builder: GreenNodeBuilder<'static>,
    tokens: &'t [Token<'input>],
    cursor: usize,
    depth: usize,
    events: Vec<Event>,
}

impl<'t, 'input> Sink<'t, 'input> {
    /// Create a new sink.
    pub fn new(tokens: &'t [Token<'input>], events: Vec<Event>) -> Self {
        Self {
            builder: GreenNodeBuilder::new(),
            tokens,
            cursor: 0,
            depth: 0,
            events,
        }
    }

    /// Consume the sink and build the green tree.
    pub fn finish(mut self) -> GreenNode {
        // Process forward_parent links to create proper tree structure
        let mut forward_parents = Vec::new();

        for i in 0..self.events.len() {
            match std::mem::replace(&mut self.events[i], Event::Placeholder) {
                Event::Start {
                    kind,
                    forward_parent,
                } => {
                    // Collect forward parent chain
                    forward_parents.push(kind);
                    let mut fp = forward_parent;

                    while let Some(parent_idx) = fp {
                        match std::mem::replace(&mut self.events[parent_idx], Event::Placeholder) {
                            Event::Start {
                                kind,
                                forward_parent,
                            } => {
                                fp = forward_parent;
                                forward_parents.push(kind);
                            }
                            _ => unreachable!(),
                        }
                    }

                    if self.depth > 0 {
                        self.eat_trivia();
                    }

                    // Start nodes in reverse order (outermost first)
                    for kind in forward_parents.drain(..).rev() {
                        self.builder.start_node(kind.into());
                        self.depth += 1;
                    }
                }
                Event::Token { kind, n_raw_tokens } => {
                    self.eat_trivia();
                    self.token(kind, n_raw_tokens as usize);
                }
                Event::Finish => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.eat_trivia();
                    }
                    self.builder.finish_node();
                }
                Event::Placeholder => {}
            }
        }

        self.builder.finish()
    }

    fn token(&mut self, kind: SyntaxKind, n_raw_tokens: usize) {
        // Accumulate text from n_raw_tokens
        let start = self.cursor;
        self.cursor = (self.cursor + n_raw_tokens).min(self.tokens.len());
        let text: String = self.tokens[start..self.cursor]
            .iter()
            .map(|t| t.text)
            .collect();
        self.builder.token(kind.into(), &text);
    }

    fn eat_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.cursor) {
            if !token.kind.is_trivia() {
                break;
            }
            self.builder.token(token.kind.into(), token.text);
            self.cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::syntax_kind::SyntaxNode;

    fn token(kind: SyntaxKind, text: &str) -> Token<'_> {
        Token { kind, text }
    }

    #[test]
    fn sink_builds_simple_tree() {
        let tokens = vec![token(SyntaxKind::TEXT, "hello")];

        let events = vec![
            Event::start(SyntaxKind::ROOT),
            Event::start(SyntaxKind::TEXT_SPAN),
            Event::token(SyntaxKind::TEXT),
            Event::Finish,
            Event::Finish,
        ];

        let tree = SyntaxNode::new_root(Sink::new(&tokens, events).finish());

        assert_eq!(tree.kind(), SyntaxKind::ROOT);
        assert_eq!(tree.children().count(), 1);
    }

    #[test]
    fn sink_reinserts_trivia() {
        let input = "{{ x }}";
        let tokens = lex(input);

        let events = vec![
            Event::start(SyntaxKind::ROOT),
            Event::start(SyntaxKind::ANTLERS_TAG),
            Event::token(SyntaxKind::L_DCURLY),
            Event::start(SyntaxKind::DIRECTIVE),
            Event::token(SyntaxKind::IDENT),
            Event::Finish,
            Event::token(SyntaxKind::R_DCURLY),
            Event::Finish,
            Event::Finish,
        ];

        let tree = SyntaxNode::new_root(Sink::new(&tokens, events).finish());
        assert_eq!(tree.text().to_string(), input);

        let tag = tree.first_child().unwrap();
        let kinds: Vec<_> = tag.children_with_tokens().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::L_DCURLY,
                SyntaxKind::WHITESPACE,
                SyntaxKind::DIRECTIVE,
                SyntaxKind::WHITESPACE,
                SyntaxKind::R_DCURLY,
            ]
        );
    }

    #[test]
    fn forward_parent_wraps_completed_node() {
        let tokens = vec![token(SyntaxKind::TEXT, "a")];

        // ERROR was started after TEXT_SPAN but precedes it
        let events = vec![
            Event::start(SyntaxKind::ROOT),
            Event::Start {
                kind: SyntaxKind::TEXT_SPAN,
                forward_parent: Some(4),
            },
            Event::token(SyntaxKind::TEXT),
            Event::Finish,
            Event::start(SyntaxKind::ERROR),
            Event::Finish,
            Event::Finish,
        ];

        let tree = SyntaxNode::new_root(Sink::new(&tokens, events).finish());
        let error = tree.first_child().unwrap();
        assert_eq!(error.kind(), SyntaxKind::ERROR);
        assert_eq!(error.first_child().unwrap().kind(), SyntaxKind::TEXT_SPAN);
    }
}
