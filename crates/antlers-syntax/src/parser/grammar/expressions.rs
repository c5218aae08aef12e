//! Expressions: precedence climbing over binary operators, prefix operators,
//! ternaries, literals, variable paths and modifier chains.
//!
//! Binding powers, loosest first:
//!
//! | operators                                  | assoc |
//! |--------------------------------------------|-------|
//! | `=` `+=` `-=` `*=` `/=` `%=` `?=`          | right |
//! | `? :`                                      | right |
//! | `??`                                       | left  |
//! | `bwa` `bwo` `bxor`                         | left  |
//! | `&&` `\|\|` `and` `or` `xor`               | left  |
//! | `==` `!=` `===` `!==` `<>` `<` `>` `<=` `>=` | left |
//! | `+` `-`                                    | left  |
//! | `*` `/` `%`                                | left  |
//! | `**`                                       | right |
//! | prefix `!` `-` `+`                         |       |
//!
//! Modifiers (`| name:arg`) are not operators: they apply to the whole
//! expression of a tag, after everything else has bound.

use crate::error::SyntaxErrorKind;
use crate::parser::{CompletedMarker, Parser};
use crate::syntax_kind::SyntaxKind;

use super::{expect, params, resolve};

const PREFIX_BP: u8 = 20;

/// An expression followed by any number of modifiers.
pub(super) fn expr_with_modifiers(p: &mut Parser<'_, '_>) -> Option<CompletedMarker> {
    let lhs = expr(p);
    if !p.at(SyntaxKind::PIPE) {
        return lhs;
    }

    let m = match lhs {
        Some(lhs) => lhs.precede(p),
        None => p.start(),
    };
    while p.at(SyntaxKind::PIPE) {
        modifier(p);
    }
    Some(m.complete(p, SyntaxKind::MODIFIED_EXPR))
}

pub(super) fn expr(p: &mut Parser<'_, '_>) -> Option<CompletedMarker> {
    expr_bp(p, 0)
}

fn expr_bp(p: &mut Parser<'_, '_>, min_bp: u8) -> Option<CompletedMarker> {
    let result = if p.enter() {
        climb(p, min_bp)
    } else {
        None
    };
    p.exit();
    result
}

fn climb(p: &mut Parser<'_, '_>, min_bp: u8) -> Option<CompletedMarker> {
    let mut lhs = prefix(p)?;

    while let Some((op, left_bp, right_bp)) = infix_op(p) {
        if left_bp < min_bp {
            break;
        }

        let m = lhs.precede(p);
        if op == SyntaxKind::QUESTION {
            p.bump();
            expr_bp(p, 0);
            expect(p, SyntaxKind::COLON, "`:` in ternary");
            expr_bp(p, right_bp);
            lhs = m.complete(p, SyntaxKind::TERNARY_EXPR);
        } else {
            p.bump_remap(op);
            expr_bp(p, right_bp);
            lhs = m.complete(p, SyntaxKind::BINARY_EXPR);
        }
    }

    Some(lhs)
}

/// The operator at the current token, with its left and right binding
/// power. Word operators come back as their keyword kinds.
fn infix_op(p: &Parser<'_, '_>) -> Option<(SyntaxKind, u8, u8)> {
    let op = match p.current() {
        SyntaxKind::IDENT => match p.current_text() {
            "and" => SyntaxKind::AND_KW,
            "or" => SyntaxKind::OR_KW,
            "xor" => SyntaxKind::XOR_KW,
            "bwa" => SyntaxKind::BWA_KW,
            "bwo" => SyntaxKind::BWO_KW,
            "bxor" => SyntaxKind::BXOR_KW,
            _ => return None,
        },
        kind => kind,
    };

    let (left, right) = match op {
        SyntaxKind::EQ
        | SyntaxKind::PLUS_EQ
        | SyntaxKind::MINUS_EQ
        | SyntaxKind::STAR_EQ
        | SyntaxKind::SLASH_EQ
        | SyntaxKind::PERCENT_EQ
        | SyntaxKind::QUESTION_EQ => (3, 2),
        SyntaxKind::QUESTION => (5, 4),
        SyntaxKind::QUESTION2 => (6, 7),
        SyntaxKind::BWA_KW | SyntaxKind::BWO_KW | SyntaxKind::BXOR_KW => (8, 9),
        SyntaxKind::AMP2
        | SyntaxKind::PIPE2
        | SyntaxKind::AND_KW
        | SyntaxKind::OR_KW
        | SyntaxKind::XOR_KW => (10, 11),
        SyntaxKind::EQ3
        | SyntaxKind::NEQ2
        | SyntaxKind::EQ2
        | SyntaxKind::NEQ
        | SyntaxKind::LT_GT
        | SyntaxKind::LT
        | SyntaxKind::GT
        | SyntaxKind::LT_EQ
        | SyntaxKind::GT_EQ => (12, 13),
        SyntaxKind::PLUS | SyntaxKind::MINUS => (14, 15),
        SyntaxKind::STAR | SyntaxKind::SLASH | SyntaxKind::PERCENT => (16, 17),
        SyntaxKind::STAR2 => (19, 18),
        _ => return None,
    };
    Some((op, left, right))
}

fn prefix(p: &mut Parser<'_, '_>) -> Option<CompletedMarker> {
    match p.current() {
        SyntaxKind::MINUS if negative_number_ahead(p) => Some(negative_number(p)),
        SyntaxKind::BANG | SyntaxKind::MINUS | SyntaxKind::PLUS => {
            let m = p.start();
            p.bump();
            expr_bp(p, PREFIX_BP);
            Some(m.complete(p, SyntaxKind::UNARY_EXPR))
        }
        _ => atom(p),
    }
}

fn atom(p: &mut Parser<'_, '_>) -> Option<CompletedMarker> {
    match p.current() {
        SyntaxKind::NUMBER | SyntaxKind::STRING => Some(literal(p)),
        SyntaxKind::IDENT => match p.current_text() {
            "true" => Some(literal_remap(p, SyntaxKind::TRUE_KW)),
            "false" => Some(literal_remap(p, SyntaxKind::FALSE_KW)),
            _ => Some(variable_or_method_call(p)),
        },
        SyntaxKind::L_PAREN => {
            let m = p.start();
            p.bump();
            expr(p);
            expect(p, SyntaxKind::R_PAREN, "`)`");
            Some(m.complete(p, SyntaxKind::PAREN_EXPR))
        }
        _ => {
            p.error_here(SyntaxErrorKind::MalformedExpression, "expected expression");
            if !at_recovery_point(p) {
                let m = p.start();
                p.bump();
                m.complete(p, SyntaxKind::ERROR);
            }
            None
        }
    }
}

/// Tokens an enclosing rule is waiting for, which a failed operand must not
/// swallow.
fn at_recovery_point(p: &Parser<'_, '_>) -> bool {
    matches!(
        p.current(),
        SyntaxKind::R_DCURLY
            | SyntaxKind::L_DCURLY
            | SyntaxKind::EOF
            | SyntaxKind::R_PAREN
            | SyntaxKind::R_BRACK
            | SyntaxKind::R_CURLY
            | SyntaxKind::COMMA
            | SyntaxKind::SEMICOLON
            | SyntaxKind::COLON
            | SyntaxKind::PIPE
            | SyntaxKind::FAT_ARROW
    )
}

pub(super) fn literal(p: &mut Parser<'_, '_>) -> CompletedMarker {
    let m = p.start();
    p.bump();
    m.complete(p, SyntaxKind::LITERAL)
}

pub(super) fn literal_remap(p: &mut Parser<'_, '_>, kind: SyntaxKind) -> CompletedMarker {
    let m = p.start();
    p.bump_remap(kind);
    m.complete(p, SyntaxKind::LITERAL)
}

/// `-` directly followed by a number.
pub(super) fn negative_number_ahead(p: &Parser<'_, '_>) -> bool {
    p.at(SyntaxKind::MINUS) && p.nth(1) == SyntaxKind::NUMBER && p.is_joint(1)
}

/// Glue `-` and the number after it into one NUMBER literal.
pub(super) fn negative_number(p: &mut Parser<'_, '_>) -> CompletedMarker {
    let m = p.start();
    p.bump_n(2, SyntaxKind::NUMBER);
    m.complete(p, SyntaxKind::LITERAL)
}

/// A variable path, or a single array method call on one.
fn variable_or_method_call(p: &mut Parser<'_, '_>) -> CompletedMarker {
    let var = variable(p);

    let method_call = p.at(SyntaxKind::DOT)
        && p.is_joint(0)
        && p.nth(1) == SyntaxKind::IDENT
        && resolve::is_array_method(p.nth_text(1))
        && p.nth(2) == SyntaxKind::L_PAREN;
    if !method_call {
        return var;
    }

    let m = var.precede(p);
    p.bump(); // .
    p.bump(); // method
    p.bump(); // (
    expect(p, SyntaxKind::R_PAREN, "`)`");
    m.complete(p, SyntaxKind::ARRAY_METHOD_CALL)
}

/// `name(:seg|.seg|[key])*`, starting at an identifier.
pub(super) fn variable(p: &mut Parser<'_, '_>) -> CompletedMarker {
    let m = p.start();
    p.bump();

    while let Some(len) = resolve::path_step(p, 0) {
        if len == 3 {
            let index = p.start();
            p.bump(); // [
            p.bump();
            p.bump(); // ]
            index.complete(p, SyntaxKind::INDEX);
        } else {
            p.bump();
            p.bump();
        }
    }

    m.complete(p, SyntaxKind::VARIABLE)
}

/// `| name`, `| name:arg` or `| name(arg, ...)`.
fn modifier(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump(); // |

    if !p.eat(SyntaxKind::IDENT) {
        p.error_here(
            SyntaxErrorKind::MalformedExpression,
            "expected modifier name",
        );
        m.complete(p, SyntaxKind::MODIFIER);
        return;
    }

    if p.at(SyntaxKind::COLON) {
        let args = p.start();
        p.bump();
        if !params::scalar_value(p) {
            p.error_here(
                SyntaxErrorKind::MalformedExpression,
                "expected modifier argument",
            );
        }
        args.complete(p, SyntaxKind::MODIFIER_ARGS);
    } else if p.at(SyntaxKind::L_PAREN) {
        let args = p.start();
        p.bump();
        if !p.at(SyntaxKind::R_PAREN) {
            loop {
                if !params::scalar_value(p) {
                    p.error_here(
                        SyntaxErrorKind::MalformedExpression,
                        "expected modifier argument",
                    );
                    break;
                }
                if !p.eat(SyntaxKind::COMMA) {
                    break;
                }
            }
        }
        expect(p, SyntaxKind::R_PAREN, "`)`");
        args.complete(p, SyntaxKind::MODIFIER_ARGS);
    }

    m.complete(p, SyntaxKind::MODIFIER);
}
