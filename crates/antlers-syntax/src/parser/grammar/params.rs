//! Bindings (`:target` after a tag name) and parameter lists.

use crate::error::SyntaxErrorKind;
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

use super::{expect, expressions, resolve};

/// Parse a `:path` binding directly attached to the previous token.
///
/// Returns the bound path as written, without trivia.
pub(super) fn binding(p: &mut Parser<'_, '_>) -> Option<String> {
    let bound = p.at(SyntaxKind::COLON)
        && p.is_joint(0)
        && p.nth(1) == SyntaxKind::IDENT
        && p.is_joint(1);
    if !bound {
        return None;
    }

    p.bump(); // :
    let m = p.start();
    let from = p.position();
    expressions::variable(p);
    let path = p.text_since(from);
    m.complete(p, SyntaxKind::BINDING);
    Some(path)
}

/// Parse a parameter list if one starts here.
pub(super) fn param_list_opt(p: &mut Parser<'_, '_>) {
    if resolve::param_start(p, 0) {
        param_list(p);
    }
}

pub(super) fn param_list(p: &mut Parser<'_, '_>) {
    let m = p.start();
    while resolve::param_start(p, 0) {
        param(p);
    }
    m.complete(p, SyntaxKind::PARAM_LIST);
}

/// `name=value`, or `:name=value` when the value is a variable reference.
fn param(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.eat(SyntaxKind::COLON);
    p.bump(); // name
    p.bump(); // =
    if !param_value(p) {
        p.error_here(
            SyntaxErrorKind::MalformedExpression,
            "expected parameter value",
        );
    }
    m.complete(p, SyntaxKind::PARAM);
}

fn param_value(p: &mut Parser<'_, '_>) -> bool {
    match p.current() {
        SyntaxKind::L_CURLY => {
            interpolation(p);
            true
        }
        SyntaxKind::IDENT if p.current_text() == "void" => {
            expressions::literal_remap(p, SyntaxKind::VOID_KW);
            true
        }
        _ => scalar_value(p),
    }
}

/// `{ expression }` embedded in a parameter value.
fn interpolation(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump(); // {
    expressions::expr_with_modifiers(p);
    expect(p, SyntaxKind::R_CURLY, "`}`");
    m.complete(p, SyntaxKind::INTERPOLATION);
}

/// A string, number, boolean or variable. Returns false, consuming nothing,
/// if none starts here.
pub(super) fn scalar_value(p: &mut Parser<'_, '_>) -> bool {
    match p.current() {
        SyntaxKind::STRING | SyntaxKind::NUMBER => {
            expressions::literal(p);
        }
        SyntaxKind::MINUS if expressions::negative_number_ahead(p) => {
            expressions::negative_number(p);
        }
        SyntaxKind::IDENT => match p.current_text() {
            "true" => {
                expressions::literal_remap(p, SyntaxKind::TRUE_KW);
            }
            "false" => {
                expressions::literal_remap(p, SyntaxKind::FALSE_KW);
            }
            _ => {
                expressions::variable(p);
            }
        },
        _ => return false,
    }
    true
}
