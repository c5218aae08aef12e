//! Tag rules, one per shape decided by [`resolve::tag_shape`].

use rowan::{TextRange, TextSize};

use crate::error::SyntaxErrorKind;
use crate::keyword::Keyword;
use crate::parser::{Marker, Parser};
use crate::syntax_kind::SyntaxKind;

use super::resolve::{CloseOutcome, LifecycleTag, OpenTag, TagShape};
use super::{at_tag_end, body, expect, expressions, finish_tag, params, resolve};

/// Parse the tag starting at the current `{{`.
pub(super) fn tag(p: &mut Parser<'_, '_>) {
    let shape = resolve::tag_shape(p);
    log::trace!("tag at {:?}: {shape:?}", p.offset());

    match shape {
        TagShape::Close => close_without_open(p),
        TagShape::FormErrors => paired(p, SyntaxKind::FORM_ERRORS),
        TagShape::Keyword(Keyword::If) => if_statement(p),
        TagShape::Keyword(Keyword::Unless) => unless_statement(p),
        TagShape::Keyword(keyword) => paired(p, loop_kind(keyword)),
        TagShape::StrayBranch => stray_branch(p),
        TagShape::Switch => switch_statement(p),
        TagShape::User => user_tag(p),
        TagShape::Recursive => recursive_tag(p),
        TagShape::Lifecycle(tag) => lifecycle_tag(p, tag),
        TagShape::MultiStatement | TagShape::Directive | TagShape::Expression => {
            antlers_tag(p, shape)
        }
    }
}

fn loop_kind(keyword: Keyword) -> SyntaxKind {
    match keyword {
        Keyword::Collection => SyntaxKind::COLLECTION_LOOP,
        Keyword::Nav => SyntaxKind::NAV_LOOP,
        Keyword::Taxonomy => SyntaxKind::TAXONOMY_LOOP,
        Keyword::Form => SyntaxKind::FORM_LOOP,
        Keyword::Entries => SyntaxKind::ENTRIES_LOOP,
        Keyword::If => SyntaxKind::IF_STATEMENT,
        Keyword::Unless => SyntaxKind::UNLESS_STATEMENT,
    }
}

/// `{{ name[:binding] [params] }}`, with the name stored as a KEYWORD token.
fn tag_head(p: &mut Parser<'_, '_>) -> OpenTag {
    let name = p.current_text().to_string();
    p.bump_remap(SyntaxKind::KEYWORD);
    let binding = params::binding(p);
    params::param_list_opt(p);
    OpenTag::new(name, binding)
}

fn open_tag(p: &mut Parser<'_, '_>) -> OpenTag {
    let m = p.start();
    p.bump(); // {{
    let open = tag_head(p);
    finish_tag(p);
    m.complete(p, SyntaxKind::OPEN_TAG);
    open
}

/// A tag with a body and a matching close: loops, `form:errors` and paired
/// lifecycle tags.
fn paired(p: &mut Parser<'_, '_>, kind: SyntaxKind) {
    let start = p.offset();
    let m = p.start();
    let open = open_tag(p);
    body_of(p, &open);
    close(p, m, kind, &open, start);
}

/// Parse a body with `open` pushed on the open-tag stack.
fn body_of(p: &mut Parser<'_, '_>, open: &OpenTag) {
    p.open_tags.push(open.clone());
    body(p);
    p.open_tags.pop();
}

/// Finish a paired construct whose body has ended.
fn close(p: &mut Parser<'_, '_>, m: Marker, kind: SyntaxKind, open: &OpenTag, start: TextSize) {
    match resolve::close_outcome(p, open) {
        CloseOutcome::Matched => {
            close_tag(p);
            m.complete(p, kind);
        }
        CloseOutcome::Mismatched => {
            m.complete(p, kind);
            let found = resolve::close_display(p);
            error_close(
                p,
                SyntaxErrorKind::MismatchedClose,
                format!("expected `/{}`, found `/{found}`", open.display()),
            );
        }
        CloseOutcome::Unterminated => {
            let node = m.complete(p, kind);
            node.precede(p).complete(p, SyntaxKind::ERROR);
            log::debug!("`{}` is never closed", open.display());
            p.error(
                SyntaxErrorKind::UnterminatedTag,
                format!("`{}` is never closed", open.display()),
                TextRange::new(start, p.prev_end().max(start)),
            );
        }
    }
}

/// `{{ /name[:binding] }}`
fn close_tag(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump(); // {{
    p.bump(); // /
    if p.at(SyntaxKind::IDENT) {
        p.bump_remap(SyntaxKind::KEYWORD);
        params::binding(p);
    }
    finish_tag(p);
    m.complete(p, SyntaxKind::CLOSE_TAG);
}

/// Wrap the close tag at the current position in an ERROR node.
fn error_close(p: &mut Parser<'_, '_>, kind: SyntaxErrorKind, message: String) {
    let start = p.offset();
    let m = p.start();
    close_tag(p);
    m.complete(p, SyntaxKind::ERROR);
    p.error(kind, message, TextRange::new(start, p.prev_end()));
}

fn close_without_open(p: &mut Parser<'_, '_>) {
    if resolve::is_structural_close(p) {
        let found = resolve::close_display(p);
        error_close(
            p,
            SyntaxErrorKind::UnmatchedClose,
            format!("`/{found}` has no matching open tag"),
        );
    } else {
        antlers_tag(p, TagShape::Directive);
    }
}

/// `{{ keyword condition }}`
fn condition_tag(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump(); // {{
    p.bump_remap(SyntaxKind::KEYWORD);
    if at_tag_end(p) {
        p.error_here(SyntaxErrorKind::MalformedExpression, "expected condition");
    } else {
        expressions::expr_with_modifiers(p);
    }
    finish_tag(p);
    m.complete(p, SyntaxKind::OPEN_TAG);
}

fn at_branch(p: &Parser<'_, '_>, name: &str) -> bool {
    p.at(SyntaxKind::L_DCURLY) && p.nth(1) == SyntaxKind::IDENT && p.nth_text(1) == name
}

fn if_statement(p: &mut Parser<'_, '_>) {
    let start = p.offset();
    let m = p.start();
    let mut open = OpenTag::new("if", None);
    open.allows_branches = true;
    p.open_tags.push(open.clone());

    let mut branch = p.start();
    condition_tag(p);
    body(p);

    while at_branch(p, "elseif") {
        branch.complete(p, SyntaxKind::IF_BRANCH);
        branch = p.start();
        condition_tag(p);
        body(p);
    }
    branch.complete(p, SyntaxKind::IF_BRANCH);

    if at_branch(p, "else") {
        if let Some(top) = p.open_tags.last_mut() {
            top.allows_branches = false;
        }
        let branch = p.start();
        let tag = p.start();
        p.bump(); // {{
        p.bump_remap(SyntaxKind::KEYWORD);
        finish_tag(p);
        tag.complete(p, SyntaxKind::OPEN_TAG);
        body(p);
        branch.complete(p, SyntaxKind::ELSE_BRANCH);
    }

    p.open_tags.pop();
    close(p, m, SyntaxKind::IF_STATEMENT, &open, start);
}

fn unless_statement(p: &mut Parser<'_, '_>) {
    let start = p.offset();
    let m = p.start();
    let open = OpenTag::new("unless", None);
    condition_tag(p);
    body_of(p, &open);
    close(p, m, SyntaxKind::UNLESS_STATEMENT, &open, start);
}

/// `elseif` or `else` with no enclosing `if`.
fn stray_branch(p: &mut Parser<'_, '_>) {
    let start = p.offset();
    let name = p.nth_text(1);
    let m = p.start();
    p.bump(); // {{
    p.bump_remap(SyntaxKind::KEYWORD);
    if !at_tag_end(p) && name == "elseif" {
        expressions::expr_with_modifiers(p);
    }
    finish_tag(p);
    m.complete(p, SyntaxKind::ERROR);
    p.error(
        SyntaxErrorKind::UnmatchedClose,
        format!("`{name}` outside of an `if` block"),
        TextRange::new(start, p.prev_end()),
    );
}

/// `{{ switch((cond) => value, ...) }}`
fn switch_statement(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump(); // {{
    p.bump_remap(SyntaxKind::KEYWORD);
    p.bump(); // (
    if !p.at(SyntaxKind::R_PAREN) {
        loop {
            switch_case(p);
            if !p.eat(SyntaxKind::COMMA) {
                break;
            }
        }
    }
    expect(p, SyntaxKind::R_PAREN, "`)`");
    finish_tag(p);
    m.complete(p, SyntaxKind::SWITCH_STATEMENT);
}

fn switch_case(p: &mut Parser<'_, '_>) {
    let m = p.start();
    if expect(p, SyntaxKind::L_PAREN, "`(` before case condition") {
        expressions::expr(p);
        expect(p, SyntaxKind::R_PAREN, "`)`");
    }
    if expect(p, SyntaxKind::FAT_ARROW, "`=>`") && !params::scalar_value(p) {
        p.error_here(SyntaxErrorKind::MalformedExpression, "expected case value");
    }
    m.complete(p, SyntaxKind::SWITCH_CASE);
}

/// `{{ user:can permission="..." }}` and friends.
fn user_tag(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump(); // {{
    p.bump_remap(SyntaxKind::KEYWORD);
    p.bump(); // :
    p.bump_remap(SyntaxKind::KEYWORD);
    if p.at(SyntaxKind::STRING) {
        expressions::literal(p);
    }
    params::param_list_opt(p);
    finish_tag(p);
    m.complete(p, SyntaxKind::USER_TAG);
}

/// `{{ *recursive children[:var]* }}`
fn recursive_tag(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump(); // {{
    p.bump_n(2, SyntaxKind::RECURSIVE_KW);
    if p.at_ident("children") {
        p.bump_remap(SyntaxKind::KEYWORD);
        params::binding(p);
    } else {
        p.error_here(SyntaxErrorKind::MalformedExpression, "expected `children`");
    }
    expect(p, SyntaxKind::STAR, "closing `*`");
    finish_tag(p);
    m.complete(p, SyntaxKind::RECURSIVE_TAG);
}

fn lifecycle_tag(p: &mut Parser<'_, '_>, tag: &LifecycleTag) {
    if tag.paired {
        paired(p, tag.kind);
    } else {
        let m = p.start();
        open_tag_contents(p);
        m.complete(p, tag.kind);
    }
}

/// The tokens of an open tag, without wrapping them in OPEN_TAG.
fn open_tag_contents(p: &mut Parser<'_, '_>) {
    p.bump(); // {{
    tag_head(p);
    finish_tag(p);
}

/// The generic tag: one directive, one expression, or several statements.
fn antlers_tag(p: &mut Parser<'_, '_>, shape: TagShape) {
    let m = p.start();
    p.bump(); // {{

    match shape {
        TagShape::MultiStatement => multi_statement(p),
        TagShape::Directive => directive(p),
        _ => {
            if at_tag_end(p) {
                p.error_here(SyntaxErrorKind::MalformedExpression, "empty tag");
            } else {
                expressions::expr_with_modifiers(p);
            }
        }
    }

    finish_tag(p);
    m.complete(p, SyntaxKind::ANTLERS_TAG);
}

fn multi_statement(p: &mut Parser<'_, '_>) {
    let m = p.start();
    loop {
        statement(p);
        if !p.eat(SyntaxKind::SEMICOLON) || at_tag_end(p) {
            break;
        }
    }
    m.complete(p, SyntaxKind::MULTI_STATEMENT);
}

fn statement(p: &mut Parser<'_, '_>) {
    match resolve::statement_shape(p, 0) {
        TagShape::Directive => directive(p),
        _ => {
            expressions::expr_with_modifiers(p);
        }
    }
}

/// `[/]path [params]`
fn directive(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.eat(SyntaxKind::SLASH);
    if p.at(SyntaxKind::IDENT) {
        expressions::variable(p);
    } else {
        p.error_here(SyntaxErrorKind::MalformedExpression, "expected variable");
    }
    params::param_list_opt(p);
    m.complete(p, SyntaxKind::DIRECTIVE);
}
