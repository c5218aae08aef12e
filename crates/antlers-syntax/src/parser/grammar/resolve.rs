//! Bounded-lookahead decisions.
//!
//! Every question here is answered by peeking at a handful of significant
//! tokens without consuming anything: which shape a tag has, whether a body
//! has reached its end, and how a close tag relates to the tag it might
//! close. Keeping these apart from the rules that consume tokens means the
//! rules never need to backtrack.

use crate::keyword::Keyword;
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Methods that turn `path.method()` into an array method call instead of a
/// longer path.
const ARRAY_METHODS: &[&str] = &[
    "orderby", "groupby", "where", "take", "skip", "merge", "pluck",
];

/// A paired tag whose body is currently being parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenTag {
    pub name: String,
    pub binding: Option<String>,
    /// `elseif` and `else` may end the body
    pub allows_branches: bool,
}

impl OpenTag {
    pub fn new(name: impl Into<String>, binding: Option<String>) -> Self {
        Self {
            name: name.into(),
            binding,
            allows_branches: false,
        }
    }

    /// The name as written in source, e.g. `collection:blog`.
    pub fn display(&self) -> String {
        display(&self.name, self.binding.as_deref())
    }
}

fn display(name: &str, binding: Option<&str>) -> String {
    match binding {
        Some(binding) => format!("{name}:{binding}"),
        None => name.to_string(),
    }
}

/// Whether a lifecycle tag accepts parameters in a given form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Params {
    Forbidden,
    Optional,
    Required,
}

/// A named tag with fixed structure, such as `partial` or `section`.
#[derive(Debug)]
pub(super) struct LifecycleTag {
    pub name: &'static str,
    pub kind: SyntaxKind,
    /// Parameter policy for `name:target`, if that form exists
    pub bound: Option<Params>,
    /// Parameter policy for bare `name`, if that form exists
    pub unbound: Option<Params>,
    /// Has a body and a close tag
    pub paired: bool,
}

const fn tag(
    name: &'static str,
    kind: SyntaxKind,
    bound: Option<Params>,
    unbound: Option<Params>,
    paired: bool,
) -> LifecycleTag {
    LifecycleTag {
        name,
        kind,
        bound,
        unbound,
        paired,
    }
}

use Params::{Forbidden, Optional, Required};

const LIFECYCLE_TAGS: &[LifecycleTag] = &[
    tag("partial", SyntaxKind::PARTIAL_TAG, Some(Optional), Some(Required), false),
    tag("yield", SyntaxKind::YIELD_TAG, Some(Forbidden), Some(Forbidden), false),
    tag("section", SyntaxKind::SECTION_TAG, Some(Forbidden), None, true),
    tag("scope", SyntaxKind::SCOPE_TAG, None, Some(Optional), true),
    tag("asset", SyntaxKind::ASSET_TAG, Some(Optional), Some(Required), false),
    tag("glide", SyntaxKind::GLIDE_TAG, Some(Optional), Some(Required), false),
    tag("dump", SyntaxKind::DUMP_TAG, Some(Forbidden), Some(Forbidden), false),
    tag("cache", SyntaxKind::CACHE_TAG, None, Some(Optional), true),
    tag("no_cache", SyntaxKind::NO_CACHE_TAG, None, Some(Forbidden), true),
    tag("redirect", SyntaxKind::REDIRECT_TAG, None, Some(Required), false),
    tag("session", SyntaxKind::SESSION_TAG, Some(Forbidden), Some(Required), false),
    tag("markdown", SyntaxKind::MARKDOWN_TAG, None, Some(Forbidden), true),
    tag("oauth", SyntaxKind::OAUTH_TAG, Some(Optional), None, false),
    tag("locales", SyntaxKind::LOCALES_TAG, None, Some(Optional), false),
    tag("svg", SyntaxKind::SVG_TAG, None, Some(Required), false),
    tag("template_content", SyntaxKind::TEMPLATE_CONTENT_TAG, None, Some(Forbidden), false),
    tag("slot", SyntaxKind::SLOT_TAG, Some(Forbidden), None, true),
    tag("push", SyntaxKind::PUSH_TAG, Some(Forbidden), None, true),
    tag("prepend", SyntaxKind::PREPEND_TAG, Some(Forbidden), None, true),
    tag("once", SyntaxKind::ONCE_TAG, None, Some(Forbidden), true),
];

fn lifecycle(name: &str) -> Option<&'static LifecycleTag> {
    LIFECYCLE_TAGS.iter().find(|t| t.name == name)
}

/// What follows an opening `{{`.
#[derive(Debug, Clone, Copy)]
pub(super) enum TagShape {
    Close,
    FormErrors,
    Keyword(Keyword),
    StrayBranch,
    Switch,
    User,
    Recursive,
    Lifecycle(&'static LifecycleTag),
    MultiStatement,
    Directive,
    Expression,
}

/// Decide the shape of the tag starting at the current `{{`.
pub(super) fn tag_shape(p: &Parser<'_, '_>) -> TagShape {
    if p.nth(1) == SyntaxKind::SLASH {
        return TagShape::Close;
    }
    if is_form_errors(p, 1) {
        return TagShape::FormErrors;
    }
    if let Some(keyword) = p.keyword_at(1) {
        return TagShape::Keyword(keyword);
    }

    if p.nth(1) == SyntaxKind::IDENT {
        match p.nth_text(1) {
            "elseif" | "else" => return TagShape::StrayBranch,
            "switch" if p.nth(2) == SyntaxKind::L_PAREN => return TagShape::Switch,
            "user" if is_user_tag(p) => return TagShape::User,
            name => {
                if let Some(tag) = lifecycle(name)
                    && lifecycle_shape_fits(p, tag)
                {
                    return TagShape::Lifecycle(tag);
                }
            }
        }
    }

    if p.nth(1) == SyntaxKind::STAR
        && p.nth(2) == SyntaxKind::IDENT
        && p.nth_text(2) == "recursive"
        && p.is_joint(2)
    {
        return TagShape::Recursive;
    }

    if has_top_level_semicolon(p, 1) {
        return TagShape::MultiStatement;
    }

    statement_shape(p, 1)
}

/// Whether the statement at `n` is a directive or an expression.
///
/// A directive is a bare path, optionally followed by parameters, that runs
/// to the end of its statement. Anything else is an expression.
pub(super) fn statement_shape(p: &Parser<'_, '_>, n: usize) -> TagShape {
    match p.nth(n) {
        SyntaxKind::SLASH => TagShape::Directive,
        SyntaxKind::IDENT if !matches!(p.nth_text(n), "true" | "false") => {
            let end = path_end(p, n);
            let ends_statement = matches!(
                p.nth(end),
                SyntaxKind::R_DCURLY
                    | SyntaxKind::L_DCURLY
                    | SyntaxKind::SEMICOLON
                    | SyntaxKind::EOF
            );
            if ends_statement || param_start(p, end) {
                TagShape::Directive
            } else {
                TagShape::Expression
            }
        }
        _ => TagShape::Expression,
    }
}

/// How many tokens the path segment at `n` spans, if there is one.
///
/// Segments are `:name`, `.name` and `[key]`, each directly attached to the
/// token before. `.method(` for an array method ends the path instead.
pub(super) fn path_step(p: &Parser<'_, '_>, n: usize) -> Option<usize> {
    match p.nth(n) {
        SyntaxKind::COLON | SyntaxKind::DOT
            if p.is_joint(n) && p.nth(n + 1) == SyntaxKind::IDENT && p.is_joint(n + 1) =>
        {
            let method = p.nth(n) == SyntaxKind::DOT
                && is_array_method(p.nth_text(n + 1))
                && p.nth(n + 2) == SyntaxKind::L_PAREN;
            (!method).then_some(2)
        }
        SyntaxKind::L_BRACK
            if p.is_joint(n)
                && matches!(
                    p.nth(n + 1),
                    SyntaxKind::IDENT | SyntaxKind::NUMBER | SyntaxKind::STRING
                )
                && p.nth(n + 2) == SyntaxKind::R_BRACK =>
        {
            Some(3)
        }
        _ => None,
    }
}

/// Position just past the path whose first identifier is at `n`.
pub(super) fn path_end(p: &Parser<'_, '_>, n: usize) -> usize {
    let mut end = n + 1;
    while let Some(len) = path_step(p, end) {
        end += len;
    }
    end
}

pub(super) fn is_array_method(name: &str) -> bool {
    ARRAY_METHODS.contains(&name)
}

/// True if a parameter (`name=` or `:name=`) starts at `n`.
pub(super) fn param_start(p: &Parser<'_, '_>, n: usize) -> bool {
    match p.nth(n) {
        SyntaxKind::IDENT => p.nth(n + 1) == SyntaxKind::EQ,
        SyntaxKind::COLON => {
            p.nth(n + 1) == SyntaxKind::IDENT
                && p.is_joint(n + 1)
                && p.nth(n + 2) == SyntaxKind::EQ
        }
        _ => false,
    }
}

/// True if a `;` separates statements before the tag ends.
fn has_top_level_semicolon(p: &Parser<'_, '_>, n: usize) -> bool {
    let mut nesting = 0usize;
    let mut i = n;
    loop {
        match p.nth(i) {
            SyntaxKind::R_DCURLY | SyntaxKind::L_DCURLY | SyntaxKind::EOF => return false,
            SyntaxKind::L_PAREN | SyntaxKind::L_BRACK | SyntaxKind::L_CURLY => nesting += 1,
            SyntaxKind::R_PAREN | SyntaxKind::R_BRACK | SyntaxKind::R_CURLY => {
                nesting = nesting.saturating_sub(1)
            }
            SyntaxKind::SEMICOLON if nesting == 0 => return true,
            _ => {}
        }
        i += 1;
    }
}

fn is_form_errors(p: &Parser<'_, '_>, n: usize) -> bool {
    p.nth(n) == SyntaxKind::IDENT
        && p.nth_text(n) == "form"
        && p.nth(n + 1) == SyntaxKind::COLON
        && p.is_joint(n + 1)
        && p.nth(n + 2) == SyntaxKind::IDENT
        && p.nth_text(n + 2) == "errors"
        && p.is_joint(n + 2)
}

/// `user:can`, `user:is` or `user:in`, followed by a string or parameters.
fn is_user_tag(p: &Parser<'_, '_>) -> bool {
    p.nth(2) == SyntaxKind::COLON
        && p.is_joint(2)
        && p.nth(3) == SyntaxKind::IDENT
        && p.is_joint(3)
        && matches!(p.nth_text(3), "can" | "is" | "in")
        && (p.nth(4) == SyntaxKind::STRING || param_start(p, 4))
}

fn lifecycle_shape_fits(p: &Parser<'_, '_>, tag: &LifecycleTag) -> bool {
    let bound = p.nth(2) == SyntaxKind::COLON
        && p.is_joint(2)
        && p.nth(3) == SyntaxKind::IDENT
        && p.is_joint(3);

    if bound {
        tag.bound
            .is_some_and(|policy| params_fit(p, path_end(p, 3), policy))
    } else {
        tag.unbound.is_some_and(|policy| params_fit(p, 2, policy))
    }
}

fn params_fit(p: &Parser<'_, '_>, n: usize, policy: Params) -> bool {
    let ends = matches!(
        p.nth(n),
        SyntaxKind::R_DCURLY | SyntaxKind::L_DCURLY | SyntaxKind::EOF
    );
    match policy {
        Params::Forbidden => ends,
        Params::Optional => ends || param_start(p, n),
        Params::Required => param_start(p, n),
    }
}

/// Why a body stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Boundary {
    /// A close tag naming one of the open tags
    Close,
    /// `elseif` or `else` of the innermost `if`
    Branch,
}

/// Whether the current position ends the body being parsed.
pub(super) fn body_boundary(p: &Parser<'_, '_>) -> Option<Boundary> {
    if p.current() != SyntaxKind::L_DCURLY {
        return None;
    }

    if p.nth(1) == SyntaxKind::SLASH {
        return (!p.open_tags.is_empty() && is_structural_close(p)).then_some(Boundary::Close);
    }

    let branch = p.nth(1) == SyntaxKind::IDENT && matches!(p.nth_text(1), "elseif" | "else");
    (branch && p.open_tags.last().is_some_and(|open| open.allows_branches))
        .then_some(Boundary::Branch)
}

/// Name and binding of the close tag at the current `{{ /`.
pub(super) fn close_signature(p: &Parser<'_, '_>) -> (String, Option<String>) {
    if p.nth(2) != SyntaxKind::IDENT {
        return (String::new(), None);
    }
    let name = p.nth_text(2).to_string();
    let bound = p.nth(3) == SyntaxKind::COLON
        && p.is_joint(3)
        && p.nth(4) == SyntaxKind::IDENT
        && p.is_joint(4);
    let binding = bound.then(|| (4..path_end(p, 4)).map(|i| p.nth_text(i)).collect());
    (name, binding)
}

/// The close tag at the current `{{ /` as written, e.g. `collection:blog`.
pub(super) fn close_display(p: &Parser<'_, '_>) -> String {
    let (name, binding) = close_signature(p);
    display(&name, binding.as_deref())
}

/// True if the close tag at the current `{{ /` names a paired construct,
/// rather than being an ordinary `/path` directive.
///
/// A bare `/collection` only counts while an unbound `collection` is open,
/// since outside one it reads the same as closing a variable.
pub(super) fn is_structural_close(p: &Parser<'_, '_>) -> bool {
    if is_form_errors(p, 2) || p.keyword_at(2).is_some() {
        return true;
    }
    if p.nth(2) != SyntaxKind::IDENT {
        return false;
    }
    match p.nth_text(2) {
        "if" | "unless" => true,
        name if p.open_tags.iter().any(|open| open.name == name) => true,
        name => lifecycle(name).is_some_and(|tag| tag.paired),
    }
}

/// What to do with the token that ended a paired tag's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CloseOutcome {
    /// The close tag belongs to this tag
    Matched,
    /// A structural close naming a different keyword or binding, and no
    /// outer tag claims it
    Mismatched,
    /// End of input, or the close tag belongs to an outer tag
    Unterminated,
}

/// Relate the current position to `open`, whose entry has already been
/// popped from the open-tag stack.
pub(super) fn close_outcome(p: &Parser<'_, '_>, open: &OpenTag) -> CloseOutcome {
    if p.current() != SyntaxKind::L_DCURLY || p.nth(1) != SyntaxKind::SLASH {
        return CloseOutcome::Unterminated;
    }

    let (name, binding) = close_signature(p);
    if name == open.name && binding == open.binding {
        return CloseOutcome::Matched;
    }

    // A different keyword is left to any outer tag of that name; the same
    // keyword only to an outer tag with that exact binding.
    let claimed_by_outer = p.open_tags.iter().any(|outer| {
        outer.name == name && (name != open.name || outer.binding == binding)
    });
    if claimed_by_outer || (name != open.name && !is_structural_close(p)) {
        CloseOutcome::Unterminated
    } else {
        CloseOutcome::Mismatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::ParseOptions;
    use rstest::rstest;

    fn shape(input: &str) -> TagShape {
        let tokens = lex(input);
        let options = ParseOptions::default();
        let parser = Parser::new(&tokens, &options);
        tag_shape(&parser)
    }

    #[rstest]
    #[case("{{ title }}", "Directive")]
    #[case("{{ /title }}", "Close")]
    #[case("{{ entry:title limit=\"2\" }}", "Directive")]
    #[case("{{ a + b }}", "Expression")]
    #[case("{{ title | upper }}", "Expression")]
    #[case("{{ true }}", "Expression")]
    #[case("{{ items.where() }}", "Expression")]
    #[case("{{ a = 1; b = 2 }}", "MultiStatement")]
    #[case("{{ f(a; b) }}", "Expression")]
    #[case("{{ form:errors }}", "FormErrors")]
    #[case("{{ if x }}", "Keyword(If)")]
    #[case("{{ collection:blog }}", "Keyword(Collection)")]
    #[case("{{ collection from=\"blog\" }}", "Keyword(Collection)")]
    #[case("{{ collection }}", "Directive")]
    #[case("{{ else }}", "StrayBranch")]
    #[case("{{ switch(x) }}", "Switch")]
    #[case("{{ user:can do=\"edit\" }}", "User")]
    #[case("{{ user:name }}", "Directive")]
    #[case("{{ *recursive children* }}", "Recursive")]
    fn tag_shapes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format!("{:?}", shape(input)), expected);
    }

    #[rstest]
    #[case("{{ partial:cards }}", true)]
    #[case("{{ partial src=\"cards\" }}", true)]
    #[case("{{ partial }}", false)]
    #[case("{{ yield:scripts }}", true)]
    #[case("{{ yield:scripts x=\"1\" }}", false)]
    #[case("{{ section:scripts }}", true)]
    #[case("{{ section }}", false)]
    #[case("{{ scope:foo }}", false)]
    #[case("{{ no_cache }}", true)]
    #[case("{{ svg src=\"logo\" }}", true)]
    #[case("{{ svg }}", false)]
    fn lifecycle_shapes(#[case] input: &str, #[case] lifecycle: bool) {
        assert_eq!(matches!(shape(input), TagShape::Lifecycle(_)), lifecycle);
    }

    #[test]
    fn path_end_stops_before_array_method() {
        let tokens = lex("{{ a.b:c[0].where() }}");
        let options = ParseOptions::default();
        let parser = Parser::new(&tokens, &options);
        // a . b : c [ 0 ] then .where(
        assert_eq!(path_end(&parser, 1), 9);
        assert_eq!(parser.nth(9), SyntaxKind::DOT);
    }

    #[test]
    fn close_signature_reads_binding() {
        let tokens = lex("{{ /collection:blog.posts }}");
        let options = ParseOptions::default();
        let parser = Parser::new(&tokens, &options);
        assert_eq!(
            close_signature(&parser),
            ("collection".to_string(), Some("blog.posts".to_string()))
        );
        assert!(is_structural_close(&parser));
    }

    #[test]
    fn generic_close_is_not_structural() {
        let tokens = lex("{{ /title }}");
        let options = ParseOptions::default();
        let parser = Parser::new(&tokens, &options);
        assert!(!is_structural_close(&parser));
    }
}
