//! Typed views over the syntax tree.
//!
//! Each type wraps a [`SyntaxNode`] of one kind and exposes its parts by
//! name, so callers can ask an `if` for its branches instead of walking
//! children by kind. The views only read the tree. Accessors return `None`
//! where error recovery left a part out.
//!
//! ```
//! use antlers_syntax::parse;
//!
//! let parse = parse("{{ collection:blog limit=\"3\" }}{{ title }}{{ /collection:blog }}").unwrap();
//! let tag = parse.document().tags().next().unwrap();
//! assert_eq!(tag.keyword().as_deref(), Some("collection"));
//! assert_eq!(tag.binding().unwrap().path(), "blog");
//! assert_eq!(tag.params().count(), 1);
//! ```

use crate::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};

/// A typed wrapper over a node of a known kind.
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                Self::can_cast(node.kind()).then(|| Self(node))
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

fn child<N: AstNode>(parent: &SyntaxNode) -> Option<N> {
    parent.children().find_map(N::cast)
}

fn children<N: AstNode>(parent: &SyntaxNode) -> impl Iterator<Item = N> + use<N> {
    parent.children().filter_map(N::cast)
}

fn token(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

ast_node!(
    /// The whole template.
    Document,
    ROOT
);
ast_node!(TextSpan, TEXT_SPAN);
ast_node!(Comment, ANTLERS_COMMENT);
ast_node!(RawBlock, RAW_BLOCK);
ast_node!(EchoBlock, ECHO_BLOCK);
ast_node!(Body, BODY);
ast_node!(CloseTag, CLOSE_TAG);
ast_node!(IfStatement, IF_STATEMENT);
ast_node!(IfBranch, IF_BRANCH);
ast_node!(ElseBranch, ELSE_BRANCH);
ast_node!(AntlersTag, ANTLERS_TAG);
ast_node!(Directive, DIRECTIVE);
ast_node!(SwitchStatement, SWITCH_STATEMENT);
ast_node!(SwitchCase, SWITCH_CASE);
ast_node!(Literal, LITERAL);
ast_node!(
    /// A lookup path such as `entry:author.name` or `items[0]`.
    Variable,
    VARIABLE
);
ast_node!(ArrayMethodCall, ARRAY_METHOD_CALL);
ast_node!(BinaryExpr, BINARY_EXPR);
ast_node!(UnaryExpr, UNARY_EXPR);
ast_node!(TernaryExpr, TERNARY_EXPR);
ast_node!(ParenExpr, PAREN_EXPR);
ast_node!(ModifiedExpr, MODIFIED_EXPR);
ast_node!(Modifier, MODIFIER);
ast_node!(Param, PARAM);
ast_node!(Interpolation, INTERPOLATION);

impl Document {
    pub(crate) fn from_root(root: SyntaxNode) -> Self {
        Self(root)
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + use<> {
        children(&self.0)
    }

    /// Top-level tags, skipping text, comments and errors.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + use<> {
        children(&self.0)
    }
}

/// A top-level node of a document or a body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Text(TextSpan),
    Comment(Comment),
    Raw(RawBlock),
    Echo(EchoBlock),
    Tag(Tag),
    /// A span the parser could not make sense of
    Error(SyntaxNode),
}

impl AstNode for Node {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::TEXT_SPAN
                | SyntaxKind::ANTLERS_COMMENT
                | SyntaxKind::RAW_BLOCK
                | SyntaxKind::ECHO_BLOCK
                | SyntaxKind::ERROR
        ) || Tag::can_cast(kind)
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        let node = match node.kind() {
            SyntaxKind::TEXT_SPAN => Node::Text(TextSpan(node)),
            SyntaxKind::ANTLERS_COMMENT => Node::Comment(Comment(node)),
            SyntaxKind::RAW_BLOCK => Node::Raw(RawBlock(node)),
            SyntaxKind::ECHO_BLOCK => Node::Echo(EchoBlock(node)),
            SyntaxKind::ERROR => Node::Error(node),
            _ => Node::Tag(Tag::cast(node)?),
        };
        Some(node)
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Node::Text(it) => it.syntax(),
            Node::Comment(it) => it.syntax(),
            Node::Raw(it) => it.syntax(),
            Node::Echo(it) => it.syntax(),
            Node::Tag(it) => it.syntax(),
            Node::Error(it) => it,
        }
    }
}

impl TextSpan {
    pub fn text(&self) -> String {
        self.0.text().to_string()
    }
}

impl Comment {
    /// The comment between its delimiters.
    pub fn content(&self) -> String {
        let text = self.0.text().to_string();
        let inner = text
            .strip_prefix("{{!--")
            .and_then(|t| t.strip_suffix("--}}"))
            .or_else(|| text.strip_prefix("{{#").and_then(|t| t.strip_suffix("#}}")))
            .unwrap_or(&text);
        inner.to_string()
    }
}

impl RawBlock {
    /// The code between `{{?` and `?}}`, verbatim.
    pub fn code(&self) -> String {
        strip_delimiters(&self.0, "{{?", "?}}")
    }
}

impl EchoBlock {
    /// The code between `{{$` and `$}}`, verbatim.
    pub fn code(&self) -> String {
        strip_delimiters(&self.0, "{{$", "$}}")
    }
}

fn strip_delimiters(node: &SyntaxNode, open: &str, close: &str) -> String {
    let text = node.text().to_string();
    text.strip_prefix(open)
        .and_then(|t| t.strip_suffix(close))
        .unwrap_or(&text)
        .to_string()
}

/// Which construct a [`Tag`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Antlers,
    If,
    Unless,
    Switch,
    Recursive,
    User,
    Collection,
    Nav,
    Taxonomy,
    Form,
    FormErrors,
    Entries,
    Partial,
    Yield,
    Section,
    Scope,
    Asset,
    Glide,
    Dump,
    Cache,
    NoCache,
    Redirect,
    Session,
    Markdown,
    Oauth,
    Locales,
    Svg,
    TemplateContent,
    Slot,
    Push,
    Prepend,
    Once,
}

impl TagKind {
    fn from_syntax(kind: SyntaxKind) -> Option<TagKind> {
        let tag = match kind {
            SyntaxKind::ANTLERS_TAG => TagKind::Antlers,
            SyntaxKind::IF_STATEMENT => TagKind::If,
            SyntaxKind::UNLESS_STATEMENT => TagKind::Unless,
            SyntaxKind::SWITCH_STATEMENT => TagKind::Switch,
            SyntaxKind::RECURSIVE_TAG => TagKind::Recursive,
            SyntaxKind::USER_TAG => TagKind::User,
            SyntaxKind::COLLECTION_LOOP => TagKind::Collection,
            SyntaxKind::NAV_LOOP => TagKind::Nav,
            SyntaxKind::TAXONOMY_LOOP => TagKind::Taxonomy,
            SyntaxKind::FORM_LOOP => TagKind::Form,
            SyntaxKind::FORM_ERRORS => TagKind::FormErrors,
            SyntaxKind::ENTRIES_LOOP => TagKind::Entries,
            SyntaxKind::PARTIAL_TAG => TagKind::Partial,
            SyntaxKind::YIELD_TAG => TagKind::Yield,
            SyntaxKind::SECTION_TAG => TagKind::Section,
            SyntaxKind::SCOPE_TAG => TagKind::Scope,
            SyntaxKind::ASSET_TAG => TagKind::Asset,
            SyntaxKind::GLIDE_TAG => TagKind::Glide,
            SyntaxKind::DUMP_TAG => TagKind::Dump,
            SyntaxKind::CACHE_TAG => TagKind::Cache,
            SyntaxKind::NO_CACHE_TAG => TagKind::NoCache,
            SyntaxKind::REDIRECT_TAG => TagKind::Redirect,
            SyntaxKind::SESSION_TAG => TagKind::Session,
            SyntaxKind::MARKDOWN_TAG => TagKind::Markdown,
            SyntaxKind::OAUTH_TAG => TagKind::Oauth,
            SyntaxKind::LOCALES_TAG => TagKind::Locales,
            SyntaxKind::SVG_TAG => TagKind::Svg,
            SyntaxKind::TEMPLATE_CONTENT_TAG => TagKind::TemplateContent,
            SyntaxKind::SLOT_TAG => TagKind::Slot,
            SyntaxKind::PUSH_TAG => TagKind::Push,
            SyntaxKind::PREPEND_TAG => TagKind::Prepend,
            SyntaxKind::ONCE_TAG => TagKind::Once,
            _ => return None,
        };
        Some(tag)
    }
}

/// Any `{{ ... }}` construct: the generic tag or one of the specialized
/// forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(SyntaxNode);

impl AstNode for Tag {
    fn can_cast(kind: SyntaxKind) -> bool {
        TagKind::from_syntax(kind).is_some()
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        Self::can_cast(node.kind()).then(|| Self(node))
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.0
    }
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        // cast only admits tag kinds
        TagKind::from_syntax(self.0.kind()).unwrap_or(TagKind::Antlers)
    }

    /// The node holding the opening tag's name, binding and parameters.
    fn head(&self) -> SyntaxNode {
        let open = match self.0.kind() {
            SyntaxKind::IF_STATEMENT => self
                .0
                .children()
                .find(|n| n.kind() == SyntaxKind::IF_BRANCH)
                .and_then(|branch| {
                    branch
                        .children()
                        .find(|n| n.kind() == SyntaxKind::OPEN_TAG)
                }),
            _ => self
                .0
                .children()
                .find(|n| n.kind() == SyntaxKind::OPEN_TAG),
        };
        open.unwrap_or_else(|| self.0.clone())
    }

    /// The tag name as written, e.g. `collection` or `partial`.
    pub fn keyword(&self) -> Option<String> {
        token(&self.head(), SyntaxKind::KEYWORD).map(|t| t.text().to_string())
    }

    /// The bound variable after the name, as in `collection:blog`.
    pub fn binding(&self) -> Option<Variable> {
        self.head()
            .children()
            .find(|n| n.kind() == SyntaxKind::BINDING)
            .and_then(|b| child(&b))
    }

    pub fn params(&self) -> impl Iterator<Item = Param> + use<> {
        self.head()
            .children()
            .find(|n| n.kind() == SyntaxKind::PARAM_LIST)
            .into_iter()
            .flat_map(|list| children(&list))
    }

    /// The body of a paired tag that has no branches.
    pub fn body(&self) -> Option<Body> {
        child(&self.0)
    }

    pub fn close(&self) -> Option<CloseTag> {
        child(&self.0)
    }

    /// The condition of an `unless`.
    pub fn condition(&self) -> Option<Expr> {
        match self.kind() {
            TagKind::Unless => child(&self.head()),
            _ => None,
        }
    }

    pub fn as_if(&self) -> Option<IfStatement> {
        IfStatement::cast(self.0.clone())
    }

    pub fn as_antlers(&self) -> Option<AntlersTag> {
        AntlersTag::cast(self.0.clone())
    }

    pub fn as_switch(&self) -> Option<SwitchStatement> {
        SwitchStatement::cast(self.0.clone())
    }
}

impl Body {
    pub fn nodes(&self) -> impl Iterator<Item = Node> + use<> {
        children(&self.0)
    }
}

impl CloseTag {
    pub fn keyword(&self) -> Option<String> {
        token(&self.0, SyntaxKind::KEYWORD).map(|t| t.text().to_string())
    }

    pub fn binding(&self) -> Option<Variable> {
        self.0
            .children()
            .find(|n| n.kind() == SyntaxKind::BINDING)
            .and_then(|b| child(&b))
    }
}

impl IfStatement {
    /// The `if` branch followed by every `elseif`.
    pub fn branches(&self) -> impl Iterator<Item = IfBranch> + use<> {
        children(&self.0)
    }

    pub fn else_branch(&self) -> Option<ElseBranch> {
        child(&self.0)
    }

    pub fn close(&self) -> Option<CloseTag> {
        child(&self.0)
    }
}

impl IfBranch {
    pub fn condition(&self) -> Option<Expr> {
        self.0
            .children()
            .find(|n| n.kind() == SyntaxKind::OPEN_TAG)
            .and_then(|open| child(&open))
    }

    pub fn body(&self) -> Option<Body> {
        child(&self.0)
    }
}

impl ElseBranch {
    pub fn body(&self) -> Option<Body> {
        child(&self.0)
    }
}

/// One statement of a generic tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    Directive(Directive),
    Expr(Expr),
}

impl AntlersTag {
    pub fn directive(&self) -> Option<Directive> {
        child(&self.0)
    }

    pub fn expression(&self) -> Option<Expr> {
        child(&self.0)
    }

    /// Every `;`-separated statement; a single statement for ordinary tags.
    pub fn statements(&self) -> Vec<Statement> {
        let parent = self
            .0
            .children()
            .find(|n| n.kind() == SyntaxKind::MULTI_STATEMENT)
            .unwrap_or_else(|| self.0.clone());

        parent
            .children()
            .filter_map(|node| match Directive::cast(node.clone()) {
                Some(directive) => Some(Statement::Directive(directive)),
                None => Expr::cast(node).map(Statement::Expr),
            })
            .collect()
    }
}

impl Directive {
    /// True for `{{ /name }}`.
    pub fn is_close(&self) -> bool {
        token(&self.0, SyntaxKind::SLASH).is_some()
    }

    pub fn variable(&self) -> Option<Variable> {
        child(&self.0)
    }

    pub fn params(&self) -> impl Iterator<Item = Param> + use<> {
        self.0
            .children()
            .find(|n| n.kind() == SyntaxKind::PARAM_LIST)
            .into_iter()
            .flat_map(|list| children(&list))
    }
}

impl SwitchStatement {
    pub fn cases(&self) -> impl Iterator<Item = SwitchCase> + use<> {
        children(&self.0)
    }
}

impl SwitchCase {
    pub fn condition(&self) -> Option<Expr> {
        self.0.children().filter_map(Expr::cast).next()
    }

    pub fn value(&self) -> Option<Expr> {
        self.0.children().filter_map(Expr::cast).nth(1)
    }
}

/// Any expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal(Literal),
    Variable(Variable),
    ArrayMethodCall(ArrayMethodCall),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Ternary(TernaryExpr),
    Paren(ParenExpr),
    Modified(ModifiedExpr),
}

impl AstNode for Expr {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::LITERAL
                | SyntaxKind::VARIABLE
                | SyntaxKind::ARRAY_METHOD_CALL
                | SyntaxKind::BINARY_EXPR
                | SyntaxKind::UNARY_EXPR
                | SyntaxKind::TERNARY_EXPR
                | SyntaxKind::PAREN_EXPR
                | SyntaxKind::MODIFIED_EXPR
        )
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        let expr = match node.kind() {
            SyntaxKind::LITERAL => Expr::Literal(Literal(node)),
            SyntaxKind::VARIABLE => Expr::Variable(Variable(node)),
            SyntaxKind::ARRAY_METHOD_CALL => Expr::ArrayMethodCall(ArrayMethodCall(node)),
            SyntaxKind::BINARY_EXPR => Expr::Binary(BinaryExpr(node)),
            SyntaxKind::UNARY_EXPR => Expr::Unary(UnaryExpr(node)),
            SyntaxKind::TERNARY_EXPR => Expr::Ternary(TernaryExpr(node)),
            SyntaxKind::PAREN_EXPR => Expr::Paren(ParenExpr(node)),
            SyntaxKind::MODIFIED_EXPR => Expr::Modified(ModifiedExpr(node)),
            _ => return None,
        };
        Some(expr)
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Literal(it) => it.syntax(),
            Expr::Variable(it) => it.syntax(),
            Expr::ArrayMethodCall(it) => it.syntax(),
            Expr::Binary(it) => it.syntax(),
            Expr::Unary(it) => it.syntax(),
            Expr::Ternary(it) => it.syntax(),
            Expr::Paren(it) => it.syntax(),
            Expr::Modified(it) => it.syntax(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    /// `?=`: assign if the right side is truthy
    ConditionalAssign,
    Coalesce,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Xor,
    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinaryOp {
    fn from_token(kind: SyntaxKind) -> Option<BinaryOp> {
        let op = match kind {
            SyntaxKind::EQ => BinaryOp::Assign,
            SyntaxKind::PLUS_EQ => BinaryOp::AddAssign,
            SyntaxKind::MINUS_EQ => BinaryOp::SubAssign,
            SyntaxKind::STAR_EQ => BinaryOp::MulAssign,
            SyntaxKind::SLASH_EQ => BinaryOp::DivAssign,
            SyntaxKind::PERCENT_EQ => BinaryOp::RemAssign,
            SyntaxKind::QUESTION_EQ => BinaryOp::ConditionalAssign,
            SyntaxKind::QUESTION2 => BinaryOp::Coalesce,
            SyntaxKind::BWA_KW => BinaryOp::BitAnd,
            SyntaxKind::BWO_KW => BinaryOp::BitOr,
            SyntaxKind::BXOR_KW => BinaryOp::BitXor,
            SyntaxKind::AMP2 | SyntaxKind::AND_KW => BinaryOp::And,
            SyntaxKind::PIPE2 | SyntaxKind::OR_KW => BinaryOp::Or,
            SyntaxKind::XOR_KW => BinaryOp::Xor,
            SyntaxKind::EQ2 => BinaryOp::Eq,
            SyntaxKind::NEQ | SyntaxKind::LT_GT => BinaryOp::NotEq,
            SyntaxKind::EQ3 => BinaryOp::Identical,
            SyntaxKind::NEQ2 => BinaryOp::NotIdentical,
            SyntaxKind::LT => BinaryOp::Lt,
            SyntaxKind::GT => BinaryOp::Gt,
            SyntaxKind::LT_EQ => BinaryOp::LtEq,
            SyntaxKind::GT_EQ => BinaryOp::GtEq,
            SyntaxKind::PLUS => BinaryOp::Add,
            SyntaxKind::MINUS => BinaryOp::Sub,
            SyntaxKind::STAR => BinaryOp::Mul,
            SyntaxKind::SLASH => BinaryOp::Div,
            SyntaxKind::PERCENT => BinaryOp::Rem,
            SyntaxKind::STAR2 => BinaryOp::Pow,
            _ => return None,
        };
        Some(op)
    }
}

impl BinaryExpr {
    pub fn lhs(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn rhs(&self) -> Option<Expr> {
        self.0.children().filter_map(Expr::cast).nth(1)
    }

    pub fn op_token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| !t.kind().is_trivia())
    }

    pub fn op(&self) -> Option<BinaryOp> {
        self.op_token().and_then(|t| BinaryOp::from_token(t.kind()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

impl UnaryExpr {
    pub fn op(&self) -> Option<UnaryOp> {
        match self.0.first_token()?.kind() {
            SyntaxKind::BANG => Some(UnaryOp::Not),
            SyntaxKind::MINUS => Some(UnaryOp::Neg),
            SyntaxKind::PLUS => Some(UnaryOp::Plus),
            _ => None,
        }
    }

    pub fn operand(&self) -> Option<Expr> {
        child(&self.0)
    }
}

impl TernaryExpr {
    pub fn condition(&self) -> Option<Expr> {
        self.0.children().filter_map(Expr::cast).next()
    }

    pub fn then_branch(&self) -> Option<Expr> {
        self.0.children().filter_map(Expr::cast).nth(1)
    }

    pub fn else_branch(&self) -> Option<Expr> {
        self.0.children().filter_map(Expr::cast).nth(2)
    }
}

impl ParenExpr {
    pub fn inner(&self) -> Option<Expr> {
        child(&self.0)
    }
}

impl ModifiedExpr {
    pub fn base(&self) -> Option<Expr> {
        child(&self.0)
    }

    /// Modifiers in application order.
    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + use<> {
        children(&self.0)
    }
}

impl ArrayMethodCall {
    pub fn receiver(&self) -> Option<Variable> {
        child(&self.0)
    }

    pub fn method(&self) -> Option<String> {
        token(&self.0, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }
}

/// An argument passed to a modifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModifierArg {
    Literal(Literal),
    Variable(Variable),
}

impl Modifier {
    pub fn name(&self) -> Option<String> {
        token(&self.0, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }

    pub fn args(&self) -> Vec<ModifierArg> {
        let Some(args) = self
            .0
            .children()
            .find(|n| n.kind() == SyntaxKind::MODIFIER_ARGS)
        else {
            return Vec::new();
        };
        args.children()
            .filter_map(|node| match node.kind() {
                SyntaxKind::LITERAL => Some(ModifierArg::Literal(Literal(node))),
                SyntaxKind::VARIABLE => Some(ModifierArg::Variable(Variable(node))),
                _ => None,
            })
            .collect()
    }
}

/// The value of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamValue {
    Literal(Literal),
    Variable(Variable),
    Interpolation(Interpolation),
}

impl Param {
    pub fn name(&self) -> Option<String> {
        token(&self.0, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }

    /// True for `:name=value`, where the value names a variable.
    pub fn is_variable(&self) -> bool {
        self.0
            .first_token()
            .is_some_and(|t| t.kind() == SyntaxKind::COLON)
    }

    pub fn value(&self) -> Option<ParamValue> {
        self.0.children().find_map(|node| match node.kind() {
            SyntaxKind::LITERAL => Some(ParamValue::Literal(Literal(node))),
            SyntaxKind::VARIABLE => Some(ParamValue::Variable(Variable(node))),
            SyntaxKind::INTERPOLATION => Some(ParamValue::Interpolation(Interpolation(node))),
            _ => None,
        })
    }
}

impl Interpolation {
    pub fn expr(&self) -> Option<Expr> {
        child(&self.0)
    }
}

/// Separator written before a path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    Colon,
    Dot,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A name, with the separator written before it (`None` for the first)
    Name {
        separator: Option<Separator>,
        name: String,
    },
    /// `[key]`, holding the key as written
    Index(String),
}

impl Variable {
    /// The first name in the path.
    pub fn name(&self) -> Option<String> {
        token(&self.0, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }

    /// The path as written.
    pub fn path(&self) -> String {
        self.0.text().to_string()
    }

    pub fn segments(&self) -> Vec<PathSegment> {
        let mut segments = Vec::new();
        let mut separator = None;
        for element in self.0.children_with_tokens() {
            match element.kind() {
                SyntaxKind::COLON => separator = Some(Separator::Colon),
                SyntaxKind::DOT => separator = Some(Separator::Dot),
                SyntaxKind::IDENT => {
                    if let Some(token) = element.as_token() {
                        segments.push(PathSegment::Name {
                            separator: separator.take(),
                            name: token.text().to_string(),
                        });
                    }
                }
                SyntaxKind::INDEX => {
                    if let Some(node) = element.as_node() {
                        let key = node
                            .children_with_tokens()
                            .filter_map(|e| e.into_token())
                            .find(|t| {
                                matches!(
                                    t.kind(),
                                    SyntaxKind::IDENT | SyntaxKind::NUMBER | SyntaxKind::STRING
                                )
                            })
                            .map(|t| t.text().to_string())
                            .unwrap_or_default();
                        segments.push(PathSegment::Index(key));
                    }
                }
                _ => {}
            }
        }
        segments
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Integer,
    Float,
    Hex,
    Octal,
    Scientific,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    /// A string with its escapes resolved
    String(String),
    /// A number as written, including any sign and `_` separators
    Number { kind: NumberKind, text: String },
    Bool(bool),
    Void,
}

impl Literal {
    pub fn token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| !t.kind().is_trivia())
    }

    pub fn value(&self) -> Option<LiteralValue> {
        let token = self.token()?;
        let value = match token.kind() {
            SyntaxKind::STRING => LiteralValue::String(unescape(token.text())),
            SyntaxKind::NUMBER => LiteralValue::Number {
                kind: number_kind(token.text()),
                text: token.text().to_string(),
            },
            SyntaxKind::TRUE_KW => LiteralValue::Bool(true),
            SyntaxKind::FALSE_KW => LiteralValue::Bool(false),
            SyntaxKind::VOID_KW => LiteralValue::Void,
            _ => return None,
        };
        Some(value)
    }
}

fn number_kind(text: &str) -> NumberKind {
    let digits = text.trim_start_matches('-');
    if digits.starts_with("0x") || digits.starts_with("0X") {
        NumberKind::Hex
    } else if digits.contains(['e', 'E']) {
        NumberKind::Scientific
    } else if digits.contains('.') {
        NumberKind::Float
    } else if digits.len() > 1 && digits.starts_with('0') {
        NumberKind::Octal
    } else {
        NumberKind::Integer
    }
}

/// Resolve the escapes of a quoted string literal and drop the quotes.
fn unescape(quoted: &str) -> String {
    let inner = quoted
        .get(1..quoted.len().saturating_sub(1))
        .unwrap_or_default();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'u' | 'x' => {
                let width = if escaped == 'u' { 4 } else { 2 };
                let hex: String = chars.clone().take(width).collect();
                let well_formed =
                    hex.len() == width && hex.chars().all(|c| c.is_ascii_hexdigit());
                match well_formed
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                {
                    Some(decoded) => {
                        out.push(decoded);
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    None => out.push(escaped),
                }
            }
            '0'..='7' => {
                let mut value = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(value));
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn document(input: &str) -> Document {
        let parse = parse(input).unwrap();
        assert!(parse.ok(), "{:?}", parse.errors());
        parse.document()
    }

    fn only_tag(input: &str) -> Tag {
        document(input).tags().next().unwrap()
    }

    fn only_expr(input: &str) -> Expr {
        only_tag(input).as_antlers().unwrap().expression().unwrap()
    }

    #[rstest]
    #[case(r#""plain""#, "plain")]
    #[case(r#"'it\'s'"#, "it's")]
    #[case(r#""a\nb\tc""#, "a\nb\tc")]
    #[case(r#""A\x42""#, "AB")]
    #[case(r#""\101\0""#, "A\0")]
    #[case(r#""\q\\""#, "q\\")]
    #[case(r#""\uZZ""#, "uZZ")]
    #[case(r#""\u0041""#, "A")]
    #[case(r#""\u+041""#, "u+041")]
    #[case(r#""\x+4""#, "x+4")]
    fn unescapes_strings(#[case] quoted: &str, #[case] expected: &str) {
        assert_eq!(unescape(quoted), expected);
    }

    #[rstest]
    #[case("42", NumberKind::Integer)]
    #[case("-42", NumberKind::Integer)]
    #[case("1_000.5", NumberKind::Float)]
    #[case("0x1F", NumberKind::Hex)]
    #[case("0755", NumberKind::Octal)]
    #[case("1.5e3", NumberKind::Scientific)]
    #[case("0", NumberKind::Integer)]
    fn classifies_numbers(#[case] text: &str, #[case] kind: NumberKind) {
        assert_eq!(number_kind(text), kind);
    }

    #[test]
    fn document_nodes() {
        let doc = document("a{{# c #}}{{ b }}");
        let nodes: Vec<_> = doc.nodes().collect();
        assert_eq!(nodes.len(), 3);
        assert!(matches!(&nodes[0], Node::Text(t) if t.text() == "a"));
        assert!(matches!(&nodes[1], Node::Comment(c) if c.content() == " c "));
        assert!(matches!(&nodes[2], Node::Tag(t) if t.kind() == TagKind::Antlers));
    }

    #[test]
    fn collection_loop_parts() {
        let tag = only_tag("{{ collection:blog limit=\"3\" }}{{ title }}{{ /collection:blog }}");
        assert_eq!(tag.kind(), TagKind::Collection);
        assert_eq!(tag.keyword().as_deref(), Some("collection"));
        assert_eq!(tag.binding().unwrap().path(), "blog");

        let params: Vec<_> = tag.params().collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name().as_deref(), Some("limit"));
        assert!(!params[0].is_variable());
        let Some(ParamValue::Literal(value)) = params[0].value() else {
            panic!("expected literal");
        };
        assert_eq!(value.value(), Some(LiteralValue::String("3".to_string())));

        let body: Vec<_> = tag.body().unwrap().nodes().collect();
        assert_eq!(body.len(), 1);

        let close = tag.close().unwrap();
        assert_eq!(close.keyword().as_deref(), Some("collection"));
        assert_eq!(close.binding().unwrap().path(), "blog");
    }

    #[test]
    fn unbound_collection_loop() {
        let tag = only_tag("{{ collection from=\"blog\" }}{{ title }}{{ /collection }}");
        assert_eq!(tag.kind(), TagKind::Collection);
        assert!(tag.binding().is_none());
        assert_eq!(tag.params().count(), 1);
        let close = tag.close().unwrap();
        assert_eq!(close.keyword().as_deref(), Some("collection"));
        assert!(close.binding().is_none());
    }

    #[test]
    fn malformed_unicode_escape_stays_literal() {
        let Expr::Literal(literal) = only_expr(r#"{{ "\u+041" }}"#) else {
            panic!("expected literal");
        };
        assert_eq!(
            literal.value(),
            Some(LiteralValue::String("u+041".to_string()))
        );
    }

    #[test]
    fn if_branches_and_conditions() {
        let tag = only_tag("{{ if a }}A{{ elseif b | empty }}B{{ else }}C{{ /if }}");
        assert_eq!(tag.keyword().as_deref(), Some("if"));
        let stmt = tag.as_if().unwrap();

        let branches: Vec<_> = stmt.branches().collect();
        assert_eq!(branches.len(), 2);
        assert!(matches!(branches[0].condition(), Some(Expr::Variable(_))));
        assert!(matches!(branches[1].condition(), Some(Expr::Modified(_))));
        assert!(stmt.else_branch().unwrap().body().is_some());
        assert!(stmt.close().is_some());
    }

    #[test]
    fn unless_condition() {
        let tag = only_tag("{{ unless a == 1 }}x{{ /unless }}");
        assert_eq!(tag.kind(), TagKind::Unless);
        assert!(matches!(tag.condition(), Some(Expr::Binary(_))));
    }

    #[test]
    fn binary_parts() {
        let Expr::Binary(bin) = only_expr("{{ a <> b }}") else {
            panic!("expected binary expression");
        };
        assert_eq!(bin.op(), Some(BinaryOp::NotEq));
        assert!(matches!(bin.lhs(), Some(Expr::Variable(_))));
        assert!(matches!(bin.rhs(), Some(Expr::Variable(_))));
    }

    #[test]
    fn ternary_and_unary_parts() {
        let Expr::Ternary(ternary) = only_expr("{{ !a ? 'y' : -1 }}") else {
            panic!("expected ternary");
        };
        let Some(Expr::Unary(unary)) = ternary.condition() else {
            panic!("expected unary condition");
        };
        assert_eq!(unary.op(), Some(UnaryOp::Not));
        let Some(Expr::Literal(otherwise)) = ternary.else_branch() else {
            panic!("expected literal");
        };
        assert_eq!(
            otherwise.value(),
            Some(LiteralValue::Number {
                kind: NumberKind::Integer,
                text: "-1".to_string()
            })
        );
    }

    #[test]
    fn modifier_parts() {
        let Expr::Modified(modified) = only_expr("{{ title | truncate:20 | wrap('p', cls) }}") else {
            panic!("expected modified expression");
        };
        assert!(matches!(modified.base(), Some(Expr::Variable(_))));
        let modifiers: Vec<_> = modified.modifiers().collect();
        assert_eq!(modifiers[0].name().as_deref(), Some("truncate"));
        assert_eq!(modifiers[0].args().len(), 1);
        assert_eq!(modifiers[1].name().as_deref(), Some("wrap"));
        assert!(matches!(
            modifiers[1].args().as_slice(),
            [ModifierArg::Literal(_), ModifierArg::Variable(_)]
        ));
    }

    #[test]
    fn variable_segments() {
        let tag = only_tag("{{ entry:author.name[0] }}");
        let var = tag
            .as_antlers()
            .unwrap()
            .directive()
            .unwrap()
            .variable()
            .unwrap();
        assert_eq!(
            var.segments(),
            vec![
                PathSegment::Name {
                    separator: None,
                    name: "entry".to_string()
                },
                PathSegment::Name {
                    separator: Some(Separator::Colon),
                    name: "author".to_string()
                },
                PathSegment::Name {
                    separator: Some(Separator::Dot),
                    name: "name".to_string()
                },
                PathSegment::Index("0".to_string()),
            ]
        );
    }

    #[test]
    fn multi_statements() {
        let tag = only_tag("{{ a = 1; title }}").as_antlers().unwrap();
        let statements = tag.statements();
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[0], Statement::Expr(Expr::Binary(_))));
        assert!(matches!(statements[1], Statement::Directive(_)));
    }

    #[test]
    fn switch_cases() {
        let tag = only_tag("{{ switch((a > 1) => 'big', (true) => 'small') }}");
        let cases: Vec<_> = tag.as_switch().unwrap().cases().collect();
        assert_eq!(cases.len(), 2);
        assert!(matches!(cases[0].condition(), Some(Expr::Binary(_))));
        assert!(matches!(cases[1].value(), Some(Expr::Literal(_))));
    }

    #[test]
    fn interpolated_param() {
        let tag = only_tag("{{ partial:card :item=entry title={ name | upper } }}");
        let params: Vec<_> = tag.params().collect();
        assert!(params[0].is_variable());
        assert!(matches!(params[0].value(), Some(ParamValue::Variable(_))));
        let Some(ParamValue::Interpolation(interp)) = params[1].value() else {
            panic!("expected interpolation");
        };
        assert!(matches!(interp.expr(), Some(Expr::Modified(_))));
    }

    #[test]
    fn raw_and_echo_code() {
        let doc = document("{{? $a = 1; ?}}{{$ $a $}}");
        let nodes: Vec<_> = doc.nodes().collect();
        assert!(matches!(&nodes[0], Node::Raw(r) if r.code() == " $a = 1; "));
        assert!(matches!(&nodes[1], Node::Echo(e) if e.code() == " $a "));
    }
}
