//! SyntaxKind enum for all tokens and nodes in the Antlers CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree.

/// All syntax kinds for the Antlers CST.
///
/// This enum represents both tokens (lexer output, plus the handful of
/// contextual keyword kinds the parser remaps identifiers into) and composite
/// nodes (parser output). The `repr(u16)` ensures efficient storage in rowan's
/// green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Trivia ===
    /// Whitespace between tokens inside a tag
    WHITESPACE,
    /// `{{# ... #}}` or `{{!-- --}}` comment nested inside a tag
    TAG_COMMENT,

    // === Text-mode tokens ===
    /// Literal template text (anything but `{` and `@`)
    TEXT,
    /// `@...` escape run, up to the next `{`
    IGNORE,
    /// `{{# ... #}}` or `{{!-- ... --}}` comment at the top level
    COMMENT,
    /// `{{? ... ?}}` raw code block
    RAW_CODE,
    /// `{{$ ... $}}` echo code block
    ECHO_CODE,

    // === Delimiters ===
    /// `{{`
    L_DCURLY,
    /// `}}`
    R_DCURLY,
    /// `{` opening an interpolated parameter
    L_CURLY,
    /// `}` closing an interpolated parameter
    R_CURLY,

    // === Literals ===
    IDENT,
    NUMBER,
    STRING,

    // === Operators and punctuation ===
    /// `**`
    STAR2,
    STAR,
    SLASH,
    PERCENT,
    PLUS,
    MINUS,
    /// `===`
    EQ3,
    /// `!==`
    NEQ2,
    /// `==`
    EQ2,
    /// `!=`
    NEQ,
    /// `<>`
    LT_GT,
    /// `<=`
    LT_EQ,
    /// `>=`
    GT_EQ,
    LT,
    GT,
    /// `&&`
    AMP2,
    /// `||`
    PIPE2,
    /// `|` applying a modifier
    PIPE,
    /// `??`
    QUESTION2,
    /// `?=`
    QUESTION_EQ,
    QUESTION,
    EQ,
    PLUS_EQ,
    MINUS_EQ,
    STAR_EQ,
    SLASH_EQ,
    PERCENT_EQ,
    BANG,
    /// `=>`
    FAT_ARROW,
    COLON,
    DOT,
    COMMA,
    SEMICOLON,
    L_PAREN,
    R_PAREN,
    L_BRACK,
    R_BRACK,

    // === Contextual keywords (identifiers remapped by the parser) ===
    /// Structural tag keyword (`if`, `collection`, `partial`, ...)
    KEYWORD,
    TRUE_KW,
    FALSE_KW,
    VOID_KW,
    AND_KW,
    OR_KW,
    XOR_KW,
    BWA_KW,
    BWO_KW,
    BXOR_KW,
    /// `*recursive`
    RECURSIVE_KW,

    /// Character sequence inside a tag the lexer could not classify
    ERROR_TOKEN,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root document node
    ROOT,
    /// Run of literal text
    TEXT_SPAN,
    ANTLERS_COMMENT,
    RAW_BLOCK,
    ECHO_BLOCK,

    /// Generic `{{ ... }}` tag
    ANTLERS_TAG,
    /// Variable reference with optional parameters, or a `/name` close
    DIRECTIVE,
    /// `;`-separated statements inside one tag
    MULTI_STATEMENT,

    /// Opening `{{ ... }}` of a paired construct
    OPEN_TAG,
    /// Closing `{{ /... }}` of a paired construct
    CLOSE_TAG,
    /// Content between an open and close tag
    BODY,
    /// `:variable` bound to a tag keyword
    BINDING,
    PARAM_LIST,
    PARAM,
    /// `{expr}` parameter value
    INTERPOLATION,

    IF_STATEMENT,
    /// `if` or `elseif` branch with its condition and body
    IF_BRANCH,
    ELSE_BRANCH,
    UNLESS_STATEMENT,
    SWITCH_STATEMENT,
    SWITCH_CASE,
    /// `{{ *recursive children* }}`
    RECURSIVE_TAG,
    /// `{{ user:can ... }}`
    USER_TAG,

    // === Loops ===
    COLLECTION_LOOP,
    NAV_LOOP,
    TAXONOMY_LOOP,
    FORM_LOOP,
    FORM_ERRORS,
    ENTRIES_LOOP,

    // === Lifecycle tags ===
    PARTIAL_TAG,
    YIELD_TAG,
    SECTION_TAG,
    SCOPE_TAG,
    ASSET_TAG,
    GLIDE_TAG,
    DUMP_TAG,
    CACHE_TAG,
    NO_CACHE_TAG,
    REDIRECT_TAG,
    SESSION_TAG,
    MARKDOWN_TAG,
    OAUTH_TAG,
    LOCALES_TAG,
    SVG_TAG,
    TEMPLATE_CONTENT_TAG,
    SLOT_TAG,
    PUSH_TAG,
    PREPEND_TAG,
    ONCE_TAG,

    // === Expressions ===
    LITERAL,
    /// Simple, nested (`a:b`, `a.b`) or indexed (`a[0]`) variable path
    VARIABLE,
    /// `[key]` segment of a variable path
    INDEX,
    /// `variable.method()`
    ARRAY_METHOD_CALL,
    BINARY_EXPR,
    UNARY_EXPR,
    TERNARY_EXPR,
    PAREN_EXPR,
    /// Expression followed by one or more modifiers
    MODIFIED_EXPR,
    /// `| name` with optional arguments
    MODIFIER,
    MODIFIER_ARGS,

    /// Error recovery node
    ERROR,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true if this kind is trivia the grammar never sees.
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::TAG_COMMENT)
    }

    /// Returns true for the node kinds that represent a tag of any shape.
    pub fn is_tag(self) -> bool {
        if matches!(self, Self::IF_BRANCH | Self::ELSE_BRANCH | Self::SWITCH_CASE) {
            return false;
        }
        self == Self::ANTLERS_TAG
            || (Self::IF_STATEMENT as u16..=Self::ONCE_TAG as u16).contains(&(self as u16))
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AntlersLang {}

impl rowan::Language for AntlersLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ERROR as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<AntlersLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<AntlersLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<AntlersLang>;
