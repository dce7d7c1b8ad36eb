//! Tokens produced by the lexer and the syntax tree built from them.

use super::lexer::TokenStream;

/// Control operators recognised outside quoting and substitution spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `&&`: run next only if previous succeeded
    And,
    /// `||`: run next only if previous failed
    Or,
    /// `;`: run next unconditionally
    Semi,
    /// `&`: run in background
    Amp,
    /// `|`: pipe stdout
    Pipe,
    /// `|&`: pipe stdout+stderr
    PipeErr,
    /// Unescaped line break, equivalent to `;` at list level
    Newline,
    /// `;;`: case arm terminator
    DSemi,
    /// `;&`: case arm fallthrough
    SemiAmp,
    /// `;;&`: case arm continue-matching
    DSemiAmp,
    LParen,
    RParen,
}

impl Operator {
    /// The operator's shell syntax.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Semi => ";",
            Operator::Amp => "&",
            Operator::Pipe => "|",
            Operator::PipeErr => "|&",
            Operator::Newline => "\\n",
            Operator::DSemi => ";;",
            Operator::SemiAmp => ";&",
            Operator::DSemiAmp => ";;&",
            Operator::LParen => "(",
            Operator::RParen => ")",
        }
    }

    /// Operators that close a case arm body.
    pub fn is_case_terminator(&self) -> bool {
        matches!(self, Operator::DSemi | Operator::SemiAmp | Operator::DSemiAmp)
    }
}

/// Redirection operators. The optional leading fd lives on the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOp {
    /// `<`
    Input,
    /// `>`
    Output,
    /// `>>`
    Append,
    /// `>|`
    Clobber,
    /// `<>`
    ReadWrite,
    /// `<&`
    DupInput,
    /// `>&`
    DupOutput,
    /// `&>`
    OutputAll,
    /// `&>>`
    AppendAll,
    /// `<<`
    HereDoc,
    /// `<<-`
    HereDocStrip,
    /// `<<<`
    HereString,
}

impl RedirectOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectOp::Input => "<",
            RedirectOp::Output => ">",
            RedirectOp::Append => ">>",
            RedirectOp::Clobber => ">|",
            RedirectOp::ReadWrite => "<>",
            RedirectOp::DupInput => "<&",
            RedirectOp::DupOutput => ">&",
            RedirectOp::OutputAll => "&>",
            RedirectOp::AppendAll => "&>>",
            RedirectOp::HereDoc => "<<",
            RedirectOp::HereDocStrip => "<<-",
            RedirectOp::HereString => "<<<",
        }
    }

    pub fn is_heredoc(&self) -> bool {
        matches!(self, RedirectOp::HereDoc | RedirectOp::HereDocStrip)
    }
}

/// How the characters of a word were quoted in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    Unquoted,
    Single,
    Double,
    /// Any combination, including backslash escapes.
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    /// `NAME=value` (or `NAME+=value`) with an unquoted, valid name.
    Assignment,
    Operator(Operator),
    Redirect(RedirectOp),
}

/// A lexed fragment of a word, before the grammar resolves substitutions.
#[derive(Debug, Clone)]
pub enum RawPart {
    Literal(String),
    /// `$name`, `${...}`; kept as source text.
    Parameter(String),
    /// `$(( ... ))` or a bare `(( ... ))` command; kept as source text.
    Arithmetic(String),
    /// `$( ... )`: source text plus the already-lexed inner tokens.
    Command(String, Box<TokenStream>),
    /// `` `...` ``: source text plus the lexed, unescaped inner tokens.
    Backtick(String, Box<TokenStream>),
    /// `<( ... )` / `>( ... )`.
    Process(String, Box<TokenStream>),
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Quote-removed text. Expansions contribute their source text verbatim.
    pub text: String,
    pub quoting: Quoting,
    pub parts: Vec<RawPart>,
    /// Explicit file descriptor on a redirect, e.g. the `2` in `2>&1`.
    pub fd: Option<u32>,
    /// Char offset of the token's first character.
    pub offset: usize,
}

impl Token {
    pub fn operator(op: Operator, offset: usize) -> Self {
        Self {
            kind: TokenKind::Operator(op),
            text: op.as_str().to_string(),
            quoting: Quoting::Unquoted,
            parts: Vec::new(),
            fd: None,
            offset,
        }
    }

    pub fn redirect(op: RedirectOp, fd: Option<u32>, offset: usize) -> Self {
        Self {
            kind: TokenKind::Redirect(op),
            text: op.as_str().to_string(),
            quoting: Quoting::Unquoted,
            parts: Vec::new(),
            fd,
            offset,
        }
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        self.kind == TokenKind::Operator(op)
    }
}

// ── Syntax tree ──

/// Word-level expansion. Command-bearing payloads are parsed but opaque to extraction.
#[derive(Debug, Clone)]
pub enum Expansion {
    Parameter(String),
    Arithmetic(String),
    Command(Box<List>),
    Process(Box<List>),
}

#[derive(Debug, Clone)]
pub enum Fragment {
    Literal(String),
    Expansion(Expansion),
}

#[derive(Debug, Clone)]
pub struct Word {
    /// Quote-removed text, as used for command names.
    pub text: String,
    pub quoting: Quoting,
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub name: String,
    pub value: Word,
}

#[derive(Debug, Clone)]
pub struct Redirection {
    pub fd: Option<u32>,
    pub op: RedirectOp,
    pub target: Word,
    /// Here-document body, kept as opaque text.
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SimpleCommand {
    pub assignments: Vec<Assignment>,
    pub words: Vec<Word>,
    pub redirections: Vec<Redirection>,
}

#[derive(Debug, Clone)]
pub struct CaseArm {
    /// Patterns are opaque text.
    pub patterns: Vec<String>,
    pub body: List,
}

#[derive(Debug, Clone)]
pub enum CompoundCommand {
    If {
        /// `if`/`elif` condition and its `then` body, in order.
        branches: Vec<(List, List)>,
        else_body: Option<List>,
    },
    While {
        condition: List,
        body: List,
    },
    Until {
        condition: List,
        body: List,
    },
    For {
        variable: String,
        items: Vec<Word>,
        body: List,
    },
    Case {
        subject: Word,
        arms: Vec<CaseArm>,
    },
    Subshell(List),
    Group(List),
    Function {
        name: String,
        body: Box<Command>,
    },
    /// `(( expr ))` evaluated as a command.
    Arithmetic(String),
}

#[derive(Debug, Clone)]
pub enum Command {
    Simple(SimpleCommand),
    Compound(CompoundCommand, Vec<Redirection>),
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    pub negated: bool,
    pub stages: Vec<Command>,
}

/// `&&` / `||` between pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

/// Left-associative `&&`/`||` chain.
#[derive(Debug, Clone)]
pub struct AndOr {
    pub first: Pipeline,
    pub rest: Vec<(Connector, Pipeline)>,
}

impl AndOr {
    pub fn pipelines(&self) -> impl Iterator<Item = &Pipeline> {
        std::iter::once(&self.first).chain(self.rest.iter().map(|(_, p)| p))
    }
}

/// `;`, `&` or newline after a list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Sequential,
    Background,
}

#[derive(Debug, Clone)]
pub struct ListEntry {
    pub chain: AndOr,
    pub separator: Option<Separator>,
}

#[derive(Debug, Clone, Default)]
pub struct List {
    pub entries: Vec<ListEntry>,
}

impl List {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
