//! Structured diagnostics reported by the lexer, parser and type checker.
use std::fmt::{self, Write as FmtWrite};

use smol_str::SmolStr;
use thiserror::Error;

use crate::{
    arena::{BindingId, CmdId, ExprId, LValueId, StmtId, TokenId, TypeId, VarId},
    ast::Ast,
    pipeline::Stage,
    tokens::{Span, TokenVec},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("Invalid lexeme")]
    InvalidLexeme,
    #[error("Illegal character")]
    IllegalCharacter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("Unexpected token type encountered")]
    UnexpectedToken,
    #[error("Missing token")]
    MissingToken,
    #[error("Integer value exceeds INTMAX")]
    IntRange,
    #[error("Floating point value exceeds DOUBLEMAX")]
    FloatRange,
    #[error("Unclosed parenthesis")]
    MissingParen,
    #[error("Unclosed brace")]
    MissingBrace,
    #[error("Unclosed bracket")]
    MissingBracket,
    #[error("Expected NEWLINE")]
    MissingNewline,
    #[error("Expected COLON")]
    MissingColon,
    #[error("Expected COMMA")]
    MissingComma,
    #[error("Expected STRING")]
    MissingString,
    #[error("Expected COMMAND")]
    InvalidCommand,
    #[error("Expected EXPRESSION")]
    InvalidExpression,
    #[error("Expected LVALUE")]
    InvalidLValue,
    #[error("Expected STATEMENT")]
    InvalidStatement,
    #[error("Expected TYPE")]
    InvalidType,
    #[error("Expected BINDING")]
    InvalidBinding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TypeErrorKind {
    #[error("Attempt to access undeclared variable")]
    UndeclaredVariable,
    #[error("Reference to name of unresolved type")]
    UnresolvedType,
    #[error("Variable shadows previously declared variable")]
    ShadowedVariable,
    #[error("Attempted binary operation on incompatible types")]
    MismatchedBinOp,
    #[error("Attempted binary operation on invalid type")]
    BadBinOp,
    #[error("If-Then-Else expression returns incompatible types on separate branches")]
    MismatchedIf,
    #[error("Attempted unary operation on invalid type")]
    BadUnOp,
    #[error("Attempt to index array with non-integer type")]
    BadIndex,
    #[error("Attempt to dereference non-struct value")]
    BadDereference,
    #[error("Attempt to dereference invalid member")]
    BadMember,
    #[error("Statement returns invalid type for function")]
    BadReturn,
    #[error("Function missing return statement")]
    NoReturn,
    #[error("Members misaligned with declaration")]
    MismatchedMembers,
    #[error("Array cannot be empty")]
    EmptyArray,
    #[error("Non-matching array element types")]
    MismatchedArray,
    #[error("Array index cannot be empty")]
    NoIndex,
    #[error("Image must be bound with exactly two indices")]
    BadRank,
    #[error("Attempt to call non-function")]
    BadFn,
    #[error("Array rank doesn't match number of indices")]
    BadDimension,
    #[error("Attempt to sum non-numeric expression")]
    BadSum,
    #[error("Unexpected expression type encountered")]
    UnexpectedType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    #[error(transparent)]
    Lex(#[from] LexErrorKind),
    #[error(transparent)]
    Parse(#[from] ParseErrorKind),
    #[error(transparent)]
    Type(#[from] TypeErrorKind),
}

impl DiagnosticKind {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Lex(_) => Stage::Lex,
            Self::Parse(_) => Stage::Parse,
            Self::Type(_) => Stage::TypeCheck,
        }
    }

    /// Note printed above the excerpt of a secondary label.
    fn secondary_note(&self) -> &'static str {
        use TypeErrorKind as T;
        match self {
            Self::Type(
                T::ShadowedVariable
                | T::BadFn
                | T::BadReturn
                | T::NoReturn
                | T::BadMember
                | T::MismatchedMembers,
            ) => "Declared here:",
            Self::Parse(_) => "Resumed here:",
            _ => "Related to:",
        }
    }
}

/// Typed reference to a node in one of the AST arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Cmd(CmdId),
    Expr(ExprId),
    LValue(LValueId),
    Stmt(StmtId),
    Type(TypeId),
    Binding(BindingId),
    Var(VarId),
}

/// Location a diagnostic points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Token(TokenId),
    Node(NodeRef),
}

impl From<TokenId> for Label {
    fn from(id: TokenId) -> Self {
        Label::Token(id)
    }
}

impl From<NodeRef> for Label {
    fn from(node: NodeRef) -> Self {
        Label::Node(node)
    }
}

macro_rules! node_label {
    ($($id:ident => $variant:ident,)*) => {
        $(
            impl From<$id> for NodeRef {
                fn from(id: $id) -> Self {
                    NodeRef::$variant(id)
                }
            }

            impl From<$id> for Label {
                fn from(id: $id) -> Self {
                    Label::Node(NodeRef::$variant(id))
                }
            }
        )*
    };
}

node_label! {
    CmdId => Cmd,
    ExprId => Expr,
    LValueId => LValue,
    StmtId => Stmt,
    TypeId => Type,
    BindingId => Binding,
    VarId => Var,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub primary: Label,
    pub secondary: Option<Label>,
    pub hint: Option<SmolStr>,
}

impl Diagnostic {
    pub fn new(kind: impl Into<DiagnosticKind>, primary: impl Into<Label>) -> Self {
        Self {
            kind: kind.into(),
            primary: primary.into(),
            secondary: None,
            hint: None,
        }
    }

    pub fn with_secondary(mut self, label: impl Into<Label>) -> Self {
        self.secondary = Some(label.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<SmolStr>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        self.kind.stage()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hint {
            Some(hint) => write!(f, "{}: {}", self.kind, hint),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Renders diagnostics against the source they were reported for.
pub struct Report<'r, 'a> {
    pub file_name: &'r str,
    pub source: &'a [u8],
    pub tokens: &'r TokenVec,
    pub ast: Option<&'r Ast<'a>>,
}

impl<'r, 'a> Report<'r, 'a> {
    /// Source span of a label, if it has one.
    ///
    /// Nodes synthesized for built-ins have no source location.
    pub fn resolve(&self, label: Label) -> Option<Span> {
        let token = match label {
            Label::Token(token) => Some(token),
            Label::Node(node) => self.ast.and_then(|ast| ast.node_token(node)),
        }?;
        self.tokens.get(token).map(|token| token.span)
    }

    pub fn write_diagnostic<W: FmtWrite>(&self, w: &mut W, diagnostic: &Diagnostic) -> fmt::Result {
        let primary = self.resolve(diagnostic.primary);
        let secondary = diagnostic.secondary.and_then(|label| self.resolve(label));

        let stage = match diagnostic.stage() {
            Stage::Lex => "Lex",
            Stage::Parse => "Parse",
            Stage::TypeCheck => "Type-check",
        };

        match primary {
            Some(span) => {
                let (line, col) = span.line_col(self.source);
                writeln!(w, "{} error at {}:{}:{}", stage, self.file_name, line, col)?;
            }
            None => writeln!(w, "{} error in {}", stage, self.file_name)?,
        }

        writeln!(w, "\t{}", diagnostic.kind)?;
        if let Some(hint) = &diagnostic.hint {
            writeln!(w, "\t{}", hint)?;
        }
        writeln!(w)?;

        match (primary, secondary) {
            (Some(a), Some(b)) if self.same_line(a, b) => self.write_excerpt(w, a.merge(&b))?,
            (Some(a), Some(b)) => {
                self.write_excerpt(w, a)?;
                writeln!(w, "\t{}", diagnostic.kind.secondary_note())?;
                writeln!(w)?;
                self.write_excerpt(w, b)?;
            }
            (Some(a), None) => self.write_excerpt(w, a)?,
            (None, Some(b)) => {
                writeln!(w, "\t{}", diagnostic.kind.secondary_note())?;
                writeln!(w)?;
                self.write_excerpt(w, b)?;
            }
            (None, None) => {}
        }

        Ok(())
    }

    /// Render every diagnostic, in order, into a string.
    pub fn render_all(&self, diagnostics: &[Diagnostic]) -> Result<String, fmt::Error> {
        let mut out = String::new();
        for diagnostic in diagnostics {
            self.write_diagnostic(&mut out, diagnostic)?;
        }
        Ok(out)
    }

    fn same_line(&self, a: Span, b: Span) -> bool {
        a.line_col(self.source).0 == b.line_col(self.source).0
    }

    fn write_excerpt<W: FmtWrite>(&self, w: &mut W, span: Span) -> fmt::Result {
        let (line_text, line_span) = span.surrounding_line(self.source);
        let (line, _) = span.line_col(self.source);

        // Clip the underline to the excerpt, spans may run past the line end.
        let start = (span.index - line_span.index) as usize;
        let end = (span.end().min(line_span.end()) - line_span.index) as usize;
        let width = end.saturating_sub(start).max(1);

        writeln!(w, "{:6} | {}", line, String::from_utf8_lossy(line_text))?;
        writeln!(w, "{:pad$}^{}", "", "~".repeat(width - 1), pad = start + 9)?;
        writeln!(w)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        arena::NodeId,
        tokens::{Token, TokenKind},
    };

    fn tokens(spans: &[(u32, u32)]) -> TokenVec {
        let mut tokens = TokenVec::new();
        for (index, size) in spans {
            tokens.push(Token {
                span: Span::new(*index, *size),
                kind: TokenKind::Variable,
            });
        }
        tokens
    }

    #[test]
    fn test_stage_of_kind() {
        assert_eq!(DiagnosticKind::from(LexErrorKind::IllegalCharacter).stage(), Stage::Lex);
        assert_eq!(DiagnosticKind::from(ParseErrorKind::MissingComma).stage(), Stage::Parse);
        assert_eq!(DiagnosticKind::from(TypeErrorKind::BadSum).stage(), Stage::TypeCheck);
    }

    #[test]
    fn test_render_underline() {
        const SOURCE: &[u8] = b"let x = 1\nlet yy = true\n";
        let tokens = tokens(&[(14, 2)]);
        let report = Report {
            file_name: "test.jpl",
            source: SOURCE,
            tokens: &tokens,
            ast: None,
        };

        let diagnostic = Diagnostic::new(ParseErrorKind::InvalidCommand, TokenId::new(0));
        let text = report.render_all(&[diagnostic]).unwrap();

        let expected = [
            "Parse error at test.jpl:2:5",
            "\tExpected COMMAND",
            "",
            "     2 | let yy = true",
            "             ^~",
            "",
            "",
        ]
        .join("\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_same_line_merges() {
        const SOURCE: &[u8] = b"show f(1, 2\n";
        let tokens = tokens(&[(6, 1), (11, 1)]);
        let report = Report {
            file_name: "a.jpl",
            source: SOURCE,
            tokens: &tokens,
            ast: None,
        };

        let diagnostic = Diagnostic::new(ParseErrorKind::MissingParen, TokenId::new(0))
            .with_secondary(TokenId::new(1));
        let text = report.render_all(&[diagnostic]).unwrap();

        assert!(text.starts_with("Parse error at a.jpl:1:7\n"));
        assert!(text.contains("     1 | show f(1, 2\n"));
        assert!(text.contains(&format!("{}^~~~~\n", " ".repeat(15))));
        assert!(!text.contains("^~~~~~"));
    }
}
