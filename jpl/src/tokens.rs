//! Tokens
use std::{borrow::Cow, fmt, ops};

use crate::arena::{Arena, TokenId};

/// Every token of a compilation unit, in source order, ending with
/// a single [`TokenKind::EOF`].
pub type TokenVec = Arena<TokenId, Token>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub span: Span,
    pub kind: TokenKind,
}

impl Token {
    #[inline]
    pub fn fragment<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        self.span.fragment(source)
    }

    #[inline]
    pub fn text<'a>(&self, source: &'a [u8]) -> Cow<'a, str> {
        self.span.text(source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum TokenKind {
    // Simple
    Colon,        // :
    Comma,        // ,
    Dot,          // .
    Equals,       // =
    LeftBrace,    // {
    RightBrace,   // }
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    /// One or more line-feeds.
    Newline,

    // ------------------------------------------------------------------------
    // Complex
    /// Math or boolean operator.
    Op,
    IntVal,
    FloatVal,
    /// String literal, including its quotes.
    String,
    Variable,
    /// Reserved identifiers
    Keyword(Keyword),

    // ------------------------------------------------------------------------
    // Special
    /// Malformed lexeme, like an unterminated string or comment.
    Invalid,
    /// Byte outside of the accepted character set.
    Illegal,
    /// End-of-file
    EOF,
}

impl TokenKind {
    /// Token kinds that signal a lexical error.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, TokenKind::Invalid | TokenKind::Illegal)
    }

    /// Upper case name used in token dumps and diagnostics.
    pub fn name(&self) -> &'static str {
        use TokenKind as TK;
        match self {
            TK::Colon => "COLON",
            TK::Comma => "COMMA",
            TK::Dot => "DOT",
            TK::Equals => "EQUALS",
            TK::LeftBrace => "LCURLY",
            TK::RightBrace => "RCURLY",
            TK::LeftParen => "LPAREN",
            TK::RightParen => "RPAREN",
            TK::LeftBracket => "LSQUARE",
            TK::RightBracket => "RSQUARE",
            TK::Newline => "NEWLINE",
            TK::Op => "OP",
            TK::IntVal => "INTVAL",
            TK::FloatVal => "FLOATVAL",
            TK::String => "STRING",
            TK::Variable => "VARIABLE",
            TK::Keyword(keyword) => keyword.name(),
            TK::Invalid => "INVALID",
            TK::Illegal => "ILLEGAL",
            TK::EOF => "END_OF_FILE",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub index: u32,
    pub size: u32,
}

impl Span {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    /// Slice the span's bytes out of the source.
    ///
    /// Returns an empty slice if the span runs past the source.
    #[inline]
    pub fn fragment<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        source
            .get(self.index as usize..self.end() as usize)
            .unwrap_or_default()
    }

    /// The span's bytes as text, with bytes that are not UTF-8
    /// replaced by U+FFFD.
    #[inline]
    pub fn text<'a>(&self, source: &'a [u8]) -> Cow<'a, str> {
        String::from_utf8_lossy(self.fragment(source))
    }

    /// Ending index of the span, exclusive.
    #[inline]
    pub fn end(&self) -> u32 {
        self.index + self.size
    }

    /// The line containing the start of the span, without its
    /// trailing newline, together with the line's own span.
    pub fn surrounding_line<'a>(&self, bytes: &'a [u8]) -> (&'a [u8], Span) {
        let index = (self.index as usize).min(bytes.len());

        let start = bytes[..index]
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = bytes[index..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|i| index + i)
            .unwrap_or(bytes.len());

        let line_span = Span {
            index: start as u32,
            size: (end - start) as u32,
        };

        (line_span.fragment(bytes), line_span)
    }

    /// One-based line and column of the start of the span.
    pub fn line_col(&self, bytes: &[u8]) -> (usize, usize) {
        let index = (self.index as usize).min(bytes.len());
        let before = &bytes[..index];
        let line = before.iter().filter(|b| **b == b'\n').count() + 1;
        let col = index - before.iter().rposition(|b| *b == b'\n').map(|i| i + 1).unwrap_or(0) + 1;
        (line, col)
    }

    /// Combine two spans to produce a new span that
    /// covers both (and everything inbetween).
    ///
    /// ```
    /// use jpl::tokens::Span;
    ///
    /// let span1 = Span::new(4, 13);
    /// let span2 = Span::new(21, 13);
    /// let span3 = span1.merge(&span2);
    /// assert_eq!(4, span3.index);
    /// assert_eq!(30, span3.size);
    /// ```
    ///
    /// ```text
    /// <-- span1 -->    <-- span2 -->
    /// <---------- span3 ----------->
    /// ```
    pub fn merge(&self, other: &Span) -> Span {
        let index = u32::min(self.index, other.index);
        let size = u32::max(self.end(), other.end()) - index;
        Span { index, size }
    }
}

impl ops::Add for Span {
    type Output = Span;

    #[allow(clippy::suspicious_arithmetic_impl)] // subtract needed to merge spans
    fn add(self, rhs: Self) -> Self::Output {
        self.merge(&rhs)
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Array,
    Assert,
    Bool,
    Else,
    False,
    Float,
    Fn,
    If,
    Image,
    Int,
    Let,
    Print,
    Read,
    Return,
    Show,
    Struct,
    Sum,
    Then,
    Time,
    To,
    True,
    Void,
    Write,
}

impl Keyword {
    pub const ALL: [Keyword; 23] = [
        Self::Array,
        Self::Assert,
        Self::Bool,
        Self::Else,
        Self::False,
        Self::Float,
        Self::Fn,
        Self::If,
        Self::Image,
        Self::Int,
        Self::Let,
        Self::Print,
        Self::Read,
        Self::Return,
        Self::Show,
        Self::Struct,
        Self::Sum,
        Self::Then,
        Self::Time,
        Self::To,
        Self::True,
        Self::Void,
        Self::Write,
    ];

    /// Source spelling.
    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Array  => "array",
            Self::Assert => "assert",
            Self::Bool   => "bool",
            Self::Else   => "else",
            Self::False  => "false",
            Self::Float  => "float",
            Self::Fn     => "fn",
            Self::If     => "if",
            Self::Image  => "image",
            Self::Int    => "int",
            Self::Let    => "let",
            Self::Print  => "print",
            Self::Read   => "read",
            Self::Return => "return",
            Self::Show   => "show",
            Self::Struct => "struct",
            Self::Sum    => "sum",
            Self::Then   => "then",
            Self::Time   => "time",
            Self::To     => "to",
            Self::True   => "true",
            Self::Void   => "void",
            Self::Write  => "write",
        }
    }

    /// Token dump name.
    #[rustfmt::skip]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Array  => "ARRAY",
            Self::Assert => "ASSERT",
            Self::Bool   => "BOOL",
            Self::Else   => "ELSE",
            Self::False  => "FALSE",
            Self::Float  => "FLOAT",
            Self::Fn     => "FN",
            Self::If     => "IF",
            Self::Image  => "IMAGE",
            Self::Int    => "INT",
            Self::Let    => "LET",
            Self::Print  => "PRINT",
            Self::Read   => "READ",
            Self::Return => "RETURN",
            Self::Show   => "SHOW",
            Self::Struct => "STRUCT",
            Self::Sum    => "SUM",
            Self::Then   => "THEN",
            Self::Time   => "TIME",
            Self::To     => "TO",
            Self::True   => "TRUE",
            Self::Void   => "VOID",
            Self::Write  => "WRITE",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
