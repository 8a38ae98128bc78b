//! Lexical analysis
use log::debug;

use crate::{
    arena::TokenId,
    diagnostics::{Diagnostic, LexErrorKind},
    dict::HashDict,
    tokens::{Keyword, Span, Token, TokenKind, TokenVec},
};

pub struct Lexer<'a> {
    /// Source being lexed. Tokens only record spans into it.
    bytes: &'a [u8],
    /// Position of the next unread byte.
    pos: usize,
    /// Start absolute byte position of the current token
    /// in the source.
    start_pos: usize,
    keywords: HashDict<'static, Keyword>,
    /// Kind of the previously produced token, used to
    /// coalesce runs of newlines.
    prev: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    /// Lexer over raw source bytes. Text need not be UTF-8, bytes
    /// outside printable ASCII lex as illegal tokens.
    pub fn new(source: &'a (impl AsRef<[u8]> + ?Sized)) -> Self {
        let mut keywords = HashDict::new();
        for keyword in Keyword::ALL {
            keywords.insert_or_replace(keyword.as_str(), keyword);
        }

        Self {
            bytes: source.as_ref(),
            pos: 0,
            start_pos: 0,
            keywords,
            prev: None,
        }
    }

    /// Indicates whether the lexer has consumed the whole source.
    pub fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Lex the whole source, reporting every malformed or illegal token.
    ///
    /// The returned vector always ends in an [`TokenKind::EOF`] token.
    pub fn tokenize(self) -> (TokenVec, Vec<Diagnostic>) {
        let mut tokens = TokenVec::with_capacity(self.bytes.len() / 2 + 1);
        let mut diagnostics = Vec::new();
        let bytes = self.bytes;

        for token in self {
            let kind = token.kind;
            let id: TokenId = tokens.push(token);

            match kind {
                TokenKind::Invalid => diagnostics.push(Diagnostic::new(LexErrorKind::InvalidLexeme, id)),
                TokenKind::Illegal => {
                    let byte = bytes.get(tokens[id].span.index as usize).copied();
                    diagnostics.push(illegal_character(id, byte));
                }
                _ => {}
            }
        }

        debug!("lexed {} tokens, {} errors", tokens.len(), diagnostics.len());

        (tokens, diagnostics)
    }

    /// Scan the source bytes and construct the next token.
    ///
    /// Comments and line continuations produce no token, and a newline
    /// directly following another newline is swallowed. Once the source is exhausted every call returns
    /// an EOF token.
    pub fn next_token(&mut self) -> Token {
        use TokenKind as TK;

        loop {
            // Erase leading whitespace.
            while self.current() == Some(b' ') {
                self.pos += 1;
            }

            self.start_token();

            let c = match self.current() {
                Some(c) => c,
                None => return self.make_token(TK::EOF),
            };
            self.pos += 1;

            let kind = match c {
                b',' => TK::Comma,
                b':' => TK::Colon,
                b'(' => TK::LeftParen,
                b')' => TK::RightParen,
                b'[' => TK::LeftBracket,
                b']' => TK::RightBracket,
                b'{' => TK::LeftBrace,
                b'}' => TK::RightBrace,
                b'+' | b'-' | b'*' | b'%' => TK::Op,
                b'=' => {
                    if self.match_byte(b'=') {
                        TK::Op
                    } else {
                        TK::Equals
                    }
                }
                b'<' | b'>' | b'!' => {
                    self.match_byte(b'=');
                    TK::Op
                }
                b'&' | b'|' => {
                    if self.match_byte(c) {
                        TK::Op
                    } else {
                        TK::Illegal
                    }
                }
                b'/' => match self.current() {
                    Some(b'/') => match self.consume_line_comment() {
                        Some(kind) => kind,
                        None => continue,
                    },
                    Some(b'*') => match self.consume_block_comment() {
                        Some(kind) => kind,
                        None => continue,
                    },
                    _ => TK::Op,
                },
                b'"' => self.consume_string(),
                b'.' => self.consume_dot(),
                b'\\' => {
                    if self.match_byte(b'\n') {
                        continue;
                    }
                    // Escapes are only valid before a newline.
                    if !self.at_end() {
                        self.pos += 1;
                    }
                    TK::Invalid
                }
                b'\n' => {
                    if matches!(self.prev, Some(TK::Newline)) {
                        continue;
                    }
                    TK::Newline
                }
                b'_' | b'a'..=b'z' | b'A'..=b'Z' => self.consume_ident(),
                b'0'..=b'9' => self.consume_number(),
                _ => TK::Illegal,
            };

            return self.make_token(kind);
        }
    }

    #[inline]
    fn current(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    /// Consume the current byte if it equals the expected one.
    #[inline]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.current() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Primes the lexer to consume the next token.
    fn start_token(&mut self) {
        self.start_pos = self.pos;
    }

    /// Create a span using the starting position of the current token,
    /// and the current position of the cursor.
    fn make_span(&self) -> Span {
        // start and end can be equal, EOF has 0 size.
        debug_assert!(self.pos >= self.start_pos);
        Span {
            index: self.start_pos as u32,
            size: (self.pos - self.start_pos) as u32,
        }
    }

    fn fragment(&self) -> &'a [u8] {
        &self.bytes[self.start_pos..self.pos]
    }

    fn make_token(&mut self, kind: TokenKind) -> Token {
        self.prev = Some(kind);
        Token {
            span: self.make_span(),
            kind,
        }
    }
}

/// Specialised tokens.
impl<'a> Lexer<'a> {
    /// Erase a comment line up to, but not including, the trailing newline.
    ///
    /// Returns an invalid kind if the comment contains an illegal byte.
    fn consume_line_comment(&mut self) -> Option<TokenKind> {
        debug_assert_eq!(self.current(), Some(b'/'));
        self.pos += 1;

        let mut valid = true;
        while let Some(c) = self.current() {
            if c == b'\n' {
                break;
            }
            valid &= !is_illegal(c);
            self.pos += 1;
        }

        (!valid).then_some(TokenKind::Invalid)
    }

    /// Erase a block comment, including embedded newlines.
    ///
    /// Returns an invalid kind if the comment is never closed,
    /// or contains an illegal byte.
    fn consume_block_comment(&mut self) -> Option<TokenKind> {
        debug_assert_eq!(self.current(), Some(b'*'));
        self.pos += 1;

        let mut valid = true;
        loop {
            match self.current() {
                Some(b'*') if self.peek() == Some(b'/') => {
                    self.pos += 2;
                    break;
                }
                Some(c) => {
                    valid &= c == b'\n' || !is_illegal(c);
                    self.pos += 1;
                }
                None => {
                    valid = false;
                    break;
                }
            }
        }

        (!valid).then_some(TokenKind::Invalid)
    }

    /// Make a string literal token, quotes included.
    ///
    /// A newline or the end of source before the closing quote leaves
    /// an invalid token that stops short of them. An illegal byte is
    /// swallowed into the invalid token.
    fn consume_string(&mut self) -> TokenKind {
        loop {
            match self.current() {
                Some(b'"') => {
                    self.pos += 1;
                    return TokenKind::String;
                }
                Some(b'\n') | None => return TokenKind::Invalid,
                Some(c) if is_illegal(c) => {
                    self.pos += 1;
                    return TokenKind::Invalid;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Make either a member access dot, or a float literal
    /// without an integer part.
    fn consume_dot(&mut self) -> TokenKind {
        if !matches!(self.current(), Some(c) if c.is_ascii_digit()) {
            return TokenKind::Dot;
        }

        self.consume_digits();
        TokenKind::FloatVal
    }

    /// Make an identifier or keyword token.
    fn consume_ident(&mut self) -> TokenKind {
        while matches!(self.current(), Some(c) if is_letter_or_digit(c)) {
            self.pos += 1;
        }

        match self.keywords.try_get(self.fragment()) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Variable,
        }
    }

    /// Make a number literal token.
    fn consume_number(&mut self) -> TokenKind {
        self.consume_digits();

        if self.match_byte(b'.') {
            self.consume_digits();
            TokenKind::FloatVal
        } else {
            TokenKind::IntVal
        }
    }

    fn consume_digits(&mut self) {
        while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
    }
}

/// Bytes outside printable ASCII, except for newline.
#[inline]
pub fn is_illegal(c: u8) -> bool {
    (c != b'\n' && c < 32) || c > 126
}

fn is_letter_or_digit(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn illegal_character(id: TokenId, byte: Option<u8>) -> Diagnostic {
    let diagnostic = Diagnostic::new(LexErrorKind::IllegalCharacter, id);
    match byte {
        Some(byte) => diagnostic.with_hint(format!("byte 0x{byte:02X}")),
        None => diagnostic,
    }
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Token;
    type IntoIter = LexerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            done: false,
        }
    }
}

/// Convenience iterator that wraps the lexer.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    // Track end so an EOF token is emitted once.
    done: bool,
    lexer: Lexer<'a>,
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let token = self.lexer.next_token();
        if token.kind == TokenKind::EOF {
            // Emit that last EOF token
            self.done = true;
        }
        Some(token)
    }
}
