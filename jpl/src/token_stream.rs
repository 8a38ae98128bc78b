//! Buffered stream of tokens for look ahead.
use std::{borrow::Cow, error, fmt};

use crate::{
    arena::{NodeId, TokenId},
    tokens::{Token, TokenKind, TokenVec},
};

/// Cursor over a fully lexed token vector that allows arbitrary look ahead.
///
/// The stream never advances past the final EOF token, so peeking beyond
/// the end keeps answering with that token.
pub struct TokenStream<'t, 'a> {
    tokens: &'t TokenVec,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    source: &'a [u8],
    pos: usize,
}

impl<'t, 'a> TokenStream<'t, 'a> {
    pub fn new(tokens: &'t TokenVec, source: &'a (impl AsRef<[u8]> + ?Sized)) -> Self {
        debug_assert!(
            tokens.as_slice().last().map(|token| token.kind) == Some(TokenKind::EOF),
            "token vector must end in EOF"
        );
        Self {
            tokens,
            source: source.as_ref(),
            pos: 0,
        }
    }

    /// Id of the token `offset` places ahead of the cursor.
    #[inline]
    pub fn peek_id(&self, offset: usize) -> TokenId {
        let last = self.tokens.len().saturating_sub(1);
        TokenId::new((self.pos + offset).min(last))
    }

    /// Kind of the token `offset` places ahead of the cursor.
    #[inline]
    pub fn peek_kind(&self, offset: usize) -> TokenKind {
        self.token(self.peek_id(offset)).kind
    }

    /// Id of the current token.
    #[inline]
    pub fn current(&self) -> TokenId {
        self.peek_id(0)
    }

    #[inline]
    pub fn token(&self, id: TokenId) -> &'t Token {
        &self.tokens[id]
    }

    /// Source text of a token.
    ///
    /// Names, numbers and strings only ever hold printable ASCII, so
    /// the text of any token the parser keeps is valid UTF-8. Other
    /// tokens may yield an empty string, use [`TokenStream::text`]
    /// to show them.
    #[inline]
    pub fn fragment(&self, id: TokenId) -> &'a str {
        std::str::from_utf8(self.tokens[id].span.fragment(self.source)).unwrap_or_default()
    }

    /// Printable text of any token.
    #[inline]
    pub fn text(&self, id: TokenId) -> Cow<'a, str> {
        self.tokens[id].span.text(self.source)
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.peek_kind(0) == TokenKind::EOF
    }

    /// Consumes the current token regardless of type.
    ///
    /// The cursor stays put on the EOF token.
    #[inline]
    pub fn next_token(&mut self) -> TokenId {
        let id = self.current();
        if !self.at_end() {
            self.pos += 1;
        }
        id
    }

    /// Consumes the current token if it matches the given token kind.
    ///
    /// Returns true when matched. Does not consume the token if the
    /// types do not match.
    pub fn match_token(&mut self, token_kind: TokenKind) -> bool {
        let is_match = self.peek_kind(0) == token_kind;
        if is_match {
            self.next_token();
        }
        is_match
    }

    /// Return the current token and advance the cursor.
    ///
    /// The consumed token must match the given token kind, otherwise
    /// an error is returned and the cursor is not advanced.
    pub fn consume(&mut self, token_kind: TokenKind) -> Result<TokenId, TokenError> {
        let encountered = self.current();
        if self.token(encountered).kind != token_kind {
            Err(TokenError {
                expected: token_kind,
                encountered,
            })
        } else {
            Ok(self.next_token())
        }
    }
}

/// Error returned when an unexpected token type is encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenError {
    pub expected: TokenKind,
    pub encountered: TokenId,
}

impl error::Error for TokenError {}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "expected token '{}'", self.expected)
    }
}
