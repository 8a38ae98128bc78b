//! Comma delimited lists between brackets.
use super::{PResult, Parser, Recover};
use crate::{
    arena::TokenId,
    diagnostics::{Diagnostic, ParseErrorKind},
    tokens::TokenKind,
};

impl<'t, 'a> Parser<'t, 'a> {
    /// Parse the items of a list whose opening delimiter has already
    /// been consumed, up to and including the closing delimiter.
    ///
    /// A line ending before the list is closed reports `unclosed`,
    /// spanning from the opening delimiter to where the line ended.
    /// Any other stray token is a missing comma. After an error the
    /// stream is left on the matching closing delimiter's successor,
    /// or in front of the newline that cut the list short.
    pub(super) fn parse_list<T>(
        &mut self,
        open: TokenId,
        close: TokenKind,
        unclosed: ParseErrorKind,
        mut item: impl FnMut(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        let mut items = Vec::new();

        if self.input.match_token(close) {
            return Ok(items);
        }

        loop {
            match item(self) {
                Ok(value) => items.push(value),
                Err(Recover) => {
                    self.recover_list(close);
                    return Err(Recover);
                }
            }

            match self.input.peek_kind(0) {
                TokenKind::Comma => {
                    self.input.next_token();
                }
                kind if kind == close => {
                    self.input.next_token();
                    return Ok(items);
                }
                TokenKind::Newline | TokenKind::EOF => {
                    return Err(self.unclosed(open, unclosed));
                }
                _ => {
                    self.error_here(ParseErrorKind::MissingComma, "COMMA");
                    self.recover_list(close);
                    return Err(Recover);
                }
            }
        }
    }

    /// Report a bracket left open at the end of a line.
    pub(super) fn unclosed(&mut self, open: TokenId, kind: ParseErrorKind) -> Recover {
        let resync = self.input.current();
        let hint = format!("found '{}' before the closing delimiter", self.describe(resync));
        self.report(
            Diagnostic::new(kind, open)
                .with_secondary(resync)
                .with_hint(hint),
        )
    }

    /// Skip past the closing delimiter of the list being parsed, or up
    /// to the end of the line, whichever comes first.
    fn recover_list(&mut self, close: TokenKind) {
        let mut depth = 0_usize;
        loop {
            match self.input.peek_kind(0) {
                TokenKind::Newline | TokenKind::EOF => return,
                kind if kind == close && depth == 0 => {
                    self.input.next_token();
                    return;
                }
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => depth += 1,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.input.next_token();
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        diagnostics::{DiagnosticKind, Label, ParseErrorKind},
        lexer::Lexer,
        parsing::parse,
    };

    fn diagnostics(source: &str) -> Vec<DiagnosticKind> {
        let (tokens, _) = Lexer::new(source).tokenize();
        parse(&tokens, source)
            .diagnostics
            .into_iter()
            .map(|diagnostic| diagnostic.kind)
            .collect()
    }

    #[test]
    fn test_unclosed_call_spans_to_newline() {
        let source = "show f(1, 2\nshow 3\n";
        let (tokens, _) = Lexer::new(source).tokenize();
        let parsed = parse(&tokens, source);

        assert_eq!(parsed.diagnostics.len(), 1);
        let diagnostic = &parsed.diagnostics[0];
        assert_eq!(diagnostic.kind, DiagnosticKind::Parse(ParseErrorKind::MissingParen));

        match (diagnostic.primary, diagnostic.secondary) {
            (Label::Token(open), Some(Label::Token(resync))) => {
                assert_eq!(tokens[open].text(source.as_bytes()), "(");
                assert_eq!(tokens[resync].text(source.as_bytes()), "\n");
            }
            other => panic!("unexpected labels {:?}", other),
        }
        assert_eq!(parsed.commands.len(), 1);
    }

    #[test]
    fn test_missing_comma() {
        assert_eq!(
            diagnostics("show [1 2]\nshow {\n"),
            vec![
                DiagnosticKind::Parse(ParseErrorKind::MissingComma),
                DiagnosticKind::Parse(ParseErrorKind::InvalidExpression),
            ]
        );
    }

    #[test]
    fn test_unclosed_bracket() {
        assert_eq!(
            diagnostics("show [1, 2\n"),
            vec![DiagnosticKind::Parse(ParseErrorKind::MissingBracket)]
        );
    }

    #[test]
    fn test_empty_lists() {
        assert!(diagnostics("show f()\nshow []\n").is_empty());
    }
}
