//! Syntactic analysis.
//!
//! Recursive descent for commands and statements, precedence climbing
//! for binary expressions. Every production appends its nodes to the
//! shared [`Ast`] arenas and hands back a handle.
//!
//! Errors are recorded as diagnostics the moment they are found. The
//! failing production then returns [`Recover`] and the nearest command
//! or statement boundary resynchronizes, so a single parse reports
//! every independent syntax error.
mod cmd;
mod delim;
mod expr;
mod lvalue;
mod stmt;
mod ty;

use log::debug;
use smol_str::SmolStr;

use crate::{
    arena::{CmdId, TokenId},
    ast::Ast,
    diagnostics::{Diagnostic, ParseErrorKind},
    token_stream::TokenStream,
    tokens::{TokenKind, TokenVec},
};

/// Marker error: a diagnostic has been recorded and the caller
/// should resynchronize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recover;

pub type PResult<T> = Result<T, Recover>;

/// Output of the parser.
#[derive(Debug)]
pub struct Parsed<'a> {
    pub ast: Ast<'a>,
    /// Top-level commands in source order.
    pub commands: Vec<CmdId>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a lexed compilation unit.
pub fn parse<'a>(tokens: &TokenVec, source: &'a (impl AsRef<[u8]> + ?Sized)) -> Parsed<'a> {
    let mut parser = Parser::new(TokenStream::new(tokens, source));
    parser.parse_program();

    debug!(
        "parsed {} commands, {} errors",
        parser.commands.len(),
        parser.diagnostics.len()
    );

    Parsed {
        ast: parser.ast,
        commands: parser.commands,
        diagnostics: parser.diagnostics,
    }
}

pub struct Parser<'t, 'a> {
    input: TokenStream<'t, 'a>,
    ast: Ast<'a>,
    commands: Vec<CmdId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(input: TokenStream<'t, 'a>) -> Self {
        Self {
            input,
            ast: Ast::new(),
            commands: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn parse_program(&mut self) {
        while !self.input.at_end() {
            // Leading newline, or recovery stopped in front of one.
            if self.input.match_token(TokenKind::Newline) {
                continue;
            }

            let cmd = match self.parse_cmd() {
                Ok(cmd) => cmd,
                Err(Recover) => {
                    self.synchronize();
                    continue;
                }
            };

            match self.input.peek_kind(0) {
                TokenKind::Newline => {
                    self.input.next_token();
                }
                TokenKind::EOF => {}
                _ => {
                    self.missing_newline();
                    self.synchronize();
                }
            }

            self.commands.push(cmd);
        }
    }

    /// Skip to the start of the next command.
    ///
    /// Consumes everything up to and including the next newline outside
    /// of braces, so a broken function or struct header does not leave
    /// its body to be parsed as commands.
    fn synchronize(&mut self) {
        let mut depth = 0_usize;
        loop {
            match self.input.peek_kind(0) {
                TokenKind::EOF => return,
                TokenKind::Newline if depth == 0 => {
                    self.input.next_token();
                    return;
                }
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.input.next_token();
        }
    }

    /// Skip to the start of the next statement of a block.
    ///
    /// Stops in front of the closing brace of the enclosing block.
    fn skip_statement(&mut self) {
        let mut depth = 0_usize;
        loop {
            match self.input.peek_kind(0) {
                TokenKind::EOF => return,
                TokenKind::Newline if depth == 0 => {
                    self.input.next_token();
                    return;
                }
                TokenKind::RightBrace if depth == 0 => return,
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => depth -= 1,
                _ => {}
            }
            self.input.next_token();
        }
    }

    // ------------------------------------------------------------------------
    // Diagnostics

    fn report(&mut self, diagnostic: Diagnostic) -> Recover {
        self.diagnostics.push(diagnostic);
        Recover
    }

    /// Record an error at the current token, naming what was found.
    fn error_here(&mut self, kind: ParseErrorKind, expected: &str) -> Recover {
        let token = self.input.current();
        let hint = format!("expected {}, found '{}'", expected, self.describe(token));
        self.report(Diagnostic::new(kind, token).with_hint(hint))
    }

    fn missing_newline(&mut self) -> Recover {
        self.error_here(ParseErrorKind::MissingNewline, "NEWLINE")
    }

    /// Consume a token of the given kind.
    ///
    /// A line that ends early is a [`ParseErrorKind::MissingToken`], any
    /// other token in the way is a [`ParseErrorKind::UnexpectedToken`].
    fn expect(&mut self, kind: TokenKind) -> PResult<TokenId> {
        match self.input.consume(kind) {
            Ok(token) => Ok(token),
            Err(err) => {
                let code = match self.input.token(err.encountered).kind {
                    TokenKind::Newline | TokenKind::EOF => ParseErrorKind::MissingToken,
                    _ => ParseErrorKind::UnexpectedToken,
                };
                let expected = describe_kind(err.expected);
                Err(self.error_here(code, &expected))
            }
        }
    }

    /// Consume a token of the given kind, reporting `code` if it is absent.
    fn expect_or(&mut self, kind: TokenKind, code: ParseErrorKind) -> PResult<TokenId> {
        match self.input.consume(kind) {
            Ok(token) => Ok(token),
            Err(err) => {
                let expected = describe_kind(err.expected);
                Err(self.error_here(code, &expected))
            }
        }
    }

    /// Human readable text of a token for hints.
    fn describe(&self, token: TokenId) -> SmolStr {
        match self.input.token(token).kind {
            kind @ (TokenKind::Newline | TokenKind::EOF) => SmolStr::new(kind.name()),
            _ => SmolStr::new(self.input.text(token)),
        }
    }
}

fn describe_kind(kind: TokenKind) -> SmolStr {
    match kind {
        TokenKind::Keyword(keyword) => SmolStr::new(format!("'{}'", keyword)),
        other => SmolStr::new(other.name()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ast::CmdKind, diagnostics::DiagnosticKind, lexer::Lexer};

    fn parse_str(source: &str) -> Parsed<'_> {
        let (tokens, _) = Lexer::new(source).tokenize();
        parse(&tokens, source)
    }

    #[test]
    fn test_commands_in_order() {
        let parsed = parse_str("print \"a\"\nshow 1\nprint \"b\"\n");

        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.commands.len(), 3);
        assert!(matches!(
            parsed.ast.cmds[parsed.commands[1]].kind,
            CmdKind::Show { .. }
        ));
    }

    #[test]
    fn test_missing_trailing_newline_is_fine_at_eof() {
        let parsed = parse_str("show 1");
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.commands.len(), 1);
    }

    #[test]
    fn test_leading_blank_lines() {
        let parsed = parse_str("\n\n\nshow 1\n");
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.commands.len(), 1);
    }

    #[test]
    fn test_illegal_byte_in_hint() {
        let source = b"show \xFF\n";
        let (tokens, _) = Lexer::new(source).tokenize();
        let parsed = parse(&tokens, source);

        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(
            parsed.diagnostics[0].hint.as_deref(),
            Some("expected EXPRESSION, found '\u{FFFD}'")
        );
    }

    #[test]
    fn test_trailing_junk() {
        let parsed = parse_str("show 1 2\nshow 3\n");

        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(
            parsed.diagnostics[0].kind,
            DiagnosticKind::Parse(ParseErrorKind::MissingNewline)
        );
        assert_eq!(parsed.commands.len(), 2);
    }

    #[test]
    fn test_recovery_skips_function_body() {
        let parsed = parse_str("fn f(x int) : int {\n  return x\n}\nshow 1\n");

        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(
            parsed.diagnostics[0].kind,
            DiagnosticKind::Parse(ParseErrorKind::MissingColon)
        );
        assert_eq!(parsed.commands.len(), 1);
    }
}
