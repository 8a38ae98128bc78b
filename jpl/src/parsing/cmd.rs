//! Top-level commands and declarations.
use super::{PResult, Parser, Recover};
use crate::{
    arena::{CmdId, ExprId, TokenId},
    ast::{Cmd, CmdKind},
    diagnostics::ParseErrorKind,
    tokens::{Keyword, TokenKind},
};

impl<'t, 'a> Parser<'t, 'a> {
    pub(super) fn parse_cmd(&mut self) -> PResult<CmdId> {
        use Keyword as K;

        let token = self.input.current();
        let kind = match self.input.token(token).kind {
            TokenKind::Keyword(K::Read) => {
                self.input.next_token();
                self.expect(TokenKind::Keyword(K::Image))?;
                let file = self.parse_string()?;
                self.expect(TokenKind::Keyword(K::To))?;
                let lvalue = self.parse_lvalue()?;
                CmdKind::Read { file, lvalue }
            }
            TokenKind::Keyword(K::Write) => {
                self.input.next_token();
                self.expect(TokenKind::Keyword(K::Image))?;
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Keyword(K::To))?;
                let file = self.parse_string()?;
                CmdKind::Write { expr, file }
            }
            TokenKind::Keyword(K::Let) => {
                self.input.next_token();
                let lvalue = self.parse_lvalue()?;
                self.expect(TokenKind::Equals)?;
                let expr = self.parse_expr()?;
                CmdKind::Let { lvalue, expr }
            }
            TokenKind::Keyword(K::Assert) => {
                self.input.next_token();
                let (expr, msg) = self.parse_assertion()?;
                CmdKind::Assert { expr, msg }
            }
            TokenKind::Keyword(K::Print) => {
                self.input.next_token();
                let msg = self.parse_string()?;
                CmdKind::Print { msg }
            }
            TokenKind::Keyword(K::Show) => {
                self.input.next_token();
                let expr = self.parse_expr()?;
                CmdKind::Show { expr }
            }
            TokenKind::Keyword(K::Time) => {
                self.input.next_token();
                CmdKind::Time(self.parse_cmd()?)
            }
            TokenKind::Keyword(K::Fn) => self.parse_fn()?,
            TokenKind::Keyword(K::Struct) => self.parse_struct()?,
            _ => return Err(self.error_here(ParseErrorKind::InvalidCommand, "COMMAND")),
        };

        Ok(self.ast.cmds.push(Cmd {
            token: Some(token),
            kind,
        }))
    }

    /// `expr , "message"`, shared by the command and statement forms.
    pub(super) fn parse_assertion(&mut self) -> PResult<(ExprId, &'a str)> {
        let expr = self.parse_expr()?;
        self.expect_or(TokenKind::Comma, ParseErrorKind::MissingComma)?;
        let msg = self.parse_string()?;
        Ok((expr, msg))
    }

    /// String literal, quotes included.
    fn parse_string(&mut self) -> PResult<&'a str> {
        let token = self.expect_or(TokenKind::String, ParseErrorKind::MissingString)?;
        Ok(self.input.fragment(token))
    }

    /// `fn name(bindings) : type { statements }`
    fn parse_fn(&mut self) -> PResult<CmdKind<'a>> {
        self.input.next_token();
        let name = self.expect(TokenKind::Variable)?;
        let name = self.input.fragment(name);

        let open = self.expect(TokenKind::LeftParen)?;
        let params = self.parse_list(
            open,
            TokenKind::RightParen,
            ParseErrorKind::MissingParen,
            Self::parse_binding,
        )?;
        self.expect_or(TokenKind::Colon, ParseErrorKind::MissingColon)?;
        let ret = self.parse_type()?;

        let open = self.open_block()?;
        let mut body = Vec::new();

        loop {
            match self.input.peek_kind(0) {
                TokenKind::RightBrace => {
                    self.input.next_token();
                    break;
                }
                TokenKind::EOF => return Err(self.unclosed(open, ParseErrorKind::MissingBrace)),
                TokenKind::Newline => {
                    self.input.next_token();
                }
                _ => match self.parse_stmt() {
                    Ok(stmt) => {
                        body.push(Some(stmt));
                        self.end_block_line();
                    }
                    Err(Recover) => {
                        body.push(None);
                        self.skip_statement();
                    }
                },
            }
        }

        Ok(CmdKind::Fn {
            name,
            params,
            ret,
            body,
        })
    }

    /// `struct name { member : type ... }`
    fn parse_struct(&mut self) -> PResult<CmdKind<'a>> {
        self.input.next_token();
        let name = self.expect(TokenKind::Variable)?;
        let name = self.input.fragment(name);

        let open = self.open_block()?;
        let mut members = Vec::new();

        loop {
            match self.input.peek_kind(0) {
                TokenKind::RightBrace => {
                    self.input.next_token();
                    break;
                }
                TokenKind::EOF => return Err(self.unclosed(open, ParseErrorKind::MissingBrace)),
                TokenKind::Newline => {
                    self.input.next_token();
                }
                _ => match self.parse_member() {
                    Ok(member) => {
                        members.push(Some(member));
                        self.end_block_line();
                    }
                    Err(Recover) => {
                        members.push(None);
                        self.skip_statement();
                    }
                },
            }
        }

        Ok(CmdKind::Struct { name, members })
    }

    /// Opening brace of a block and the line break after it.
    fn open_block(&mut self) -> PResult<TokenId> {
        let open = self.expect_or(TokenKind::LeftBrace, ParseErrorKind::MissingBrace)?;
        self.input.match_token(TokenKind::Newline);
        Ok(open)
    }

    /// A line inside a block ends with a newline or the closing brace.
    fn end_block_line(&mut self) {
        match self.input.peek_kind(0) {
            TokenKind::Newline => {
                self.input.next_token();
            }
            TokenKind::RightBrace => {}
            _ => {
                self.missing_newline();
                self.skip_statement();
            }
        }
    }
}
