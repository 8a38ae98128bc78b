//! Function body statements.
use super::{PResult, Parser};
use crate::{
    arena::StmtId,
    ast::{Stmt, StmtKind},
    diagnostics::ParseErrorKind,
    tokens::{Keyword, TokenKind},
};

impl<'t, 'a> Parser<'t, 'a> {
    pub(super) fn parse_stmt(&mut self) -> PResult<StmtId> {
        let token = self.input.current();

        let kind = match self.input.token(token).kind {
            TokenKind::Keyword(Keyword::Let) => {
                self.input.next_token();
                let lvalue = self.parse_lvalue()?;
                self.expect(TokenKind::Equals)?;
                let expr = self.parse_expr()?;
                StmtKind::Let { lvalue, expr }
            }
            TokenKind::Keyword(Keyword::Assert) => {
                self.input.next_token();
                let (expr, msg) = self.parse_assertion()?;
                StmtKind::Assert { expr, msg }
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.input.next_token();
                let expr = self.parse_expr()?;
                StmtKind::Return { expr }
            }
            _ => return Err(self.error_here(ParseErrorKind::InvalidStatement, "STATEMENT")),
        };

        Ok(self.ast.stmts.push(Stmt { token, kind }))
    }
}

#[cfg(test)]
mod test {
    use crate::{
        ast::{CmdKind, StmtKind},
        diagnostics::{DiagnosticKind, ParseErrorKind},
        lexer::Lexer,
        parsing::parse,
    };

    #[test]
    fn test_body_statements() {
        let source = "fn f(x : int) : int {\n  let y = x * 2\n  assert y > 0, \"positive\"\n  return y\n}\n";
        let (tokens, _) = Lexer::new(source).tokenize();
        let parsed = parse(&tokens, source);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

        let body = match &parsed.ast.cmds[parsed.commands[0]].kind {
            CmdKind::Fn { body, .. } => body.clone(),
            other => panic!("expected fn, found {:?}", other),
        };
        let kinds: Vec<_> = body
            .iter()
            .map(|stmt| parsed.ast.stmts[stmt.expect("parsed")].kind.clone())
            .collect();

        assert!(matches!(kinds[0], StmtKind::Let { .. }));
        assert!(matches!(kinds[1], StmtKind::Assert { msg: "\"positive\"", .. }));
        assert!(matches!(kinds[2], StmtKind::Return { .. }));
    }

    #[test]
    fn test_bad_statement_keeps_the_rest() {
        let source = "fn f() : int {\n  show 1\n  return 2\n}\nshow 3\n";
        let (tokens, _) = Lexer::new(source).tokenize();
        let parsed = parse(&tokens, source);

        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(
            parsed.diagnostics[0].kind,
            DiagnosticKind::Parse(ParseErrorKind::InvalidStatement)
        );
        assert_eq!(parsed.commands.len(), 2);
        match &parsed.ast.cmds[parsed.commands[0]].kind {
            CmdKind::Fn { body, .. } => {
                assert_eq!(body.len(), 2);
                assert!(body[0].is_none());
                assert!(body[1].is_some());
            }
            other => panic!("expected fn, found {:?}", other),
        }
    }
}
