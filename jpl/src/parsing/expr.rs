//! Expression parsing.
use super::{PResult, Parser};
use crate::{
    arena::{ExprId, TokenId},
    ast::{BinOp, Expr, ExprKind, LoopBind, UnOp},
    diagnostics::{Diagnostic, ParseErrorKind},
    tokens::{Keyword, TokenKind},
};

impl<'t, 'a> Parser<'t, 'a> {
    pub(super) fn parse_expr(&mut self) -> PResult<ExprId> {
        self.parse_binary(0)
    }

    /// Precedence climbing over the binary operators.
    ///
    /// The right operand only takes operators that bind strictly
    /// tighter, which keeps chains of equal precedence left associative.
    fn parse_binary(&mut self, min_precedence: u8) -> PResult<ExprId> {
        let mut lhs = self.parse_unary()?;

        while let Some(op) = self.peek_binop() {
            if op.precedence() < min_precedence {
                break;
            }

            let token = self.input.next_token();
            let rhs = self.parse_binary(op.precedence() + 1)?;
            lhs = self.push_expr(token, ExprKind::Binary { op, lhs, rhs });
        }

        Ok(lhs)
    }

    fn peek_binop(&self) -> Option<BinOp> {
        let token = self.input.current();
        match self.input.token(token).kind {
            TokenKind::Op => BinOp::parse(self.input.fragment(token)),
            _ => None,
        }
    }

    fn parse_unary(&mut self) -> PResult<ExprId> {
        let token = self.input.current();
        let op = match self.input.token(token).kind {
            TokenKind::Op => UnOp::parse(self.input.fragment(token)),
            _ => None,
        };

        match op {
            Some(op) => {
                self.input.next_token();
                let operand = self.parse_unary()?;
                Ok(self.push_expr(token, ExprKind::Unary { op, operand }))
            }
            None => self.parse_postfix(),
        }
    }

    /// Member access and indexing, applied left to right after an atom.
    fn parse_postfix(&mut self) -> PResult<ExprId> {
        let mut expr = self.parse_atom()?;

        loop {
            match self.input.peek_kind(0) {
                TokenKind::Dot => {
                    let token = self.input.next_token();
                    let member = self.expect(TokenKind::Variable)?;
                    let member = self.input.fragment(member);
                    expr = self.push_expr(token, ExprKind::Dot { base: expr, member });
                }
                TokenKind::LeftBracket => {
                    let open = self.input.next_token();
                    let indices = self.parse_list(
                        open,
                        TokenKind::RightBracket,
                        ParseErrorKind::MissingBracket,
                        Self::parse_expr,
                    )?;
                    expr = self.push_expr(open, ExprKind::Index { base: expr, indices });
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_atom(&mut self) -> PResult<ExprId> {
        use Keyword as K;
        use TokenKind as TK;

        let token = self.input.current();
        match self.input.token(token).kind {
            TK::IntVal => {
                self.input.next_token();
                let value = self.parse_int(token);
                Ok(self.push_expr(token, ExprKind::Int(value)))
            }
            TK::FloatVal => {
                self.input.next_token();
                let value = self.parse_float(token);
                Ok(self.push_expr(token, ExprKind::Float(value)))
            }
            TK::Keyword(K::True) => {
                self.input.next_token();
                Ok(self.push_expr(token, ExprKind::True))
            }
            TK::Keyword(K::False) => {
                self.input.next_token();
                Ok(self.push_expr(token, ExprKind::False))
            }
            TK::Keyword(K::Void) => {
                self.input.next_token();
                Ok(self.push_expr(token, ExprKind::Void))
            }
            TK::Variable => self.parse_name(),
            TK::LeftBracket => {
                let open = self.input.next_token();
                let elems = self.parse_list(
                    open,
                    TK::RightBracket,
                    ParseErrorKind::MissingBracket,
                    Self::parse_expr,
                )?;
                Ok(self.push_expr(open, ExprKind::ArrayLit(elems)))
            }
            TK::LeftParen => {
                let open = self.input.next_token();
                let inner = self.parse_expr()?;
                match self.input.peek_kind(0) {
                    TK::RightParen => {
                        self.input.next_token();
                        Ok(inner)
                    }
                    TK::Newline | TK::EOF => Err(self.unclosed(open, ParseErrorKind::MissingParen)),
                    _ => Err(self.error_here(ParseErrorKind::UnexpectedToken, "RPAREN")),
                }
            }
            TK::Keyword(K::If) => self.parse_if(),
            TK::Keyword(K::Array) | TK::Keyword(K::Sum) => self.parse_loop(),
            _ => Err(self.error_here(ParseErrorKind::InvalidExpression, "EXPRESSION")),
        }
    }

    /// Variable reference, call or struct literal.
    fn parse_name(&mut self) -> PResult<ExprId> {
        let token = self.input.next_token();
        let name = self.input.fragment(token);

        match self.input.peek_kind(0) {
            TokenKind::LeftParen => {
                let open = self.input.next_token();
                let args = self.parse_list(
                    open,
                    TokenKind::RightParen,
                    ParseErrorKind::MissingParen,
                    Self::parse_expr,
                )?;
                Ok(self.push_expr(token, ExprKind::Call { name, args }))
            }
            TokenKind::LeftBrace => {
                let open = self.input.next_token();
                let args = self.parse_list(
                    open,
                    TokenKind::RightBrace,
                    ParseErrorKind::MissingBrace,
                    Self::parse_expr,
                )?;
                Ok(self.push_expr(token, ExprKind::StructLit { name, args }))
            }
            _ => Ok(self.push_expr(token, ExprKind::Var(name))),
        }
    }

    /// `if cond then a else b`
    fn parse_if(&mut self) -> PResult<ExprId> {
        let token = self.expect(TokenKind::Keyword(Keyword::If))?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Keyword(Keyword::Then))?;
        let then = self.parse_expr()?;
        self.expect(TokenKind::Keyword(Keyword::Else))?;
        let els = self.parse_expr()?;

        Ok(self.push_expr(token, ExprKind::If { cond, then, els }))
    }

    /// `array[i : n, ...] body` or `sum[i : n, ...] body`
    fn parse_loop(&mut self) -> PResult<ExprId> {
        let token = self.input.next_token();
        let is_sum = self.input.token(token).kind == TokenKind::Keyword(Keyword::Sum);

        let open = self.expect(TokenKind::LeftBracket)?;
        let binds = self.parse_list(
            open,
            TokenKind::RightBracket,
            ParseErrorKind::MissingBracket,
            Self::parse_loop_bind,
        )?;
        let body = self.parse_expr()?;

        let kind = if is_sum {
            ExprKind::SumLoop { binds, body }
        } else {
            ExprKind::ArrayLoop { binds, body }
        };
        Ok(self.push_expr(token, kind))
    }

    fn parse_loop_bind(&mut self) -> PResult<LoopBind> {
        let token = self.expect(TokenKind::Variable)?;
        self.expect_or(TokenKind::Colon, ParseErrorKind::MissingColon)?;
        let bound = self.parse_expr()?;

        let var = self.ast.push_var(Some(token), self.input.fragment(token));
        Ok(LoopBind { var, bound })
    }

    /// Integer literal value, saturating on overflow.
    fn parse_int(&mut self, token: TokenId) -> i64 {
        match self.input.fragment(token).parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                self.report(Diagnostic::new(ParseErrorKind::IntRange, token));
                i64::MAX
            }
        }
    }

    /// Float literal value, infinite on overflow.
    fn parse_float(&mut self, token: TokenId) -> f64 {
        let value = self.input.fragment(token).parse::<f64>().unwrap_or(f64::INFINITY);
        if value.is_infinite() {
            self.report(Diagnostic::new(ParseErrorKind::FloatRange, token));
        }
        value
    }

    #[inline]
    fn push_expr(&mut self, token: TokenId, kind: ExprKind<'a>) -> ExprId {
        self.ast.exprs.push(Expr { token, kind, ty: None })
    }
}

#[cfg(test)]
mod test {
    use crate::{
        arena::ExprId,
        ast::{Ast, BinOp, CmdKind, ExprKind, UnOp},
        diagnostics::{DiagnosticKind, ParseErrorKind},
        lexer::Lexer,
        parsing::{parse, Parsed},
    };

    fn parse_str(source: &str) -> Parsed<'_> {
        let (tokens, _) = Lexer::new(source).tokenize();
        parse(&tokens, source)
    }

    /// Expression of a single `show` command.
    fn shown(parsed: &Parsed) -> ExprId {
        match parsed.ast.cmds[parsed.commands[0]].kind {
            CmdKind::Show { expr } => expr,
            ref other => panic!("expected show, found {:?}", other),
        }
    }

    /// Compact prefix rendering for assertions.
    fn sexpr(ast: &Ast, expr: ExprId) -> String {
        match &ast.exprs[expr].kind {
            ExprKind::Int(value) => value.to_string(),
            ExprKind::Var(name) => name.to_string(),
            ExprKind::Binary { op, lhs, rhs } => {
                format!("({} {} {})", op, sexpr(ast, *lhs), sexpr(ast, *rhs))
            }
            ExprKind::Unary { op, operand } => format!("({} {})", op, sexpr(ast, *operand)),
            ExprKind::Dot { base, member } => format!("(. {} {})", sexpr(ast, *base), member),
            ExprKind::Index { base, indices } => format!(
                "([] {} {})",
                sexpr(ast, *base),
                indices.iter().map(|i| sexpr(ast, *i)).collect::<Vec<_>>().join(" ")
            ),
            other => format!("{:?}", other),
        }
    }

    fn expr_str(source: &str) -> String {
        let parsed = parse_str(source);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        sexpr(&parsed.ast, shown(&parsed))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(expr_str("show 1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(expr_str("show 1 * 2 + 3"), "(+ (* 1 2) 3)");
        assert_eq!(expr_str("show a < b + 1 && c"), "(&& (< a (+ b 1)) c)");
        assert_eq!(expr_str("show a == b || c != d"), "(|| (== a b) (!= c d))");
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(expr_str("show 1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(expr_str("show 8 / 4 % 3"), "(% (/ 8 4) 3)");
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(expr_str("show (1 + 2) * 3"), "(* (+ 1 2) 3)");
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        assert_eq!(expr_str("show -a * b"), "(* (- a) b)");
        assert_eq!(expr_str("show !!a"), "(! (! a))");
        assert_eq!(expr_str("show -p.x"), "(- (. p x))");
    }

    #[test]
    fn test_postfix_chain() {
        assert_eq!(expr_str("show a[1, 2].x[3]"), "([] (. ([] a 1 2) x) 3)");
    }

    #[test]
    fn test_loops_and_if() {
        let parsed = parse_str("show sum[i : 10, j : n] if i < j then i else j\n");
        assert!(parsed.diagnostics.is_empty());

        match &parsed.ast.exprs[shown(&parsed)].kind {
            ExprKind::SumLoop { binds, body } => {
                assert_eq!(binds.len(), 2);
                assert_eq!(parsed.ast.vars[binds[1].var].name, "j");
                assert!(matches!(parsed.ast.exprs[*body].kind, ExprKind::If { .. }));
            }
            other => panic!("expected sum loop, found {:?}", other),
        }
    }

    #[test]
    fn test_calls_and_struct_literals() {
        let parsed = parse_str("show f(1, g(2))\nshow P{1.0, true}\n");
        assert!(parsed.diagnostics.is_empty());

        assert!(matches!(
            &parsed.ast.exprs[shown(&parsed)].kind,
            ExprKind::Call { name: "f", args } if args.len() == 2
        ));
        match parsed.ast.cmds[parsed.commands[1]].kind {
            CmdKind::Show { expr } => assert!(matches!(
                &parsed.ast.exprs[expr].kind,
                ExprKind::StructLit { name: "P", args } if args.len() == 2
            )),
            ref other => panic!("expected show, found {:?}", other),
        }
    }

    #[test]
    fn test_int_range() {
        let parsed = parse_str("show 99999999999999999999\n");

        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(
            parsed.diagnostics[0].kind,
            DiagnosticKind::Parse(ParseErrorKind::IntRange)
        );
        // The literal is still installed.
        assert_eq!(parsed.commands.len(), 1);
        assert_eq!(parsed.ast.exprs[shown(&parsed)].kind, ExprKind::Int(i64::MAX));
    }

    #[test]
    fn test_float_range() {
        let source = format!("show {}.0\n", "9".repeat(400));
        let parsed = parse_str(&source);

        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(
            parsed.diagnostics[0].kind,
            DiagnosticKind::Parse(ParseErrorKind::FloatRange)
        );
    }

    #[test]
    fn test_missing_then() {
        let parsed = parse_str("show if a 1 else 2\n");
        assert_eq!(
            parsed.diagnostics[0].kind,
            DiagnosticKind::Parse(ParseErrorKind::UnexpectedToken)
        );
        assert_eq!(parsed.diagnostics[0].hint.as_deref(), Some("expected 'then', found '1'"));
    }

    #[test]
    fn test_unary_op_kinds() {
        let parsed = parse_str("show -1\n");
        assert!(matches!(
            parsed.ast.exprs[shown(&parsed)].kind,
            ExprKind::Unary { op: UnOp::Neg, .. }
        ));
        let parsed = parse_str("show 1 >= 2\n");
        assert!(matches!(
            parsed.ast.exprs[shown(&parsed)].kind,
            ExprKind::Binary { op: BinOp::Ge, .. }
        ));
    }
}
