//! Type annotations.
use super::{PResult, Parser};
use crate::{
    arena::TypeId,
    ast::TypeKind,
    diagnostics::ParseErrorKind,
    tokens::{Keyword, TokenKind},
};

impl<'t, 'a> Parser<'t, 'a> {
    /// Base type followed by any number of array suffixes.
    ///
    /// Each suffix wraps the type so far, so `int[][,]` is a rank 2
    /// array of rank 1 arrays of int.
    pub(super) fn parse_type(&mut self) -> PResult<TypeId> {
        let token = self.input.current();
        let kind = match self.input.token(token).kind {
            TokenKind::Keyword(Keyword::Int) => TypeKind::Int,
            TokenKind::Keyword(Keyword::Float) => TypeKind::Float,
            TokenKind::Keyword(Keyword::Bool) => TypeKind::Bool,
            TokenKind::Keyword(Keyword::Void) => TypeKind::Void,
            TokenKind::Variable => TypeKind::Struct {
                name: self.input.fragment(token),
                decl: None,
            },
            _ => return Err(self.error_here(ParseErrorKind::InvalidType, "TYPE")),
        };
        self.input.next_token();

        let mut ty = self.ast.push_type(Some(token), kind);

        while self.input.peek_kind(0) == TokenKind::LeftBracket {
            let open = self.input.next_token();
            let mut rank = 1;

            loop {
                match self.input.peek_kind(0) {
                    TokenKind::Comma => rank += 1,
                    TokenKind::RightBracket => break,
                    TokenKind::Newline | TokenKind::EOF => {
                        return Err(self.unclosed(open, ParseErrorKind::MissingBracket));
                    }
                    _ => return Err(self.error_here(ParseErrorKind::InvalidType, "COMMA or RSQUARE")),
                }
                self.input.next_token();
            }
            self.input.next_token();

            ty = self.ast.push_type(Some(open), TypeKind::Array { elem: ty, rank });
        }

        Ok(ty)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        ast::{CmdKind, TypeKind},
        diagnostics::{DiagnosticKind, ParseErrorKind},
        lexer::Lexer,
        parsing::parse,
    };

    #[test]
    fn test_array_rank_from_commas() {
        let source = "fn f() : float[,,][] {\n}\n";
        let (tokens, _) = Lexer::new(source).tokenize();
        let parsed = parse(&tokens, source);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

        let ret = match parsed.ast.cmds[parsed.commands[0]].kind {
            CmdKind::Fn { ret, .. } => ret,
            ref other => panic!("expected fn, found {:?}", other),
        };
        let inner = match parsed.ast.types[ret].kind {
            TypeKind::Array { elem, rank: 1 } => elem,
            ref other => panic!("unexpected type {:?}", other),
        };
        let base = match parsed.ast.types[inner].kind {
            TypeKind::Array { elem, rank: 3 } => elem,
            ref other => panic!("unexpected type {:?}", other),
        };
        assert_eq!(parsed.ast.types[base].kind, TypeKind::Float);
    }

    #[test]
    fn test_invalid_types() {
        for (source, expected) in [
            ("fn f() : 3 {\n}\n", ParseErrorKind::InvalidType),
            ("fn f() : int[3] {\n}\n", ParseErrorKind::InvalidType),
            ("fn f() : int[,\n", ParseErrorKind::MissingBracket),
        ] {
            let (tokens, _) = Lexer::new(source).tokenize();
            let parsed = parse(&tokens, source);
            assert_eq!(
                parsed.diagnostics[0].kind,
                DiagnosticKind::Parse(expected),
                "{}",
                source
            );
        }
    }
}
