//! Assignment targets and typed bindings.
use super::{PResult, Parser};
use crate::{
    arena::{BindingId, LValueId, VarId},
    ast::{Binding, LValue, LValueKind},
    diagnostics::ParseErrorKind,
    tokens::TokenKind,
};

impl<'t, 'a> Parser<'t, 'a> {
    /// `name` or `name[i, j]`
    pub(super) fn parse_lvalue(&mut self) -> PResult<LValueId> {
        let token = match self.input.consume(TokenKind::Variable) {
            Ok(token) => token,
            Err(_) => return Err(self.error_here(ParseErrorKind::InvalidLValue, "VARIABLE")),
        };
        let var = self.ast.push_var(Some(token), self.input.fragment(token));

        let kind = if self.input.peek_kind(0) == TokenKind::LeftBracket {
            let open = self.input.next_token();
            let indices = self.parse_list(
                open,
                TokenKind::RightBracket,
                ParseErrorKind::MissingBracket,
                Self::parse_index_var,
            )?;
            LValueKind::Array { var, indices }
        } else {
            LValueKind::Var(var)
        };

        Ok(self.ast.lvalues.push(LValue {
            token: Some(token),
            kind,
        }))
    }

    fn parse_index_var(&mut self) -> PResult<VarId> {
        match self.input.consume(TokenKind::Variable) {
            Ok(token) => Ok(self.ast.push_var(Some(token), self.input.fragment(token))),
            Err(_) => Err(self.error_here(ParseErrorKind::InvalidLValue, "VARIABLE")),
        }
    }

    /// `lvalue : type`
    pub(super) fn parse_binding(&mut self) -> PResult<BindingId> {
        let token = self.input.current();
        let lvalue = self.parse_lvalue()?;
        self.expect_or(TokenKind::Colon, ParseErrorKind::MissingColon)?;
        let ty = self.parse_type()?;

        Ok(self.ast.bindings.push(Binding {
            token: Some(token),
            lvalue,
            ty,
        }))
    }

    /// Struct member, `name : type`.
    ///
    /// Members can't destructure, so anything other than a plain name
    /// in front of the colon is an invalid binding.
    pub(super) fn parse_member(&mut self) -> PResult<BindingId> {
        let token = match self.input.consume(TokenKind::Variable) {
            Ok(token) => token,
            Err(_) => return Err(self.error_here(ParseErrorKind::InvalidBinding, "VARIABLE")),
        };
        let var = self.ast.push_var(Some(token), self.input.fragment(token));
        let lvalue = self.ast.lvalues.push(LValue {
            token: Some(token),
            kind: LValueKind::Var(var),
        });

        self.expect_or(TokenKind::Colon, ParseErrorKind::MissingColon)?;
        let ty = self.parse_type()?;

        Ok(self.ast.bindings.push(Binding {
            token: Some(token),
            lvalue,
            ty,
        }))
    }
}
