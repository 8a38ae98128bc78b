//! Debug dumps of tokens and syntax trees.
use std::fmt::{self, Write as FmtWrite};

use itertools::Itertools;

use crate::{
    arena::{BindingId, CmdId, ExprId, LValueId, StmtId, TypeId},
    ast::{Ast, CmdKind, ExprKind, LValueKind, StmtKind, TypeKind},
    tokens::{TokenKind, TokenVec},
};

/// Write one line per token.
pub fn write_tokens<W: FmtWrite>(w: &mut W, tokens: &TokenVec, source: &[u8]) -> fmt::Result {
    for (_, token) in tokens.iter() {
        match token.kind {
            TokenKind::Newline | TokenKind::EOF => writeln!(w, "{}", token.kind.name())?,
            kind => writeln!(w, "{} '{}'", kind.name(), token.text(source))?,
        }
    }
    Ok(())
}

/// S-expression printer for parsed commands.
pub struct Printer<'p, 'a> {
    ast: &'p Ast<'a>,
    /// Print the resolved type of every expression.
    typed: bool,
}

impl<'p, 'a> Printer<'p, 'a> {
    pub fn new(ast: &'p Ast<'a>) -> Self {
        Self { ast, typed: false }
    }

    /// Printer that annotates expressions with their resolved types.
    pub fn typed(ast: &'p Ast<'a>) -> Self {
        Self { ast, typed: true }
    }

    /// Write one S-expression line per command.
    pub fn write_program<W: FmtWrite>(&self, w: &mut W, commands: &[CmdId]) -> fmt::Result {
        for cmd in commands {
            self.write_cmd(w, *cmd)?;
            writeln!(w)?;
        }
        Ok(())
    }

    pub fn write_cmd<W: FmtWrite>(&self, w: &mut W, cmd: CmdId) -> fmt::Result {
        match &self.ast.cmds[cmd].kind {
            CmdKind::Read { file, lvalue } => {
                write!(w, "(ReadCmd {} ", file)?;
                self.write_lvalue(w, *lvalue)?;
            }
            CmdKind::Write { expr, file } => {
                w.write_str("(WriteCmd ")?;
                self.write_expr(w, *expr)?;
                write!(w, " {}", file)?;
            }
            CmdKind::Let { lvalue, expr } => {
                w.write_str("(LetCmd ")?;
                self.write_lvalue(w, *lvalue)?;
                w.write_char(' ')?;
                self.write_expr(w, *expr)?;
            }
            CmdKind::Assert { expr, msg } => {
                w.write_str("(AssertCmd ")?;
                self.write_expr(w, *expr)?;
                write!(w, " {}", msg)?;
            }
            CmdKind::Print { msg } => write!(w, "(PrintCmd {}", msg)?,
            CmdKind::Show { expr } => {
                w.write_str("(ShowCmd ")?;
                self.write_expr(w, *expr)?;
            }
            CmdKind::Time(inner) => {
                w.write_str("(TimeCmd ")?;
                self.write_cmd(w, *inner)?;
            }
            CmdKind::Fn {
                name,
                params,
                ret,
                body,
            } => {
                write!(w, "(FnCmd {} ((", name)?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        w.write_char(' ')?;
                    }
                    self.write_binding(w, *param)?;
                }
                w.write_str(")) ")?;
                self.write_type(w, *ret)?;
                for stmt in body.iter().flatten() {
                    w.write_char(' ')?;
                    self.write_stmt(w, *stmt)?;
                }
            }
            CmdKind::Struct { name, members } => {
                write!(w, "(StructCmd {}", name)?;
                for member in members.iter().flatten() {
                    let binding = &self.ast.bindings[*member];
                    write!(w, " {} ", self.ast.lvalue_name(binding.lvalue))?;
                    self.write_type(w, binding.ty)?;
                }
            }
        }
        w.write_char(')')
    }

    fn write_stmt<W: FmtWrite>(&self, w: &mut W, stmt: StmtId) -> fmt::Result {
        match &self.ast.stmts[stmt].kind {
            StmtKind::Let { lvalue, expr } => {
                w.write_str("(LetStmt ")?;
                self.write_lvalue(w, *lvalue)?;
                w.write_char(' ')?;
                self.write_expr(w, *expr)?;
            }
            StmtKind::Assert { expr, msg } => {
                w.write_str("(AssertStmt ")?;
                self.write_expr(w, *expr)?;
                write!(w, " {}", msg)?;
            }
            StmtKind::Return { expr } => {
                w.write_str("(ReturnStmt ")?;
                self.write_expr(w, *expr)?;
            }
        }
        w.write_char(')')
    }

    fn write_lvalue<W: FmtWrite>(&self, w: &mut W, lvalue: LValueId) -> fmt::Result {
        let vars = &self.ast.vars;
        match &self.ast.lvalues[lvalue].kind {
            LValueKind::Var(var) => write!(w, "(VarLValue {})", vars[*var].name),
            LValueKind::Array { var, indices } => {
                write!(w, "(ArrayLValue {}", vars[*var].name)?;
                if !indices.is_empty() {
                    write!(w, " {}", indices.iter().map(|index| vars[*index].name).join(" "))?;
                }
                w.write_char(')')
            }
        }
    }

    fn write_binding<W: FmtWrite>(&self, w: &mut W, binding: BindingId) -> fmt::Result {
        let binding = &self.ast.bindings[binding];
        self.write_lvalue(w, binding.lvalue)?;
        w.write_char(' ')?;
        self.write_type(w, binding.ty)
    }

    pub fn write_type<W: FmtWrite>(&self, w: &mut W, ty: TypeId) -> fmt::Result {
        match &self.ast.types[ty].kind {
            TypeKind::Int => w.write_str("(IntType)"),
            TypeKind::Float => w.write_str("(FloatType)"),
            TypeKind::Bool => w.write_str("(BoolType)"),
            TypeKind::Void => w.write_str("(VoidType)"),
            TypeKind::Struct { name, .. } => write!(w, "(StructType {})", name),
            TypeKind::Array { elem, rank } => {
                w.write_str("(ArrayType ")?;
                self.write_type(w, *elem)?;
                write!(w, " {})", rank)
            }
        }
    }

    pub fn write_expr<W: FmtWrite>(&self, w: &mut W, expr: ExprId) -> fmt::Result {
        let node = &self.ast.exprs[expr];

        w.write_char('(')?;
        w.write_str(expr_name(&node.kind))?;
        if let (true, Some(ty)) = (self.typed, node.ty) {
            w.write_char(' ')?;
            self.write_type(w, ty)?;
        }

        match &node.kind {
            ExprKind::Int(value) => write!(w, " {}", value)?,
            // Truncated toward zero.
            ExprKind::Float(value) => write!(w, " {}", value.trunc() as i64)?,
            ExprKind::True | ExprKind::False | ExprKind::Void => {}
            ExprKind::Var(name) => write!(w, " {}", name)?,
            ExprKind::ArrayLit(elems) => self.write_exprs(w, elems)?,
            ExprKind::StructLit { name, args } | ExprKind::Call { name, args } => {
                write!(w, " {}", name)?;
                self.write_exprs(w, args)?;
            }
            ExprKind::Dot { base, member } => {
                w.write_char(' ')?;
                self.write_expr(w, *base)?;
                write!(w, " {}", member)?;
            }
            ExprKind::Index { base, indices } => {
                w.write_char(' ')?;
                self.write_expr(w, *base)?;
                self.write_exprs(w, indices)?;
            }
            ExprKind::Unary { op, operand } => {
                write!(w, " {} ", op)?;
                self.write_expr(w, *operand)?;
            }
            ExprKind::Binary { op, lhs, rhs } => {
                w.write_char(' ')?;
                self.write_expr(w, *lhs)?;
                write!(w, " {} ", op)?;
                self.write_expr(w, *rhs)?;
            }
            ExprKind::If { cond, then, els } => self.write_exprs(w, &[*cond, *then, *els])?,
            ExprKind::ArrayLoop { binds, body } | ExprKind::SumLoop { binds, body } => {
                for bind in binds {
                    write!(w, " {} ", self.ast.vars[bind.var].name)?;
                    self.write_expr(w, bind.bound)?;
                }
                w.write_char(' ')?;
                self.write_expr(w, *body)?;
            }
        }

        w.write_char(')')
    }

    /// Space separated expressions, each preceded by a space.
    fn write_exprs<W: FmtWrite>(&self, w: &mut W, exprs: &[ExprId]) -> fmt::Result {
        for expr in exprs {
            w.write_char(' ')?;
            self.write_expr(w, *expr)?;
        }
        Ok(())
    }
}

fn expr_name(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::Int(_) => "IntExpr",
        ExprKind::Float(_) => "FloatExpr",
        ExprKind::True => "TrueExpr",
        ExprKind::False => "FalseExpr",
        ExprKind::Void => "VoidExpr",
        ExprKind::Var(_) => "VarExpr",
        ExprKind::ArrayLit(_) => "ArrayLiteralExpr",
        ExprKind::StructLit { .. } => "StructLiteralExpr",
        ExprKind::Dot { .. } => "DotExpr",
        ExprKind::Index { .. } => "ArrayIndexExpr",
        ExprKind::Call { .. } => "CallExpr",
        ExprKind::Unary { .. } => "UnopExpr",
        ExprKind::Binary { .. } => "BinopExpr",
        ExprKind::If { .. } => "IfExpr",
        ExprKind::ArrayLoop { .. } => "ArrayLoopExpr",
        ExprKind::SumLoop { .. } => "SumLoopExpr",
    }
}
