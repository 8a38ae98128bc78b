//! Syntax tree stored in typed arenas.
//!
//! Children are referenced by handle, never by pointer. Names are
//! slices of the source text, or static strings for nodes synthesized
//! by the type checker. A `token` of `None` marks such a synthesized
//! node, which has no place in the source.
use std::fmt;

use crate::{
    arena::{Arena, BindingId, CmdId, ExprId, LValueId, StmtId, TokenId, TypeId, VarId},
    diagnostics::NodeRef,
};

#[derive(Debug, Default)]
pub struct Ast<'a> {
    pub cmds: Arena<CmdId, Cmd<'a>>,
    pub exprs: Arena<ExprId, Expr<'a>>,
    pub lvalues: Arena<LValueId, LValue>,
    pub stmts: Arena<StmtId, Stmt<'a>>,
    pub types: Arena<TypeId, Type<'a>>,
    pub bindings: Arena<BindingId, Binding>,
    pub vars: Arena<VarId, Var<'a>>,
}

impl<'a> Ast<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source token a node was parsed from.
    pub fn node_token(&self, node: NodeRef) -> Option<TokenId> {
        match node {
            NodeRef::Cmd(id) => self.cmds.get(id)?.token,
            NodeRef::Expr(id) => self.exprs.get(id).map(|expr| expr.token),
            NodeRef::LValue(id) => self.lvalues.get(id)?.token,
            NodeRef::Stmt(id) => self.stmts.get(id).map(|stmt| stmt.token),
            NodeRef::Type(id) => self.types.get(id)?.token,
            NodeRef::Binding(id) => self.bindings.get(id)?.token,
            NodeRef::Var(id) => self.vars.get(id)?.token,
        }
    }

    #[inline]
    pub fn push_type(&mut self, token: Option<TokenId>, kind: TypeKind<'a>) -> TypeId {
        self.types.push(Type { token, kind })
    }

    #[inline]
    pub fn push_var(&mut self, token: Option<TokenId>, name: &'a str) -> VarId {
        self.vars.push(Var { token, name, ty: None })
    }

    /// Variable an lvalue declares.
    #[inline]
    pub fn lvalue_var(&self, id: LValueId) -> VarId {
        self.lvalues[id].kind.var()
    }

    /// Name of the variable an lvalue declares.
    #[inline]
    pub fn lvalue_name(&self, id: LValueId) -> &'a str {
        self.vars[self.lvalue_var(id)].name
    }
}

// ----------------------------------------------------------------------------
// Commands

#[derive(Debug, Clone, PartialEq)]
pub struct Cmd<'a> {
    pub token: Option<TokenId>,
    pub kind: CmdKind<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CmdKind<'a> {
    /// `read image "file" to lvalue`
    Read { file: &'a str, lvalue: LValueId },
    /// `write image expr to "file"`
    Write { expr: ExprId, file: &'a str },
    Let { lvalue: LValueId, expr: ExprId },
    Assert { expr: ExprId, msg: &'a str },
    Print { msg: &'a str },
    Show { expr: ExprId },
    Time(CmdId),
    /// Function declaration.
    ///
    /// Body statements that failed to parse are kept as `None`.
    Fn {
        name: &'a str,
        params: Vec<BindingId>,
        ret: TypeId,
        body: Vec<Option<StmtId>>,
    },
    /// Struct declaration.
    ///
    /// Members that failed to parse are kept as `None`.
    Struct {
        name: &'a str,
        members: Vec<Option<BindingId>>,
    },
}

// ----------------------------------------------------------------------------
// Statements

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt<'a> {
    pub token: TokenId,
    pub kind: StmtKind<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind<'a> {
    Let { lvalue: LValueId, expr: ExprId },
    Assert { expr: ExprId, msg: &'a str },
    Return { expr: ExprId },
}

// ----------------------------------------------------------------------------
// Expressions

#[derive(Debug, Clone, PartialEq)]
pub struct Expr<'a> {
    pub token: TokenId,
    pub kind: ExprKind<'a>,
    /// Resolved type, filled in by the type checker.
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind<'a> {
    Int(i64),
    Float(f64),
    True,
    False,
    Void,
    Var(&'a str),
    /// `[a, b, c]`
    ArrayLit(Vec<ExprId>),
    /// `Name{a, b}`
    StructLit { name: &'a str, args: Vec<ExprId> },
    /// `base.member`
    Dot { base: ExprId, member: &'a str },
    /// `base[i, j]`
    Index { base: ExprId, indices: Vec<ExprId> },
    /// `name(a, b)`
    Call { name: &'a str, args: Vec<ExprId> },
    Unary { op: UnOp, operand: ExprId },
    Binary { op: BinOp, lhs: ExprId, rhs: ExprId },
    If { cond: ExprId, then: ExprId, els: ExprId },
    /// `array[i : n, j : m] body`
    ArrayLoop { binds: Vec<LoopBind>, body: ExprId },
    /// `sum[i : n, j : m] body`
    SumLoop { binds: Vec<LoopBind>, body: ExprId },
}

/// Loop variable and the extent it ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopBind {
    pub var: VarId,
    pub bound: ExprId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "-" => Some(Self::Neg),
            "!" => Some(Self::Not),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
        }
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum BinOp {
    Mul, Div, Mod,
    Add, Sub,
    Lt, Gt, Le, Ge, Eq, Ne,
    And, Or,
}

impl BinOp {
    #[rustfmt::skip]
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "*"  => Some(Self::Mul),
            "/"  => Some(Self::Div),
            "%"  => Some(Self::Mod),
            "+"  => Some(Self::Add),
            "-"  => Some(Self::Sub),
            "<"  => Some(Self::Lt),
            ">"  => Some(Self::Gt),
            "<=" => Some(Self::Le),
            ">=" => Some(Self::Ge),
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "&&" => Some(Self::And),
            "||" => Some(Self::Or),
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Lt  => "<",
            Self::Gt  => ">",
            Self::Le  => "<=",
            Self::Ge  => ">=",
            Self::Eq  => "==",
            Self::Ne  => "!=",
            Self::And => "&&",
            Self::Or  => "||",
        }
    }

    /// Binding power, higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Mul | Self::Div | Self::Mod => 3,
            Self::Add | Self::Sub => 2,
            Self::Lt | Self::Gt | Self::Le | Self::Ge | Self::Eq | Self::Ne => 1,
            Self::And | Self::Or => 0,
        }
    }

    /// Operators producing a boolean regardless of operand type.
    pub fn is_comparison(&self) -> bool {
        self.precedence() == 1
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ----------------------------------------------------------------------------
// Declarations

/// A declared name.
#[derive(Debug, Clone, PartialEq)]
pub struct Var<'a> {
    pub token: Option<TokenId>,
    pub name: &'a str,
    /// Resolved type, filled in by the type checker.
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LValue {
    pub token: Option<TokenId>,
    pub kind: LValueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LValueKind {
    Var(VarId),
    /// `name[i, j]`, binding one index variable per dimension.
    Array { var: VarId, indices: Vec<VarId> },
}

impl LValueKind {
    pub fn var(&self) -> VarId {
        match self {
            Self::Var(var) => *var,
            Self::Array { var, .. } => *var,
        }
    }
}

/// `lvalue : type`
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub token: Option<TokenId>,
    pub lvalue: LValueId,
    pub ty: TypeId,
}

// ----------------------------------------------------------------------------
// Types

#[derive(Debug, Clone, PartialEq)]
pub struct Type<'a> {
    pub token: Option<TokenId>,
    pub kind: TypeKind<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind<'a> {
    Int,
    Float,
    Bool,
    Void,
    /// Named struct type.
    ///
    /// `decl` is filled in once the name is resolved to its declaration.
    Struct { name: &'a str, decl: Option<CmdId> },
    Array { elem: TypeId, rank: usize },
}

impl<'a> TypeKind<'a> {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}
