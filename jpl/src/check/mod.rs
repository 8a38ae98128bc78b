//! Semantic analysis.
//!
//! Walks the commands in order, resolving names against a single flat
//! symbol dictionary and annotating every expression and variable with
//! its type. Nested scopes are emulated by remembering the names each
//! scope declared and removing them again when it ends.
//!
//! Errors accumulate. A construct whose operands already failed fails
//! silently, so one mistake yields one diagnostic.
mod builtins;

pub use self::builtins::{Builtins, Symbol};

use log::{debug, trace};
use smol_str::SmolStr;

use crate::{
    arena::{BindingId, CmdId, ExprId, LValueId, StmtId, TypeId, VarId},
    ast::{Ast, BinOp, CmdKind, ExprKind, LValueKind, LoopBind, StmtKind, TypeKind, UnOp},
    diagnostics::{Diagnostic, NodeRef, TypeErrorKind},
    dict::{HashDict, InsertError},
};

/// Type check a parsed program, annotating the tree in place.
pub fn check(ast: &mut Ast<'_>, commands: &[CmdId]) -> Vec<Diagnostic> {
    let mut checker = Checker::new(ast);
    for cmd in commands {
        checker.check_cmd(*cmd);
    }

    debug!("type checked {} commands, {} errors", commands.len(), checker.diagnostics.len());

    checker.diagnostics
}

pub struct Checker<'c, 'a> {
    ast: &'c mut Ast<'a>,
    builtins: Builtins,
    symbols: HashDict<'a, Symbol>,
    /// Names declared by each open scope, innermost last.
    ///
    /// Declarations made while no scope is open are global.
    scopes: Vec<Vec<&'a str>>,
    /// Declared return type of the function being checked.
    ret: Option<TypeId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'c, 'a> Checker<'c, 'a> {
    pub fn new(ast: &'c mut Ast<'a>) -> Self {
        let mut symbols = HashDict::new();
        let builtins = Builtins::install(ast, &mut symbols);

        Self {
            ast,
            builtins,
            symbols,
            scopes: Vec::new(),
            ret: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    // ------------------------------------------------------------------------
    // Scopes

    /// Run `f` in a new scope, removing everything it declared afterwards.
    fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.push(Vec::new());
        let result = f(self);

        if let Some(names) = self.scopes.pop() {
            trace!("closing scope, removing {} names", names.len());
            for name in names.into_iter().rev() {
                self.symbols.remove(name);
            }
        }

        result
    }

    /// Bring a name into the innermost scope.
    ///
    /// Returns false and reports [`TypeErrorKind::ShadowedVariable`]
    /// when the name is already visible.
    fn declare(&mut self, name: &'a str, symbol: Symbol, node: impl Into<NodeRef>) -> bool {
        match self.symbols.insert_if_absent(name, symbol) {
            Ok(()) => {
                if let Some(scope) = self.scopes.last_mut() {
                    scope.push(name);
                }
                true
            }
            Err(InsertError::Occupied(existing)) => {
                let node: NodeRef = node.into();
                let diagnostic = Diagnostic::new(TypeErrorKind::ShadowedVariable, node)
                    .with_secondary(symbol_node(existing))
                    .with_hint(format!("'{}' is already declared", name));
                self.diagnostics.push(diagnostic);
                false
            }
            Err(InsertError::EmptyKey) => false,
        }
    }

    fn declare_var(&mut self, var: VarId, ty: Option<TypeId>) -> bool {
        self.ast.vars[var].ty = ty;
        let name = self.ast.vars[var].name;
        self.declare(name, Symbol::Var(var), var)
    }

    /// Declare the names an lvalue binds, given the type of its value.
    ///
    /// An unknown type still declares the variable so later uses fail
    /// silently instead of as undeclared.
    fn declare_lvalue(&mut self, lvalue: LValueId, ty: Option<TypeId>) {
        let kind = self.ast.lvalues[lvalue].kind.clone();

        if let LValueKind::Array { indices, .. } = &kind {
            if indices.is_empty() {
                self.error(TypeErrorKind::EmptyArray, lvalue, "array lvalue binds no dimensions");
            } else if let Some(ty) = ty {
                match self.ast.types[ty].kind {
                    TypeKind::Array { rank, .. } if rank == indices.len() => {}
                    _ => {
                        let hint = format!(
                            "{} dimensions bound for a value of type {}",
                            indices.len(),
                            self.type_name(ty)
                        );
                        self.error(TypeErrorKind::BadDimension, lvalue, hint);
                    }
                }
            }
        }

        self.bind_lvalue(&kind, ty);
    }

    /// Declare the names of an lvalue without checking its shape.
    fn bind_lvalue(&mut self, kind: &LValueKind, ty: Option<TypeId>) {
        if let LValueKind::Array { indices, .. } = kind {
            let int = self.builtins.int;
            for index in indices {
                self.declare_var(*index, Some(int));
            }
        }
        self.declare_var(kind.var(), ty);
    }

    // ------------------------------------------------------------------------
    // Diagnostics

    fn error(&mut self, kind: TypeErrorKind, node: impl Into<NodeRef>, hint: impl Into<SmolStr>) {
        let node: NodeRef = node.into();
        self.diagnostics.push(Diagnostic::new(kind, node).with_hint(hint));
    }

    fn error_with(
        &mut self,
        kind: TypeErrorKind,
        node: impl Into<NodeRef>,
        related: impl Into<NodeRef>,
        hint: impl Into<SmolStr>,
    ) {
        let (node, related): (NodeRef, NodeRef) = (node.into(), related.into());
        self.diagnostics.push(
            Diagnostic::new(kind, node)
                .with_secondary(related)
                .with_hint(hint),
        );
    }

    /// Report an expression whose type differs from the one required.
    fn expect_type(&mut self, expr: ExprId, actual: TypeId, expected: TypeId) -> bool {
        if self.same_type(actual, expected) {
            return true;
        }
        let hint = format!(
            "expected {}, found {}",
            self.type_name(expected),
            self.type_name(actual)
        );
        self.error(TypeErrorKind::UnexpectedType, expr, hint);
        false
    }

    // ------------------------------------------------------------------------
    // Types

    /// Structural equality, with structs equal only to themselves.
    ///
    /// An unresolved struct equals nothing.
    pub fn same_type(&self, a: TypeId, b: TypeId) -> bool {
        use TypeKind as T;
        match (&self.ast.types[a].kind, &self.ast.types[b].kind) {
            (T::Int, T::Int) | (T::Float, T::Float) | (T::Bool, T::Bool) | (T::Void, T::Void) => true,
            (T::Struct { decl: Some(x), .. }, T::Struct { decl: Some(y), .. }) => x == y,
            (T::Array { elem: x, rank: m }, T::Array { elem: y, rank: n }) => {
                m == n && self.same_type(*x, *y)
            }
            _ => false,
        }
    }

    fn is_resolved(&self, ty: TypeId) -> bool {
        match self.ast.types[ty].kind {
            TypeKind::Struct { decl, .. } => decl.is_some(),
            TypeKind::Array { elem, .. } => self.is_resolved(elem),
            _ => true,
        }
    }

    /// Source spelling of a type, for hints.
    pub fn type_name(&self, ty: TypeId) -> String {
        match &self.ast.types[ty].kind {
            TypeKind::Int => "int".to_string(),
            TypeKind::Float => "float".to_string(),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Void => "void".to_string(),
            TypeKind::Struct { name, .. } => name.to_string(),
            TypeKind::Array { elem, rank } => {
                format!("{}[{}]", self.type_name(*elem), ",".repeat(rank.saturating_sub(1)))
            }
        }
    }

    /// Link the struct names in a written type to their declarations.
    fn resolve_type(&mut self, ty: TypeId) -> bool {
        match self.ast.types[ty].kind {
            TypeKind::Struct { name, decl: None } => match self.symbols.try_get(name) {
                Some(Symbol::Struct(decl)) => {
                    self.ast.types[ty].kind = TypeKind::Struct {
                        name,
                        decl: Some(decl),
                    };
                    true
                }
                _ => {
                    self.error(TypeErrorKind::UnresolvedType, ty, format!("no struct named '{}'", name));
                    false
                }
            },
            TypeKind::Array { elem, .. } => self.resolve_type(elem),
            _ => true,
        }
    }

    fn array_of(&mut self, elem: TypeId, rank: usize) -> TypeId {
        self.ast.push_type(None, TypeKind::Array { elem, rank })
    }

    // ------------------------------------------------------------------------
    // Commands

    pub fn check_cmd(&mut self, cmd: CmdId) {
        match self.ast.cmds[cmd].kind.clone() {
            CmdKind::Read { lvalue, .. } => {
                let image = self.builtins.image;
                let kind = self.ast.lvalues[lvalue].kind.clone();
                match &kind {
                    LValueKind::Array { indices, .. } if indices.len() != 2 => {
                        let hint = format!("an image has 2 dimensions, found {}", indices.len());
                        self.error(TypeErrorKind::BadRank, lvalue, hint);
                        self.bind_lvalue(&kind, Some(image));
                    }
                    _ => self.declare_lvalue(lvalue, Some(image)),
                }
            }
            CmdKind::Write { expr, .. } => {
                if let Some(ty) = self.check_expr(expr) {
                    let image = self.builtins.image;
                    self.expect_type(expr, ty, image);
                }
            }
            CmdKind::Let { lvalue, expr } => self.check_let(lvalue, expr),
            CmdKind::Assert { expr, .. } => self.check_assert(expr),
            CmdKind::Print { .. } => {}
            CmdKind::Show { expr } => {
                self.check_expr(expr);
            }
            CmdKind::Time(inner) => self.check_cmd(inner),
            CmdKind::Fn {
                name,
                params,
                ret,
                body,
            } => self.check_fn(cmd, name, &params, ret, &body),
            CmdKind::Struct { name, members } => {
                let mut seen = HashDict::new();

                for member in members.into_iter().flatten() {
                    let binding = &self.ast.bindings[member];
                    let ty = binding.ty;
                    let name = self.ast.lvalue_name(binding.lvalue);

                    if let Err(InsertError::Occupied(first)) = seen.insert_if_absent(name, member) {
                        self.error_with(
                            TypeErrorKind::ShadowedVariable,
                            member,
                            first,
                            format!("member '{}' is declared twice", name),
                        );
                    }
                    // The struct is not declared yet, so it can't refer to itself.
                    self.resolve_type(ty);
                }

                self.declare(name, Symbol::Struct(cmd), cmd);
            }
        }
    }

    fn check_let(&mut self, lvalue: LValueId, expr: ExprId) {
        let ty = self.check_expr(expr);
        self.declare_lvalue(lvalue, ty);
    }

    fn check_assert(&mut self, expr: ExprId) {
        if let Some(ty) = self.check_expr(expr) {
            let bool = self.builtins.bool;
            self.expect_type(expr, ty, bool);
        }
    }

    fn check_fn(
        &mut self,
        cmd: CmdId,
        name: &'a str,
        params: &[BindingId],
        ret: TypeId,
        body: &[Option<StmtId>],
    ) {
        // Declared before the body so it may recurse.
        self.declare(name, Symbol::Fn(cmd), cmd);

        for param in params {
            let ty = self.ast.bindings[*param].ty;
            self.resolve_type(ty);
        }
        self.resolve_type(ret);

        let returns = self.scoped(|checker| {
            for param in params {
                let binding = &checker.ast.bindings[*param];
                let (lvalue, ty) = (binding.lvalue, binding.ty);
                // Unresolved types were already reported.
                let ty = checker.is_resolved(ty).then_some(ty);
                checker.declare_lvalue(lvalue, ty);
            }

            let outer = checker.ret.replace(ret);
            let mut returns = false;
            for stmt in body.iter().flatten() {
                returns |= checker.check_stmt(*stmt);
            }
            checker.ret = outer;

            returns
        });

        let complete = body.iter().all(Option::is_some);
        let is_void = matches!(self.ast.types[ret].kind, TypeKind::Void);
        if !returns && !is_void && complete {
            let hint = format!("'{}' must return a value of type {}", name, self.type_name(ret));
            self.error_with(TypeErrorKind::NoReturn, cmd, ret, hint);
        }
    }

    /// Check a body statement, returning true for a return statement.
    fn check_stmt(&mut self, stmt: StmtId) -> bool {
        match self.ast.stmts[stmt].kind.clone() {
            StmtKind::Let { lvalue, expr } => {
                self.check_let(lvalue, expr);
                false
            }
            StmtKind::Assert { expr, .. } => {
                self.check_assert(expr);
                false
            }
            StmtKind::Return { expr } => {
                let ty = self.check_expr(expr);
                if let (Some(ty), Some(ret)) = (ty, self.ret) {
                    if self.is_resolved(ret) && !self.same_type(ty, ret) {
                        let hint = format!(
                            "expected {}, found {}",
                            self.type_name(ret),
                            self.type_name(ty)
                        );
                        self.error_with(TypeErrorKind::BadReturn, expr, ret, hint);
                    }
                }
                true
            }
        }
    }

    // ------------------------------------------------------------------------
    // Expressions

    /// Compute, record and return the type of an expression.
    ///
    /// `None` when the expression is ill typed.
    pub fn check_expr(&mut self, expr: ExprId) -> Option<TypeId> {
        let ty = self.infer(expr)?;
        self.ast.exprs[expr].ty = Some(ty);
        Some(ty)
    }

    fn infer(&mut self, expr: ExprId) -> Option<TypeId> {
        let b = self.builtins;

        match self.ast.exprs[expr].kind.clone() {
            ExprKind::Int(_) => Some(b.int),
            ExprKind::Float(_) => Some(b.float),
            ExprKind::True | ExprKind::False => Some(b.bool),
            ExprKind::Void => Some(b.void),
            ExprKind::Var(name) => self.infer_var(expr, name),
            ExprKind::ArrayLit(elems) => self.infer_array_lit(expr, &elems),
            ExprKind::StructLit { name, args } => self.infer_struct_lit(expr, name, &args),
            ExprKind::Dot { base, member } => self.infer_dot(expr, base, member),
            ExprKind::Index { base, indices } => self.infer_index(expr, base, &indices),
            ExprKind::Call { name, args } => self.infer_call(expr, name, &args),
            ExprKind::Unary { op, operand } => {
                let ty = self.check_expr(operand)?;
                let ok = match op {
                    UnOp::Neg => self.ast.types[ty].kind.is_numeric(),
                    UnOp::Not => matches!(self.ast.types[ty].kind, TypeKind::Bool),
                };
                if ok {
                    Some(ty)
                } else {
                    let hint = format!("'{}' cannot be applied to {}", op, self.type_name(ty));
                    self.error(TypeErrorKind::BadUnOp, expr, hint);
                    None
                }
            }
            ExprKind::Binary { op, lhs, rhs } => self.infer_binary(expr, op, lhs, rhs),
            ExprKind::If { cond, then, els } => {
                let cond_ty = self.check_expr(cond);
                let then_ty = self.check_expr(then);
                let els_ty = self.check_expr(els);

                if let Some(cond_ty) = cond_ty {
                    if !self.expect_type(cond, cond_ty, b.bool) {
                        return None;
                    }
                }

                let (then_ty, els_ty) = (then_ty?, els_ty?);
                if !self.same_type(then_ty, els_ty) {
                    let hint = format!(
                        "branches have types {} and {}",
                        self.type_name(then_ty),
                        self.type_name(els_ty)
                    );
                    self.error_with(TypeErrorKind::MismatchedIf, then, els, hint);
                    return None;
                }
                cond_ty?;
                Some(then_ty)
            }
            ExprKind::ArrayLoop { binds, body } => {
                let elem = self.infer_loop(expr, &binds, body)?;
                Some(self.array_of(elem, binds.len()))
            }
            ExprKind::SumLoop { binds, body } => {
                let ty = self.infer_loop(expr, &binds, body)?;
                if self.ast.types[ty].kind.is_numeric() {
                    Some(ty)
                } else {
                    let hint = format!("can only sum int or float, found {}", self.type_name(ty));
                    self.error(TypeErrorKind::BadSum, body, hint);
                    None
                }
            }
        }
    }

    fn infer_var(&mut self, expr: ExprId, name: &'a str) -> Option<TypeId> {
        match self.symbols.try_get(name) {
            // Unknown when the declaration failed to type check.
            Some(Symbol::Var(var)) => self.ast.vars[var].ty,
            Some(Symbol::Fn(_)) => {
                let hint = format!("'{}' is a function, not a value", name);
                self.error(TypeErrorKind::UndeclaredVariable, expr, hint);
                None
            }
            Some(Symbol::Struct(_)) => {
                let hint = format!("'{}' is a struct, not a value", name);
                self.error(TypeErrorKind::UndeclaredVariable, expr, hint);
                None
            }
            None => {
                let hint = format!("no variable named '{}' in scope", name);
                self.error(TypeErrorKind::UndeclaredVariable, expr, hint);
                None
            }
        }
    }

    fn infer_array_lit(&mut self, expr: ExprId, elems: &[ExprId]) -> Option<TypeId> {
        let (first, rest) = match elems.split_first() {
            Some(split) => split,
            None => {
                self.error(TypeErrorKind::EmptyArray, expr, "array literals need at least one element");
                return None;
            }
        };

        let mut types = Vec::with_capacity(elems.len());
        for elem in elems {
            types.push(self.check_expr(*elem));
        }
        let elem_ty = types[0]?;

        for (elem, ty) in rest.iter().zip(&types[1..]) {
            let ty = (*ty)?;
            if !self.same_type(elem_ty, ty) {
                let hint = format!(
                    "expected {}, found {}",
                    self.type_name(elem_ty),
                    self.type_name(ty)
                );
                self.error_with(TypeErrorKind::MismatchedArray, *elem, *first, hint);
                return None;
            }
        }

        Some(self.array_of(elem_ty, 1))
    }

    fn infer_struct_lit(&mut self, expr: ExprId, name: &'a str, args: &[ExprId]) -> Option<TypeId> {
        let arg_types: Vec<_> = args.iter().map(|arg| self.check_expr(*arg)).collect();

        let decl = match self.symbols.try_get(name) {
            Some(Symbol::Struct(decl)) => decl,
            _ => {
                self.error(TypeErrorKind::UnresolvedType, expr, format!("no struct named '{}'", name));
                return None;
            }
        };
        let members = match &self.ast.cmds[decl].kind {
            CmdKind::Struct { members, .. } => members.clone(),
            _ => return None,
        };
        // A member that failed to parse leaves the layout unknown.
        let members: Vec<_> = members.into_iter().collect::<Option<_>>()?;

        if members.len() != args.len() {
            let hint = format!(
                "'{}' has {} members, found {}",
                name,
                members.len(),
                args.len()
            );
            self.error_with(TypeErrorKind::MismatchedMembers, expr, decl, hint);
            return None;
        }

        let mut ok = true;
        for ((arg, ty), member) in args.iter().zip(arg_types).zip(&members) {
            let member_ty = self.ast.bindings[*member].ty;
            match ty {
                Some(ty) if self.is_resolved(member_ty) && !self.same_type(ty, member_ty) => {
                    let hint = format!(
                        "member '{}' has type {}, found {}",
                        self.ast.lvalue_name(self.ast.bindings[*member].lvalue),
                        self.type_name(member_ty),
                        self.type_name(ty)
                    );
                    self.error_with(TypeErrorKind::MismatchedMembers, *arg, *member, hint);
                    ok = false;
                }
                Some(_) => {}
                None => ok = false,
            }
        }

        if !ok {
            return None;
        }
        Some(self.ast.push_type(
            None,
            TypeKind::Struct {
                name,
                decl: Some(decl),
            },
        ))
    }

    fn infer_dot(&mut self, expr: ExprId, base: ExprId, member: &'a str) -> Option<TypeId> {
        let base_ty = self.check_expr(base)?;

        let decl = match self.ast.types[base_ty].kind {
            TypeKind::Struct { decl: Some(decl), .. } => decl,
            _ => {
                let hint = format!("{} has no members", self.type_name(base_ty));
                self.error(TypeErrorKind::BadDereference, base, hint);
                return None;
            }
        };

        let members = match &self.ast.cmds[decl].kind {
            CmdKind::Struct { members, .. } => members.clone(),
            _ => return None,
        };
        let found = members
            .iter()
            .flatten()
            .find(|binding| self.ast.lvalue_name(self.ast.bindings[**binding].lvalue) == member);

        match found {
            Some(binding) => Some(self.ast.bindings[*binding].ty),
            None => {
                let hint = format!("{} has no member '{}'", self.type_name(base_ty), member);
                self.error_with(TypeErrorKind::BadMember, expr, decl, hint);
                None
            }
        }
    }

    fn infer_index(&mut self, expr: ExprId, base: ExprId, indices: &[ExprId]) -> Option<TypeId> {
        let base_ty = self.check_expr(base);
        let index_types: Vec<_> = indices.iter().map(|index| self.check_expr(*index)).collect();

        if indices.is_empty() {
            self.error(TypeErrorKind::NoIndex, expr, "indexing needs at least one index");
            return None;
        }

        let base_ty = base_ty?;
        let (elem, rank) = match self.ast.types[base_ty].kind {
            TypeKind::Array { elem, rank } => (elem, rank),
            _ => {
                let hint = format!("expected an array, found {}", self.type_name(base_ty));
                self.error(TypeErrorKind::UnexpectedType, base, hint);
                return None;
            }
        };

        if rank != indices.len() {
            let hint = format!(
                "{} has {} dimensions, found {} indices",
                self.type_name(base_ty),
                rank,
                indices.len()
            );
            self.error(TypeErrorKind::BadDimension, expr, hint);
            return None;
        }

        let mut ok = true;
        for (index, ty) in indices.iter().zip(index_types) {
            match ty {
                Some(ty) if !matches!(self.ast.types[ty].kind, TypeKind::Int) => {
                    let hint = format!("indices must be int, found {}", self.type_name(ty));
                    self.error(TypeErrorKind::BadIndex, *index, hint);
                    ok = false;
                }
                Some(_) => {}
                None => ok = false,
            }
        }

        ok.then_some(elem)
    }

    fn infer_call(&mut self, expr: ExprId, name: &'a str, args: &[ExprId]) -> Option<TypeId> {
        let arg_types: Vec<_> = args.iter().map(|arg| self.check_expr(*arg)).collect();

        let decl = match self.symbols.try_get(name) {
            Some(Symbol::Fn(decl)) => decl,
            Some(_) => {
                self.error(TypeErrorKind::BadFn, expr, format!("'{}' is not a function", name));
                return None;
            }
            None => {
                let hint = format!("no function named '{}' in scope", name);
                self.error(TypeErrorKind::UndeclaredVariable, expr, hint);
                return None;
            }
        };
        let (params, ret) = match &self.ast.cmds[decl].kind {
            CmdKind::Fn { params, ret, .. } => (params.clone(), *ret),
            _ => return None,
        };

        if params.len() != args.len() {
            let hint = format!(
                "'{}' takes {} arguments, found {}",
                name,
                params.len(),
                args.len()
            );
            self.error_with(TypeErrorKind::MismatchedMembers, expr, decl, hint);
            return None;
        }

        let mut ok = true;
        for ((arg, ty), param) in args.iter().zip(arg_types).zip(&params) {
            let param_ty = self.ast.bindings[*param].ty;
            match ty {
                Some(_) if !self.is_resolved(param_ty) => ok = false,
                Some(ty) if !self.same_type(ty, param_ty) => {
                    let hint = format!(
                        "expected {}, found {}",
                        self.type_name(param_ty),
                        self.type_name(ty)
                    );
                    self.error_with(TypeErrorKind::BadMember, *arg, *param, hint);
                    ok = false;
                }
                Some(_) => {}
                None => ok = false,
            }
        }

        (ok && self.is_resolved(ret)).then_some(ret)
    }

    fn infer_binary(&mut self, expr: ExprId, op: BinOp, lhs: ExprId, rhs: ExprId) -> Option<TypeId> {
        let lhs_ty = self.check_expr(lhs);
        let rhs_ty = self.check_expr(rhs);
        let (lhs_ty, rhs_ty) = (lhs_ty?, rhs_ty?);

        if !self.same_type(lhs_ty, rhs_ty) {
            let hint = format!(
                "'{}' applied to {} and {}",
                op,
                self.type_name(lhs_ty),
                self.type_name(rhs_ty)
            );
            self.error_with(TypeErrorKind::MismatchedBinOp, lhs, rhs, hint);
            return None;
        }

        let kind = &self.ast.types[lhs_ty].kind;
        let ok = match op {
            BinOp::And | BinOp::Or => matches!(kind, TypeKind::Bool),
            BinOp::Eq | BinOp::Ne => kind.is_numeric() || matches!(kind, TypeKind::Bool),
            _ => kind.is_numeric(),
        };
        if !ok {
            let hint = format!("'{}' cannot be applied to {}", op, self.type_name(lhs_ty));
            self.error(TypeErrorKind::BadBinOp, expr, hint);
            return None;
        }

        if op.is_comparison() {
            Some(self.builtins.bool)
        } else {
            Some(lhs_ty)
        }
    }

    /// Check the bounds, then the body with the loop variables in scope.
    ///
    /// Returns the type of the body.
    fn infer_loop(&mut self, expr: ExprId, binds: &[LoopBind], body: ExprId) -> Option<TypeId> {
        if binds.is_empty() {
            self.error(TypeErrorKind::EmptyArray, expr, "loops need at least one index variable");
            return None;
        }

        let int = self.builtins.int;
        let mut ok = true;
        for bind in binds {
            match self.check_expr(bind.bound) {
                Some(ty) if !self.same_type(ty, int) => {
                    let hint = format!("loop bounds must be int, found {}", self.type_name(ty));
                    self.error(TypeErrorKind::BadIndex, bind.bound, hint);
                    ok = false;
                }
                Some(_) => {}
                None => ok = false,
            }
        }

        let body_ty = self.scoped(|checker| {
            for bind in binds {
                checker.declare_var(bind.var, Some(int));
            }
            checker.check_expr(body)
        });

        if ok {
            body_ty
        } else {
            None
        }
    }
}

fn symbol_node(symbol: Symbol) -> NodeRef {
    match symbol {
        Symbol::Var(var) => NodeRef::Var(var),
        Symbol::Fn(cmd) | Symbol::Struct(cmd) => NodeRef::Cmd(cmd),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        diagnostics::{DiagnosticKind, Label},
        lexer::Lexer,
        parsing::parse,
    };

    /// Type errors of a program that must lex and parse cleanly.
    fn type_errors(source: &str) -> Vec<TypeErrorKind> {
        let (tokens, lex_errors) = Lexer::new(source).tokenize();
        assert!(lex_errors.is_empty());
        let mut parsed = parse(&tokens, source);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

        check(&mut parsed.ast, &parsed.commands)
            .into_iter()
            .map(|diagnostic| match diagnostic.kind {
                DiagnosticKind::Type(kind) => kind,
                other => panic!("unexpected diagnostic {:?}", other),
            })
            .collect()
    }

    fn assert_ok(source: &str) {
        assert_eq!(type_errors(source), vec![], "{}", source);
    }

    fn assert_err(source: &str, expected: TypeErrorKind) {
        assert_eq!(type_errors(source), vec![expected], "{}", source);
    }

    #[test]
    fn test_let_annotates_types() {
        let source = "let x = 1\nlet y = x + 2\nshow y < 3\n";
        let (tokens, _) = Lexer::new(source).tokenize();
        let mut parsed = parse(&tokens, source);
        assert!(check(&mut parsed.ast, &parsed.commands).is_empty());

        let ast = &parsed.ast;
        let y = ast
            .vars
            .iter()
            .find(|(_, var)| var.name == "y")
            .and_then(|(_, var)| var.ty)
            .expect("y is typed");
        assert_eq!(ast.types[y].kind, TypeKind::Int);

        match ast.cmds[parsed.commands[2]].kind {
            CmdKind::Show { expr } => {
                let ty = ast.exprs[expr].ty.expect("typed");
                assert_eq!(ast.types[ty].kind, TypeKind::Bool);
            }
            ref other => panic!("expected show, found {:?}", other),
        }
    }

    #[test]
    fn test_shadowing_points_at_both_declarations() {
        let source = "let x = 1\nlet x = 2.0\n";
        let (tokens, _) = Lexer::new(source).tokenize();
        let mut parsed = parse(&tokens, source);
        let diagnostics = check(&mut parsed.ast, &parsed.commands);

        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(diagnostic.kind, DiagnosticKind::Type(TypeErrorKind::ShadowedVariable));

        let line_of = |label: Label| {
            let node = match label {
                Label::Node(node) => node,
                other => panic!("expected node label, found {:?}", other),
            };
            let token = parsed.ast.node_token(node).expect("has a token");
            tokens[token].span.line_col(source.as_bytes()).0
        };
        assert_eq!(line_of(diagnostic.primary), 2);
        assert_eq!(line_of(diagnostic.secondary.expect("secondary")), 1);
    }

    #[test]
    fn test_builtins_cannot_be_shadowed() {
        assert_err("let sqrt = 1\n", TypeErrorKind::ShadowedVariable);
        assert_err("let argnum = 1\n", TypeErrorKind::ShadowedVariable);
        assert_err("struct rgba {\n}\n", TypeErrorKind::ShadowedVariable);
    }

    #[test]
    fn test_binary_operators() {
        assert_ok("show 1 + 2 * 3\nshow 1.0 / 2.0\nshow 1 < 2 && true\nshow true == false\n");
        assert_err("let x = true + 1\n", TypeErrorKind::MismatchedBinOp);
        assert_err("show true + false\n", TypeErrorKind::BadBinOp);
        assert_err("show 1 && 2\n", TypeErrorKind::BadBinOp);
    }

    #[test]
    fn test_unary_operators() {
        assert_ok("show -1\nshow -1.5\nshow !true\n");
        assert_err("show !1\n", TypeErrorKind::BadUnOp);
        assert_err("show -true\n", TypeErrorKind::BadUnOp);
    }

    #[test]
    fn test_errors_do_not_cascade() {
        // `x` is declared with an unknown type, so neither use reports.
        assert_err("let x = y\nshow x + 1\nshow x\n", TypeErrorKind::UndeclaredVariable);
    }

    #[test]
    fn test_unresolved_parameter_does_not_cascade() {
        assert_err("fn f(p : Q) : float {\n  return p.x\n}\n", TypeErrorKind::UnresolvedType);
        assert_err("fn f(ps[n] : Q[]) : int {\n  return n\n}\n", TypeErrorKind::UnresolvedType);
    }

    #[test]
    fn test_function_scope_is_popped() {
        assert_err(
            "fn f(z : int) : int {\n  return z\n}\nshow f(1)\nshow z\n",
            TypeErrorKind::UndeclaredVariable,
        );
    }

    #[test]
    fn test_functions() {
        assert_ok("fn add(a : int, b : int) : int {\n  let c = a + b\n  return c\n}\nshow add(1, 2)\n");
        assert_ok("fn fact(n : int) : int {\n  return if n < 2 then 1 else n * fact(n - 1)\n}\n");
        assert_ok("fn nothing() : void {\n}\n");
        assert_err("fn f() : int {\n  return true\n}\n", TypeErrorKind::BadReturn);
        assert_err("fn f() : int {\n  let x = 1\n}\n", TypeErrorKind::NoReturn);
        assert_err("show f(1)\n", TypeErrorKind::UndeclaredVariable);
        assert_err("show sqrt(1)\n", TypeErrorKind::BadMember);
        assert_err("show pow(1.0)\n", TypeErrorKind::MismatchedMembers);
        assert_err("let x = 1\nshow x(1)\n", TypeErrorKind::BadFn);
        assert_err("show sqrt\n", TypeErrorKind::UndeclaredVariable);
    }

    #[test]
    fn test_array_parameters_bind_dimensions() {
        assert_ok("fn w(img[W, H] : rgba[,]) : int {\n  return W * H\n}\n");
        assert_err(
            "fn w(img[W] : rgba[,]) : int {\n  return W\n}\n",
            TypeErrorKind::BadDimension,
        );
    }

    #[test]
    fn test_structs() {
        assert_ok("struct P {\n  x : float\n  y : float\n}\nlet p = P{1.0, 2.0}\nshow p.x + p.y\n");
        assert_ok("let c = rgba{1.0, 0.5, 0.0, 1.0}\nshow c.a\n");
        assert_err("struct P {\n  x : float\n  x : int\n}\n", TypeErrorKind::ShadowedVariable);
        assert_err("struct P {\n  next : P\n}\n", TypeErrorKind::UnresolvedType);
        assert_err("struct P {\n  x : float\n}\nshow P{1}\n", TypeErrorKind::MismatchedMembers);
        assert_err("struct P {\n  x : float\n}\nshow P{1.0, 2.0}\n", TypeErrorKind::MismatchedMembers);
        assert_err("struct P {\n  x : float\n}\nshow P{1.0}.y\n", TypeErrorKind::BadMember);
        assert_err("show (1).x\n", TypeErrorKind::BadDereference);
        assert_err("show Q{1}\n", TypeErrorKind::UnresolvedType);
    }

    #[test]
    fn test_arrays() {
        assert_ok("let a = [1, 2, 3]\nshow a[0]\nshow args[argnum - 1]\n");
        assert_ok("let m = array[i : 3, j : 4] i * j\nshow m[1, 2]\nlet m2[r, c] = m\n");
        assert_err("show []\n", TypeErrorKind::EmptyArray);
        assert_err("show [1, 2.0]\n", TypeErrorKind::MismatchedArray);
        assert_err("let a = [1]\nshow a[1, 2]\n", TypeErrorKind::BadDimension);
        assert_err("let a = [1]\nshow a[1.0]\n", TypeErrorKind::BadIndex);
        assert_err("show 1[0]\n", TypeErrorKind::UnexpectedType);
        assert_err("let a = [1]\nshow a[]\n", TypeErrorKind::NoIndex);
        assert_err("let a[i, j] = [1]\n", TypeErrorKind::BadDimension);
    }

    #[test]
    fn test_loops() {
        assert_ok("show sum[i : 10] i\nshow sum[i : 3, j : 3] to_float(i + j)\n");
        assert_err("show array[i : 1.0] i\n", TypeErrorKind::BadIndex);
        assert_err("show sum[i : 10] i < 3\n", TypeErrorKind::BadSum);
        assert_err("show array[] 1\n", TypeErrorKind::EmptyArray);
        // Loop variables are gone once the loop ends.
        assert_err("show sum[i : 10] i\nshow i\n", TypeErrorKind::UndeclaredVariable);
    }

    #[test]
    fn test_conditions() {
        assert_ok("show if true then 1 else 2\nassert 1 < 2, \"ordered\"\n");
        assert_err("show if 1 then 1 else 2\n", TypeErrorKind::UnexpectedType);
        assert_err("show if true then 1 else 2.0\n", TypeErrorKind::MismatchedIf);
        assert_err("assert 1, \"not a bool\"\n", TypeErrorKind::UnexpectedType);
    }

    #[test]
    fn test_images() {
        assert_ok("read image \"in.png\" to img\nwrite image img to \"out.png\"\n");
        assert_ok("read image \"in.png\" to img[w, h]\nshow w * h\n");
        assert_err("read image \"in.png\" to img[w]\n", TypeErrorKind::BadRank);
        assert_err("write image 1 to \"out.png\"\n", TypeErrorKind::UnexpectedType);
    }

    #[test]
    fn test_time_checks_inner_command() {
        assert_err("time show nope\n", TypeErrorKind::UndeclaredVariable);
    }
}
