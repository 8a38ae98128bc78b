//! Definitions every program starts with.
use crate::{
    arena::{BindingId, CmdId, TypeId, VarId},
    ast::{Ast, Binding, Cmd, CmdKind, LValue, LValueKind, TypeKind, Var},
    dict::HashDict,
};

/// What a name in scope refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Var(VarId),
    Fn(CmdId),
    Struct(CmdId),
}

/// Handles to the built-in type nodes, shared by every expression of
/// that type.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    pub int: TypeId,
    pub float: TypeId,
    pub bool: TypeId,
    pub void: TypeId,
    /// The `rgba` struct type.
    pub rgba: TypeId,
    /// Two dimensional array of `rgba`, the type of a loaded image.
    pub image: TypeId,
}

/// Unary float functions.
const FLOAT_FNS: [&str; 9] = ["sqrt", "exp", "sin", "cos", "tan", "asin", "acos", "atan", "log"];

/// Binary float functions.
const FLOAT2_FNS: [&str; 2] = ["pow", "atan2"];

impl Builtins {
    /// Synthesize the built-in nodes and declare them.
    ///
    /// The nodes carry no token since they have no place in the source.
    pub fn install<'a>(ast: &mut Ast<'a>, symbols: &mut HashDict<'a, Symbol>) -> Self {
        let int = ast.push_type(None, TypeKind::Int);
        let float = ast.push_type(None, TypeKind::Float);
        let bool = ast.push_type(None, TypeKind::Bool);
        let void = ast.push_type(None, TypeKind::Void);

        let members = ["r", "g", "b", "a"]
            .into_iter()
            .map(|name| Some(synth_binding(ast, name, float)))
            .collect();
        let rgba_decl = ast.cmds.push(Cmd {
            token: None,
            kind: CmdKind::Struct { name: "rgba", members },
        });
        symbols.insert_or_replace("rgba", Symbol::Struct(rgba_decl));

        let rgba = ast.push_type(
            None,
            TypeKind::Struct {
                name: "rgba",
                decl: Some(rgba_decl),
            },
        );
        let image = ast.push_type(None, TypeKind::Array { elem: rgba, rank: 2 });

        let builtins = Self {
            int,
            float,
            bool,
            void,
            rgba,
            image,
        };

        for name in FLOAT_FNS {
            declare_fn(ast, symbols, name, &[float], float);
        }
        for name in FLOAT2_FNS {
            declare_fn(ast, symbols, name, &[float, float], float);
        }
        declare_fn(ast, symbols, "to_int", &[float], int);
        declare_fn(ast, symbols, "to_float", &[int], float);

        let argnum = ast.vars.push(Var {
            token: None,
            name: "argnum",
            ty: Some(int),
        });
        symbols.insert_or_replace("argnum", Symbol::Var(argnum));

        let int_array = ast.push_type(None, TypeKind::Array { elem: int, rank: 1 });
        let args = ast.vars.push(Var {
            token: None,
            name: "args",
            ty: Some(int_array),
        });
        symbols.insert_or_replace("args", Symbol::Var(args));

        builtins
    }
}

fn declare_fn<'a>(
    ast: &mut Ast<'a>,
    symbols: &mut HashDict<'a, Symbol>,
    name: &'static str,
    params: &[TypeId],
    ret: TypeId,
) {
    const PARAM_NAMES: [&str; 2] = ["x", "y"];

    let params = params
        .iter()
        .zip(PARAM_NAMES)
        .map(|(ty, param)| synth_binding(ast, param, *ty))
        .collect();
    let decl = ast.cmds.push(Cmd {
        token: None,
        kind: CmdKind::Fn {
            name,
            params,
            ret,
            body: Vec::new(),
        },
    });
    symbols.insert_or_replace(name, Symbol::Fn(decl));
}

fn synth_binding<'a>(ast: &mut Ast<'a>, name: &'a str, ty: TypeId) -> BindingId {
    let var = ast.push_var(None, name);
    ast.vars[var].ty = Some(ty);
    let lvalue = ast.lvalues.push(LValue {
        token: None,
        kind: LValueKind::Var(var),
    });
    ast.bindings.push(Binding {
        token: None,
        lvalue,
        ty,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_install() {
        let mut ast = Ast::new();
        let mut symbols = HashDict::new();
        let builtins = Builtins::install(&mut ast, &mut symbols);

        // rgba, 13 functions, argnum and args
        assert_eq!(symbols.len(), 16);
        assert!(matches!(symbols.try_get("rgba"), Some(Symbol::Struct(_))));
        assert!(matches!(symbols.try_get("atan2"), Some(Symbol::Fn(_))));
        assert!(matches!(symbols.try_get("args"), Some(Symbol::Var(_))));

        match ast.types[builtins.image].kind {
            TypeKind::Array { elem, rank: 2 } => assert_eq!(elem, builtins.rgba),
            ref other => panic!("unexpected image type {:?}", other),
        }

        match symbols.try_get("to_float") {
            Some(Symbol::Fn(decl)) => match &ast.cmds[decl].kind {
                CmdKind::Fn { params, ret, .. } => {
                    assert_eq!(params.len(), 1);
                    assert_eq!(ast.bindings[params[0]].ty, builtins.int);
                    assert_eq!(*ret, builtins.float);
                }
                other => panic!("unexpected declaration {:?}", other),
            },
            other => panic!("unexpected symbol {:?}", other),
        }
    }
}
