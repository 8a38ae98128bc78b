//! Front end for a small array language: lexer, parser and type checker.
pub mod arena;
pub mod ast;
pub mod check;
pub mod diagnostics;
pub mod dict;
mod error;
pub mod lexer;
pub mod parsing;
pub mod pipeline;
pub mod printer;
pub mod token_stream;
pub mod tokens;

pub use self::error::{JplError, JplResult};

pub mod prelude {
    pub use super::{
        diagnostics::{Diagnostic, DiagnosticKind, LexErrorKind, ParseErrorKind, Report, TypeErrorKind},
        error::{JplError, JplResult},
        lexer::Lexer,
        pipeline::{run, CompileConf, PipelineResult, PrintMode, Stage},
    };
}
