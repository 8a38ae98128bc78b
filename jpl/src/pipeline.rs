//! Driving the front end stages over one compilation unit.
use std::fmt::{self, Display, Formatter, Write as FmtWrite};

use log::debug;

use crate::{
    check,
    diagnostics::{Diagnostic, Report},
    error::{JplError, JplResult},
    lexer::Lexer,
    parsing::{self, Parsed},
    printer::{self, Printer},
    tokens::TokenVec,
};

/// Front end stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Lex,
    Parse,
    TypeCheck,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex => write!(f, "lexing"),
            Self::Parse => write!(f, "parsing"),
            Self::TypeCheck => write!(f, "type checking"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// Print the output of the last stage that ran.
    Dump,
    /// Print nothing; the exit code carries the outcome.
    Quiet,
}

/// What to compile and what to show.
#[derive(Debug, Clone, Copy)]
pub struct CompileConf {
    /// Last stage to run.
    pub stage: Stage,
    pub print: PrintMode,
}

impl Default for CompileConf {
    fn default() -> Self {
        Self {
            stage: Stage::TypeCheck,
            print: PrintMode::Dump,
        }
    }
}

/// Everything the stages produced.
#[derive(Debug)]
pub struct PipelineResult<'a> {
    pub source: &'a [u8],
    /// Last stage that ran.
    pub stage: Stage,
    pub tokens: TokenVec,
    /// Present once parsing ran.
    pub parsed: Option<Parsed<'a>>,
    /// Diagnostics of every stage in discovery order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Run every stage up to and including `stage`.
///
/// Later stages run even when earlier ones reported errors, on
/// whatever the earlier stages managed to recover. The source is raw
/// bytes, anything outside printable ASCII is reported while lexing.
pub fn run(source: &(impl AsRef<[u8]> + ?Sized), stage: Stage) -> PipelineResult<'_> {
    let source = source.as_ref();
    let (tokens, mut diagnostics) = Lexer::new(source).tokenize();

    let parsed = if stage >= Stage::Parse {
        let mut parsed = parsing::parse(&tokens, source);
        diagnostics.append(&mut parsed.diagnostics);

        if stage >= Stage::TypeCheck {
            let mut type_errors = check::check(&mut parsed.ast, &parsed.commands);
            diagnostics.append(&mut type_errors);
        }

        Some(parsed)
    } else {
        None
    };

    debug!("{} finished with {} diagnostics", stage, diagnostics.len());

    PipelineResult {
        source,
        stage,
        tokens,
        parsed,
        diagnostics,
    }
}

impl<'a> PipelineResult<'a> {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Earliest stage that reported an error.
    pub fn failed_stage(&self) -> Option<Stage> {
        self.diagnostics.iter().map(Diagnostic::stage).min()
    }

    /// Error summarizing the diagnostics, if there are any.
    pub fn ok(&self) -> JplResult<()> {
        match self.failed_stage() {
            Some(stage) => Err(JplError::Failed {
                stage,
                count: self.diagnostics.len(),
            }),
            None => Ok(()),
        }
    }

    pub fn report<'r>(&'r self, file_name: &'r str) -> Report<'r, 'a> {
        Report {
            file_name,
            source: self.source,
            tokens: &self.tokens,
            ast: self.parsed.as_ref().map(|parsed| &parsed.ast),
        }
    }

    /// All diagnostics rendered with source excerpts.
    pub fn render_diagnostics(&self, file_name: &str) -> JplResult<String> {
        Ok(self.report(file_name).render_all(&self.diagnostics)?)
    }

    /// Write the output of the last stage: tokens, syntax tree or
    /// typed syntax tree.
    pub fn write_dump<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        match (&self.parsed, self.stage) {
            (None, _) | (_, Stage::Lex) => printer::write_tokens(w, &self.tokens, self.source),
            (Some(parsed), Stage::Parse) => Printer::new(&parsed.ast).write_program(w, &parsed.commands),
            (Some(parsed), Stage::TypeCheck) => {
                Printer::typed(&parsed.ast).write_program(w, &parsed.commands)
            }
        }
    }

    pub fn dump(&self) -> JplResult<String> {
        let mut out = String::new();
        self.write_dump(&mut out)?;
        Ok(out)
    }
}
