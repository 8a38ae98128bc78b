//! Entrypoint for CLI
mod error;

use std::{env, fs, process};

use jpl::prelude::*;
use log::{error, info, LevelFilter};

use crate::error::AppError;

static USAGE: &str = r#"
usage: jplc [-l | -p | -t] [--no-print] FILE

options:
    -l          Lex only and print the tokens
    -p          Lex and parse, and print the syntax tree
    -t          Lex, parse and type check, and print the typed syntax tree (default)
    -h          Print this help text
    --no-print  Print nothing, only set the exit code

examples:
    jplc -l gradient.jpl
    jplc --no-print gradient.jpl
"#;

/// Compile one file, returning whether it succeeded.
fn compile_file(file_path: &str, conf: CompileConf) -> Result<bool, AppError> {
    info!("compiling {} up to {}", file_path, conf.stage);

    let file_bytes = fs::read(file_path)?;
    let result = run(&file_bytes, conf.stage);

    if let Err(err) = result.ok() {
        error!("{}", err);
    }
    print!("{}", render_output(&result, file_path, conf.print)?);

    Ok(result.is_success())
}

/// Text printed to stdout for a finished run.
fn render_output(
    result: &PipelineResult,
    file_path: &str,
    print: PrintMode,
) -> Result<String, AppError> {
    let mut output = String::new();

    match (print, result.is_success()) {
        (PrintMode::Quiet, _) => {}
        (PrintMode::Dump, true) => {
            output.push_str(&result.dump()?);
            output.push_str("Compilation succeeded\n");
        }
        (PrintMode::Dump, false) => {
            output.push_str(&result.render_diagnostics(file_path)?);
            output.push_str("Compilation failed\n");
        }
    }

    Ok(output)
}

fn main() {
    if let Err(err) = simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .env()
        .init()
    {
        eprintln!("failed to initialise logger: {err}");
    }

    let (file_path, conf) = match parse_args(env::args().skip(1)) {
        Some(Cli::Help) => {
            print_usage();
            return;
        }
        Some(Cli::Compile { file_path, conf }) => (file_path, conf),
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            process::exit(64)
        }
    };

    match compile_file(&file_path, conf) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("{err}");
            process::exit(1)
        }
    }
}

fn parse_args(args: impl Iterator<Item = String>) -> Option<Cli> {
    let mut conf = CompileConf::default();
    let mut file_path = None;

    for arg in args {
        match arg.as_str() {
            "-l" => conf.stage = Stage::Lex,
            "-p" => conf.stage = Stage::Parse,
            "-t" => conf.stage = Stage::TypeCheck,
            "-h" => return Some(Cli::Help),
            "--no-print" => conf.print = PrintMode::Quiet,
            flag if flag.starts_with('-') => return None,
            // Exactly one file.
            _ if file_path.is_some() => return None,
            _ => file_path = Some(arg),
        }
    }

    Some(Cli::Compile {
        file_path: file_path?,
        conf,
    })
}

fn print_usage() {
    println!("jplc v{}", env!("CARGO_PKG_VERSION"));
    println!("{USAGE}");
}

enum Cli {
    Help,
    Compile { file_path: String, conf: CompileConf },
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(list: &[&str]) -> Option<Cli> {
        parse_args(list.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn test_parse_args() {
        match args(&["-p", "--no-print", "main.jpl"]) {
            Some(Cli::Compile { file_path, conf }) => {
                assert_eq!(file_path, "main.jpl");
                assert_eq!(conf.stage, Stage::Parse);
                assert_eq!(conf.print, PrintMode::Quiet);
            }
            _ => panic!("expected compile"),
        }

        assert!(matches!(args(&["-h"]), Some(Cli::Help)));
        assert!(args(&[]).is_none());
        assert!(args(&["a.jpl", "b.jpl"]).is_none());
        assert!(args(&["-x", "a.jpl"]).is_none());
    }

    #[test]
    fn test_no_print_is_silent() {
        let failed = run("show 1 +\n", Stage::TypeCheck);
        let output = render_output(&failed, "bad.jpl", PrintMode::Dump).unwrap();
        assert!(output.starts_with("Parse error at bad.jpl:1:"), "{}", output);
        assert!(output.ends_with("Compilation failed\n"));
        assert_eq!(render_output(&failed, "bad.jpl", PrintMode::Quiet).unwrap(), "");

        let passed = run("show 1\n", Stage::Lex);
        let output = render_output(&passed, "ok.jpl", PrintMode::Dump).unwrap();
        assert!(output.starts_with("SHOW 'show'\n"));
        assert!(output.ends_with("Compilation succeeded\n"));
        assert_eq!(render_output(&passed, "ok.jpl", PrintMode::Quiet).unwrap(), "");
    }
}
