//! `rill` library crate.
//!
//! A tree-walking interpreter for a small dynamically-typed scripting
//! language with numbers, strings, lists, first-class functions and nil.
//!
//! Pipeline: `lexer` turns source text into tokens, `parser` builds the AST
//! (`ast`), and `interpreter` executes the root block against a flat global
//! environment, writing program output to a caller-provided sink.

use std::io::{Read, Write};

use anyhow::Context;
use log::debug;

pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;

use interpreter::{Interpreter, RuntimeError};
use lexer::LexError;
use parser::ParseError;

/// Runs the program read from `input`, writing its output to `output`.
///
/// Returns `true` when execution completed without error. On failure a
/// human-readable diagnostic is written to `output` and `false` is returned.
pub fn interpret<R: Read, W: Write>(mut input: R, mut output: W) -> bool {
    match run(&mut input, &mut output) {
        Ok(()) => true,
        Err(error) => {
            report(&mut output, &error);
            false
        }
    }
}

fn run(input: &mut dyn Read, output: &mut dyn Write) -> anyhow::Result<()> {
    let mut source = String::new();
    input
        .read_to_string(&mut source)
        .context("Reading source input")?;

    let tokens = lexer::tokenize(&source)?;
    debug!("scanned {} tokens", tokens.len());

    let program = parser::parse_tokens(tokens)?;
    debug!("parsed {} top-level statements", program.statements.len());

    Interpreter::new(output).run(&program)?;
    debug!("execution completed");
    Ok(())
}

fn report(output: &mut dyn Write, error: &anyhow::Error) {
    let specific =
        error.is::<LexError>() || error.is::<ParseError>() || error.is::<RuntimeError>();
    let kind = if specific { "specific" } else { "generic" };
    let _ = writeln!(output, "Runtime error ({kind}): {error:#}");
}
