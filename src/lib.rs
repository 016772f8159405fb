pub mod ast;
pub mod augmenter;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod stdlib;
pub mod typechecker;

#[cfg(test)]
mod test;

use ariadne::{ColorGenerator, Label, Report, ReportKind};
use tracing::{debug, info};

use crate::ast::{Definitions, Expression, Program, Span};
use crate::augmenter::AugmentError;
use crate::interpreter::{DEFAULT_MAX_DEPTH, EvalError, interpret};
use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::stdlib::{Output, io, standard_library};
use crate::typechecker::{TypeCheckError, check_types};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Augment(#[from] AugmentError),
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Type(#[from] TypeCheckError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl Error {
    /// An `ariadne` report for errors that point into the augmented source.
    pub fn report(&self, file: &str) -> Option<Report<'static, (String, Span)>> {
        match self {
            Error::Parse(err) => Some(err.report(file)),
            Error::Lex(err) => Some(
                Report::build(ReportKind::Error, (file.to_string(), err.span.clone()))
                    .with_code("Lex Error")
                    .with_label(
                        Label::new((file.to_string(), err.span.clone()))
                            .with_message("this is not a valid token")
                            .with_color(ColorGenerator::new().next()),
                    )
                    .with_message(err.to_string())
                    .finish(),
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Run the type checker before evaluating.
    pub check_types: bool,
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            check_types: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Source text to definition table: augment, lex and parse.
pub fn compile(source: &str) -> Result<Program, Error> {
    let augmented = augmenter::augment(source)?;
    let tokens = lexer::lex(&augmented)?;
    debug!(tokens = tokens.len(), "lexed source");
    Ok(parser::parse(tokens)?)
}

/// Parses a single expression. No augmentation, so it has to fit on one line.
pub fn compile_expression(source: &str) -> Result<Expression, Error> {
    Ok(parser::parse_expression(lexer::lex(source)?)?)
}

/// Type checks `program` against the standard library.
pub fn check(program: &Program) -> Result<(), Error> {
    check_with(&standard_library(io::discard()), program)
}

fn check_with(builtins: &Definitions, program: &Program) -> Result<(), Error> {
    let mut table = builtins.clone();
    table.extend(program.definitions.clone());
    Ok(check_types(&table, &program.type_aliases)?)
}

/// Compiles `source`, optionally type checks it and evaluates `main`.
/// `printLine` writes to `output`.
pub fn run(source: &str, options: &Options, output: Output) -> Result<Expression, Error> {
    let program = compile(source)?;
    let builtins = standard_library(output);
    if options.check_types {
        check_with(&builtins, &program)?;
        info!("type check passed");
    }
    Ok(interpret(&program, &builtins, options.max_depth)?)
}
