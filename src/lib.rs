//! A small tree-walking interpreter: lex, parse, then evaluate statements
//! sequentially against a stack of lexical scopes.

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod token;
pub mod value;

use error::{LexError, ParseError, RuntimeError};
use interpreter::Interpreter;

/// Everything that can go wrong running one batch of source.
#[derive(Debug)]
pub enum PipelineError {
    Lex(LexError),
    Parse(Vec<ParseError>),
}

/// Lexes and parses `source`. If this succeeds, nothing has been evaluated
/// yet — parsing failure suppresses evaluation of the entire batch.
pub fn parse_source(source: &str) -> Result<Vec<ast::Stmt>, PipelineError> {
    let tokens = lexer::Lexer::tokenize(source).map_err(PipelineError::Lex)?;
    parser::Parser::parse(&tokens).map_err(PipelineError::Parse)
}

/// Evaluates a parsed batch of statements in order against `interpreter`. A
/// runtime error in one top-level statement is reported to the caller but
/// does not stop later statements in the batch from running.
pub fn eval_statements(interpreter: &mut Interpreter, stmts: &[ast::Stmt]) -> Vec<RuntimeError> {
    let mut errors = Vec::new();
    for stmt in stmts {
        if let Err(e) = interpreter.eval_top_level(stmt) {
            errors.push(e);
        }
    }
    errors
}

/// Runs one full batch of source through lex → parse → eval. Diagnostics
/// from a failed lex/parse suppress evaluation entirely, matching the
/// pipeline's one-way data flow.
pub fn run(interpreter: &mut Interpreter, source: &str) -> Result<Vec<RuntimeError>, PipelineError> {
    let stmts = parse_source(source)?;
    Ok(eval_statements(interpreter, &stmts))
}
