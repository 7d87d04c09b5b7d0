//! Error types for each pipeline stage.
//!
//! Mirrors the teacher crate's hand-rolled `Display`-based errors
//! (`FileLoadError`, `ImportError` in its `loader` module) rather than reaching
//! for `thiserror`/`anyhow`, since neither is part of this crate's dependency
//! stack.

use std::error::Error;
use std::fmt;

use crate::token::Offset;

/// Produced by the lexer when no pattern matches at the current cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub offset: Offset,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at: {}", self.message, self.offset)
    }
}

impl Error for LexError {}

/// A single parser diagnostic. The parser accumulates these and keeps going.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub offset: Offset,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at: {}", self.message, self.offset)
    }
}

impl Error for ParseError {}

/// A runtime error raised while evaluating the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for RuntimeError {}

impl From<&str> for RuntimeError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for RuntimeError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
