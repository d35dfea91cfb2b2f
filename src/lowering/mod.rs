//! Front-end lowering: parses the restricted scripting subset and
//! walks the resulting syntax tree to emit RV32I assembly text.
//!
//! This stage is peripheral to the toolchain's core (assembler + ISS):
//! it exists only to produce realistic input for them. It is not a
//! general-purpose compiler — the grammar is deliberately small.

pub mod ast;
mod codegen;
mod parser;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LowerError {
    #[error("unexpected token {found:?}, expected {expected}")]
    UnexpectedToken { found: String, expected: &'static str },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("unsupported operator {op:?}")]
    UnsupportedOperator { op: String },
    #[error("variable register pool exhausted (more than 11 live variables)")]
    RegisterPoolExhausted,
}

/// Parse `source` and lower it to RV32I assembly text.
pub fn lower(source: &str) -> Result<String, LowerError> {
    let program = parser::parse(source)?;
    codegen::generate(&program)
}
