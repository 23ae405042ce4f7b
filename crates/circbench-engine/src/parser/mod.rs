//! Solver output parsing.
//!
//! Solver stdout is free-form log text containing at most one
//! `SOLUTION_DATA = { ... }` block. The block is located by brace matching
//! and decoded with a restricted literal grammar.

pub mod literal;
mod solution;

pub use literal::{Literal, LiteralError, parse_literal};
pub use solution::{SOLUTION_MARKER, StructuredSolution, parse, parse_bytes};
