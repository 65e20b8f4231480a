//! Parser module for building the flat syntax tree.
//!
//! This module contains the parser that transforms a stream of tokens
//! into an index-addressed syntax tree. It uses a Pratt parser for
//! expressions with operator precedence and handles:
//!
//! - Statement parsing (functions, blocks, const/var declarations, assignments, returns)
//! - Expression parsing (binary and prefix operators, calls, literals)
//! - Optional statement terminators before `}` and end of input
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
