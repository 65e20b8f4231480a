//! Lexical analysis module for the compiler.
//!
//! This module contains the lexer (tokenizer) that converts source code
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using an ordered table of regex patterns
//! - Recognition of keywords, identifiers, literals, and operators
//! - Automatic statement terminator insertion at line breaks
//! - Comments and whitespace handling

pub mod lexer;
pub mod tokens;
