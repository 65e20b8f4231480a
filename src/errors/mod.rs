//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - Error structures carrying a line/column location
//! - Specific error variants for lexing, parsing and semantic analysis
//! - The accumulating `ErrorHandler` sink every stage reports into
//! - Error formatting and display functionality

pub mod errors;

#[cfg(test)]
mod tests;
