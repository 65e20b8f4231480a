//! Name resolution.
//!
//! Binds every identifier in expression position to the innermost visible
//! declaration with the same lexeme and gives each declaration a
//! scope-unique qualified name.

pub mod qualified_names;
pub mod scope_resolver;

#[cfg(test)]
mod tests;
