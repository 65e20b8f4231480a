//! Type inference over the flat syntax tree.
//!
//! A single post-order walk assigns a type variable to every expression
//! and declaration, then unifies them according to how they are used.
//! Names come from the scope resolver, so every occurrence of a
//! declaration shares one canonical type.
//!
//! Type errors are collected, not fatal: inference keeps going so a single
//! run can report several of them.

pub mod type_checker;
pub mod types;
pub mod union_find;

#[cfg(test)]
mod tests;
