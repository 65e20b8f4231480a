#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::{
    ast::ast::Ast,
    errors::errors::{ErrorHandler, Location},
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope_resolver::{qualified_names::QualifiedNameTable, scope_resolver::resolve_scopes},
    type_checker::{type_checker::infer_types, types::TypeTable},
};

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod scope_resolver;
pub mod type_checker;

extern crate regex;

/// Byte offset into a named source file.
#[derive(Debug, Clone)]
pub struct Position(pub u32, pub Rc<String>);

#[derive(Debug, Clone)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Maps byte offsets to 1-based line/column pairs.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset as u32 + 1);
            }
        }
        LineIndex { line_starts }
    }

    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        (line as u32 + 1, offset - self.line_starts[line] + 1)
    }

    pub fn location(&self, offset: u32, file: &Rc<String>) -> Location {
        let (line, col) = self.line_col(offset);
        Location::new(line, col, Rc::clone(file))
    }
}

/// Returns the 1-based line number and text of `line`, if it exists.
pub fn get_line(source: &str, line: u32) -> Option<&str> {
    source
        .split('\n')
        .nth(line.checked_sub(1)? as usize)
        .map(|text| text.trim_end_matches('\r'))
}

/// Output of a full front-end run over one compilation unit.
#[derive(Debug)]
pub struct Analysis {
    pub ast: Ast,
    pub names: QualifiedNameTable,
    pub types: TypeTable,
}

/// Runs lexing, parsing, scope resolution and type inference in order.
///
/// Lexing and parsing stop at their first error, which is reported into
/// `errors` and yields `None`. The semantic passes always run to
/// completion; check `errors` before trusting their results.
pub fn analyze(source: String, file: Option<String>, errors: &mut ErrorHandler) -> Option<Analysis> {
    let file = Rc::new(file.unwrap_or_else(|| String::from("shell")));

    let tokens = match tokenize(source.clone(), Some((*file).clone())) {
        Ok(tokens) => tokens,
        Err(error) => {
            errors.push(error);
            return None;
        }
    };

    let ast = match parse(tokens, source, Rc::clone(&file)) {
        Ok(ast) => ast,
        Err(error) => {
            errors.push(error);
            return None;
        }
    };

    let names = resolve_scopes(&ast, errors);
    let types = infer_types(&ast, &names, errors);

    Some(Analysis { ast, names, types })
}
