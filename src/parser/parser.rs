//! Parser implementation for building the flat syntax tree.
//!
//! This module contains the main Parser struct and the parse entry point.
//! The parser uses a Pratt parser approach with NUD/LED handlers for
//! expression parsing and specialized functions for statement parsing.
//!
//! It maintains lookup tables for:
//! - Statement handlers
//! - NUD (null denotation) handlers for prefix expressions
//! - LED (left denotation) handlers for infix expressions
//! - Binding powers for operator precedence
//!
//! Nodes are appended to a flat arena as they are completed; the root is
//! reserved up front so it always sits at index 0.

use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::ast::{Ast, Data, Node, NodeId, Tag, TokenId},
    errors::errors::{Error, ErrorImpl, Location},
    lexer::tokens::{Token, TokenKind},
    LineIndex,
};

use super::{
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler,
        NUDLookup, StmtHandler, StmtLookup,
    },
    stmt::parse_stmt,
};

/// The main parser structure that maintains parsing state.
pub struct Parser {
    /// The list of tokens to parse
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// The name of the source file being parsed
    file: Rc<String>,
    source: String,
    line_index: LineIndex,
    /// Lookup table for statement parsing handlers
    stmt_lookup: StmtLookup,
    /// Lookup table for null denotation (prefix) expression handlers
    nud_lookup: NUDLookup,
    /// Lookup table for left denotation (infix) expression handlers
    led_lookup: LEDLookup,
    /// Lookup table for expression binding powers (precedence)
    binding_power_lookup: BPLookup,
    nodes: Vec<Node>,
    extra: Vec<u32>,
    /// Number of function bodies currently open
    fn_depth: usize,
}

impl Parser {
    /// Creates a new Parser instance over a token stream that ends in `EOF`.
    pub fn new(tokens: Vec<Token>, source: String, file: Rc<String>) -> Self {
        let line_index = LineIndex::new(&source);
        Parser {
            tokens,
            pos: 0,
            file,
            source,
            line_index,
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            nodes: vec![],
            extra: vec![],
            fn_depth: 0,
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        // The stream always ends in EOF, so clamp rather than run off the end.
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    pub fn current_token_id(&self) -> TokenId {
        TokenId(self.pos.min(self.tokens.len() - 1) as u32)
    }

    /// Advances to the next token and returns the id of the previous one.
    pub fn advance(&mut self) -> TokenId {
        let id = self.current_token_id();
        if self.current_token_kind() != TokenKind::EOF {
            self.pos += 1;
        }
        id
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<TokenId, Error> {
        if self.current_token_kind() != expected_kind {
            match error {
                Some(error) => Err(error),
                None => Err(self.unexpected_token()),
            }
        } else {
            Ok(self.advance())
        }
    }

    /// Expects a token of the specified kind with default error message.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<TokenId, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Consumes a statement terminator. It may be left out before `}` and at the end of input.
    pub fn expect_terminator(&mut self) -> Result<(), Error> {
        match self.current_token_kind() {
            TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::CloseCurly | TokenKind::EOF => Ok(()),
            _ => Err(self.unexpected_token_detailed("expected `;` or a newline")),
        }
    }

    /// Checks if there are more tokens to parse.
    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    pub fn unexpected_token(&self) -> Error {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: self.current_token().value.clone(),
            },
            self.get_location(),
        )
    }

    pub fn unexpected_token_detailed(&self, message: &str) -> Error {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: self.current_token().value.clone(),
                message: String::from(message),
            },
            self.get_location(),
        )
    }

    /// Returns a reference to the statement lookup table.
    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    /// Returns a reference to the NUD (null denotation) lookup table.
    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    /// Returns a reference to the LED (left denotation) lookup table.
    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    /// Returns a reference to the binding power lookup table.
    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    /// Registers a left denotation (infix) handler for a token.
    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    /// Registers a null denotation (prefix) handler for a token.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    /// Registers a statement handler for a token.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    /// Returns the location of the current token.
    pub fn get_location(&self) -> Location {
        self.line_index
            .location(self.current_token().span.start.0, &self.file)
    }

    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id.0 as usize]
    }

    pub fn add_node(&mut self, tag: Tag, main_token: TokenId, lhs: u32, rhs: u32) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            tag,
            main_token,
            data: Data { lhs, rhs },
        });
        id
    }

    pub fn set_node(&mut self, id: NodeId, tag: Tag, main_token: TokenId, lhs: u32, rhs: u32) {
        self.nodes[id.index()] = Node {
            tag,
            main_token,
            data: Data { lhs, rhs },
        };
    }

    /// Appends a run of node ids to the side array and returns its `[start, end)` bounds.
    pub fn add_extra_range(&mut self, ids: &[NodeId]) -> (u32, u32) {
        let start = self.extra.len() as u32;
        self.extra.extend(ids.iter().map(|id| id.0));
        (start, self.extra.len() as u32)
    }

    /// Appends raw words to the side array and returns the index of the first.
    pub fn add_extra(&mut self, words: &[u32]) -> u32 {
        let start = self.extra.len() as u32;
        self.extra.extend_from_slice(words);
        start
    }

    pub fn enter_function(&mut self) {
        self.fn_depth += 1;
    }

    pub fn exit_function(&mut self) {
        self.fn_depth -= 1;
    }

    pub fn in_function(&self) -> bool {
        self.fn_depth > 0
    }

    fn into_ast(self) -> Ast {
        Ast::new(self.source, self.file, self.tokens, self.nodes, self.extra)
    }
}

/// Parses a stream of tokens into a flat syntax tree.
///
/// This is the main entry point for parsing. It creates a parser instance,
/// initializes all lookup tables, and parses all statements until EOF.
/// Parsing stops at the first syntax error.
pub fn parse(tokens: Vec<Token>, source: String, file: Rc<String>) -> Result<Ast, Error> {
    let mut parser = Parser::new(tokens, source, file);
    create_token_lookups(&mut parser);

    let root_token = parser.current_token_id();
    let root = parser.add_node(Tag::Root, root_token, 0, 0);

    let mut body = vec![];
    while parser.has_tokens() {
        if parser.current_token_kind() == TokenKind::Semicolon {
            parser.advance();
            continue;
        }
        body.push(parse_stmt(&mut parser)?);
    }

    let (start, end) = parser.add_extra_range(&body);
    parser.set_node(root, Tag::Root, root_token, start, end);

    tracing::debug!(nodes = parser.nodes.len(), file = %parser.file, "parsed source");
    Ok(parser.into_ast())
}
