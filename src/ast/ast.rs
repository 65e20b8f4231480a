use std::{fmt::Display, rc::Rc};

use crate::{errors::errors::Location, lexer::tokens::Token, LineIndex};

/// Index of a node inside [`Ast::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a token inside [`Ast::tokens`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(pub u32);

/// Marks an absent optional child in [`Data`].
pub const NULL_NODE: u32 = u32::MAX;

/// Node tags
///
/// Closed set of node shapes. How `lhs`/`rhs` are read depends on the tag:
///
/// - `Root`, `Block`: `extra[lhs..rhs]` holds the statements
/// - `FnDecl`: `lhs` is the name, `extra[rhs..rhs + 3]` is `[params_start, params_end, body]`
/// - `ConstDecl`, `VarDecl`: `lhs` is the name, `rhs` the initialiser
/// - `Assign`: `lhs` is the target, `rhs` the value
/// - `ExprStmt`, `Expression`, prefix operators: `lhs` is the operand
/// - `Return`: `lhs` is the value or [`NULL_NODE`]
/// - binary operators: `lhs`, `rhs`
/// - `Call`: `lhs` is the callee, `extra[rhs..rhs + 2]` is `[args_start, args_end]`
/// - identifiers and literals: no children, the text lives in the main token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Root,
    FnDecl,
    Block,
    ConstDecl,
    VarDecl,
    Assign,
    ExprStmt,
    Return,
    Expression,

    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    BoolLiteral,

    UnaryPlus,
    Negate,
    Not,
    AddressOf,
    Deref,

    Add,
    Sub,
    Mul,
    Div,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,

    Call,
}

impl Tag {
    /// Tags that open a new lexical scope.
    pub fn is_scope(&self) -> bool {
        matches!(self, Tag::Root | Tag::FnDecl | Tag::Block)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tag::Root => "root",
            Tag::FnDecl => "fn",
            Tag::Block => "block",
            Tag::ConstDecl => "const",
            Tag::VarDecl => "var",
            Tag::Assign => "=",
            Tag::ExprStmt => "expr",
            Tag::Return => "return",
            Tag::Expression => "expression",
            Tag::Identifier => "ident",
            Tag::IntLiteral => "int",
            Tag::FloatLiteral => "float",
            Tag::StringLiteral => "string",
            Tag::BoolLiteral => "bool",
            Tag::UnaryPlus => "pos",
            Tag::Negate => "neg",
            Tag::Not => "!",
            Tag::AddressOf => "&",
            Tag::Deref => "*",
            Tag::Add => "+",
            Tag::Sub => "-",
            Tag::Mul => "*",
            Tag::Div => "/",
            Tag::Equal => "==",
            Tag::NotEqual => "!=",
            Tag::Less => "<",
            Tag::LessEqual => "<=",
            Tag::Greater => ">",
            Tag::GreaterEqual => ">=",
            Tag::And => "&&",
            Tag::Or => "||",
            Tag::Call => "call",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Data {
    pub lhs: u32,
    pub rhs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub tag: Tag,
    pub main_token: TokenId,
    pub data: Data,
}

/// Function declaration view over a `FnDecl` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnDecl {
    pub name: NodeId,
    pub params: Vec<NodeId>,
    pub body: NodeId,
}

/// Call view over a `Call` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub callee: NodeId,
    pub args: Vec<NodeId>,
}

/// Immutable flat syntax tree.
///
/// Nodes reference each other by [`NodeId`] only. Variable-length child
/// runs are stored in the shared `extra` side array.
#[derive(Debug, Clone)]
pub struct Ast {
    pub source: String,
    pub file: Rc<String>,
    pub tokens: Vec<Token>,
    pub nodes: Vec<Node>,
    pub extra: Vec<u32>,
    line_index: LineIndex,
}

impl Ast {
    pub fn new(
        source: String,
        file: Rc<String>,
        tokens: Vec<Token>,
        nodes: Vec<Node>,
        extra: Vec<u32>,
    ) -> Self {
        let line_index = LineIndex::new(&source);
        Ast {
            source,
            file,
            tokens,
            nodes,
            extra,
            line_index,
        }
    }

    /// The root is always the first node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn tag(&self, id: NodeId) -> Tag {
        self.node(id).tag
    }

    pub fn lhs(&self, id: NodeId) -> NodeId {
        NodeId(self.node(id).data.lhs)
    }

    pub fn rhs(&self, id: NodeId) -> NodeId {
        NodeId(self.node(id).data.rhs)
    }

    fn extra_nodes(&self, start: u32, end: u32) -> Vec<NodeId> {
        self.extra[start as usize..end as usize]
            .iter()
            .map(|index| NodeId(*index))
            .collect()
    }

    /// Statements of a `Root` or `Block` node.
    pub fn statements(&self, id: NodeId) -> Vec<NodeId> {
        let data = self.node(id).data;
        self.extra_nodes(data.lhs, data.rhs)
    }

    pub fn fn_decl(&self, id: NodeId) -> FnDecl {
        let data = self.node(id).data;
        let at = data.rhs as usize;
        FnDecl {
            name: NodeId(data.lhs),
            params: self.extra_nodes(self.extra[at], self.extra[at + 1]),
            body: NodeId(self.extra[at + 2]),
        }
    }

    pub fn call(&self, id: NodeId) -> Call {
        let data = self.node(id).data;
        let at = data.rhs as usize;
        Call {
            callee: NodeId(data.lhs),
            args: self.extra_nodes(self.extra[at], self.extra[at + 1]),
        }
    }

    /// The value of a `Return`, if any.
    pub fn return_value(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id).data.lhs {
            NULL_NODE => None,
            lhs => Some(NodeId(lhs)),
        }
    }

    /// Children in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.tag(id) {
            Tag::Root | Tag::Block => self.statements(id),
            Tag::FnDecl => {
                let decl = self.fn_decl(id);
                let mut children = vec![decl.name];
                children.extend(decl.params);
                children.push(decl.body);
                children
            }
            Tag::Call => {
                let call = self.call(id);
                let mut children = vec![call.callee];
                children.extend(call.args);
                children
            }
            Tag::Return => self.return_value(id).into_iter().collect(),
            Tag::ConstDecl
            | Tag::VarDecl
            | Tag::Assign
            | Tag::Add
            | Tag::Sub
            | Tag::Mul
            | Tag::Div
            | Tag::Equal
            | Tag::NotEqual
            | Tag::Less
            | Tag::LessEqual
            | Tag::Greater
            | Tag::GreaterEqual
            | Tag::And
            | Tag::Or => vec![self.lhs(id), self.rhs(id)],
            Tag::ExprStmt
            | Tag::Expression
            | Tag::UnaryPlus
            | Tag::Negate
            | Tag::Not
            | Tag::AddressOf
            | Tag::Deref => vec![self.lhs(id)],
            Tag::Identifier
            | Tag::IntLiteral
            | Tag::FloatLiteral
            | Tag::StringLiteral
            | Tag::BoolLiteral => vec![],
        }
    }

    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id.0 as usize]
    }

    /// Source text of the node's main token.
    pub fn token_text(&self, id: NodeId) -> &str {
        &self.token(self.node(id).main_token).value
    }

    /// Line and column of the node's main token.
    pub fn token_location(&self, id: NodeId) -> Location {
        let offset = self.token(self.node(id).main_token).span.start.0;
        self.line_index.location(offset, &self.file)
    }

    /// Renders the tree as an S-expression.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(self.root(), &mut out);
        out
    }

    fn render_node(&self, id: NodeId, out: &mut String) {
        match self.tag(id) {
            Tag::Identifier => out.push_str(self.token_text(id)),
            Tag::StringLiteral => out.push_str(&format!("{:?}", self.token_text(id))),
            Tag::IntLiteral | Tag::FloatLiteral | Tag::BoolLiteral => {
                out.push_str(self.token_text(id))
            }
            // Expression wrappers are transparent in the dump.
            Tag::Expression => self.render_node(self.lhs(id), out),
            tag => {
                out.push('(');
                out.push_str(tag.name());
                for child in self.children(id) {
                    out.push(' ');
                    self.render_node(child, out);
                }
                out.push(')');
            }
        }
    }
}
