use std::{collections::HashMap, fmt::Display};

use crate::ast::ast::NodeId;

/// Scope-unique key for a declaration.
///
/// Rendered as the `::`-joined ids of the enclosing scope nodes from the
/// root down, followed by `lexeme#node`, e.g. `0::4::a#7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn new(scopes: &[NodeId], lexeme: &str, node: NodeId) -> Self {
        let mut name = scopes
            .iter()
            .map(|scope| scope.to_string())
            .collect::<Vec<String>>()
            .join("::");
        if !name.is_empty() {
            name.push_str("::");
        }
        name.push_str(&format!("{}#{}", lexeme, node));
        QualifiedName(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Qualified names for every declaration and every resolved usage.
#[derive(Debug, Clone, Default)]
pub struct QualifiedNameTable {
    node_to_name: HashMap<NodeId, QualifiedName>,
    name_to_decl: HashMap<QualifiedName, NodeId>,
    declarations: Vec<NodeId>,
    usages: Vec<(NodeId, NodeId)>,
}

impl QualifiedNameTable {
    pub fn new() -> Self {
        QualifiedNameTable::default()
    }

    pub fn add_declaration(&mut self, node: NodeId, name: QualifiedName) {
        self.name_to_decl.insert(name.clone(), node);
        self.node_to_name.insert(node, name);
        self.declarations.push(node);
    }

    /// Gives `user` the name of `declaration`. The declaration must already be in the table.
    pub fn add_usage(&mut self, user: NodeId, declaration: NodeId) {
        if let Some(name) = self.node_to_name.get(&declaration).cloned() {
            self.node_to_name.insert(user, name);
            self.usages.push((user, declaration));
        }
    }

    /// Name of a declaration or of a usage resolved to one.
    pub fn node_to_name(&self, node: NodeId) -> Option<&QualifiedName> {
        self.node_to_name.get(&node)
    }

    pub fn name_to_decl_node(&self, name: &QualifiedName) -> Option<NodeId> {
        self.name_to_decl.get(name).copied()
    }

    /// Declaration nodes in the order they were declared.
    pub fn all_declaration_nodes(&self) -> &[NodeId] {
        &self.declarations
    }

    /// `(usage, declaration)` node pairs in traversal order.
    pub fn usages(&self) -> &[(NodeId, NodeId)] {
        &self.usages
    }

    /// Declaration a usage (or declaration) node resolves to.
    pub fn declaration_of(&self, node: NodeId) -> Option<NodeId> {
        self.node_to_name(node)
            .and_then(|name| self.name_to_decl_node(name))
    }
}
