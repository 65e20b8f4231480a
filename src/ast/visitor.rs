use super::ast::{Ast, NodeId};

/// Traversal hooks driven by [`walk`].
///
/// `enter` fires before a node's children are visited (pre-order) and
/// `exit` after all of them (post-order).
pub trait Visitor {
    fn enter(&mut self, _ast: &Ast, _node: NodeId) {}
    fn exit(&mut self, _ast: &Ast, _node: NodeId) {}
}

/// Depth-first walk of the whole tree starting at the root.
pub fn walk<V: Visitor>(ast: &Ast, visitor: &mut V) {
    if ast.is_empty() {
        return;
    }
    walk_node(ast, ast.root(), visitor);
}

pub fn walk_node<V: Visitor>(ast: &Ast, node: NodeId, visitor: &mut V) {
    visitor.enter(ast, node);
    for child in ast.children(node) {
        walk_node(ast, child, visitor);
    }
    visitor.exit(ast, node);
}
