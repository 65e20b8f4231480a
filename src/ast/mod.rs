/// AST (Abstract Syntax Tree) module
/// Contains the flat, index-addressed syntax tree
///
/// Submodules:
/// - ast: Node storage, tags, shape accessors and the source-text service
/// - visitor: Enter/exit traversal over the tree
pub mod ast;
pub mod visitor;
