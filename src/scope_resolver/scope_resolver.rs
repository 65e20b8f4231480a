use std::collections::HashSet;

use crate::{
    ast::{
        ast::{Ast, NodeId, Tag},
        visitor::{walk, Visitor},
    },
    errors::errors::{ErrorHandler, ErrorImpl},
};

use super::qualified_names::{QualifiedName, QualifiedNameTable};

/// Index into [`ScopeStack::declarations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A name binding, or the anchor of a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub node: NodeId,
    /// Enclosing scope anchor. Only the root has none.
    pub parent: Option<DeclId>,
    pub line: u32,
    pub col: u32,
    /// `false` for scope anchors (root, function, block).
    pub is_binding_site: bool,
    pub depth: u32,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    saved_top: usize,
    anchor: DeclId,
}

/// Append-only declaration list plus the window of currently visible names.
///
/// Exiting a scope truncates the window back to where it was on entry. The
/// declaration records themselves are never removed.
#[derive(Debug, Default)]
pub struct ScopeStack {
    declarations: Vec<Declaration>,
    visible: Vec<DeclId>,
    frames: Vec<Frame>,
    depth: u32,
    entered: usize,
    exited: usize,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack::default()
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn declaration(&self, id: DeclId) -> &Declaration {
        &self.declarations[id.index()]
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Every entered scope has been exited and no name is left visible.
    pub fn is_balanced(&self) -> bool {
        self.entered == self.exited && self.frames.is_empty() && self.visible.is_empty()
    }

    fn current_parent(&self) -> Option<DeclId> {
        self.frames.last().map(|frame| frame.anchor)
    }

    fn record(&mut self, node: NodeId, line: u32, col: u32, is_binding_site: bool) -> DeclId {
        let id = DeclId(self.declarations.len() as u32);
        self.declarations.push(Declaration {
            node,
            parent: self.current_parent(),
            line,
            col,
            is_binding_site,
            depth: self.depth,
        });
        id
    }

    pub fn enter_scope(&mut self, node: NodeId, line: u32, col: u32) -> DeclId {
        let saved_top = self.visible.len();
        self.depth += 1;
        self.entered += 1;
        let anchor = self.record(node, line, col, false);
        self.frames.push(Frame { saved_top, anchor });
        anchor
    }

    pub fn exit_scope(&mut self) {
        // Exit without a matching enter means the traversal itself is broken.
        let frame = self
            .frames
            .pop()
            .expect("scope exit without a matching enter");
        self.visible.truncate(frame.saved_top);
        self.depth -= 1;
        self.exited += 1;
    }

    pub fn declare(&mut self, node: NodeId, line: u32, col: u32) -> DeclId {
        let id = self.record(node, line, col, true);
        self.visible.push(id);
        id
    }

    /// Innermost visible declaration whose lexeme satisfies `matches`.
    pub fn lookup<F>(&self, mut matches: F) -> Option<DeclId>
    where
        F: FnMut(&Declaration) -> bool,
    {
        self.visible
            .iter()
            .rev()
            .copied()
            .find(|id| matches(self.declaration(*id)))
    }

    /// Like [`ScopeStack::lookup`] but limited to the current scope depth.
    pub fn lookup_current_scope<F>(&self, mut matches: F) -> Option<DeclId>
    where
        F: FnMut(&Declaration) -> bool,
    {
        self.visible
            .iter()
            .rev()
            .copied()
            .take_while(|id| self.declaration(*id).depth == self.depth)
            .find(|id| matches(self.declaration(*id)))
    }

    /// Anchor node ids from the root down to (excluding) `id`.
    pub fn scope_path(&self, id: DeclId) -> Vec<NodeId> {
        let mut path = vec![];
        let mut parent = self.declaration(id).parent;
        while let Some(anchor) = parent {
            let declaration = self.declaration(anchor);
            path.push(declaration.node);
            parent = declaration.parent;
        }
        path.reverse();
        path
    }
}

/// Resolved identifier in usage position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub user: NodeId,
    pub decl: DeclId,
}

/// Pre-order pass binding every identifier use to its declaration.
pub struct ScopeResolver<'e> {
    scopes: ScopeStack,
    usages: Vec<Usage>,
    in_expression: bool,
    /// Function names declared ahead of their own scope.
    predeclared: HashSet<NodeId>,
    errors: &'e mut ErrorHandler,
}

impl<'e> ScopeResolver<'e> {
    pub fn new(errors: &'e mut ErrorHandler) -> Self {
        ScopeResolver {
            scopes: ScopeStack::new(),
            usages: vec![],
            in_expression: false,
            predeclared: HashSet::new(),
            errors,
        }
    }

    pub fn scope_stack(&self) -> &ScopeStack {
        &self.scopes
    }

    pub fn usages(&self) -> &[Usage] {
        &self.usages
    }

    fn declare_name(&mut self, ast: &Ast, node: NodeId) {
        let lexeme = ast.token_text(node);
        let location = ast.token_location(node);

        let clash = self
            .scopes
            .lookup_current_scope(|decl| decl.is_binding_site && ast.token_text(decl.node) == lexeme);
        if clash.is_some() {
            self.errors.add(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: lexeme.to_string(),
                },
                location.clone(),
            );
        }

        let id = self.scopes.declare(node, location.line, location.col);
        tracing::trace!(name = lexeme, decl = id.0, depth = self.scopes.depth(), "declared");
    }

    fn resolve_usage(&mut self, ast: &Ast, node: NodeId) {
        let lexeme = ast.token_text(node);
        let found = self
            .scopes
            .lookup(|decl| decl.is_binding_site && ast.token_text(decl.node) == lexeme);

        match found {
            Some(decl) => self.usages.push(Usage { user: node, decl }),
            None => self.errors.add(
                ErrorImpl::ScopecheckFailed {
                    identifier: lexeme.to_string(),
                },
                ast.token_location(node),
            ),
        }
    }

    /// Builds the qualified name table from everything recorded during the walk.
    pub fn finish(self, ast: &Ast) -> QualifiedNameTable {
        let mut table = QualifiedNameTable::new();

        for (index, declaration) in self.scopes.declarations().iter().enumerate() {
            if !declaration.is_binding_site {
                continue;
            }
            let path = self.scopes.scope_path(DeclId(index as u32));
            let name = QualifiedName::new(&path, ast.token_text(declaration.node), declaration.node);
            table.add_declaration(declaration.node, name);
        }

        for usage in self.usages.iter() {
            let declaration = self.scopes.declaration(usage.decl).node;
            table.add_usage(usage.user, declaration);
        }

        tracing::debug!(
            declarations = table.all_declaration_nodes().len(),
            usages = table.usages().len(),
            "resolved scopes"
        );
        table
    }
}

impl Visitor for ScopeResolver<'_> {
    fn enter(&mut self, ast: &Ast, node: NodeId) {
        match ast.tag(node) {
            Tag::Root | Tag::Block => {
                let location = ast.token_location(node);
                let anchor = self.scopes.enter_scope(node, location.line, location.col);
                tracing::trace!(node = node.0, anchor = anchor.0, depth = self.scopes.depth(), "enter scope");
            }
            Tag::FnDecl => {
                // The name belongs to the enclosing scope so callers after
                // the declaration, and the body itself, can see it.
                let name = ast.fn_decl(node).name;
                self.declare_name(ast, name);
                self.predeclared.insert(name);

                let location = ast.token_location(node);
                self.scopes.enter_scope(node, location.line, location.col);
            }
            Tag::Expression => self.in_expression = true,
            Tag::Identifier => {
                if self.in_expression {
                    self.resolve_usage(ast, node);
                } else if !self.predeclared.remove(&node) {
                    self.declare_name(ast, node);
                }
            }
            _ => {}
        }
    }

    fn exit(&mut self, ast: &Ast, node: NodeId) {
        match ast.tag(node) {
            Tag::Root | Tag::Block | Tag::FnDecl => {
                self.scopes.exit_scope();
                tracing::trace!(node = node.0, depth = self.scopes.depth(), "exit scope");
            }
            Tag::Expression => self.in_expression = false,
            _ => {}
        }
    }
}

/// Resolves every identifier in `ast`, reporting unresolved ones into `errors`.
pub fn resolve_scopes(ast: &Ast, errors: &mut ErrorHandler) -> QualifiedNameTable {
    let mut resolver = ScopeResolver::new(errors);
    walk(ast, &mut resolver);
    resolver.finish(ast)
}
