use std::collections::HashMap;

use crate::{
    ast::{
        ast::{Ast, NodeId, Tag},
        visitor::{walk, Visitor},
    },
    errors::errors::{ErrorHandler, ErrorImpl},
    scope_resolver::qualified_names::{QualifiedName, QualifiedNameTable},
};

use super::{
    types::{BaseType, TypeId, TypeRepository, TypeTable, TypeTerm},
    union_find::UnionFind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnifyError {
    /// Two concrete types of different shape or base.
    Mismatch,
    /// Binding a variable would make it contain itself.
    Occurs,
    /// Function types with a different number of subtypes.
    Arity,
}

/// Post-order inference pass.
///
/// Every expression leaves exactly one type on `stack`; parents pop what
/// their children pushed. Unification is union-find over [`TypeId`]s, and
/// unbound variables always join the set of the concrete side.
pub struct TypeChecker<'a, 'e> {
    names: &'a QualifiedNameTable,
    errors: &'e mut ErrorHandler,
    repository: TypeRepository,
    sets: UnionFind,
    stack: Vec<TypeId>,
    return_types: Vec<TypeId>,
    name_types: HashMap<QualifiedName, TypeId>,
    node_types: HashMap<NodeId, TypeId>,
}

impl<'a, 'e> TypeChecker<'a, 'e> {
    pub fn new(names: &'a QualifiedNameTable, errors: &'e mut ErrorHandler) -> Self {
        TypeChecker {
            names,
            errors,
            repository: TypeRepository::new(),
            sets: UnionFind::new(),
            stack: vec![],
            return_types: vec![],
            name_types: HashMap::new(),
            node_types: HashMap::new(),
        }
    }

    pub fn repository(&self) -> &TypeRepository {
        &self.repository
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn fresh(&mut self, node: Option<NodeId>) -> TypeId {
        let id = self.repository.fresh(node);
        self.sets.make_set(id);
        id
    }

    pub fn base(&mut self, base: BaseType) -> TypeId {
        let id = self.repository.base(base);
        self.sets.make_set(id);
        id
    }

    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        let id = self.repository.pointer(pointee);
        self.sets.make_set(id);
        id
    }

    pub fn function(&mut self, subtypes: &[TypeId]) -> TypeId {
        let id = self.repository.function(subtypes);
        self.sets.make_set(id);
        id
    }

    pub fn find(&mut self, id: TypeId) -> TypeId {
        self.sets.find(id)
    }

    /// Fully resolved rendering of `id` as currently known.
    pub fn render(&self, id: TypeId) -> String {
        self.repository.render(id, &|id| self.sets.root(id))
    }

    fn occurs(&mut self, var: TypeId, ty: TypeId) -> bool {
        let ty = self.find(ty);
        if ty == var {
            return true;
        }
        self.repository
            .subtypes(ty)
            .into_iter()
            .any(|subtype| self.occurs(var, subtype))
    }

    fn bind(&mut self, var: TypeId, ty: TypeId) -> Result<(), UnifyError> {
        if self.occurs(var, ty) {
            return Err(UnifyError::Occurs);
        }
        self.sets.union(var, ty);
        Ok(())
    }

    /// Makes `a` and `b` the same type.
    ///
    /// Constraints already merged before a failure stay merged.
    pub fn unify(&mut self, a: TypeId, b: TypeId) -> Result<(), UnifyError> {
        let a = self.find(a);
        let b = self.find(b);
        if a == b {
            return Ok(());
        }

        match (self.repository.term(a), self.repository.term(b)) {
            (TypeTerm::Unbound, TypeTerm::Unbound) => {
                self.sets.union(a, b);
                Ok(())
            }
            (TypeTerm::Unbound, _) => self.bind(a, b),
            (_, TypeTerm::Unbound) => self.bind(b, a),
            (TypeTerm::Base(left), TypeTerm::Base(right)) => {
                if left != right {
                    return Err(UnifyError::Mismatch);
                }
                self.sets.union(a, b);
                Ok(())
            }
            (TypeTerm::Pointer(left), TypeTerm::Pointer(right)) => {
                self.unify(left, right)?;
                self.sets.union(a, b);
                Ok(())
            }
            (TypeTerm::Function { .. }, TypeTerm::Function { .. }) => {
                let left = self.repository.subtypes(a);
                let right = self.repository.subtypes(b);
                if left.len() != right.len() {
                    return Err(UnifyError::Arity);
                }
                for (l, r) in left.into_iter().zip(right) {
                    self.unify(l, r)?;
                }
                self.sets.union(a, b);
                Ok(())
            }
            _ => Err(UnifyError::Mismatch),
        }
    }

    /// Unifies and reports a failure at `node`. Returns whether it succeeded.
    fn unify_at(&mut self, ast: &Ast, node: NodeId, left: TypeId, right: TypeId) -> bool {
        match self.unify(left, right) {
            Ok(()) => true,
            Err(error) => {
                let (left, right) = (self.render(left), self.render(right));
                tracing::debug!(node = node.0, ?error, %left, %right, "unification failed");
                self.errors.add(
                    ErrorImpl::TypeInferenceFailed { left, right },
                    ast.token_location(node),
                );
                false
            }
        }
    }

    fn push(&mut self, node: NodeId, ty: TypeId) {
        self.node_types.insert(node, ty);
        self.stack.push(ty);
    }

    fn pop(&mut self) -> TypeId {
        // Children always push before their parent pops.
        self.stack.pop().expect("type stack underflow")
    }

    fn pop_n(&mut self, count: usize) -> Vec<TypeId> {
        let at = self
            .stack
            .len()
            .checked_sub(count)
            .expect("type stack underflow");
        self.stack.split_off(at)
    }

    fn literal(&mut self, node: NodeId, base: BaseType) {
        let ty = self.fresh(Some(node));
        let base = self.base(base);
        // A fresh variable always binds.
        let _ = self.unify(ty, base);
        self.push(node, ty);
    }

    fn identifier(&mut self, ast: &Ast, node: NodeId) {
        let ty = self.fresh(Some(node));
        match self.names.node_to_name(node) {
            Some(name) => match self.name_types.get(name).copied() {
                Some(canonical) => {
                    self.unify_at(ast, node, ty, canonical);
                }
                None => {
                    self.name_types.insert(name.clone(), ty);
                }
            },
            // Already reported by scope resolution.
            None => tracing::trace!(node = node.0, "unresolved identifier left unconstrained"),
        }
        self.push(node, ty);
    }

    fn unary(&mut self, ast: &Ast, node: NodeId, base: BaseType) {
        let operand = self.pop();
        let base = self.base(base);
        self.unify_at(ast, node, operand, base);
        self.push(node, operand);
    }

    fn arithmetic(&mut self, ast: &Ast, node: NodeId) {
        let right = self.pop();
        let left = self.pop();
        self.unify_at(ast, node, left, right);
        let result = self.fresh(Some(node));
        let _ = self.unify(result, left);
        self.push(node, result);
    }

    fn comparison(&mut self, ast: &Ast, node: NodeId) {
        let right = self.pop();
        let left = self.pop();
        let bool_type = self.base(BaseType::Bool);
        if self.unify_at(ast, node, left, right) {
            self.unify_at(ast, node, left, bool_type);
        }
        let result = self.fresh(Some(node));
        let _ = self.unify(result, bool_type);
        self.push(node, result);
    }

    fn binding(&mut self, ast: &Ast, node: NodeId) {
        let value = self.pop();
        let target = self.pop();
        self.unify_at(ast, node, target, value);
    }

    fn call(&mut self, ast: &Ast, node: NodeId) {
        let args = self.pop_n(ast.call(node).args.len());
        let callee = self.pop();

        let result = self.fresh(Some(node));
        let mut subtypes = args;
        subtypes.push(result);
        let signature = self.function(&subtypes);

        self.unify_at(ast, node, callee, signature);
        self.push(node, result);
    }

    fn fn_decl(&mut self, ast: &Ast, node: NodeId) {
        let params = self.pop_n(ast.fn_decl(node).params.len());
        let name = self.pop();
        let result = self
            .return_types
            .pop()
            .expect("function exit without a matching enter");

        let mut subtypes = params;
        subtypes.push(result);
        let signature = self.function(&subtypes);

        self.unify_at(ast, node, name, signature);
    }

    fn return_stmt(&mut self, ast: &Ast, node: NodeId) {
        if ast.return_value(node).is_none() {
            return;
        }
        let value = self.pop();
        if let Some(expected) = self.return_types.last().copied() {
            self.unify_at(ast, node, value, expected);
        }
    }

    /// Canonicalizes every type and hands the result over as a [`TypeTable`].
    pub fn finish(mut self) -> TypeTable {
        debug_assert!(self.stack.is_empty(), "type stack not drained");

        let representatives = (0..self.repository.len())
            .map(|index| self.sets.find(TypeId(index as u32)))
            .collect::<Vec<TypeId>>();
        let repository = self.repository.canonicalize(&representatives);

        tracing::debug!(
            types = repository.len(),
            typed_nodes = self.node_types.len(),
            names = self.name_types.len(),
            "inferred types"
        );

        TypeTable::new(
            repository,
            representatives,
            self.node_types,
            self.name_types,
        )
    }
}

impl Visitor for TypeChecker<'_, '_> {
    fn enter(&mut self, ast: &Ast, node: NodeId) {
        if ast.tag(node) == Tag::FnDecl {
            let result = self.fresh(Some(node));
            self.return_types.push(result);
        }
    }

    fn exit(&mut self, ast: &Ast, node: NodeId) {
        match ast.tag(node) {
            Tag::Root | Tag::Block => {}
            Tag::IntLiteral => self.literal(node, BaseType::Int),
            Tag::FloatLiteral => self.literal(node, BaseType::Float),
            Tag::StringLiteral => self.literal(node, BaseType::String),
            Tag::BoolLiteral => self.literal(node, BaseType::Bool),
            Tag::Identifier => self.identifier(ast, node),
            Tag::UnaryPlus | Tag::Negate => self.unary(ast, node, BaseType::Int),
            Tag::Not => self.unary(ast, node, BaseType::Bool),
            Tag::AddressOf => {
                let pointee = self.pop();
                let pointer = self.pointer(pointee);
                self.push(node, pointer);
            }
            Tag::Deref => {
                let operand = self.pop();
                let pointee = self.fresh(Some(node));
                let pointer = self.pointer(pointee);
                self.unify_at(ast, node, operand, pointer);
                self.push(node, pointee);
            }
            Tag::Add | Tag::Sub | Tag::Mul | Tag::Div => self.arithmetic(ast, node),
            Tag::Equal
            | Tag::NotEqual
            | Tag::Less
            | Tag::LessEqual
            | Tag::Greater
            | Tag::GreaterEqual
            | Tag::And
            | Tag::Or => self.comparison(ast, node),
            Tag::Call => self.call(ast, node),
            Tag::Expression => {
                let inner = self.pop();
                self.push(node, inner);
            }
            Tag::ExprStmt => {
                self.pop();
            }
            Tag::ConstDecl | Tag::VarDecl | Tag::Assign => self.binding(ast, node),
            Tag::Return => self.return_stmt(ast, node),
            Tag::FnDecl => self.fn_decl(ast, node),
        }
    }
}

/// Infers a type for every expression and declaration in `ast`.
///
/// Failed unifications are reported into `errors`; inference carries on
/// past them.
pub fn infer_types(ast: &Ast, names: &QualifiedNameTable, errors: &mut ErrorHandler) -> TypeTable {
    let mut checker = TypeChecker::new(names, errors);
    walk(ast, &mut checker);
    checker.finish()
}
