use std::{collections::HashMap, fmt::Display};

use crate::{ast::ast::NodeId, scope_resolver::qualified_names::QualifiedName};

/// Index into a [`TypeRepository`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    Float,
    String,
    Bool,
}

impl Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaseType::Int => write!(f, "int"),
            BaseType::Float => write!(f, "float"),
            BaseType::String => write!(f, "string"),
            BaseType::Bool => write!(f, "bool"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Identity,
    Pointer,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTerm {
    /// Fresh variable with nothing known about it yet.
    Unbound,
    Base(BaseType),
    Pointer(TypeId),
    /// Parameters then return type, as `extra[start..end]`.
    Function { start: u32, end: u32 },
}

impl TypeTerm {
    pub fn kind(&self) -> Kind {
        match self {
            TypeTerm::Unbound | TypeTerm::Base(_) => Kind::Identity,
            TypeTerm::Pointer(_) => Kind::Pointer,
            TypeTerm::Function { .. } => Kind::Function,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeNode {
    /// Syntax node the type was created for. `None` for synthetic types.
    pub decl_node: Option<NodeId>,
    pub term: TypeTerm,
}

/// Append-only table of type nodes.
///
/// Function subtypes live in the shared `extra` array, the same way the
/// syntax tree stores variable-length child runs.
#[derive(Debug, Clone, Default)]
pub struct TypeRepository {
    nodes: Vec<TypeNode>,
    extra: Vec<TypeId>,
    base_types: HashMap<BaseType, TypeId>,
}

impl TypeRepository {
    pub fn new() -> Self {
        TypeRepository::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, decl_node: Option<NodeId>, term: TypeTerm) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(TypeNode { decl_node, term });
        id
    }

    pub fn fresh(&mut self, decl_node: Option<NodeId>) -> TypeId {
        self.push(decl_node, TypeTerm::Unbound)
    }

    /// The shared synthetic node for a base type.
    pub fn base(&mut self, base: BaseType) -> TypeId {
        if let Some(id) = self.base_types.get(&base) {
            return *id;
        }
        let id = self.push(None, TypeTerm::Base(base));
        self.base_types.insert(base, id);
        id
    }

    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.push(None, TypeTerm::Pointer(pointee))
    }

    /// Function type over `subtypes`, the last of which is the return type.
    pub fn function(&mut self, subtypes: &[TypeId]) -> TypeId {
        let start = self.extra.len() as u32;
        self.extra.extend_from_slice(subtypes);
        let end = self.extra.len() as u32;
        self.push(None, TypeTerm::Function { start, end })
    }

    pub fn get(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.index()]
    }

    pub fn term(&self, id: TypeId) -> TypeTerm {
        self.get(id).term
    }

    pub fn kind(&self, id: TypeId) -> Kind {
        self.term(id).kind()
    }

    /// Direct subtypes: the pointee of a pointer, parameters and return of a function.
    pub fn subtypes(&self, id: TypeId) -> Vec<TypeId> {
        match self.term(id) {
            TypeTerm::Pointer(pointee) => vec![pointee],
            TypeTerm::Function { start, end } => self.extra[start as usize..end as usize].to_vec(),
            TypeTerm::Unbound | TypeTerm::Base(_) => vec![],
        }
    }

    /// Renders `id`, passing every reference through `resolve` first.
    pub fn render<F>(&self, id: TypeId, resolve: &F) -> String
    where
        F: Fn(TypeId) -> TypeId,
    {
        let id = resolve(id);
        match self.term(id) {
            TypeTerm::Unbound => format!("'t{}", id.0),
            TypeTerm::Base(base) => base.to_string(),
            TypeTerm::Pointer(pointee) => format!("(^ {})", self.render(pointee, resolve)),
            TypeTerm::Function { .. } => {
                let mut out = String::from("(FN");
                for subtype in self.subtypes(id) {
                    out.push(' ');
                    out.push_str(&self.render(subtype, resolve));
                }
                out.push(')');
                out
            }
        }
    }

    /// Rebuilds the repository so every id holds its representative's
    /// term, with subtypes pointing at representatives.
    ///
    /// `representatives[i]` must be the representative of id `i` and a
    /// representative must map to itself.
    pub fn canonicalize(&self, representatives: &[TypeId]) -> TypeRepository {
        let mut canonical = TypeRepository::new();
        let mut rewritten: HashMap<TypeId, TypeTerm> = HashMap::new();

        for (index, node) in self.nodes.iter().enumerate() {
            let rep = representatives[index];
            let term = match rewritten.get(&rep) {
                Some(term) => *term,
                None => {
                    let term = match self.term(rep) {
                        TypeTerm::Pointer(pointee) => {
                            TypeTerm::Pointer(representatives[pointee.index()])
                        }
                        TypeTerm::Function { start, end } => {
                            let new_start = canonical.extra.len() as u32;
                            for subtype in &self.extra[start as usize..end as usize] {
                                canonical.extra.push(representatives[subtype.index()]);
                            }
                            TypeTerm::Function {
                                start: new_start,
                                end: canonical.extra.len() as u32,
                            }
                        }
                        term => term,
                    };
                    rewritten.insert(rep, term);
                    term
                }
            };

            canonical.nodes.push(TypeNode {
                decl_node: node.decl_node,
                term,
            });
        }

        for (base, id) in self.base_types.iter() {
            canonical.base_types.insert(*base, representatives[id.index()]);
        }

        canonical
    }
}

/// Finalized inference result for one compilation unit.
#[derive(Debug, Clone)]
pub struct TypeTable {
    repository: TypeRepository,
    representatives: Vec<TypeId>,
    node_types: HashMap<NodeId, TypeId>,
    name_types: HashMap<QualifiedName, TypeId>,
}

impl TypeTable {
    pub fn new(
        repository: TypeRepository,
        representatives: Vec<TypeId>,
        node_types: HashMap<NodeId, TypeId>,
        name_types: HashMap<QualifiedName, TypeId>,
    ) -> Self {
        TypeTable {
            repository,
            representatives,
            node_types,
            name_types,
        }
    }

    pub fn repository(&self) -> &TypeRepository {
        &self.repository
    }

    /// Representative of `id`. Applying it twice gives the same result.
    pub fn canonical(&self, id: TypeId) -> TypeId {
        self.representatives
            .get(id.index())
            .copied()
            .unwrap_or(id)
    }

    /// Canonical type of an expression or identifier node.
    pub fn node_to_type(&self, node: NodeId) -> Option<TypeId> {
        self.node_types.get(&node).map(|id| self.canonical(*id))
    }

    pub fn type_of_name(&self, name: &QualifiedName) -> Option<TypeId> {
        self.name_types.get(name).map(|id| self.canonical(*id))
    }

    pub fn render(&self, id: TypeId) -> String {
        self.repository.render(id, &|id| self.canonical(id))
    }

    pub fn render_node(&self, node: NodeId) -> Option<String> {
        self.node_to_type(node).map(|id| self.render(id))
    }

    /// Typed nodes in ascending node order.
    pub fn typed_nodes(&self) -> Vec<NodeId> {
        let mut nodes = self.node_types.keys().copied().collect::<Vec<NodeId>>();
        nodes.sort();
        nodes
    }
}
