use super::types::TypeId;

const UNSET: u32 = u32::MAX;

/// Disjoint sets over type ids.
///
/// Dense parent vector with a lazy make-set: an id becomes its own
/// singleton set the first time it is touched.
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    parents: Vec<u32>,
}

impl UnionFind {
    pub fn new() -> Self {
        UnionFind::default()
    }

    pub fn make_set(&mut self, id: TypeId) {
        let index = id.index();
        if index >= self.parents.len() {
            self.parents.resize(index + 1, UNSET);
        }
        if self.parents[index] == UNSET {
            self.parents[index] = id.0;
        }
    }

    /// Representative of `id`, compressing the path on the way.
    pub fn find(&mut self, id: TypeId) -> TypeId {
        self.make_set(id);

        let root = self.root(id);
        let mut current = id.0;
        while current != root.0 {
            let next = self.parents[current as usize];
            self.parents[current as usize] = root.0;
            current = next;
        }
        root
    }

    /// Representative of `id` without touching the structure.
    pub fn root(&self, id: TypeId) -> TypeId {
        let mut current = id.0;
        loop {
            match self.parents.get(current as usize) {
                Some(&parent) if parent != UNSET && parent != current => current = parent,
                _ => return TypeId(current),
            }
        }
    }

    /// Makes `to`'s representative the representative of `from`'s set.
    pub fn union(&mut self, from: TypeId, to: TypeId) {
        let from = self.find(from);
        let to = self.find(to);
        if from != to {
            self.parents[from.index()] = to.0;
        }
    }

    pub fn same_set(&mut self, a: TypeId, b: TypeId) -> bool {
        self.find(a) == self.find(b)
    }
}
