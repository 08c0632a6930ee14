//! Submodules of a module, as declared by a module map.

use crate::ids::to_u32;
use crate::{FileId, SubmoduleId};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Submodule {
    pub name: String,
    pub parent: Option<SubmoduleId>,
    pub is_explicit: bool,
    pub headers: Vec<FileId>,
}

#[derive(Clone, Debug, Default)]
pub struct SubmoduleTable {
    modules: Vec<Submodule>,
}

impl SubmoduleTable {
    pub fn create(
        &mut self,
        name: impl Into<String>,
        parent: Option<SubmoduleId>,
        is_explicit: bool,
    ) -> SubmoduleId {
        let id = SubmoduleId::new(to_u32(self.modules.len(), "submodules"));
        self.modules.push(Submodule {
            name: name.into(),
            parent,
            is_explicit,
            headers: Vec::new(),
        });
        id
    }

    #[inline]
    pub fn get(&self, id: SubmoduleId) -> &Submodule {
        &self.modules[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: SubmoduleId) -> &mut Submodule {
        &mut self.modules[id.index()]
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubmoduleId, &Submodule)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (SubmoduleId::new(i as u32), m))
    }

    /// Dotted path from the top-level module (`Top.Sub.Leaf`).
    pub fn full_name(&self, id: SubmoduleId) -> String {
        let mut parts = vec![self.get(id).name.as_str()];
        let mut cur = self.get(id).parent;
        while let Some(p) = cur {
            parts.push(self.get(p).name.as_str());
            cur = self.get(p).parent;
        }
        parts.reverse();
        parts.join(".")
    }
}

#[cfg(test)]
mod tests;
