//! Identifier and selector interning.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::ids::to_u32;
use crate::SelectorId;

/// Interned identifier. Compare by index, resolve through the
/// [`IdentifierTable`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// The empty identifier (anonymous declarations).
    pub const EMPTY: Self = Self(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct IdentifierTable {
    strings: Vec<Box<str>>,
    map: FxHashMap<Box<str>, Name>,
}

impl Default for IdentifierTable {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierTable {
    pub fn new() -> Self {
        let mut table = IdentifierTable {
            strings: Vec::new(),
            map: FxHashMap::default(),
        };
        let empty = table.intern("");
        debug_assert_eq!(empty, Name::EMPTY);
        table
    }

    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&name) = self.map.get(s) {
            return name;
        }
        let name = Name(to_u32(self.strings.len(), "identifiers"));
        self.strings.push(s.into());
        self.map.insert(s.into(), name);
        name
    }

    /// Look up without interning.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.map.get(s).copied()
    }

    #[inline]
    pub fn as_str(&self, name: Name) -> &str {
        &self.strings[name.0 as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (Name, &str)> {
        self.strings
            .iter()
            .enumerate()
            .map(|(i, s)| (Name(i as u32), &**s))
    }
}

/// An Objective-C selector: zero or more keyword pieces.
///
/// A nullary selector (`foo`) has one piece and no arguments; a keyword
/// selector (`foo:bar:`) has one piece per argument.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Selector {
    pub pieces: Box<[Name]>,
    pub num_args: u32,
}

#[derive(Clone, Debug, Default)]
pub struct SelectorTable {
    selectors: Vec<Selector>,
    map: FxHashMap<Selector, SelectorId>,
}

impl SelectorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, pieces: &[Name], num_args: u32) -> SelectorId {
        let sel = Selector {
            pieces: pieces.into(),
            num_args,
        };
        if let Some(&id) = self.map.get(&sel) {
            return id;
        }
        let id = SelectorId::new(to_u32(self.selectors.len(), "selectors"));
        self.selectors.push(sel.clone());
        self.map.insert(sel, id);
        id
    }

    #[inline]
    pub fn get(&self, id: SelectorId) -> &Selector {
        &self.selectors[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Render as written in source, e.g. `initWithFoo:bar:`.
    pub fn display(&self, id: SelectorId, idents: &IdentifierTable) -> String {
        let sel = self.get(id);
        if sel.num_args == 0 {
            return sel
                .pieces
                .first()
                .map(|&n| idents.as_str(n).to_owned())
                .unwrap_or_default();
        }
        let mut out = String::new();
        for &piece in sel.pieces.iter() {
            out.push_str(idents.as_str(piece));
            out.push(':');
        }
        out
    }
}

#[cfg(test)]
mod tests;
