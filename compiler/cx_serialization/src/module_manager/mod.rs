//! Loaded modules, their global ID ranges and where to find AST files.
//!
//! [`ModuleManager`] hands out global ID ranges in load order: a module
//! added after its imports gets bases above theirs in every ID space. The
//! remap table built for a module covers its own entities plus every module
//! it was written against, so any ID in the file resolves without knowing
//! which module owns it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cx_ir::{FileId, MacroId, Name, PreprocessedEntityId, SelectorId, SubmoduleId, TypeId};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ids::IdSpaceKind;
use crate::module_file::{ModuleFile, RemapEntry};
use crate::range_map::ContinuousRangeMap;
use crate::{Result, SerializationError};

/// Extension of AST files a [`ModuleCache`] finds on disk.
pub const MODULE_FILE_EXTENSION: &str = "cxast";

/// Position of a module in its manager, in load order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct ModuleIndex(u32);

impl ModuleIndex {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModuleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Global IDs of entities that came from loaded modules, keyed by the
/// in-memory entity. A writer emits these IDs instead of numbering the
/// entities again.
#[derive(Clone, Debug, Default)]
pub struct ImportedEntities {
    pub types: FxHashMap<TypeId, u32>,
    pub idents: FxHashMap<Name, u32>,
    pub selectors: FxHashMap<SelectorId, u32>,
    pub macros: FxHashMap<MacroId, u32>,
    pub entities: FxHashMap<PreprocessedEntityId, u32>,
    pub submodules: FxHashMap<SubmoduleId, u32>,
    /// Source files created for loaded modules.
    pub files: FxHashSet<FileId>,
}

impl ImportedEntities {
    /// The first module to provide an entity keeps its ID.
    pub(crate) fn record_type(&mut self, ty: TypeId, global: u32) {
        self.types.entry(ty).or_insert(global);
    }

    pub(crate) fn record_ident(&mut self, name: Name, global: u32) {
        self.idents.entry(name).or_insert(global);
    }

    pub(crate) fn record_selector(&mut self, sel: SelectorId, global: u32) {
        self.selectors.entry(sel).or_insert(global);
    }

    pub(crate) fn record_macro(&mut self, id: MacroId, global: u32) {
        self.macros.entry(id).or_insert(global);
    }

    pub(crate) fn record_entity(&mut self, id: PreprocessedEntityId, global: u32) {
        self.entities.entry(id).or_insert(global);
    }

    pub(crate) fn record_submodule(&mut self, id: SubmoduleId, global: u32) {
        self.submodules.entry(id).or_insert(global);
    }
}

/// Every module loaded into one translation.
#[derive(Debug)]
pub struct ModuleManager {
    modules: Vec<ModuleFile>,
    by_name: FxHashMap<String, ModuleIndex>,
    next_global: [u32; IdSpaceKind::COUNT],
    global_maps: [ContinuousRangeMap<u32, ModuleIndex>; IdSpaceKind::COUNT],
    /// Latest rewrite of an imported decl: the module holding it and the
    /// record offset.
    replacements: FxHashMap<u32, (ModuleIndex, u64)>,
    /// Redeclarations added by later modules to a chain whose first decl
    /// lives in an earlier one.
    chain_extensions: FxHashMap<u32, Vec<u32>>,
    /// Modules the translation named itself rather than reached through
    /// another module's imports.
    direct: FxHashSet<ModuleIndex>,
    pub imported: ImportedEntities,
}

impl Default for ModuleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleManager {
    pub fn new() -> Self {
        ModuleManager {
            modules: Vec::new(),
            by_name: FxHashMap::default(),
            next_global: IdSpaceKind::ALL.map(IdSpaceKind::num_predefined),
            global_maps: std::array::from_fn(|_| ContinuousRangeMap::new()),
            replacements: FxHashMap::default(),
            chain_extensions: FxHashMap::default(),
            direct: FxHashSet::default(),
            imported: ImportedEntities::default(),
        }
    }

    /// Register a parsed module: assign its global bases and build its
    /// remap tables. Every module it imports must already be registered.
    ///
    /// The module's own source remap entries must be in place; entries for
    /// its imports are added here. Nothing is registered unless every step
    /// succeeds.
    pub fn add(&mut self, mut module: ModuleFile) -> Result<ModuleIndex> {
        if self.by_name.contains_key(&module.name) {
            return Err(SerializationError::DuplicateLoad { name: module.name });
        }
        let index = ModuleIndex(crate::ids::to_u32(self.modules.len(), "modules"));

        let mut import_indices = Vec::with_capacity(module.imports.len());
        for import in &module.imports {
            let found = self.lookup(&import.name).ok_or_else(|| SerializationError::MissingImport {
                module: module.name.clone(),
                import: import.name.clone(),
            })?;
            import_indices.push(found);
        }

        let bases = self.next_global;
        let mut next_global = self.next_global;
        for kind in IdSpaceKind::ALL {
            let k = kind.index();
            next_global[k] = bases[k].checked_add(module.spaces[k].count).ok_or_else(|| {
                SerializationError::malformed(format!(
                    "{kind} IDs overflow while loading `{}`",
                    module.name
                ))
            })?;
        }

        for kind in IdSpaceKind::ALL {
            let k = kind.index();
            let space = &mut module.spaces[k];
            space.base = bases[k];
            let mut remap = space.remap.builder();
            if space.count > 0 {
                remap.insert(
                    space.local_base,
                    RemapEntry {
                        target: space.base,
                        len: space.count,
                    },
                );
            }
            for (import, &imported) in module.imports.iter().zip(&import_indices) {
                let theirs = &self.modules[imported.index()].spaces[k];
                if theirs.count > 0 {
                    remap.insert(
                        import.bases[k],
                        RemapEntry {
                            target: theirs.base,
                            len: theirs.count,
                        },
                    );
                }
            }
            remap.finish();
        }

        {
            let mut remap = module.source_remap.builder();
            for (import, &imported) in module.imports.iter().zip(&import_indices) {
                let theirs = &self.modules[imported.index()];
                if theirs.source_span > 0 {
                    remap.insert(
                        import.source_base,
                        RemapEntry {
                            target: theirs.source_start,
                            len: theirs.source_span,
                        },
                    );
                }
            }
        }

        let replacements = module
            .replacements
            .iter()
            .map(|&(decl, offset)| Ok((module.resolve(IdSpaceKind::Decl, decl)?, offset)))
            .collect::<Result<Vec<_>>>()?;
        let chain_latest = module
            .chain_latest
            .iter()
            .map(|&(first, latest)| {
                Ok((
                    module.resolve(IdSpaceKind::Decl, first)?,
                    module.resolve(IdSpaceKind::Decl, latest)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        self.next_global = next_global;
        for kind in IdSpaceKind::ALL {
            let k = kind.index();
            if module.spaces[k].count > 0 {
                self.global_maps[k].insert(bases[k], index);
            }
        }
        for (global, offset) in replacements {
            self.replacements.insert(global, (index, offset));
        }
        for (first, latest) in chain_latest {
            self.chain_extensions.entry(first).or_default().push(latest);
        }
        for &imported in &import_indices {
            self.modules[imported.index()].imported_by.push(index);
        }
        module.import_indices = import_indices;

        tracing::debug!(
            module = %module.name,
            index = %index,
            decl_base = bases[IdSpaceKind::Decl.index()],
            decls = module.spaces[IdSpaceKind::Decl.index()].count,
            type_base = bases[IdSpaceKind::Type.index()],
            "registered module"
        );
        self.by_name.insert(module.name.clone(), index);
        self.modules.push(module);
        Ok(index)
    }

    #[inline]
    pub fn get(&self, index: ModuleIndex) -> &ModuleFile {
        &self.modules[index.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, index: ModuleIndex) -> &mut ModuleFile {
        &mut self.modules[index.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<ModuleIndex> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules in load order.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleIndex, &ModuleFile)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleIndex(i as u32), m))
    }

    /// First global ID the next module will receive in `space`.
    #[inline]
    pub fn next_global(&self, space: IdSpaceKind) -> u32 {
        self.next_global[space.index()]
    }

    /// Module owning a global ID and the ID's position among that
    /// module's own entities.
    pub fn owner_of(&self, space: IdSpaceKind, global: u32) -> Option<(ModuleIndex, u32)> {
        let (start, &index) = self.global_maps[space.index()].find(global)?;
        let local = global - start;
        (local < self.get(index).spaces[space.index()].count).then_some((index, local))
    }

    fn require_owner(&self, space: IdSpaceKind, global: u32) -> Result<(ModuleIndex, u32)> {
        self.owner_of(space, global)
            .ok_or(SerializationError::UnknownGlobalId { space, id: global })
    }

    pub fn resolve_global_decl(&self, global: u32) -> Result<(ModuleIndex, u32)> {
        self.require_owner(IdSpaceKind::Decl, global)
    }

    pub fn resolve_global_type(&self, global: u32) -> Result<(ModuleIndex, u32)> {
        self.require_owner(IdSpaceKind::Type, global)
    }

    pub fn resolve_global_ident(&self, global: u32) -> Result<(ModuleIndex, u32)> {
        self.require_owner(IdSpaceKind::Identifier, global)
    }

    pub fn resolve_global_selector(&self, global: u32) -> Result<(ModuleIndex, u32)> {
        self.require_owner(IdSpaceKind::Selector, global)
    }

    pub fn resolve_global_macro(&self, global: u32) -> Result<(ModuleIndex, u32)> {
        self.require_owner(IdSpaceKind::Macro, global)
    }

    pub fn resolve_global_entity(&self, global: u32) -> Result<(ModuleIndex, u32)> {
        self.require_owner(IdSpaceKind::PreprocessedEntity, global)
    }

    pub fn resolve_global_submodule(&self, global: u32) -> Result<(ModuleIndex, u32)> {
        self.require_owner(IdSpaceKind::Submodule, global)
    }

    /// Where the current record of a decl lives: the newest replacement if
    /// a later module rewrote it, otherwise its owner's offset table.
    pub fn decl_record(&self, global: u32) -> Result<(ModuleIndex, u64)> {
        if let Some(&found) = self.replacements.get(&global) {
            return Ok(found);
        }
        let (index, local) = self.resolve_global_decl(global)?;
        let offset = self
            .get(index)
            .decl_offsets
            .get(local as usize)
            .copied()
            .ok_or_else(|| {
                SerializationError::malformed(format!("declaration {global} has no offset"))
            })?;
        Ok((index, offset))
    }

    /// Whether a later module replaced the record of `global`.
    pub fn is_replaced(&self, global: u32) -> bool {
        self.replacements.contains_key(&global)
    }

    /// Redeclarations later modules appended to the chain starting at
    /// `first`.
    pub fn chain_extensions(&self, first: u32) -> &[u32] {
        self.chain_extensions.get(&first).map_or(&[], Vec::as_slice)
    }

    pub fn mark_direct(&mut self, index: ModuleIndex) {
        self.direct.insert(index);
    }

    #[inline]
    pub fn is_direct(&self, index: ModuleIndex) -> bool {
        self.direct.contains(&index)
    }

    /// `root` and everything it imports, imports first.
    pub fn dependency_order(&self, root: ModuleIndex) -> Vec<ModuleIndex> {
        fn visit(
            mgr: &ModuleManager,
            m: ModuleIndex,
            seen: &mut FxHashSet<ModuleIndex>,
            out: &mut Vec<ModuleIndex>,
        ) {
            if !seen.insert(m) {
                return;
            }
            for &dep in &mgr.get(m).import_indices {
                visit(mgr, dep, seen, out);
            }
            out.push(m);
        }
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        visit(self, root, &mut seen, &mut out);
        out
    }
}

/// Where AST files come from: bytes registered in memory, then files named
/// `<module>.cxast` in the search directories.
#[derive(Clone, Debug, Default)]
pub struct ModuleCache {
    buffers: FxHashMap<String, Arc<[u8]>>,
    directories: Vec<PathBuf>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directories.push(dir.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.buffers.insert(name.into(), bytes.into());
    }

    /// Register the AST file at `path` under the module name it records.
    pub fn insert_file(&mut self, path: &Path) -> Result<String> {
        let bytes: Arc<[u8]> = std::fs::read(path)
            .map_err(|source| SerializationError::Io {
                path: path.to_owned(),
                source,
            })?
            .into();
        let name = ModuleFile::peek_name(Arc::clone(&bytes))?;
        tracing::debug!(module = %name, path = %path.display(), "registered AST file");
        self.buffers.insert(name.clone(), bytes);
        Ok(name)
    }

    /// Bytes of module `name`.
    pub fn get(&self, name: &str) -> Result<Arc<[u8]>> {
        if let Some(bytes) = self.buffers.get(name) {
            return Ok(Arc::clone(bytes));
        }
        for dir in &self.directories {
            let path = dir.join(format!("{name}.{MODULE_FILE_EXTENSION}"));
            match std::fs::read(&path) {
                Ok(bytes) => return Ok(bytes.into()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(SerializationError::Io { path, source }),
            }
        }
        Err(SerializationError::ModuleNotFound { name: name.to_owned() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.buffers.contains_key(name)
            || self
                .directories
                .iter()
                .any(|dir| dir.join(format!("{name}.{MODULE_FILE_EXTENSION}")).is_file())
    }
}

#[cfg(test)]
mod tests;
