//! Global module index: which modules declare which names.
//!
//! Name lookup otherwise has to ask every loaded module. The index is
//! built once from a fully loaded [`ModuleManager`] and saved next to the
//! module cache; a later lookup skips any module the index covers but
//! does not list for the name. Modules the index does not know about are
//! always searched.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::module_file::ModuleKind;
use crate::module_manager::ModuleManager;
use crate::{Result, SerializationError};

/// Bumped whenever the serialized layout changes.
const INDEX_VERSION: u32 = 1;

/// One module as the index remembers it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedModule {
    pub name: String,
    pub kind: ModuleKind,
    pub imports: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalModuleIndex {
    version: u32,
    modules: Vec<IndexedModule>,
    /// Name to positions in `modules`, ascending.
    identifiers: BTreeMap<String, Vec<u32>>,
}

impl GlobalModuleIndex {
    pub fn new() -> Self {
        GlobalModuleIndex {
            version: INDEX_VERSION,
            ..Self::default()
        }
    }

    /// Index every module `manager` has loaded, by the names in its lookup
    /// table.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn from_manager(manager: &ModuleManager) -> Self {
        let mut index = Self::new();
        for (_, module) in manager.iter() {
            let imports = module.imports.iter().map(|i| i.name.clone()).collect();
            let names = module.lookup.keys().map(String::as_str);
            index.add_module(&module.name, module.kind, imports, names);
        }
        tracing::debug!(
            modules = index.modules.len(),
            identifiers = index.identifiers.len(),
            "built global module index"
        );
        index
    }

    /// Record a module and the names it declares. Adding a module that is
    /// already indexed replaces its import list and merges its names.
    pub fn add_module<'n>(
        &mut self,
        name: &str,
        kind: ModuleKind,
        imports: Vec<String>,
        names: impl IntoIterator<Item = &'n str>,
    ) {
        let position = match self.position(name) {
            Some(p) => {
                let module = &mut self.modules[p as usize];
                module.kind = kind;
                module.imports = imports;
                p
            }
            None => {
                let p = u32::try_from(self.modules.len()).unwrap_or_else(|_| {
                    panic!("global module index holds more than u32::MAX modules")
                });
                self.modules.push(IndexedModule {
                    name: name.to_owned(),
                    kind,
                    imports,
                });
                p
            }
        };
        for ident in names {
            let owners = self.identifiers.entry(ident.to_owned()).or_default();
            if let Err(slot) = owners.binary_search(&position) {
                owners.insert(slot, position);
            }
        }
    }

    pub fn modules(&self) -> &[IndexedModule] {
        &self.modules
    }

    pub fn num_identifiers(&self) -> usize {
        self.identifiers.len()
    }

    /// Names of the modules that declare `name`, in the order they were
    /// indexed.
    pub fn modules_for<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.identifiers
            .get(name)
            .into_iter()
            .flatten()
            .map(|&p| self.modules[p as usize].name.as_str())
    }

    /// Whether the index knows about `module` at all.
    pub fn covers(&self, module: &str) -> bool {
        self.position(module).is_some()
    }

    /// Whether `module` may declare `name`. Always true for modules the
    /// index does not cover.
    pub fn may_contain(&self, module: &str, name: &str) -> bool {
        let Some(position) = self.position(module) else {
            return true;
        };
        self.identifiers
            .get(name)
            .is_some_and(|owners| owners.binary_search(&position).is_ok())
    }

    fn position(&self, module: &str) -> Option<u32> {
        self.modules.iter().position(|m| m.name == module).map(|p| p as u32)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| SerializationError::MalformedIndex {
            reason: format!("failed to serialize: {e}"),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let index: Self =
            bincode::deserialize(bytes).map_err(|e| SerializationError::MalformedIndex {
                reason: e.to_string(),
            })?;
        if index.version != INDEX_VERSION {
            return Err(SerializationError::MalformedIndex {
                reason: format!(
                    "version {} is not supported (expected {INDEX_VERSION})",
                    index.version
                ),
            });
        }
        let n = index.modules.len();
        if let Some((name, _)) = index
            .identifiers
            .iter()
            .find(|(_, owners)| owners.iter().any(|&p| p as usize >= n))
        {
            return Err(SerializationError::MalformedIndex {
                reason: format!("`{name}` points past the {n} indexed modules"),
            });
        }
        Ok(index)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|source| SerializationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            modules = self.modules.len(),
            "wrote global module index"
        );
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| SerializationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }
}
