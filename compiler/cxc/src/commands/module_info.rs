//! The `module-info` command: summarize one AST file without loading it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use cx_serialization::{IdSpaceKind, ModuleFile, ModuleKind, SerializationError};

/// Header facts of one AST file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub kind: ModuleKind,
    pub version: (u32, u32),
    /// Imported module names; `true` for direct imports.
    pub imports: Vec<(String, bool)>,
    pub source_files: Vec<String>,
    /// Entities the file defines itself, per ID space.
    pub counts: Vec<(IdSpaceKind, u32)>,
    pub top_level_decls: usize,
}

#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn module_info(path: &Path) -> Result<ModuleInfo, SerializationError> {
    let bytes: Arc<[u8]> = std::fs::read(path)
        .map_err(|source| SerializationError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .into();
    let module = ModuleFile::parse(bytes)?;
    Ok(ModuleInfo {
        name: module.name.clone(),
        kind: module.kind,
        version: module.version,
        imports: module.imports.iter().map(|i| (i.name.clone(), i.is_direct)).collect(),
        source_files: module.source_files.iter().map(|f| f.name.clone()).collect(),
        counts: IdSpaceKind::ALL
            .iter()
            .map(|&kind| (kind, module.space(kind).count))
            .collect(),
        top_level_decls: module.num_top_level_decls(),
    })
}

impl fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module:   {}", self.name)?;
        writeln!(f, "kind:     {}", self.kind)?;
        writeln!(f, "version:  {}.{}", self.version.0, self.version.1)?;
        if self.imports.is_empty() {
            writeln!(f, "imports:  (none)")?;
        } else {
            for (name, direct) in &self.imports {
                let how = if *direct { "direct" } else { "indirect" };
                writeln!(f, "import:   {name} ({how})")?;
            }
        }
        for file in &self.source_files {
            writeln!(f, "file:     {file}")?;
        }
        for (kind, count) in &self.counts {
            writeln!(f, "{:<22}{count}", format!("{kind} IDs:"))?;
        }
        write!(f, "top-level declarations: {}", self.top_level_decls)
    }
}
