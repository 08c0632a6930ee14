//! One AST file as the reader sees it.
//!
//! [`ModuleFile::parse`] walks every block except the declaration and type
//! payloads: it validates the header, collects the ID space table, the
//! offset tables and the name tables, and keeps a cursor positioned inside
//! the DECLTYPES block so records can be decoded later by offset.
//!
//! Every ID stored in the file is in the writer's numbering. The remap
//! tables built when the module joins a [`ModuleManager`](crate::ModuleManager)
//! translate them into the loading translation's global IDs.

use std::fmt;
use std::sync::Arc;

use cx_ir::{Name, SourceLocation};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::bitstream::{BitstreamCursor, Entry, Record};
use crate::codes::{self, ast, control, preprocessor, source, submodule};
use crate::ids::{IdSpaceKind, TypeIdx};
use crate::module_manager::ModuleIndex;
use crate::range_map::ContinuousRangeMap;
use crate::{Result, SerializationError};

/// What kind of translation an AST file snapshots.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum ModuleKind {
    /// Precompiled header.
    #[default]
    Pch,
    /// Preamble of a main file, rebuilt as the file is edited.
    Preamble,
    Module,
    MainFile,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 4] = [
        ModuleKind::Pch,
        ModuleKind::Preamble,
        ModuleKind::Module,
        ModuleKind::MainFile,
    ];

    #[inline]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    pub fn from_raw(raw: u64) -> Option<Self> {
        usize::try_from(raw).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub const fn name(self) -> &'static str {
        match self {
            ModuleKind::Pch => "pch",
            ModuleKind::Preamble => "preamble",
            ModuleKind::Module => "module",
            ModuleKind::MainFile => "main-file",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A run of file IDs starting at the map key lands at `target..target + len`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct RemapEntry {
    pub target: u32,
    pub len: u32,
}

/// One ID space of one module.
#[derive(Clone, Debug, Default)]
pub struct IdSpace {
    /// First global ID of the module's own entities, assigned on load.
    pub base: u32,
    /// First ID of the module's own entities as written in the file.
    pub local_base: u32,
    pub count: u32,
    /// File ID to global ID, covering the module's own entities and
    /// every module it was written against.
    pub remap: ContinuousRangeMap<u32, RemapEntry>,
}

impl IdSpace {
    /// Translate an ID found in the file into a global ID.
    pub fn resolve(&self, kind: IdSpaceKind, id: u32) -> Result<u32> {
        if id < kind.num_predefined() {
            return Ok(id);
        }
        match self.remap.find(id) {
            Some((start, entry)) if id - start < entry.len => Ok(entry.target + (id - start)),
            _ => Err(SerializationError::UnknownGlobalId { space: kind, id }),
        }
    }

    /// Position among the module's own entities of a global ID.
    pub fn local_index(&self, global: u32) -> Option<u32> {
        global
            .checked_sub(self.base)
            .filter(|&local| local < self.count)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFileRecord {
    pub name: String,
    /// Offset of the file in the writer's location space.
    pub base: u32,
    pub size: u32,
}

/// A module that was loaded when this file was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportRecord {
    pub name: String,
    /// Named by the translation itself, not only reached through another
    /// import.
    pub is_direct: bool,
    /// First global ID the writer saw for the module, per ID space.
    pub bases: [u32; IdSpaceKind::COUNT],
    /// First source location the writer saw for the module's files.
    pub source_base: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorRecord {
    pub num_args: u32,
    /// Identifier IDs of the keyword pieces.
    pub pieces: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmoduleRecord {
    pub name: String,
    /// Submodule ID of the parent, 0 for a top-level module.
    pub parent: u32,
    pub is_explicit: bool,
    /// Locations of the header files, in the writer's location space.
    pub headers: Vec<u32>,
}

/// A parsed AST file.
pub struct ModuleFile {
    pub name: String,
    pub kind: ModuleKind,
    pub version: (u32, u32),
    pub signature: [u8; 4],
    bytes: Arc<[u8]>,
    pub imports: Vec<ImportRecord>,
    pub(crate) import_indices: Vec<ModuleIndex>,
    pub(crate) imported_by: Vec<ModuleIndex>,
    pub(crate) spaces: [IdSpace; IdSpaceKind::COUNT],
    pub source_files: Vec<SourceFileRecord>,
    /// Where this module's files start in the loading translation's
    /// location space, and how much of it they occupy.
    pub(crate) source_start: u32,
    pub(crate) source_span: u32,
    pub(crate) source_remap: ContinuousRangeMap<u32, RemapEntry>,
    pub identifiers: Vec<String>,
    /// Interned form of `identifiers`, filled by the reader.
    pub(crate) ident_names: Vec<Name>,
    pub selectors: Vec<SelectorRecord>,
    pub(crate) macros: Vec<Record>,
    pub(crate) entities: Vec<Record>,
    pub submodules: Vec<SubmoduleRecord>,
    pub(crate) type_offsets: Vec<u64>,
    pub(crate) decl_offsets: Vec<u64>,
    pub(crate) body_offsets: Vec<u64>,
    pub(crate) tu_decls: Vec<u32>,
    pub(crate) lookup: FxHashMap<String, Vec<u32>>,
    pub(crate) replacements: Vec<(u32, u64)>,
    pub(crate) chain_latest: Vec<(u32, u32)>,
    pub(crate) decls_cursor: BitstreamCursor,
}

impl fmt::Debug for ModuleFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleFile")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("version", &self.version)
            .field("imports", &self.imports)
            .field("spaces", &self.spaces)
            .finish_non_exhaustive()
    }
}

impl ModuleFile {
    /// Parse everything but the declaration and type payloads.
    #[tracing::instrument(level = "debug", skip_all, fields(bytes = bytes.len()))]
    pub fn parse(bytes: Arc<[u8]>) -> Result<Self> {
        let mut cursor = BitstreamCursor::new(Arc::clone(&bytes));
        let signature = read_signature(&mut cursor)?;
        let mut file = ModuleFile {
            name: String::new(),
            kind: ModuleKind::default(),
            version: (0, 0),
            signature,
            decls_cursor: cursor.clone(),
            bytes,
            imports: Vec::new(),
            import_indices: Vec::new(),
            imported_by: Vec::new(),
            spaces: Default::default(),
            source_files: Vec::new(),
            source_start: 0,
            source_span: 0,
            source_remap: ContinuousRangeMap::new(),
            identifiers: Vec::new(),
            ident_names: Vec::new(),
            selectors: Vec::new(),
            macros: Vec::new(),
            entities: Vec::new(),
            submodules: Vec::new(),
            type_offsets: Vec::new(),
            decl_offsets: Vec::new(),
            body_offsets: Vec::new(),
            tu_decls: Vec::new(),
            lookup: FxHashMap::default(),
            replacements: Vec::new(),
            chain_latest: Vec::new(),
        };

        let mut saw_control = false;
        let mut saw_ast = false;
        while !cursor.at_end() {
            let block = match cursor.advance()? {
                Entry::SubBlock(id) => id,
                Entry::Record(_) | Entry::EndBlock => {
                    return Err(SerializationError::malformed("top-level entry outside of a block"))
                }
            };
            if !saw_control && block != codes::CONTROL_BLOCK_ID {
                return Err(SerializationError::malformed(
                    "AST file does not start with a control block",
                ));
            }
            match block {
                codes::CONTROL_BLOCK_ID => {
                    file.read_control_block(&mut cursor)?;
                    saw_control = true;
                }
                codes::SOURCE_MANAGER_BLOCK_ID => file.read_source_block(&mut cursor)?,
                codes::PREPROCESSOR_BLOCK_ID => file.read_preprocessor_block(&mut cursor)?,
                codes::SUBMODULE_BLOCK_ID => file.read_submodule_block(&mut cursor)?,
                codes::AST_BLOCK_ID => {
                    file.read_ast_block(&mut cursor)?;
                    saw_ast = true;
                }
                _ => cursor.skip_block()?,
            }
        }
        if !saw_control || !saw_ast {
            return Err(SerializationError::malformed(
                "AST file is missing its control or AST block",
            ));
        }
        file.check_counts()?;
        tracing::debug!(
            module = %file.name,
            kind = %file.kind,
            imports = file.imports.len(),
            "parsed AST file"
        );
        Ok(file)
    }

    /// Name of the module in `bytes`, reading only the control block.
    pub fn peek_name(bytes: Arc<[u8]>) -> Result<String> {
        let mut cursor = BitstreamCursor::new(bytes);
        read_signature(&mut cursor)?;
        if cursor.advance()? != Entry::SubBlock(codes::CONTROL_BLOCK_ID) {
            return Err(SerializationError::malformed(
                "AST file does not start with a control block",
            ));
        }
        cursor.enter_subblock()?;
        loop {
            match cursor.advance()? {
                Entry::EndBlock => {
                    return Err(SerializationError::malformed("control block has no module name"))
                }
                Entry::SubBlock(_) => cursor.skip_block()?,
                Entry::Record(id) => {
                    let record = cursor.read_record(id)?;
                    if record.code == control::MODULE_NAME {
                        return decode_name(&record.values);
                    }
                }
            }
        }
    }

    #[inline]
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    #[inline]
    pub fn space(&self, kind: IdSpaceKind) -> &IdSpace {
        &self.spaces[kind.index()]
    }

    /// Modules this one was written against, resolved when it was added
    /// to a manager.
    #[inline]
    pub fn import_indices(&self) -> &[ModuleIndex] {
        &self.import_indices
    }

    #[inline]
    pub fn imported_by(&self) -> &[ModuleIndex] {
        &self.imported_by
    }

    /// Names of the direct imports.
    pub fn direct_imports(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .filter(|i| i.is_direct)
            .map(|i| i.name.as_str())
    }

    /// Number of top-level declarations the file lists for the
    /// translation unit.
    #[inline]
    pub fn num_top_level_decls(&self) -> usize {
        self.tu_decls.len()
    }

    /// Names in the module's lookup table.
    pub fn lookup_names(&self) -> impl Iterator<Item = &str> {
        self.lookup.keys().map(String::as_str)
    }

    pub(crate) fn resolve(&self, kind: IdSpaceKind, id: u32) -> Result<u32> {
        self.space(kind).resolve(kind, id)
    }

    pub(crate) fn resolve_type(&self, idx: TypeIdx) -> Result<TypeIdx> {
        let index = self.resolve(IdSpaceKind::Type, idx.index())?;
        Ok(idx.with_index(index))
    }

    /// Translate a location written in this file into the loading
    /// translation's location space.
    pub(crate) fn resolve_location(&self, raw: u32) -> Result<SourceLocation> {
        if raw == 0 {
            return Ok(SourceLocation::INVALID);
        }
        match self.source_remap.find(raw) {
            Some((start, entry)) if raw - start < entry.len => {
                Ok(SourceLocation::from_raw(entry.target + (raw - start)))
            }
            _ => Err(SerializationError::malformed(format!(
                "source location {raw} lies outside every file of `{}`",
                self.name
            ))),
        }
    }

    fn check_counts(&self) -> Result<()> {
        let tables = [
            (IdSpaceKind::Decl, self.decl_offsets.len()),
            (IdSpaceKind::Type, self.type_offsets.len()),
            (IdSpaceKind::Identifier, self.identifiers.len()),
            (IdSpaceKind::Selector, self.selectors.len()),
            (IdSpaceKind::Macro, self.macros.len()),
            (IdSpaceKind::PreprocessedEntity, self.entities.len()),
            (IdSpaceKind::Submodule, self.submodules.len()),
        ];
        for (kind, len) in tables {
            let space = self.space(kind);
            if space.count as usize != len {
                return Err(SerializationError::malformed(format!(
                    "{kind} space declares {} entries but the file holds {len}",
                    space.count
                )));
            }
            if space.count > 0 && space.local_base < kind.num_predefined() {
                return Err(SerializationError::malformed(format!(
                    "{kind} IDs of `{}` overlap the predefined IDs",
                    self.name
                )));
            }
        }
        Ok(())
    }

    fn read_control_block(&mut self, cursor: &mut BitstreamCursor) -> Result<()> {
        cursor.enter_subblock()?;
        let mut saw_metadata = false;
        while let Some(record) = next_record(cursor)? {
            let mut f = record.fields();
            match record.code {
                control::METADATA => {
                    let major = f.next_u32()?;
                    let minor = f.next_u32()?;
                    if major != codes::VERSION_MAJOR {
                        return Err(SerializationError::VersionMismatch {
                            expected_major: codes::VERSION_MAJOR,
                            found_major: major,
                            found_minor: minor,
                        });
                    }
                    self.version = (major, minor);
                    self.kind = f.next_enum("module kind", ModuleKind::from_raw)?;
                    f.finish()?;
                    saw_metadata = true;
                }
                control::MODULE_NAME => self.name = decode_name(&record.values)?,
                control::IMPORT => {
                    let is_direct = f.next_bool()?;
                    let mut bases = [0; IdSpaceKind::COUNT];
                    for base in &mut bases {
                        *base = f.next_u32()?;
                    }
                    let source_base = f.next_u32()?;
                    f.finish()?;
                    self.imports.push(ImportRecord {
                        name: blob_str(&record)?,
                        is_direct,
                        bases,
                        source_base,
                    });
                }
                code => return Err(unknown_record(code, "control")),
            }
        }
        if !saw_metadata {
            return Err(SerializationError::malformed("control block has no metadata record"));
        }
        if self.name.is_empty() {
            return Err(SerializationError::malformed("control block has no module name"));
        }
        Ok(())
    }

    fn read_source_block(&mut self, cursor: &mut BitstreamCursor) -> Result<()> {
        cursor.enter_subblock()?;
        while let Some(record) = next_record(cursor)? {
            match record.code {
                source::SOURCE_FILE => {
                    let mut f = record.fields();
                    let base = f.next_u32()?;
                    let size = f.next_u32()?;
                    f.finish()?;
                    self.source_files.push(SourceFileRecord {
                        name: blob_str(&record)?,
                        base,
                        size,
                    });
                }
                code => return Err(unknown_record(code, "source manager")),
            }
        }
        Ok(())
    }

    fn read_preprocessor_block(&mut self, cursor: &mut BitstreamCursor) -> Result<()> {
        cursor.enter_subblock()?;
        while let Some(record) = next_record(cursor)? {
            match record.code {
                preprocessor::MACRO_DEFINITION => self.macros.push(record),
                preprocessor::MACRO_EXPANSION | preprocessor::INCLUSION_DIRECTIVE => {
                    self.entities.push(record);
                }
                code => return Err(unknown_record(code, "preprocessor")),
            }
        }
        Ok(())
    }

    fn read_submodule_block(&mut self, cursor: &mut BitstreamCursor) -> Result<()> {
        cursor.enter_subblock()?;
        while let Some(record) = next_record(cursor)? {
            let mut f = record.fields();
            match record.code {
                submodule::DEFINITION => {
                    let parent = f.next_u32()?;
                    let is_explicit = f.next_bool()?;
                    f.finish()?;
                    self.submodules.push(SubmoduleRecord {
                        name: blob_str(&record)?,
                        parent,
                        is_explicit,
                        headers: Vec::new(),
                    });
                }
                submodule::HEADERS => {
                    let headers = record
                        .values
                        .iter()
                        .map(|&v| narrow(v, "header location"))
                        .collect::<Result<Vec<_>>>()?;
                    match self.submodules.last_mut() {
                        Some(m) => m.headers = headers,
                        None => {
                            return Err(SerializationError::malformed(
                                "submodule headers before any submodule definition",
                            ))
                        }
                    }
                }
                code => return Err(unknown_record(code, "submodule")),
            }
        }
        Ok(())
    }

    fn read_ast_block(&mut self, cursor: &mut BitstreamCursor) -> Result<()> {
        cursor.enter_subblock()?;
        let mut lookup_names: Option<Vec<String>> = None;
        loop {
            let record = match cursor.advance()? {
                Entry::EndBlock => break,
                Entry::SubBlock(codes::DECLTYPES_BLOCK_ID) => {
                    cursor.enter_subblock()?;
                    cursor.read_abbrevs()?;
                    self.decls_cursor = cursor.clone();
                    cursor.leave_block()?;
                    continue;
                }
                Entry::SubBlock(_) => {
                    cursor.skip_block()?;
                    continue;
                }
                Entry::Record(id) => cursor.read_record(id)?,
            };
            let mut f = record.fields();
            match record.code {
                ast::ID_SPACES => {
                    for space in &mut self.spaces {
                        space.local_base = f.next_u32()?;
                        space.count = f.next_u32()?;
                    }
                    f.finish()?;
                }
                ast::IDENTIFIER_TABLE => {
                    let count = f.next_usize()?;
                    f.finish()?;
                    self.identifiers = split_names(record.blob()?, count)?;
                }
                ast::SELECTOR_TABLE => {
                    while !f.is_exhausted() {
                        let num_args = f.next_u32()?;
                        let num_pieces = f.next_usize()?;
                        let pieces = f
                            .take(num_pieces)?
                            .iter()
                            .map(|&v| narrow(v, "selector piece"))
                            .collect::<Result<Vec<_>>>()?;
                        self.selectors.push(SelectorRecord { num_args, pieces });
                    }
                }
                ast::TYPE_OFFSET => self.type_offsets = record.values,
                ast::DECL_OFFSET => self.decl_offsets = record.values,
                ast::FUNCTION_BODY_OFFSETS => self.body_offsets = record.values,
                ast::TU_DECLS => self.tu_decls = narrow_all(&record.values, "declaration ID")?,
                ast::NAME_LOOKUP => {
                    let count = f.next_usize()?;
                    f.finish()?;
                    lookup_names = Some(split_names(record.blob()?, count)?);
                }
                ast::LOOKUP_DECLS => {
                    let names = lookup_names.take().ok_or_else(|| {
                        SerializationError::malformed("lookup declarations without lookup names")
                    })?;
                    for name in names {
                        let n = f.next_usize()?;
                        let decls = narrow_all(f.take(n)?, "declaration ID")?;
                        self.lookup.entry(name).or_default().extend(decls);
                    }
                    f.finish()?;
                }
                ast::DECL_REPLACEMENTS => {
                    while !f.is_exhausted() {
                        let decl = f.next_u32()?;
                        let offset = f.next_u64()?;
                        self.replacements.push((decl, offset));
                    }
                }
                ast::CHAIN_LATEST => {
                    while !f.is_exhausted() {
                        let first = f.next_u32()?;
                        let latest = f.next_u32()?;
                        self.chain_latest.push((first, latest));
                    }
                }
                code => return Err(unknown_record(code, "AST")),
            }
        }
        if lookup_names.is_some() {
            return Err(SerializationError::malformed("lookup names without lookup declarations"));
        }
        Ok(())
    }
}

fn read_signature(cursor: &mut BitstreamCursor) -> Result<[u8; 4]> {
    let mut found = Vec::with_capacity(4);
    for _ in 0..4 {
        match cursor.read(8) {
            Ok(b) => found.push(b as u8),
            Err(_) => break,
        }
    }
    if found != codes::SIGNATURE {
        return Err(SerializationError::BadSignature {
            expected: codes::SIGNATURE,
            found,
        });
    }
    Ok(codes::SIGNATURE)
}

/// Next record of the current block, `None` at its end. Nested blocks
/// nobody asked for are skipped.
fn next_record(cursor: &mut BitstreamCursor) -> Result<Option<Record>> {
    loop {
        match cursor.advance()? {
            Entry::EndBlock => return Ok(None),
            Entry::SubBlock(_) => cursor.skip_block()?,
            Entry::Record(id) => return cursor.read_record(id).map(Some),
        }
    }
}

fn unknown_record(code: u32, block: &str) -> SerializationError {
    SerializationError::malformed(format!("unknown record code {code} in the {block} block"))
}

fn narrow(v: u64, what: &str) -> Result<u32> {
    u32::try_from(v)
        .map_err(|_| SerializationError::malformed(format!("{what} {v} does not fit 32 bits")))
}

fn narrow_all(values: &[u64], what: &str) -> Result<Vec<u32>> {
    values.iter().map(|&v| narrow(v, what)).collect()
}

fn decode_name(values: &[u64]) -> Result<String> {
    let bytes = values
        .iter()
        .map(|&v| {
            u8::try_from(v)
                .map_err(|_| SerializationError::malformed("module name byte out of range"))
        })
        .collect::<Result<Vec<u8>>>()?;
    String::from_utf8(bytes).map_err(|_| SerializationError::malformed("module name is not UTF-8"))
}

fn blob_str(record: &Record) -> Result<String> {
    String::from_utf8(record.blob()?.to_vec()).map_err(|_| {
        SerializationError::malformed(format!("name in record {} is not UTF-8", record.code))
    })
}

/// Split a blob of `count` NUL-terminated names.
pub(crate) fn split_names(blob: &[u8], count: usize) -> Result<Vec<String>> {
    // Every name takes at least its terminator.
    let mut names = Vec::with_capacity(count.min(blob.len()));
    let mut rest = blob;
    for _ in 0..count {
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| SerializationError::malformed("name table is truncated"))?;
        let name = std::str::from_utf8(&rest[..end])
            .map_err(|_| SerializationError::malformed("name table entry is not UTF-8"))?;
        names.push(name.to_owned());
        rest = &rest[end + 1..];
    }
    if !rest.is_empty() {
        return Err(SerializationError::malformed("name table has trailing bytes"));
    }
    Ok(names)
}

/// Blob of NUL-terminated names, the inverse of [`split_names`].
pub(crate) fn join_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<u8> {
    let mut blob = Vec::new();
    for name in names {
        blob.extend_from_slice(name.as_bytes());
        blob.push(0);
    }
    blob
}

#[cfg(test)]
mod tests;
